//! Postgres-backed article store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use newsranker_common::{join_keywords, split_keywords, Article, Referer, ScrapedArticle, Subject};

use crate::{ArticleStore, StoreError};

pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: String,
    url: String,
    title: String,
    body: String,
    keywords: Option<String>,
    reference_score: f64,
    article_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            url: row.url,
            title: row.title,
            body: row.body,
            keywords: split_keywords(row.keywords.as_deref()),
            reference_score: row.reference_score,
            article_date: row.article_date,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubjectRow {
    id: String,
    symbol: String,
    name: String,
    score: f64,
    article_id: String,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            id: row.id,
            symbol: row.symbol,
            name: row.name,
            score: row.score,
            article_id: row.article_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefererRow {
    id: String,
    twitter_author: String,
    follower_count: i64,
    article_id: String,
}

impl From<RefererRow> for Referer {
    fn from(row: RefererRow) -> Self {
        Referer {
            id: row.id,
            external_id: row.twitter_author,
            follower_count: row.follower_count,
            article_id: row.article_id,
        }
    }
}

const FIND_ARTICLE_BY_URL: &str = r#"
    SELECT id, url, title, body, keywords, reference_score, article_date, created_at
    FROM article
    WHERE url = $1
"#;

const FIND_SUBJECTS: &str = r#"
    SELECT id, symbol, name, score, article_id
    FROM subject
    WHERE article_id = $1
"#;

const FIND_REFERERS: &str = r#"
    SELECT id, twitter_author, follower_count, article_id
    FROM twitter_references
    WHERE article_id = $1
"#;

const UPDATE_ARTICLE: &str = r#"
    UPDATE article
    SET reference_score = $1
    WHERE id = $2
"#;

const INSERT_REFERER: &str = r#"
    INSERT INTO twitter_references (id, twitter_author, follower_count, article_id)
    VALUES ($1, $2, $3, $4)
"#;

const UPSERT_ARTICLE: &str = r#"
    INSERT INTO article (id, url, title, body, keywords, reference_score, article_date, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
    ON CONFLICT ON CONSTRAINT article_pkey
    DO UPDATE SET reference_score = $6
"#;

const INSERT_REFERER_IGNORE_CONFLICT: &str = r#"
    INSERT INTO twitter_references (id, twitter_author, follower_count, article_id)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT ON CONSTRAINT twitter_references_pkey DO NOTHING
"#;

const UPSERT_SUBJECT: &str = r#"
    INSERT INTO subject (id, symbol, name, score, article_id)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT ON CONSTRAINT subject_pkey
    DO UPDATE SET score = $4
"#;

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn find_by_url(&self, url: &str) -> Result<Article, StoreError> {
        let row = sqlx::query_as::<_, ArticleRow>(FIND_ARTICLE_BY_URL)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Article::from).ok_or(StoreError::NoSuchArticle)
    }

    async fn find_subjects(&self, article_id: &str) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query_as::<_, SubjectRow>(FIND_SUBJECTS)
            .bind(article_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Subject::from).collect())
    }

    async fn find_referers(&self, article_id: &str) -> Result<Vec<Referer>, StoreError> {
        let rows = sqlx::query_as::<_, RefererRow>(FIND_REFERERS)
            .bind(article_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Referer::from).collect())
    }

    async fn update_article(&self, article: &Article) -> Result<(), StoreError> {
        let result = sqlx::query(UPDATE_ARTICLE)
            .bind(article.reference_score)
            .bind(&article.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::NoSuchArticle);
        }
        Ok(())
    }

    async fn save_referer(&self, referer: &Referer) -> Result<(), StoreError> {
        let result = sqlx::query(INSERT_REFERER)
            .bind(&referer.id)
            .bind(&referer.external_id)
            .bind(referer.follower_count)
            .bind(&referer.article_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::InsertFailed);
        }
        Ok(())
    }

    async fn save_scraped(&self, scraped: &ScrapedArticle) -> Result<(), StoreError> {
        // A dropped transaction rolls back, so any `?` below aborts the batch.
        let mut tx = self.pool.begin().await?;

        let article = &scraped.article;
        let result = sqlx::query(UPSERT_ARTICLE)
            .bind(&article.id)
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.body)
            .bind(join_keywords(&article.keywords))
            .bind(article.reference_score)
            .bind(article.article_date)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::InsertFailed);
        }

        // The referer may already exist; conflicts on the key are fine.
        sqlx::query(INSERT_REFERER_IGNORE_CONFLICT)
            .bind(&scraped.referer.id)
            .bind(&scraped.referer.external_id)
            .bind(scraped.referer.follower_count)
            .bind(&scraped.referer.article_id)
            .execute(&mut *tx)
            .await?;

        for subject in &scraped.subjects {
            sqlx::query(UPSERT_SUBJECT)
                .bind(&subject.id)
                .bind(&subject.symbol)
                .bind(&subject.name)
                .bind(subject.score)
                .bind(&subject.article_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
