//! Postgres-backed cluster store.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use newsranker_domain::{ArticleCluster, ClusterMember};

use crate::{ClusterStore, StoreError};

pub struct PgClusterStore {
    pool: PgPool,
}

impl PgClusterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClusterRow {
    cluster_hash: String,
    title: String,
    symbol: String,
    article_date: NaiveDate,
    score: f64,
    lead_article_id: String,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: String,
    reference_score: f64,
    subject_score: f64,
    cluster_hash: String,
    article_id: String,
}

impl From<MemberRow> for ClusterMember {
    fn from(row: MemberRow) -> Self {
        ClusterMember {
            id: row.id,
            cluster_hash: row.cluster_hash,
            article_id: row.article_id,
            reference_score: row.reference_score,
            subject_score: row.subject_score,
        }
    }
}

const FIND_CLUSTER: &str = r#"
    SELECT cluster_hash, title, symbol, article_date, score, lead_article_id
    FROM article_cluster
    WHERE cluster_hash = $1
"#;

const FIND_MEMBERS: &str = r#"
    SELECT id, reference_score, subject_score, cluster_hash, article_id
    FROM cluster_member
    WHERE cluster_hash = $1
"#;

const INSERT_CLUSTER: &str = r#"
    INSERT INTO article_cluster (cluster_hash, title, symbol, article_date, score, lead_article_id)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const UPDATE_CLUSTER: &str = r#"
    UPDATE article_cluster
    SET score = $1, lead_article_id = $2
    WHERE cluster_hash = $3
"#;

const UPSERT_MEMBER: &str = r#"
    INSERT INTO cluster_member (id, reference_score, subject_score, cluster_hash, article_id)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT ON CONSTRAINT cluster_member_pkey
    DO UPDATE SET reference_score = $2, subject_score = $3
"#;

#[async_trait]
impl ClusterStore for PgClusterStore {
    async fn find_by_hash(&self, cluster_hash: &str) -> Result<ArticleCluster, StoreError> {
        let mut tx = self.pool.begin().await?;

        let members = sqlx::query_as::<_, MemberRow>(FIND_MEMBERS)
            .bind(cluster_hash)
            .fetch_all(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ClusterRow>(FIND_CLUSTER)
            .bind(cluster_hash)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NoSuchCluster)?;

        tx.commit().await?;

        Ok(ArticleCluster {
            hash: row.cluster_hash,
            title: row.title,
            symbol: row.symbol,
            article_date: row.article_date,
            lead_article_id: row.lead_article_id,
            score: row.score,
            members: members.into_iter().map(ClusterMember::from).collect(),
        })
    }

    async fn save(&self, cluster: &ArticleCluster) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(INSERT_CLUSTER)
            .bind(&cluster.hash)
            .bind(&cluster.title)
            .bind(&cluster.symbol)
            .bind(cluster.article_date)
            .bind(cluster.score)
            .bind(&cluster.lead_article_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::InsertFailed);
        }

        upsert_members(&mut tx, &cluster.members).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, cluster: &ArticleCluster) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(UPDATE_CLUSTER)
            .bind(cluster.score)
            .bind(&cluster.lead_article_id)
            .bind(&cluster.hash)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::UpdateFailed);
        }

        upsert_members(&mut tx, &cluster.members).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn upsert_members(
    tx: &mut Transaction<'_, Postgres>,
    members: &[ClusterMember],
) -> Result<(), StoreError> {
    for member in members {
        let result = sqlx::query(UPSERT_MEMBER)
            .bind(&member.id)
            .bind(member.reference_score)
            .bind(member.subject_score)
            .bind(&member.cluster_hash)
            .bind(&member.article_id)
            .execute(&mut **tx)
            .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::InsertFailed);
        }
    }
    Ok(())
}
