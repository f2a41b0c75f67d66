//! Transactional persistence for articles, their subjects and referers, and
//! article clusters. Postgres via sqlx; expected absence is a typed variant,
//! never a generic error.

pub mod article;
pub mod cluster;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod testutil;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use newsranker_common::{Article, Referer, ScrapedArticle, Subject};
use newsranker_domain::ArticleCluster;

pub use article::PgArticleStore;
pub use cluster::PgClusterStore;
pub use error::StoreError;

/// Data access for articles and their owned subjects and referers.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Article, StoreError>;
    async fn find_subjects(&self, article_id: &str) -> Result<Vec<Subject>, StoreError>;
    async fn find_referers(&self, article_id: &str) -> Result<Vec<Referer>, StoreError>;
    /// Rewrite the reference score of an existing article.
    async fn update_article(&self, article: &Article) -> Result<(), StoreError>;
    async fn save_referer(&self, referer: &Referer) -> Result<(), StoreError>;
    /// Transactional upsert of a scraped payload: article, referer, subjects.
    async fn save_scraped(&self, scraped: &ScrapedArticle) -> Result<(), StoreError>;
}

/// Data access for article clusters and their members.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn find_by_hash(&self, cluster_hash: &str) -> Result<ArticleCluster, StoreError>;
    async fn save(&self, cluster: &ArticleCluster) -> Result<(), StoreError>;
    async fn update(&self, cluster: &ArticleCluster) -> Result<(), StoreError>;
}

/// Open the shared connection pool. Broker-induced parallelism is bounded by
/// the pool limit.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(0)
        .connect(database_url)
        .await
}

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;
    Ok(())
}

/// Round-trip liveness probe.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
