use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such article")]
    NoSuchArticle,

    #[error("no such cluster")]
    NoSuchCluster,

    #[error("insert failed")]
    InsertFailed,

    #[error("update failed")]
    UpdateFailed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
