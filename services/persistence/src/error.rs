use thiserror::Error;

/// Storage-layer errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database not configured. Set DATABASE_URL to enable storage.")]
    Unconfigured,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
