use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("Database initialization error: {0}")]
    DatabaseInitialization(String),

    #[error("Directory creation error: {0}")]
    DirectoryCreation(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store actor unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected store response: {0}")]
    UnexpectedResponse(String),
}
