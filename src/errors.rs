use thiserror::Error;

/// Errors that can occur during crossnav operations.
#[derive(Error, Debug)]
pub enum CrossNavError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("database error: {message} (operation: {operation})")]
    Database { message: String, operation: String },

    #[error("snapshot error: {message}")]
    Snapshot { message: String },

    #[error("query error: {message}")]
    Query { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `CrossNavError`.
pub type Result<T> = std::result::Result<T, CrossNavError>;
