use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("fallback SQL generation failed: {0}")]
    FallbackExhausted(String),

    #[error("Error executing SQL: {message}")]
    SqlExecution { message: String, sql: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn code(&self) -> i32 {
        match self {
            Error::Ingestion(_) => -32001,
            Error::Generation(_) => -32002,
            Error::Extraction(_) => -32003,
            Error::FallbackExhausted(_) => -32004,
            Error::SqlExecution { .. } => -32000,
            Error::Json(_) => -32700,
            Error::InvalidRequest(_) => -32600,
            Error::Internal(_) => -32603,
        }
    }

    /// Whether the pipeline recovers from this error locally by falling
    /// through to the heuristic tier instead of surfacing it to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Generation(_) | Error::Extraction(_))
    }

    /// The SQL statement that was being executed when the error occurred,
    /// so the caller can inspect what was tried.
    pub fn attempted_sql(&self) -> Option<&str> {
        match self {
            Error::SqlExecution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
