// errors.rs
use crate::pipeline::PersistenceError;
use crate::providers::ProviderError;
use astra::Response;
use thiserror::Error;

/// Errors surfaced by route handlers. Per-listing problems never get here;
/// they travel inside the run output.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),

    /// The primary listing search could not run at all.
    #[error("Search Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Unavailable(_) => 503,
            ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => 500,
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(err: rusqlite::Error) -> Self {
        ServerError::DbError(err.to_string())
    }
}

impl From<PersistenceError> for ServerError {
    fn from(err: PersistenceError) -> Self {
        ServerError::DbError(err.to_string())
    }
}

impl From<ProviderError> for ServerError {
    fn from(err: ProviderError) -> Self {
        ServerError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("invalid JSON: {err}"))
    }
}
