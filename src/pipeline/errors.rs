use thiserror::Error;

/// A per-listing stage failure. Never escapes the orchestrator: the listing
/// is emitted as a degraded record carrying the message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListingError {
    #[error("insufficient listing data: {0}")]
    InsufficientListingData(&'static str),

    #[error("invalid listing: {0}")]
    InvalidListing(String),

    #[error("analysis aborted: {0}")]
    StagePanicked(String),
}

/// Failures writing finalized records or freshness history.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write record {record_id}: {message}")]
    Write { record_id: String, message: String },

    #[error("history store error: {0}")]
    Store(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Store(err.to_string())
    }
}
