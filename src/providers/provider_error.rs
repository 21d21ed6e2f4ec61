use thiserror::Error;

/// Failures from an external listing or description source.
///
/// Description lookups never surface these to callers: the resolver turns
/// every variant into "no description from this source".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("credential not configured for {0}")]
    MissingCredential(&'static str),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no property matched {0}")]
    NoMatch(String),

    #[error("blocked by provider: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Malformed(err.to_string())
    }
}
