use thiserror::Error;

/// Failure taxonomy for store interactions.
///
/// Expected HTTP error statuses are mapped into this type rather than
/// surfaced as transport errors, so callers can decide policy (surface to
/// the user, skip a poll tick, re-sync) by matching on the kind. Variants
/// are `Clone` so a failure can be fanned out to multiple subscribers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The store was unreachable or the request timed out.
    #[error("network failure: {0}")]
    Network(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// An invariant violation caught client-side, such as a duplicate email
    /// at registration, or a 409 from the store.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The operation is not allowed in the current state: self-follow,
    /// transition out of a terminal status, missing privilege.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Malformed input rejected before any network call was made.
    #[error("validation failed: {0}")]
    Validation(String),
    /// An unexpected status, or a response body that did not match its
    /// schema.
    #[error("unexpected store response: {0}")]
    Unknown(String),
}

impl Error {
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status {
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(context.to_string()),
            reqwest::StatusCode::CONFLICT => Self::Conflict(context.to_string()),
            _ => Self::Unknown(format!("{context}: status {status}")),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::Network(error.to_string())
        } else if error.is_decode() {
            Self::Unknown(format!("response parsing error: {error}"))
        } else {
            Self::Unknown(error.to_string())
        }
    }
}
