//! Structured errors returned by catalog loading, search requests and exports.
//!
//! "Nothing derivable" is not an error: searches return an empty outcome. Soft limits are not
//! errors either; they are reported through [`crate::search::limits::LimitHits`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The catalog is unusable (fatal, raised before any search starts).
    #[error("invalid catalog: {reason}")]
    Catalog { reason: String },
    /// The request cannot be served as given.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
    /// I/O failure while reading a catalog/config or writing an export.
    #[error("io error at {stage} for {path}: {error}")]
    Io {
        stage: &'static str,
        path: String,
        error: String,
    },
    /// JSON (de)serialization failure.
    #[error("json error at {stage}: {error}")]
    Json { stage: &'static str, error: String },
}

impl SearchError {
    pub(crate) fn catalog(reason: impl Into<String>) -> Self {
        SearchError::Catalog {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        SearchError::InvalidRequest {
            reason: reason.into(),
        }
    }
}
