//! Catalog error types

use crate::fetcher::FetchFailure;
use shared::error::{ErrorBody, ErrorCode};
use shared::models::{CriteriaError, MalformedTree};
use thiserror::Error;

/// Failure reported by a category tree or product source
///
/// Never used for "no such product"; sources return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport or decode failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not a valid category tree
    #[error("invalid tree payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-success status other than 404
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Base URL cannot carry path segments
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    /// Source refused or could not serve the request
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Catalog error type
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Tree failed shape checks; nothing was published
    #[error("malformed category tree: {0}")]
    MalformedTree(#[from] MalformedTree),

    /// Filter or sort criteria rejected
    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),

    /// Tree source call failed
    #[error("category tree source failed: {0}")]
    TreeSource(#[source] SourceError),

    /// Product fetches failed and partial loads are not allowed
    #[error("{} product fetches failed", .failures.len())]
    PartialLoad { failures: Vec<FetchFailure> },

    /// A newer load started before this one could commit
    #[error("load generation {generation} superseded by generation {current}")]
    Superseded { generation: u64, current: u64 },

    #[error("catalog load cancelled")]
    Cancelled,

    #[error("catalog has not been loaded")]
    NotLoaded,
}

impl CatalogError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedTree(MalformedTree::MissingId { .. }) => ErrorCode::CategoryIdMissing,
            Self::MalformedTree(MalformedTree::Cycle { .. }) => ErrorCode::CategoryCycle,
            Self::InvalidCriteria(err) => err.code(),
            Self::TreeSource(_) => ErrorCode::SourceUnavailable,
            Self::PartialLoad { .. } => ErrorCode::PartialLoad,
            Self::Superseded { .. } => ErrorCode::LoadSuperseded,
            Self::Cancelled => ErrorCode::LoadCancelled,
            Self::NotLoaded => ErrorCode::CatalogNotLoaded,
        }
    }

    /// Payload for the presentation layer
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::with_message(self.code(), self.to_string())
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
