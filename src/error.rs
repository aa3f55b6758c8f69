//! Error types for the search core
//!
//! Each layer has its own enum. The ranker keeps the distinction between
//! failure modes internally so they can be logged, and the outward search API
//! flattens all of them to an empty result list.

use crate::vector::VectorError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`ContentStore`](crate::storage::ContentStore) implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Content store unavailable: {reason}\nSuggestion: Check the store connection and retry")]
    Unavailable { reason: String },

    #[error("Failed to read corpus '{path}': {source}")]
    CorpusRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Corpus file '{path}' is malformed: {reason}\nSuggestion: The file must be a JSON object with an \"items\" array"
    )]
    CorpusFormat { path: PathBuf, reason: String },
}

/// Why a search produced no results
///
/// Every variant is a degradation path; none of them reaches the caller of
/// [`RelevanceRanker::search`](crate::ranking::RelevanceRanker::search).
#[derive(Error, Debug)]
pub enum SearchFailure {
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: &'static str },

    #[error("Unknown platform filter '{0}'\nSuggestion: Use one of youtube, instagram, tiktok, facebook")]
    UnknownPlatform(String),

    #[error("Query embedding failed: {0}")]
    Embedding(#[source] VectorError),

    #[error("Embedding index unavailable: {0}")]
    Index(#[source] VectorError),

    #[error("Candidate lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Search exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl SearchFailure {
    /// Get a stable status code for this failure.
    ///
    /// Used as a structured field in degradation log lines.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::InvalidQuery { .. } => "INVALID_QUERY",
            Self::UnknownPlatform(_) => "UNKNOWN_PLATFORM",
            Self::Embedding(_) => "EMBEDDING_FAILED",
            Self::Index(_) => "INDEX_UNAVAILABLE",
            Self::Store(_) => "STORE_FAILED",
            Self::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
        }
    }

    /// Whether the failure came from the request itself rather than a collaborator
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. } | Self::UnknownPlatform(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for internal search operations
pub type SearchResultOf<T> = Result<T, SearchFailure>;
