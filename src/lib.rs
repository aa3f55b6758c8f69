//! Hybrid relevance search over a user's saved videos.
//!
//! Items are recalled by embedding similarity from an [`EmbeddingIndex`],
//! then re-scored with additive lexical tiers by the [`RelevanceRanker`].

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod ranking;
pub mod storage;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{SearchFailure, SearchResultOf, StoreError, StoreResult};
pub use ranking::{RankingWeights, RelevanceRanker, SearchRequest};
pub use storage::{ContentStore, EmbeddingRecord, MemoryStore};
pub use types::{ContentItem, ItemId, Platform, SearchResult, UserId};
pub use vector::{
    EmbeddingGenerator, EmbeddingIndex, FastEmbedGenerator, IndexKind, IndexOptions, IndexStats,
    VectorError,
};
