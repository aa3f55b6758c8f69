//! Read interface onto the content store.
//!
//! The search core never writes content records; it reads stored embeddings
//! to build the index and fetches candidate records to score them. The
//! production store lives outside this crate. [`MemoryStore`] backs the CLI
//! and the tests.

mod corpus;
mod memory;

pub use corpus::{CorpusEntry, CorpusFile};
pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::types::{ContentItem, ItemId, Platform, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One stored embedding, keyed by the item it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: ItemId,
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    pub fn new(id: impl Into<ItemId>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }
}

/// Store operations the search core depends on.
///
/// Both calls may suspend on network or disk I/O.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every stored embedding of a live (not deleted) item.
    async fn get_embeddings(&self) -> StoreResult<Vec<EmbeddingRecord>>;

    /// Records for `ids` owned by `user_id`, optionally restricted to `platform`.
    ///
    /// Identifiers that do not exist or do not pass the filters are skipped.
    async fn get_content_items(
        &self,
        ids: &[ItemId],
        user_id: &UserId,
        platform: Option<Platform>,
    ) -> StoreResult<Vec<ContentItem>>;
}
