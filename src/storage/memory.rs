use crate::error::StoreResult;
use crate::storage::{ContentStore, CorpusEntry, CorpusFile, EmbeddingRecord};
use crate::types::{ContentItem, ItemId, Platform, UserId};
use crate::vector::{EmbeddingGenerator, VectorError, create_item_text, normalize_vector};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;

/// In-process content store.
///
/// Cloning is cheap and every clone shares the same maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: Arc<DashMap<ItemId, ContentItem>>,
    embeddings: Arc<DashMap<ItemId, Vec<f32>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every entry of a JSON corpus file.
    pub fn from_corpus_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let corpus = CorpusFile::load(path)?;
        let store = Self::new();
        for entry in corpus.items {
            store.insert_entry(entry);
        }
        Ok(store)
    }

    /// Writes the current contents back out as a corpus file.
    pub fn save_corpus_file(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let mut items: Vec<CorpusEntry> = self
            .items
            .iter()
            .map(|entry| CorpusEntry {
                item: entry.value().clone(),
                embedding: self.embedding(entry.key()),
            })
            .collect();
        items.sort_by(|a, b| a.item.id.cmp(&b.item.id));

        CorpusFile { items }.save(path)
    }

    pub fn insert(&self, item: ContentItem) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn insert_entry(&self, entry: CorpusEntry) {
        if let Some(vector) = entry.embedding {
            self.embeddings.insert(entry.item.id.clone(), vector);
        }
        self.insert(entry.item);
    }

    /// Stores the embedding of an existing item. Returns `false` if the item is unknown.
    pub fn set_embedding(&self, id: &ItemId, vector: Vec<f32>) -> bool {
        if !self.items.contains_key(id) {
            return false;
        }
        self.embeddings.insert(id.clone(), vector);
        true
    }

    /// Deletes an item together with its embedding.
    pub fn remove(&self, id: &ItemId) -> Option<ContentItem> {
        self.embeddings.remove(id);
        self.items.remove(id).map(|(_, item)| item)
    }

    pub fn get(&self, id: &ItemId) -> Option<ContentItem> {
        self.items.get(id).map(|entry| entry.clone())
    }

    pub fn embedding(&self, id: &ItemId) -> Option<Vec<f32>> {
        self.embeddings.get(id).map(|entry| entry.clone())
    }

    /// Items that have no embedding yet, ordered by identifier.
    pub fn items_without_embedding(&self) -> Vec<ContentItem> {
        let mut items: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|entry| !self.embeddings.contains_key(entry.key()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// Embeds every item that has no embedding yet, `batch_size` texts per
    /// generator call. Vectors are unit-normalized before they are stored.
    ///
    /// Returns the number of items embedded.
    pub fn fill_missing_embeddings(
        &self,
        generator: &dyn EmbeddingGenerator,
        batch_size: usize,
    ) -> Result<usize, VectorError> {
        let pending = self.items_without_embedding();
        let mut embedded = 0;

        for batch in pending.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(create_item_text).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let vectors = generator.generate_embeddings(&refs)?;

            if vectors.len() != batch.len() {
                return Err(VectorError::EmbeddingFailed(format!(
                    "generator returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (item, mut vector) in batch.iter().zip(vectors) {
                generator.dimension().validate_vector(&vector)?;
                normalize_vector(&mut vector);
                self.embeddings.insert(item.id.clone(), vector);
                embedded += 1;
            }
            tracing::debug!(embedded, pending = pending.len(), "embedded batch");
        }

        Ok(embedded)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_embeddings(&self) -> StoreResult<Vec<EmbeddingRecord>> {
        Ok(self
            .embeddings
            .iter()
            .filter(|entry| self.items.contains_key(entry.key()))
            .map(|entry| EmbeddingRecord {
                id: entry.key().clone(),
                vector: entry.value().clone(),
            })
            .collect())
    }

    async fn get_content_items(
        &self,
        ids: &[ItemId],
        user_id: &UserId,
        platform: Option<Platform>,
    ) -> StoreResult<Vec<ContentItem>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.get(id))
            .filter(|item| &item.user_id == user_id)
            .filter(|item| platform.is_none_or(|p| item.platform == p))
            .collect())
    }
}
