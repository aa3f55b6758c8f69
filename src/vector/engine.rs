//! Embedding index that orchestrates builds, inserts and searches.
//!
//! The active similarity structure is held as a *generation*. Readers load the
//! current generation and search it under a shared lock. A rebuild constructs
//! a fresh generation from the store's full record set and swaps it in
//! atomically, so concurrent readers keep using the previous generation until
//! the swap and never observe a half-built structure. All mutations are
//! serialized by a single writer lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::storage::{ContentStore, EmbeddingRecord};
use crate::types::ItemId;
use crate::vector::{
    DEFAULT_RECALL_WINDOW, IndexKind, IvfParams, Similarity, VectorDimension, VectorError,
    VectorIndex, build_index,
};

/// Static parameters of an [`EmbeddingIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOptions {
    pub kind: IndexKind,
    pub dimension: VectorDimension,
    /// Default `k` for [`EmbeddingIndex::search_default`].
    pub recall_window: usize,
    pub ivf: IvfParams,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            kind: IndexKind::Flat,
            dimension: VectorDimension::dimension_384(),
            recall_window: DEFAULT_RECALL_WINDOW,
            ivf: IvfParams::default(),
        }
    }
}

/// Snapshot of the active generation, for logs and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub generation: u64,
    pub kind: IndexKind,
    pub dimension: usize,
    pub vectors: usize,
    pub trained: bool,
}

/// Why a rebuild could not produce a populated generation.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("Failed to load embeddings: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build index: {0}")]
    Vector(#[from] VectorError),
}

/// Slot bookkeeping plus the structure it describes.
#[derive(Debug)]
struct GenerationState {
    index: Box<dyn VectorIndex>,
    ids: Vec<ItemId>,
    slots: HashMap<ItemId, usize>,
}

impl GenerationState {
    fn empty(options: &IndexOptions) -> Self {
        Self {
            index: build_index(options.kind, options.dimension, &options.ivf),
            ids: Vec::new(),
            slots: HashMap::new(),
        }
    }

    fn insert(&mut self, id: ItemId, vector: &[f32]) -> Result<(), VectorError> {
        if self.slots.contains_key(&id) {
            return Err(VectorError::DuplicateId(id.to_string()));
        }
        let slot = self.index.add(vector)?;
        debug_assert_eq!(slot, self.ids.len());
        self.ids.push(id.clone());
        self.slots.insert(id, slot);
        Ok(())
    }
}

#[derive(Debug)]
struct Generation {
    number: u64,
    state: RwLock<GenerationState>,
}

/// Shared nearest-neighbour index over content embeddings, keyed by item.
pub struct EmbeddingIndex {
    store: Arc<dyn ContentStore>,
    options: IndexOptions,
    active: ArcSwap<Generation>,
    writer: Mutex<()>,
    generations: AtomicU64,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("options", &self.options)
            .field("stats", &self.stats())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Creates an empty index. Call [`initialize`](Self::initialize) to load
    /// the stored embeddings.
    pub fn new(store: Arc<dyn ContentStore>, options: IndexOptions) -> Self {
        let empty = Generation {
            number: 0,
            state: RwLock::new(GenerationState::empty(&options)),
        };
        Self {
            store,
            options,
            active: ArcSwap::from_pointee(empty),
            writer: Mutex::new(()),
            generations: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn recall_window(&self) -> usize {
        self.options.recall_window
    }

    /// Rebuilds the index from every embedding in the store.
    ///
    /// Fails soft: if the store cannot be read, an empty generation is
    /// installed and searches return no candidates until the next rebuild.
    pub async fn initialize(&self) -> IndexStats {
        self.rebuild_soft(None).await
    }

    /// Like [`initialize`](Self::initialize) but reports the failure instead
    /// of installing an empty generation.
    pub async fn try_initialize(&self) -> Result<IndexStats, RebuildError> {
        let _guard = self.writer.lock().await;
        self.rebuild_locked(None).await
    }

    /// Drops `id` from the index.
    ///
    /// The similarity structures cannot delete points, so this is a full
    /// rebuild from the store that skips `id` even if the store still
    /// returns its embedding.
    pub async fn remove(&self, id: &ItemId) -> IndexStats {
        self.rebuild_soft(Some(id)).await
    }

    /// Inserts one vector for `id` into the active generation.
    ///
    /// An untrained clustered index is trained on this first vector; a later
    /// [`initialize`](Self::initialize) retrains it on the full record set.
    pub async fn add(&self, id: ItemId, vector: &[f32]) -> Result<(), VectorError> {
        self.options.dimension.validate_vector(vector)?;
        let _guard = self.writer.lock().await;

        let generation = self.active.load();
        let mut state = generation.state.write();
        if !state.index.is_trained() {
            tracing::info!(id = %id, "training empty clustered index on first inserted vector");
            state.index.train(&[vector])?;
        }
        state.insert(id, vector)
    }

    /// Up to `k` `(item, similarity)` pairs, highest similarity first.
    ///
    /// An empty or untrained index yields an empty list. A query with the
    /// wrong dimension is an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ItemId, Similarity)>, VectorError> {
        let generation = self.active.load();
        let state = generation.state.read();
        let hits = state.index.search(query, k)?;

        Ok(hits
            .into_iter()
            .filter_map(|(slot, score)| state.ids.get(slot).map(|id| (id.clone(), score)))
            .collect())
    }

    /// [`search`](Self::search) with the configured recall window as `k`.
    pub fn search_default(&self, query: &[f32]) -> Result<Vec<(ItemId, Similarity)>, VectorError> {
        self.search(query, self.options.recall_window)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.active.load().state.read().slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.active.load().state.read().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        let generation = self.active.load();
        let state = generation.state.read();
        IndexStats {
            generation: generation.number,
            kind: state.index.kind(),
            dimension: state.index.dimension().get(),
            vectors: state.ids.len(),
            trained: state.index.is_trained(),
        }
    }

    async fn rebuild_soft(&self, exclude: Option<&ItemId>) -> IndexStats {
        let _guard = self.writer.lock().await;
        match self.rebuild_locked(exclude).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "index rebuild failed, serving an empty index");
                let state = GenerationState::empty(&self.options);
                self.install(state)
            }
        }
    }

    /// Builds and swaps in a new generation. Caller holds the writer lock.
    async fn rebuild_locked(&self, exclude: Option<&ItemId>) -> Result<IndexStats, RebuildError> {
        let records = self.store.get_embeddings().await?;
        let state = self.build_state(records, exclude)?;
        let stats = self.install(state);
        tracing::info!(
            generation = stats.generation,
            vectors = stats.vectors,
            kind = %stats.kind,
            "embedding index rebuilt"
        );
        Ok(stats)
    }

    fn build_state(
        &self,
        mut records: Vec<EmbeddingRecord>,
        exclude: Option<&ItemId>,
    ) -> Result<GenerationState, VectorError> {
        let dimension = self.options.dimension;

        // Stable slot order regardless of store iteration order
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records.dedup_by(|b, a| {
            let duplicate = a.id == b.id;
            if duplicate {
                tracing::warn!(id = %b.id, "store returned a second embedding, keeping the first");
            }
            duplicate
        });
        records.retain(|record| {
            if exclude == Some(&record.id) {
                return false;
            }
            match dimension.validate_vector(&record.vector) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "skipping stored embedding");
                    false
                }
            }
        });

        let mut state = GenerationState::empty(&self.options);
        if records.is_empty() {
            return Ok(state);
        }

        let sample: Vec<&[f32]> = records.iter().map(|r| r.vector.as_slice()).collect();
        state.index.train(&sample)?;

        for record in records {
            state.insert(record.id, &record.vector)?;
        }
        Ok(state)
    }

    fn install(&self, state: GenerationState) -> IndexStats {
        let number = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        self.active.store(Arc::new(Generation {
            number,
            state: RwLock::new(state),
        }));
        self.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{ContentItem, Platform, UserId};
    use crate::vector::clustering::normalize_vector_copy;
    use async_trait::async_trait;

    const DIM: usize = 8;

    fn options(kind: IndexKind) -> IndexOptions {
        IndexOptions {
            kind,
            dimension: VectorDimension::new(DIM).unwrap(),
            recall_window: 50,
            ivf: IvfParams {
                lists: 2,
                probes: 2,
                ..IvfParams::default()
            },
        }
    }

    fn unit(seed: usize) -> Vec<f32> {
        let v: Vec<f32> = (0..DIM)
            .map(|j| (((seed + 1) * (j + 3)) % 7) as f32 - 3.0)
            .collect();
        normalize_vector_copy(&v)
    }

    fn axis(j: usize) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        v[j] = 1.0;
        v
    }

    fn seeded_store(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            let id = format!("item-{i}");
            store.insert(ContentItem::new(&id, "u1", Platform::YouTube, format!("video {i}")));
            store.set_embedding(&ItemId::new(id), axis(i % DIM));
        }
        store
    }

    struct OfflineStore;

    #[async_trait]
    impl ContentStore for OfflineStore {
        async fn get_embeddings(&self) -> crate::error::StoreResult<Vec<EmbeddingRecord>> {
            Err(StoreError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }

        async fn get_content_items(
            &self,
            _ids: &[ItemId],
            _user_id: &UserId,
            _platform: Option<Platform>,
        ) -> crate::error::StoreResult<Vec<ContentItem>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_results() {
        let index = EmbeddingIndex::new(Arc::new(MemoryStore::new()), options(IndexKind::Flat));
        let stats = index.initialize().await;
        assert_eq!(stats.vectors, 0);
        assert!(index.search(&unit(0), 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_soft() {
        let index = EmbeddingIndex::new(Arc::new(OfflineStore), options(IndexKind::Flat));
        assert!(index.try_initialize().await.is_err());

        let stats = index.initialize().await;
        assert_eq!(stats.vectors, 0);
        assert!(index.search_default(&unit(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_loads_store_and_is_idempotent() {
        let index = EmbeddingIndex::new(Arc::new(seeded_store(6)), options(IndexKind::Flat));

        let first = index.initialize().await;
        assert_eq!(first.vectors, 6);
        let before = index.search(&axis(2), 3).unwrap();

        let second = index.initialize().await;
        assert_eq!(second.vectors, 6);
        assert!(second.generation > first.generation);
        assert_eq!(index.search(&axis(2), 3).unwrap(), before);
        assert_eq!(before[0].0, ItemId::new("item-2"));
    }

    #[tokio::test]
    async fn test_ivf_over_duplicate_embeddings_keeps_every_vector() {
        let store = MemoryStore::new();
        for id in ["saved-once", "saved-twice"] {
            store.insert(ContentItem::new(id, "u1", Platform::YouTube, "same video"));
            store.set_embedding(&ItemId::new(id), axis(0));
        }
        let index = EmbeddingIndex::new(Arc::new(store), options(IndexKind::Ivf));

        let stats = index.try_initialize().await.unwrap();
        assert_eq!(stats.vectors, 2);
        assert!(stats.trained);

        let hits = index.search(&axis(0), 10).unwrap();
        let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"saved-once") && ids.contains(&"saved-twice"));

        let stats = index.remove(&ItemId::new("saved-once")).await;
        assert_eq!(stats.vectors, 1);
        assert_eq!(index.search(&axis(0), 10).unwrap()[0].0, ItemId::new("saved-twice"));
    }

    #[tokio::test]
    async fn test_add_then_search_finds_self() {
        for kind in [IndexKind::Flat, IndexKind::Ivf] {
            let index = EmbeddingIndex::new(Arc::new(MemoryStore::new()), options(kind));
            index.initialize().await;

            let v = unit(3);
            index.add(ItemId::new("fresh"), &v).await.unwrap();

            let hits = index.search(&v, 1).unwrap();
            assert_eq!(hits[0].0, ItemId::new("fresh"), "kind {kind}");
            assert!((hits[0].1 - 1.0).abs() < 0.02, "kind {kind}");
        }
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates_and_bad_dimensions() {
        let index = EmbeddingIndex::new(Arc::new(seeded_store(2)), options(IndexKind::Flat));
        index.initialize().await;

        let err = index.add(ItemId::new("item-0"), &unit(0)).await.unwrap_err();
        assert!(matches!(err, VectorError::DuplicateId(_)));

        let err = index.add(ItemId::new("other"), &[1.0, 2.0]).await.unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { .. }));
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_matches_initialize_without_item() {
        for kind in [IndexKind::Flat, IndexKind::Ivf] {
            let store = seeded_store(5);
            let removed = ItemId::new("item-3");

            // Store still holds the embedding; remove must exclude it anyway
            let index = EmbeddingIndex::new(Arc::new(store.clone()), options(kind));
            index.initialize().await;
            index.remove(&removed).await;
            assert!(!index.contains(&removed));

            let reference_store = MemoryStore::new();
            for i in 0..5 {
                let id = ItemId::new(format!("item-{i}"));
                if id == removed {
                    continue;
                }
                reference_store.insert(store.get(&id).unwrap());
                reference_store.set_embedding(&id, store.embedding(&id).unwrap());
            }
            let reference = EmbeddingIndex::new(Arc::new(reference_store), options(kind));
            reference.initialize().await;

            for j in 0..DIM {
                let got = index.search(&axis(j), 10).unwrap();
                assert!(got.iter().all(|(id, _)| *id != removed));
                assert_eq!(got, reference.search(&axis(j), 10).unwrap(), "kind {kind}");
            }
        }
    }

    #[tokio::test]
    async fn test_wrong_query_dimension_is_an_error() {
        let index = EmbeddingIndex::new(Arc::new(seeded_store(2)), options(IndexKind::Flat));
        index.initialize().await;
        assert!(index.search(&[1.0], 5).is_err());
    }

    #[tokio::test]
    async fn test_records_with_wrong_dimension_are_skipped() {
        let store = seeded_store(2);
        store.insert(ContentItem::new("short", "u1", Platform::YouTube, "bad"));
        store.set_embedding(&ItemId::new("short"), vec![1.0, 0.0]);

        let index = EmbeddingIndex::new(Arc::new(store), options(IndexKind::Flat));
        let stats = index.initialize().await;
        assert_eq!(stats.vectors, 2);
        assert!(!index.contains(&ItemId::new("short")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_searches_during_rebuilds() {
        let index = Arc::new(EmbeddingIndex::new(
            Arc::new(seeded_store(16)),
            options(IndexKind::Flat),
        ));
        index.initialize().await;

        let mut handles = Vec::new();
        for t in 0..8 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let hits = index.search(&axis(t % DIM), 4).unwrap();
                    // Every generation holds the same 16 items
                    assert_eq!(hits.len(), 4);
                }
            }));
        }
        for _ in 0..5 {
            index.initialize().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(index.len(), 16);
    }
}
