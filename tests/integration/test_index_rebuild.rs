//! Index lifecycle seen through the public API: add, remove, rebuild under load.

use crate::common::{DIM, WordHashGenerator, item};
use clipmark::storage::ContentStore;
use clipmark::vector::VectorDimension;
use clipmark::{
    EmbeddingGenerator, EmbeddingIndex, IndexKind, IndexOptions, ItemId, MemoryStore, Platform,
    RankingWeights, RelevanceRanker, SearchRequest, Settings,
};
use std::sync::Arc;

const TITLES: [&str; 8] = [
    "Sourdough shaping basics",
    "Latte art heart",
    "Three days in Lisbon",
    "Beginner kayak rolls",
    "Fingerstyle guitar warmup",
    "Tonkotsu ramen at home",
    "Knife sharpening on stones",
    "Cold brew in a jar",
];

fn options(kind: IndexKind) -> IndexOptions {
    IndexOptions {
        kind,
        dimension: VectorDimension::new(DIM).unwrap(),
        ..IndexOptions::default()
    }
}

fn populated_store(generator: &WordHashGenerator) -> MemoryStore {
    let store = MemoryStore::new();
    for (i, title) in TITLES.iter().enumerate() {
        store.insert(item(&format!("v{i}"), "alice", Platform::YouTube, title));
    }
    store.fill_missing_embeddings(generator, 4).unwrap();
    store
}

#[tokio::test]
async fn test_added_item_is_its_own_nearest_neighbour() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let generator = WordHashGenerator::new();
        let store = Arc::new(populated_store(&generator));
        let index = EmbeddingIndex::new(store.clone(), options(kind));
        index.initialize().await;

        let fresh = item("v-new", "alice", Platform::TikTok, "Pour over coffee ratio");
        let vector = generator.embed(&fresh.title);
        store.insert(fresh);
        store.set_embedding(&ItemId::new("v-new"), vector.clone());
        index.add(ItemId::new("v-new"), &vector).await.unwrap();

        let hits = index.search(&vector, 1).unwrap();
        assert_eq!(hits[0].0.as_str(), "v-new", "kind {kind}");
        assert!((hits[0].1 - 1.0).abs() < 0.02, "kind {kind}");
        assert_eq!(index.len(), TITLES.len() + 1);
    }
}

#[tokio::test]
async fn test_remove_equals_rebuild_without_item() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let generator = WordHashGenerator::new();
        let store = Arc::new(populated_store(&generator));
        let removed = ItemId::new("v3");

        let index = EmbeddingIndex::new(store.clone(), options(kind));
        index.initialize().await;
        index.remove(&removed).await;

        // A store that really lost the item, indexed from scratch
        let trimmed = populated_store(&generator);
        trimmed.remove(&removed);
        let reference = EmbeddingIndex::new(Arc::new(trimmed), options(kind));
        reference.initialize().await;

        assert_eq!(index.len(), TITLES.len() - 1);
        for title in TITLES {
            let query = generator.embed(title);
            let got = index.search(&query, 10).unwrap();
            assert!(got.iter().all(|(id, _)| *id != removed), "kind {kind}");
            assert_eq!(got, reference.search(&query, 10).unwrap(), "kind {kind}");
        }
    }
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let generator = WordHashGenerator::new();
    let store = Arc::new(populated_store(&generator));
    let index = EmbeddingIndex::new(store.clone(), options(IndexKind::Ivf));

    let first = index.initialize().await;
    let query = generator.embed("coffee");
    let before = index.search(&query, 5).unwrap();

    let second = index.initialize().await;
    assert_eq!(first.vectors, second.vectors);
    assert_eq!(index.search(&query, 5).unwrap(), before);
    assert_eq!(store.get_embeddings().await.unwrap().len(), TITLES.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_searches_run_during_rebuilds() {
    let generator = Arc::new(WordHashGenerator::new());
    let store = Arc::new(populated_store(&generator));
    let index = Arc::new(EmbeddingIndex::new(store.clone(), options(IndexKind::Flat)));
    index.initialize().await;

    let ranker = Arc::new(RelevanceRanker::new(
        index.clone(),
        store,
        generator as Arc<dyn EmbeddingGenerator>,
        RankingWeights::default(),
    ));
    let request = SearchRequest::new("alice", "ramen");
    let baseline = ranker.search(&request).await;
    assert_eq!(baseline[0].id.as_str(), "v5");

    let mut readers = Vec::new();
    for _ in 0..4 {
        let ranker = ranker.clone();
        let request = request.clone();
        let baseline = baseline.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..25 {
                // Every generation holds the same data, so results never change
                assert_eq!(ranker.search(&request).await, baseline);
            }
        }));
    }

    for _ in 0..10 {
        index.initialize().await;
    }
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_index_built_from_settings() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        format!("[index]\nkind = \"ivf\"\ndimension = {DIM}\n\n[index.ivf]\nlists = 2\nprobes = 2\n"),
    )
    .unwrap();
    let settings = Settings::load_from(&config_path).unwrap();

    let generator = WordHashGenerator::new();
    let store = Arc::new(populated_store(&generator));
    let index = EmbeddingIndex::new(store, settings.index.options());
    let stats = index.try_initialize().await.unwrap();

    assert_eq!(stats.kind, IndexKind::Ivf);
    assert!(stats.trained);
    assert_eq!(stats.vectors, TITLES.len());
    assert_eq!(stats.dimension, DIM);
}
