//! End-to-end search over a JSON corpus: load, embed, index, rank.

use crate::common::{DIM, TestCorpus, WordHashGenerator, sample_corpus_json};
use clipmark::vector::VectorDimension;
use clipmark::{
    EmbeddingIndex, IndexKind, IndexOptions, MemoryStore, Platform, RankingWeights,
    RelevanceRanker, SearchRequest, SearchResult,
};
use std::sync::Arc;

async fn build_ranker(store: MemoryStore, kind: IndexKind) -> RelevanceRanker {
    let generator = Arc::new(WordHashGenerator::new());
    store
        .fill_missing_embeddings(generator.as_ref(), 2)
        .expect("embedding should succeed");

    let options = IndexOptions {
        kind,
        dimension: VectorDimension::new(DIM).unwrap(),
        ..IndexOptions::default()
    };
    let store = Arc::new(store);
    let index = Arc::new(EmbeddingIndex::new(store.clone(), options));
    let stats = index.try_initialize().await.expect("index should build");
    assert_eq!(stats.vectors, 5);

    RelevanceRanker::new(index, store, generator, RankingWeights::default())
}

fn sample_store() -> (TestCorpus, MemoryStore) {
    let corpus = TestCorpus::new();
    let path = corpus.write("corpus.json", sample_corpus_json());
    let store = MemoryStore::from_corpus_file(&path).expect("corpus should load");
    (corpus, store)
}

fn ids(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn test_keyword_beats_transcript_and_other_users_are_hidden() {
    for kind in [IndexKind::Flat, IndexKind::Ivf] {
        let (_corpus, store) = sample_store();
        let ranker = build_ranker(store, kind).await;

        let results = ranker.search(&SearchRequest::new("alice", "bread")).await;

        // Recall covers the whole corpus; every alice item comes back
        assert_eq!(results.len(), 4, "kind {kind}");
        assert_eq!(&ids(&results)[..2], &["yt-sourdough", "fb-bread"], "kind {kind}");
        assert!(!ids(&results).contains(&"yt-bob-bread"));
        assert!(results[0].relevance_score >= 30.0);
    }
}

#[tokio::test]
async fn test_results_carry_display_fields() {
    let (_corpus, store) = sample_store();
    let ranker = build_ranker(store, IndexKind::Flat).await;

    let results = ranker
        .search(&SearchRequest::new("alice", "lisbon").with_platform("instagram"))
        .await;

    assert_eq!(ids(&results), vec!["ig-lisbon"]);
    let hit = &results[0];
    assert_eq!(hit.platform, Platform::Instagram);
    assert_eq!(hit.url, "https://www.instagram.com/reel/CxYz123abc/");
    assert_eq!(hit.title, "Three days in Lisbon");
    // Title (50) plus metadata location (5) plus some similarity
    assert!(hit.relevance_score > 55.0 && hit.relevance_score <= 100.0);
}

#[tokio::test]
async fn test_lower_tiers_surface_matches() {
    let (_corpus, store) = sample_store();
    let ranker = build_ranker(store, IndexKind::Flat).await;

    let visual = ranker.search(&SearchRequest::new("alice", "banneton")).await;
    assert_eq!(visual[0].id.as_str(), "yt-sourdough");
    assert!(visual[0].relevance_score >= 20.0);

    let metadata = ranker.search(&SearchRequest::new("alice", "Crumb Lab")).await;
    assert_eq!(metadata[0].id.as_str(), "yt-sourdough");
    assert!(metadata[0].relevance_score >= 5.0);
}

#[tokio::test]
async fn test_each_user_sees_only_their_items() {
    let (_corpus, store) = sample_store();
    let ranker = build_ranker(store, IndexKind::Flat).await;

    let bob = ranker.search(&SearchRequest::new("bob", "bread")).await;
    assert_eq!(ids(&bob), vec!["yt-bob-bread"]);
    // Title and keyword both match
    assert!(bob[0].relevance_score >= 80.0);

    let stranger = ranker.search(&SearchRequest::new("mallory", "bread")).await;
    assert!(stranger.is_empty());
}

#[tokio::test]
async fn test_invalid_requests_return_empty() {
    let (_corpus, store) = sample_store();
    let ranker = build_ranker(store, IndexKind::Flat).await;

    assert!(ranker.search(&SearchRequest::new("alice", "")).await.is_empty());
    assert!(
        ranker
            .search(&SearchRequest::new("alice", "bread").with_platform("vimeo"))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_filled_embeddings_survive_a_save() {
    let (corpus, store) = sample_store();
    assert_eq!(store.embedding_count(), 0);

    let generator = WordHashGenerator::new();
    assert_eq!(store.fill_missing_embeddings(&generator, 3).unwrap(), 5);

    let saved = corpus.path().join("embedded.json");
    store.save_corpus_file(&saved).unwrap();

    let reloaded = MemoryStore::from_corpus_file(&saved).unwrap();
    assert_eq!(reloaded.len(), 5);
    assert_eq!(reloaded.embedding_count(), 5);
    assert!(reloaded.items_without_embedding().is_empty());
}
