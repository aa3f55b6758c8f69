//! Invariants that hold for every search over a generated multi-user corpus.

use crate::common::{DIM, WordHashGenerator, item};
use clipmark::vector::VectorDimension;
use clipmark::{
    EmbeddingIndex, IndexOptions, MemoryStore, Platform, RankingWeights, RelevanceRanker,
    SearchRequest,
};
use std::sync::Arc;

const USERS: [&str; 3] = ["ana", "ben", "chloe"];
const TOPICS: [&str; 6] = ["bread", "coffee", "lisbon", "kayak", "guitar", "ramen"];
const PLATFORMS: [Platform; 4] = [
    Platform::YouTube,
    Platform::Instagram,
    Platform::TikTok,
    Platform::Facebook,
];

fn generated_store() -> MemoryStore {
    let store = MemoryStore::new();
    let mut n = 0;
    for user in USERS {
        for (t, topic) in TOPICS.iter().enumerate() {
            for variant in 0..3 {
                let platform = PLATFORMS[(t + variant) % PLATFORMS.len()];
                let id = format!("{user}-{topic}-{variant}");
                let mut it = item(&id, user, platform, &format!("{topic} session {variant}"));
                let next = TOPICS[(t + 1) % TOPICS.len()];
                it.keywords.insert(next.to_string());
                if variant == 1 {
                    it.audio_transcript = format!("we talk about {topic} and {next}");
                }
                if variant == 2 {
                    it.metadata
                        .insert("series".to_string(), serde_json::json!(format!("{topic} weekly")));
                }
                store.insert(it);
                n += 1;
            }
        }
    }
    assert_eq!(store.len(), n);
    store
}

async fn ranker(recall_window: usize) -> RelevanceRanker {
    let store = generated_store();
    let generator = Arc::new(WordHashGenerator::new());
    store.fill_missing_embeddings(generator.as_ref(), 16).unwrap();

    let options = IndexOptions {
        dimension: VectorDimension::new(DIM).unwrap(),
        recall_window,
        ..IndexOptions::default()
    };
    let store = Arc::new(store);
    let index = Arc::new(EmbeddingIndex::new(store.clone(), options));
    index.initialize().await;

    RelevanceRanker::new(index, store, generator, RankingWeights::default())
}

#[tokio::test]
async fn test_scores_bounded_and_sorted() {
    let ranker = ranker(200).await;

    for user in USERS {
        for query in TOPICS.iter().chain(["session", "weekly", "zzz"].iter()) {
            let results = ranker.search(&SearchRequest::new(user, *query)).await;
            assert!(!results.is_empty(), "{user} / {query}");

            for r in &results {
                assert!(
                    (0.0..=100.0).contains(&r.relevance_score),
                    "{} scored {}",
                    r.id,
                    r.relevance_score
                );
            }
            for pair in results.windows(2) {
                assert!(pair[0].relevance_score >= pair[1].relevance_score);
                if pair[0].relevance_score == pair[1].relevance_score {
                    assert!(pair[0].id < pair[1].id, "ties must order by id");
                }
            }
        }
    }
}

#[tokio::test]
async fn test_tenant_isolation() {
    let ranker = ranker(200).await;

    for user in USERS {
        for query in TOPICS {
            let results = ranker.search(&SearchRequest::new(user, query)).await;
            let prefix = format!("{user}-");
            assert!(
                results.iter().all(|r| r.id.as_str().starts_with(&prefix)),
                "{user} saw another user's item for {query}"
            );
        }
    }
}

#[tokio::test]
async fn test_platform_filter_is_respected() {
    let ranker = ranker(200).await;

    for platform in ["youtube", "instagram", "tiktok", "facebook"] {
        let results = ranker
            .search(&SearchRequest::new("ben", "session").with_platform(platform))
            .await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.platform.as_str() == platform));
    }
}

#[tokio::test]
async fn test_repeated_search_is_identical() {
    let ranker = ranker(50).await;
    let request = SearchRequest::new("chloe", "coffee");

    let first = ranker.search(&request).await;
    for _ in 0..5 {
        assert_eq!(ranker.search(&request).await, first);
    }
}

#[tokio::test]
async fn test_recall_window_bounds_candidates() {
    let ranker = ranker(5).await;
    let results = ranker.search(&SearchRequest::new("ana", "session")).await;

    // At most five candidates are recalled across all users
    assert!(results.len() <= 5);
}
