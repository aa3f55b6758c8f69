//! Hybrid relevance search over a user's saved content.
//!
//! A query goes through four stages:
//! 1. embed the query text and normalize the vector,
//! 2. recall candidates from the [`EmbeddingIndex`],
//! 3. fetch the candidates' records, restricted to the requesting user and
//!    optional platform,
//! 4. score each record lexically plus by similarity and sort.
//!
//! Any failure along the way degrades to an empty result list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{SearchFailure, SearchResultOf};
use crate::ranking::{LexicalScorer, RankingWeights};
use crate::storage::ContentStore;
use crate::types::{ItemId, Platform, SearchResult, UserId};
use crate::vector::{EmbeddingGenerator, EmbeddingIndex, VectorError, normalize_vector};

/// A search as received from the API layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub user_id: UserId,
    pub query: String,
    /// Platform name as typed by the caller; validated on search.
    pub platform: Option<String>,
}

impl SearchRequest {
    pub fn new(user_id: impl Into<UserId>, query: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            query: query.into(),
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Lowercased query and parsed platform filter.
    fn validate(&self) -> SearchResultOf<(String, Option<Platform>)> {
        if self.query.is_empty() {
            return Err(SearchFailure::InvalidQuery {
                reason: "query is empty",
            });
        }

        let platform = match self.platform.as_deref() {
            None => None,
            Some(raw) => Some(
                raw.parse::<Platform>()
                    .map_err(|_| SearchFailure::UnknownPlatform(raw.to_string()))?,
            ),
        };

        Ok((self.query.to_lowercase(), platform))
    }
}

/// Combines embedding recall with lexical scoring.
///
/// All collaborators are shared handles, so one ranker can serve many
/// concurrent searches.
pub struct RelevanceRanker {
    index: Arc<EmbeddingIndex>,
    store: Arc<dyn ContentStore>,
    generator: Arc<dyn EmbeddingGenerator>,
    scorer: LexicalScorer,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for RelevanceRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceRanker")
            .field("index", &self.index)
            .field("weights", self.scorer.weights())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl RelevanceRanker {
    pub fn new(
        index: Arc<EmbeddingIndex>,
        store: Arc<dyn ContentStore>,
        generator: Arc<dyn EmbeddingGenerator>,
        weights: RankingWeights,
    ) -> Self {
        Self {
            index,
            store,
            generator,
            scorer: LexicalScorer::new(weights),
            deadline: None,
        }
    }

    /// Bounds every [`search`](Self::search) call by `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    /// Ranked results for `request`, best first.
    ///
    /// Never fails: invalid requests and collaborator failures are logged
    /// and yield an empty list.
    pub async fn search(&self, request: &SearchRequest) -> Vec<SearchResult> {
        match self.deadline {
            Some(deadline) => self.search_with_deadline(request, deadline).await,
            None => Self::flatten(request, self.try_search(request).await),
        }
    }

    /// Like [`search`](Self::search) but gives up after `deadline`.
    pub async fn search_with_deadline(
        &self,
        request: &SearchRequest,
        deadline: Duration,
    ) -> Vec<SearchResult> {
        let outcome = tokio::time::timeout(deadline, self.try_search(request))
            .await
            .unwrap_or(Err(SearchFailure::DeadlineExceeded(deadline)));
        Self::flatten(request, outcome)
    }

    /// Runs the search, reporting why it produced nothing.
    pub async fn try_search(&self, request: &SearchRequest) -> SearchResultOf<Vec<SearchResult>> {
        let (query_lower, platform) = request.validate()?;

        let query_vector = self.embed_query(&request.query)?;

        let candidates = self
            .index
            .search_default(&query_vector)
            .map_err(SearchFailure::Index)?;
        tracing::debug!(
            user = %request.user_id,
            candidates = candidates.len(),
            "recalled candidates"
        );
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ItemId> = candidates.iter().map(|(id, _)| id.clone()).collect();
        let similarity: HashMap<ItemId, f32> = candidates.into_iter().collect();

        let items = self
            .store
            .get_content_items(&ids, &request.user_id, platform)
            .await?;

        let mut seen = HashSet::new();
        let mut scored: Vec<SearchResult> = items
            .into_iter()
            .filter(|item| item.user_id == request.user_id)
            .filter(|item| seen.insert(item.id.clone()))
            .filter_map(|item| {
                let sim = *similarity.get(&item.id)?;
                let (score, signals) = self.scorer.score(&query_lower, &item, sim);
                tracing::trace!(id = %item.id, score, %signals, "scored candidate");
                Some(SearchResult::from_item(&item, score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| a.id.cmp(&b.id))
        });

        tracing::debug!(user = %request.user_id, results = scored.len(), "search complete");
        Ok(scored)
    }

    fn embed_query(&self, query: &str) -> SearchResultOf<Vec<f32>> {
        let mut vector = self
            .generator
            .generate_embeddings(&[query])
            .map_err(SearchFailure::Embedding)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                SearchFailure::Embedding(VectorError::EmbeddingFailed(
                    "generator returned no vector for the query".to_string(),
                ))
            })?;
        normalize_vector(&mut vector);
        Ok(vector)
    }

    fn flatten(
        request: &SearchRequest,
        outcome: SearchResultOf<Vec<SearchResult>>,
    ) -> Vec<SearchResult> {
        outcome.unwrap_or_else(|e| {
            tracing::warn!(
                user = %request.user_id,
                status = e.status_code(),
                error = %e,
                "search degraded to empty result"
            );
            Vec::new()
        })
    }
}
