//! Additive relevance scoring.
//!
//! Each lexical tier contributes its weight at most once when the lowercased
//! query occurs as a substring of the tier's fields. Similarity adds
//! `similarity * weights.similarity` on top, unclamped, and the sum is capped
//! at `weights.max_score`.

use crate::ranking::{MatchTier, RankingSignals};
use crate::types::ContentItem;
use serde::{Deserialize, Serialize};

/// Points per tier and the overall cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    /// Title or search summary
    #[serde(default = "default_perfect")]
    pub perfect: f32,

    /// Any keyword
    #[serde(default = "default_strong")]
    pub strong: f32,

    /// Visual-content summary
    #[serde(default = "default_partial")]
    pub partial: f32,

    /// Audio transcript
    #[serde(default = "default_weak")]
    pub weak: f32,

    /// Any metadata value
    #[serde(default = "default_last_resort")]
    pub last_resort: f32,

    /// Multiplier applied to the raw similarity
    #[serde(default = "default_similarity")]
    pub similarity: f32,

    #[serde(default = "default_max_score")]
    pub max_score: f32,
}

fn default_perfect() -> f32 {
    50.0
}
fn default_strong() -> f32 {
    30.0
}
fn default_partial() -> f32 {
    20.0
}
fn default_weak() -> f32 {
    10.0
}
fn default_last_resort() -> f32 {
    5.0
}
fn default_similarity() -> f32 {
    20.0
}
fn default_max_score() -> f32 {
    100.0
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            perfect: default_perfect(),
            strong: default_strong(),
            partial: default_partial(),
            weak: default_weak(),
            last_resort: default_last_resort(),
            similarity: default_similarity(),
            max_score: default_max_score(),
        }
    }
}

impl RankingWeights {
    pub fn tier_weight(&self, tier: MatchTier) -> f32 {
        match tier {
            MatchTier::Perfect => self.perfect,
            MatchTier::Strong => self.strong,
            MatchTier::Partial => self.partial,
            MatchTier::Weak => self.weak,
            MatchTier::LastResort => self.last_resort,
        }
    }
}

/// Scores content items against a query.
#[derive(Debug, Clone, Default)]
pub struct LexicalScorer {
    weights: RankingWeights,
}

impl LexicalScorer {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Relevance of `item` for `query_lower`, with the tiers it matched.
    ///
    /// `query_lower` must already be lowercased.
    pub fn score(
        &self,
        query_lower: &str,
        item: &ContentItem,
        similarity: f32,
    ) -> (f32, RankingSignals) {
        let mut signals = RankingSignals::default();
        signals.similarity = similarity;

        let contains = |text: &str| text.to_lowercase().contains(query_lower);

        if contains(item.title.as_str()) || contains(item.search_summary.as_str()) {
            signals.mark(MatchTier::Perfect);
        }
        if item.keywords.iter().any(|k| contains(k.as_str())) {
            signals.mark(MatchTier::Strong);
        }
        if contains(item.visual_summary.as_str()) {
            signals.mark(MatchTier::Partial);
        }
        if contains(item.audio_transcript.as_str()) {
            signals.mark(MatchTier::Weak);
        }
        if item.metadata.values().any(|value| match value {
            serde_json::Value::String(s) => contains(s.as_str()),
            other => contains(other.to_string().as_str()),
        }) {
            signals.mark(MatchTier::LastResort);
        }

        signals.lexical = signals
            .tiers()
            .map(|tier| self.weights.tier_weight(tier))
            .sum();
        signals.semantic = self.weights.similarity * similarity;

        let score = (signals.lexical + signals.semantic).min(self.weights.max_score);
        (score, signals)
    }
}
