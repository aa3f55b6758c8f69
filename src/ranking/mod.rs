//! Relevance ranking: lexical tiers blended with embedding similarity.

mod ranker;
mod scorer;
mod signals;

pub use ranker::{RelevanceRanker, SearchRequest};
pub use scorer::{LexicalScorer, RankingWeights};
pub use signals::{MatchTier, RankingSignals};
