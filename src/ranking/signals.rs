//! Which lexical tiers a record matched.

use std::fmt;

/// Lexical match tiers, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    /// Query found in the title or search summary.
    Perfect,
    /// Query found in a keyword.
    Strong,
    /// Query found in the visual-content summary.
    Partial,
    /// Query found in the audio transcript.
    Weak,
    /// Query found in a metadata value.
    LastResort,
}

impl MatchTier {
    pub const ALL: [MatchTier; 5] = [
        MatchTier::Perfect,
        MatchTier::Strong,
        MatchTier::Partial,
        MatchTier::Weak,
        MatchTier::LastResort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Perfect => "perfect",
            MatchTier::Strong => "strong",
            MatchTier::Partial => "partial",
            MatchTier::Weak => "weak",
            MatchTier::LastResort => "last_resort",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Per-record breakdown of a relevance score.
///
/// Kept for tracing and tests; callers of the search interface only see
/// the final score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RankingSignals {
    tiers: u8,
    /// Raw similarity reported by the index.
    pub similarity: f32,
    /// Lexical contribution before capping.
    pub lexical: f32,
    /// Similarity contribution before capping.
    pub semantic: f32,
}

impl RankingSignals {
    pub fn mark(&mut self, tier: MatchTier) {
        self.tiers |= tier.bit();
    }

    pub fn matched(&self, tier: MatchTier) -> bool {
        self.tiers & tier.bit() != 0
    }

    pub fn tiers(&self) -> impl Iterator<Item = MatchTier> + '_ {
        MatchTier::ALL.into_iter().filter(|t| self.matched(*t))
    }

    pub fn has_lexical_match(&self) -> bool {
        self.tiers != 0
    }
}

impl fmt::Display for RankingSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tiers: Vec<&str> = self.tiers().map(|t| t.as_str()).collect();
        write!(
            f,
            "[{}] lexical={:.1} semantic={:.2} (similarity {:.3})",
            tiers.join(","),
            self.lexical,
            self.semantic,
            self.similarity
        )
    }
}
