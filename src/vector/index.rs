//! Similarity structures behind the embedding index.
//!
//! A [`VectorIndex`] stores vectors in dense slots and answers top-k inner
//! product queries by slot. Mapping slots back to item identifiers is the
//! job of [`EmbeddingIndex`](crate::vector::EmbeddingIndex). Neither
//! structure supports point deletion.

use crate::vector::{FlatIndex, IvfIndex, IvfParams, Similarity, VectorDimension, VectorError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which similarity structure to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact scan over every stored vector.
    #[default]
    Flat,
    /// Inverted lists over k-means clusters with 8-bit quantized vectors.
    Ivf,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => f.write_str("flat"),
            IndexKind::Ivf => f.write_str("ivf"),
        }
    }
}

/// Slot-addressed nearest-neighbour structure.
pub trait VectorIndex: Send + Sync + fmt::Debug {
    fn kind(&self) -> IndexKind;

    fn dimension(&self) -> VectorDimension;

    /// Whether `add` and `search` are usable.
    fn is_trained(&self) -> bool;

    /// Learns the structure's parameters from a representative sample.
    ///
    /// Must be called on an empty index. Structures without parameters
    /// accept any sample.
    fn train(&mut self, sample: &[&[f32]]) -> Result<(), VectorError>;

    /// Appends a vector and returns its slot.
    fn add(&mut self, vector: &[f32]) -> Result<usize, VectorError>;

    /// Up to `k` `(slot, similarity)` pairs, highest similarity first.
    ///
    /// An untrained or empty structure returns an empty list.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, Similarity)>, VectorError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates an empty structure of the requested kind.
pub fn build_index(
    kind: IndexKind,
    dimension: VectorDimension,
    ivf: &IvfParams,
) -> Box<dyn VectorIndex> {
    match kind {
        IndexKind::Flat => Box::new(FlatIndex::new(dimension)),
        IndexKind::Ivf => Box::new(IvfIndex::new(dimension, ivf.clone())),
    }
}

/// Sorts `(slot, similarity)` hits best-first and keeps the top `k`.
///
/// Equal similarities keep slot order so results are reproducible.
pub(crate) fn top_k(mut hits: Vec<(usize, Similarity)>, k: usize) -> Vec<(usize, Similarity)> {
    hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    hits.truncate(k);
    hits
}
