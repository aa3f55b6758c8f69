//! Embedding index for content items.
//!
//! Items are embedded into 384-dimensional unit vectors and stored in a
//! similarity structure that answers top-k inner-product queries. Two
//! structures are available: an exact flat scan, and an IVF index that
//! clusters vectors with k-means and stores them 8-bit quantized in
//! per-cluster inverted lists.
//!
//! [`EmbeddingIndex`] maps item identifiers onto those structures and
//! swaps whole generations on rebuild so readers are never blocked by one.

mod clustering;
mod embedding;
mod engine;
mod flat;
mod index;
mod ivf;
mod quantize;
mod types;

pub use clustering::{
    ClusteringError, KMeansResult, assign_to_nearest_centroid, cosine_similarity, inner_product,
    kmeans_clustering, normalize_vector, normalize_vector_copy,
};
#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, create_item_text, parse_embedding_model,
};
pub use engine::{EmbeddingIndex, IndexOptions, IndexStats, RebuildError};
pub use flat::FlatIndex;
pub use index::{IndexKind, VectorIndex, build_index};
pub use ivf::{IvfIndex, IvfParams};
pub use quantize::QuantizedVector;
pub use types::{
    ClusterId, DEFAULT_RECALL_WINDOW, Similarity, VECTOR_DIMENSION_384, VectorDimension,
    VectorError,
};
