//! Exact inner-product index.
//!
//! Vectors live in one contiguous buffer; a query scans all of them. Correct
//! at any size and fast enough for the low thousands of items a single user
//! accumulates.

use crate::vector::clustering::inner_product;
use crate::vector::index::{IndexKind, VectorIndex, top_k};
use crate::vector::{Similarity, VectorDimension, VectorError};

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn row(&self, slot: usize) -> &[f32] {
        let dim = self.dimension.get();
        &self.data[slot * dim..(slot + 1) * dim]
    }
}

impl VectorIndex for FlatIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn train(&mut self, sample: &[&[f32]]) -> Result<(), VectorError> {
        for vector in sample {
            self.dimension.validate_vector(vector)?;
        }
        Ok(())
    }

    fn add(&mut self, vector: &[f32]) -> Result<usize, VectorError> {
        self.dimension.validate_vector(vector)?;
        let slot = self.len();
        self.data.extend_from_slice(vector);
        Ok(slot)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, Similarity)>, VectorError> {
        self.dimension.validate_vector(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let hits = (0..self.len())
            .map(|slot| (slot, inner_product(query, self.row(slot))))
            .collect();

        Ok(top_k(hits, k))
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }
}
