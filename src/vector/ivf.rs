//! Clustered, quantized approximate index.
//!
//! Training runs k-means over a sample and keeps the centroids. Each added
//! vector is quantized to 8 bits and appended to the inverted list of its
//! nearest centroid. A query scans only the lists of its `probes` nearest
//! centroids, trading a little recall for sub-linear cost.

use crate::vector::clustering::{assign_to_nearest_centroid, cosine_similarity, kmeans_clustering};
use crate::vector::index::{IndexKind, VectorIndex, top_k};
use crate::vector::quantize::QuantizedVector;
use crate::vector::{Similarity, VectorDimension, VectorError};
use serde::{Deserialize, Serialize};

/// Minimum number of inverted lists.
const MIN_LISTS: usize = 1;

/// Maximum number of inverted lists chosen automatically.
const MAX_AUTO_LISTS: usize = 100;

/// Tuning knobs for [`IvfIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfParams {
    /// Number of inverted lists; 0 picks `ceil(sqrt(n))` of the sample.
    #[serde(default)]
    pub lists: usize,

    /// Lists scanned per query.
    #[serde(default = "default_probes")]
    pub probes: usize,

    /// Upper bound on vectors used for training.
    #[serde(default = "default_train_sample")]
    pub train_sample: usize,

    /// Seed for centroid initialization.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_probes() -> usize {
    4
}
fn default_train_sample() -> usize {
    10_000
}
fn default_seed() -> u64 {
    42
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            lists: 0,
            probes: default_probes(),
            train_sample: default_train_sample(),
            seed: default_seed(),
        }
    }
}

impl IvfParams {
    /// Number of lists to train for a sample of `sample_len` vectors.
    pub fn list_count(&self, sample_len: usize) -> usize {
        let wanted = if self.lists == 0 {
            ((sample_len as f32).sqrt().ceil() as usize).clamp(MIN_LISTS, MAX_AUTO_LISTS)
        } else {
            self.lists
        };
        wanted.min(sample_len).max(MIN_LISTS)
    }
}

#[derive(Debug, Clone)]
pub struct IvfIndex {
    dimension: VectorDimension,
    params: IvfParams,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<(usize, QuantizedVector)>>,
    count: usize,
}

impl IvfIndex {
    pub fn new(dimension: VectorDimension, params: IvfParams) -> Self {
        Self {
            dimension,
            params,
            centroids: Vec::new(),
            lists: Vec::new(),
            count: 0,
        }
    }

    /// Number of inverted lists; zero before training.
    pub fn list_count(&self) -> usize {
        self.centroids.len()
    }

    fn centroid_refs(&self) -> Vec<&[f32]> {
        self.centroids.iter().map(|c| c.as_slice()).collect()
    }

    /// Indices of the `probes` centroids closest to `query`.
    fn probe_lists(&self, query: &[f32]) -> Vec<usize> {
        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, cosine_similarity(query, c)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(self.params.probes.max(1))
            .map(|(i, _)| i)
            .collect()
    }
}

impl VectorIndex for IvfIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Ivf
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    fn train(&mut self, sample: &[&[f32]]) -> Result<(), VectorError> {
        if self.count > 0 {
            return Err(VectorError::ClusteringFailed(
                "cannot retrain an index that already holds vectors".to_string(),
            ));
        }
        for vector in sample {
            self.dimension.validate_vector(vector)?;
        }

        let sample = &sample[..sample.len().min(self.params.train_sample.max(1))];
        let k = self.params.list_count(sample.len());
        let result = kmeans_clustering(sample, k, self.params.seed)
            .map_err(|e| VectorError::ClusteringFailed(e.to_string()))?;

        tracing::debug!(
            lists = result.centroids.len(),
            sample = sample.len(),
            iterations = result.iterations,
            "trained clustered index"
        );

        self.lists = vec![Vec::new(); result.centroids.len()];
        self.centroids = result.centroids;
        Ok(())
    }

    fn add(&mut self, vector: &[f32]) -> Result<usize, VectorError> {
        self.dimension.validate_vector(vector)?;
        if !self.is_trained() {
            return Err(VectorError::NotTrained);
        }

        let cluster = assign_to_nearest_centroid(vector, &self.centroid_refs());
        let slot = self.count;
        self.lists[cluster.index()].push((slot, QuantizedVector::encode(vector)));
        self.count += 1;
        Ok(slot)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, Similarity)>, VectorError> {
        self.dimension.validate_vector(query)?;
        if k == 0 || !self.is_trained() || self.count == 0 {
            return Ok(Vec::new());
        }

        let hits = self
            .probe_lists(query)
            .into_iter()
            .flat_map(|list| self.lists[list].iter())
            .map(|(slot, code)| (*slot, code.inner_product(query)))
            .collect();

        Ok(top_k(hits, k))
    }

    fn len(&self) -> usize {
        self.count
    }
}
