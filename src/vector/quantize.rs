//! 8-bit scalar quantization for vectors stored in the clustered index.
//!
//! Each vector is stored as `i8` codes plus one `f32` scale, so a 384-dim
//! embedding takes 388 bytes instead of 1536. Inner products against an
//! `f32` query are computed directly on the codes.

/// Largest magnitude representable by a code.
const CODE_MAX: f32 = 127.0;

/// A vector compressed with symmetric per-vector scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedVector {
    codes: Vec<i8>,
    scale: f32,
}

impl QuantizedVector {
    /// Quantizes `vector` so that its largest component maps to ±127.
    pub fn encode(vector: &[f32]) -> Self {
        let max_abs = vector.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        if max_abs == 0.0 || !max_abs.is_finite() {
            return Self {
                codes: vec![0; vector.len()],
                scale: 0.0,
            };
        }

        let scale = max_abs / CODE_MAX;
        let codes = vector
            .iter()
            .map(|v| (v / scale).round().clamp(-CODE_MAX, CODE_MAX) as i8)
            .collect();

        Self { codes, scale }
    }

    /// Reconstructs an approximation of the original vector.
    pub fn decode(&self) -> Vec<f32> {
        self.codes
            .iter()
            .map(|&c| f32::from(c) * self.scale)
            .collect()
    }

    /// Approximate inner product with an unquantized query.
    #[inline]
    pub fn inner_product(&self, query: &[f32]) -> f32 {
        debug_assert_eq!(query.len(), self.codes.len());
        let raw: f32 = self
            .codes
            .iter()
            .zip(query.iter())
            .map(|(&c, &q)| f32::from(c) * q)
            .sum();
        raw * self.scale
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
