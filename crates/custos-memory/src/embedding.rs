//! Text embeddings for the memory index
//!
//! Captures are embedded locally with a feature-hashing model: every
//! lowercase word is hashed into one signed bucket of the output vector, and
//! the result is normalized to unit length. Texts that share words land close
//! together under cosine distance, which is enough for recall over a
//! personal meeting history without shipping model files.
//!
//! # Examples
//!
//! ```rust
//! use custos_memory::embedding::{EmbeddingModel, HashEmbeddingModel};
//!
//! let model = HashEmbeddingModel::new(384);
//! let embedding = model.embed("Vendor contract is blocked").unwrap();
//! assert_eq!(embedding.len(), 384);
//! assert_eq!(embedding, model.embed("vendor CONTRACT is blocked").unwrap());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::IndexError;

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Deterministic bag-of-words embedding
pub struct HashEmbeddingModel {
    dimension: usize,
}

impl HashEmbeddingModel {
    /// Create a model producing vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Bucket and sign for one token
    fn feature(token: &str, dimension: usize) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let hash = hasher.finish();

        let bucket = (hash % dimension as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl EmbeddingModel for HashEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        if self.dimension == 0 {
            return Err(IndexError::InvalidInput(
                "Embedding dimension must be positive".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let (bucket, sign) = Self::feature(&token.to_lowercase(), self.dimension);
            embedding[bucket] += sign;
            tokens += 1;
        }

        if tokens == 0 {
            return Err(IndexError::InvalidInput(
                "Text has no words to embed".to_string(),
            ));
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors, 0.0 when lengths differ or either is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
