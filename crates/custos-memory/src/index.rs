//! Indexer implementations

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Mutex;

use custos_domain::traits::{IndexMetadata, Indexer};
use tracing::debug;

use crate::embedding::{EmbeddingModel, HashEmbeddingModel};
use crate::vector_index::VectorIndex;
use crate::IndexError;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// One recalled capture
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryHit {
    /// Document id the capture was indexed under (its source id)
    pub id: String,

    /// Cosine similarity to the query
    pub score: f32,

    /// Envelope stored at indexing time
    pub metadata: IndexMetadata,
}

/// Semantic memory over indexed captures
///
/// Holds the embedding model, the HNSW index and the metadata envelope of
/// every indexed document.
pub struct MemoryIndex<M = HashEmbeddingModel> {
    model: M,
    vectors: VectorIndex,
    envelopes: Mutex<HashMap<String, IndexMetadata>>,
}

impl MemoryIndex<HashEmbeddingModel> {
    /// Create an index backed by the hashing model
    pub fn new(dimension: usize) -> Self {
        Self::with_model(HashEmbeddingModel::new(dimension))
    }
}

impl Default for MemoryIndex<HashEmbeddingModel> {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl<M: EmbeddingModel> MemoryIndex<M> {
    /// Create an index backed by a custom embedding model
    pub fn with_model(model: M) -> Self {
        let vectors = VectorIndex::new(model.dimension());
        Self {
            model,
            vectors,
            envelopes: Mutex::new(HashMap::new()),
        }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Nearest indexed captures to `text`, most similar first
    pub fn query(&self, text: &str, limit: usize) -> Result<Vec<MemoryHit>, IndexError> {
        let embedding = self.model.embed(text)?;
        let neighbours = self.vectors.search(&embedding, limit)?;

        let envelopes = self
            .envelopes
            .lock()
            .map_err(|e| IndexError::Internal(format!("Envelope lock poisoned: {}", e)))?;

        Ok(neighbours
            .into_iter()
            .filter_map(|(id, score)| {
                envelopes.get(&id).map(|metadata| MemoryHit {
                    id,
                    score,
                    metadata: metadata.clone(),
                })
            })
            .collect())
    }
}

impl<M: EmbeddingModel> Indexer for MemoryIndex<M> {
    type Error = IndexError;

    fn index(&self, document: &str, metadata: &IndexMetadata, id: &str) -> Result<(), Self::Error> {
        let embedding = self.model.embed(document)?;
        self.vectors.add(id, &embedding)?;

        self.envelopes
            .lock()
            .map_err(|e| IndexError::Internal(format!("Envelope lock poisoned: {}", e)))?
            .insert(id.to_string(), metadata.clone());

        debug!(id, meeting_id = %metadata.meeting_id, "Indexed capture");
        Ok(())
    }
}

/// Indexer used when semantic memory is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndexer;

impl Indexer for NoopIndexer {
    type Error = Infallible;

    fn index(&self, _document: &str, _metadata: &IndexMetadata, _id: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}
