//! HNSW vector index
//!
//! In-memory nearest-neighbour search over capture embeddings.
//!
//! # HNSW Parameters
//!
//! - **M**: bi-directional links per node (16)
//! - **efConstruction**: candidate list size while building (200)
//! - **efSearch**: candidate list size while querying (at least 64)
//!
//! HNSW has no removal, so re-adding a document id inserts a new point and
//! retires the old one; retired points are skipped at search time.

use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::IndexError;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_EF_SEARCH: usize = 64;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

struct IndexState {
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Internal point id → document id
    points: HashMap<usize, String>,
    /// Document id → live internal point id
    live: HashMap<String, usize>,
    next_point: usize,
}

/// A thread-safe HNSW index keyed by document id
pub struct VectorIndex {
    dimension: usize,
    state: Mutex<IndexState>,
}

fn build_hnsw() -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        DEFAULT_MAX_ELEMENTS,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Mutex::new(IndexState {
                hnsw: build_hnsw(),
                points: HashMap::new(),
                live: HashMap::new(),
                next_point: 0,
            }),
        }
    }

    /// Vector dimension accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, IndexState>, IndexError> {
        self.state
            .lock()
            .map_err(|e| IndexError::Internal(format!("Vector index lock poisoned: {}", e)))
    }

    /// Add or replace the vector for a document
    pub fn add(&self, id: &str, embedding: &[f32]) -> Result<(), IndexError> {
        self.check_dimension(embedding)?;

        let mut state = self.lock()?;
        let point = state.next_point;
        state.next_point += 1;

        if let Some(retired) = state.live.insert(id.to_string(), point) {
            state.points.remove(&retired);
        }
        state.points.insert(point, id.to_string());

        let embedding_vec = embedding.to_vec();
        state.hnsw.insert((&embedding_vec, point));

        Ok(())
    }

    /// The `k` nearest live documents as `(id, similarity)`, most similar first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>, IndexError> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let state = self.lock()?;
        if state.live.is_empty() {
            return Ok(Vec::new());
        }

        // Ask for extra neighbours so retired points do not crowd out live ones
        let wanted = (k + state.next_point - state.live.len()).min(state.next_point);
        let ef_search = DEFAULT_EF_SEARCH.max(wanted);

        let mut results: Vec<(String, f32)> = state
            .hnsw
            .search(query, wanted, ef_search)
            .into_iter()
            .filter_map(|neighbour| {
                state
                    .points
                    .get(&neighbour.d_id)
                    .map(|id| (id.clone(), 1.0 - neighbour.distance))
            })
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }

    /// Number of live documents
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.live.len()).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
