//! Custos Memory
//!
//! Best-effort semantic index for captures.
//!
//! # Architecture
//!
//! - Local hashing embeddings (no model files, no network)
//! - In-memory HNSW index for nearest-neighbour recall
//! - Metadata envelopes kept beside the vectors so hits can be shown without
//!   a store round-trip
//!
//! The worker treats every error from this crate as non-fatal.
//!
//! # Examples
//!
//! ```rust
//! use custos_domain::traits::{IndexMetadata, Indexer};
//! use custos_domain::{CaptureKind, MeetingId, SourceId};
//! use custos_memory::MemoryIndex;
//!
//! let memory = MemoryIndex::new(384);
//! let source_id = SourceId::new();
//! let metadata = IndexMetadata {
//!     source_id: source_id.clone(),
//!     meeting_id: MeetingId::from("m_1"),
//!     meeting_title: "Weekly sync".to_string(),
//!     captured_at: 1_000,
//!     capture_kind: CaptureKind::Reflection,
//!     excerpt: "Felt rushed on the roadmap".to_string(),
//! };
//! memory.index("Felt rushed on the roadmap", &metadata, source_id.as_str()).unwrap();
//!
//! let hits = memory.query("roadmap", 3).unwrap();
//! assert_eq!(hits[0].metadata.source_id, source_id);
//! ```

#![warn(missing_docs)]

pub mod embedding;
mod error;
mod index;
pub mod vector_index;

pub use error::IndexError;
pub use index::{MemoryHit, MemoryIndex, NoopIndexer, DEFAULT_DIMENSION};
