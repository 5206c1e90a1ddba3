//! Indexer selected by the `[memory]` configuration section.

use custos_domain::traits::{IndexMetadata, Indexer};
use custos_memory::{IndexError, MemoryIndex};

use crate::config::MemoryConfig;

/// Semantic memory for the lifetime of one CLI process
///
/// The memory index lives in process memory, so entries written by
/// `run-once` last only for that invocation; `work` keeps them for the
/// whole loop.
pub enum SessionIndexer {
    /// In-process HNSW memory
    Memory(MemoryIndex),

    /// Memory disabled; every document is accepted and dropped
    Disabled,
}

impl SessionIndexer {
    /// Build from configuration
    pub fn from_config(config: &MemoryConfig) -> Self {
        if config.enabled {
            SessionIndexer::Memory(MemoryIndex::new(config.dimension))
        } else {
            SessionIndexer::Disabled
        }
    }

    /// Number of documents indexed so far
    pub fn len(&self) -> usize {
        match self {
            SessionIndexer::Memory(memory) => memory.len(),
            SessionIndexer::Disabled => 0,
        }
    }

    /// Check if nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Indexer for SessionIndexer {
    type Error = IndexError;

    fn index(&self, document: &str, metadata: &IndexMetadata, id: &str) -> Result<(), Self::Error> {
        match self {
            SessionIndexer::Memory(memory) => memory.index(document, metadata, id),
            SessionIndexer::Disabled => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custos_domain::{CaptureKind, MeetingId, SourceId};

    fn metadata(source_id: &SourceId) -> IndexMetadata {
        IndexMetadata {
            source_id: source_id.clone(),
            meeting_id: MeetingId::from("m_1"),
            meeting_title: "Weekly sync".to_string(),
            captured_at: 1_000,
            capture_kind: CaptureKind::Reflection,
            excerpt: "Felt rushed".to_string(),
        }
    }

    #[test]
    fn test_enabled_memory_indexes() {
        let indexer = SessionIndexer::from_config(&MemoryConfig::default());
        let id = SourceId::new();
        indexer.index("Felt rushed", &metadata(&id), id.as_str()).unwrap();
        assert_eq!(indexer.len(), 1);
    }

    #[test]
    fn test_disabled_memory_drops_documents() {
        let indexer = SessionIndexer::from_config(&MemoryConfig {
            enabled: false,
            ..MemoryConfig::default()
        });
        let id = SourceId::new();
        indexer.index("", &metadata(&id), id.as_str()).unwrap();
        assert!(indexer.is_empty());
    }
}
