//! Episode storage: index catalog, store trait, in-memory backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

use super::episodes::EpisodicNode;

/// Default number of episodes returned by recent-episode retrieval.
pub const EPISODE_WINDOW_LEN: usize = 3;

/// Embedding width used by the vector indices.
pub const EMBEDDING_DIMENSIONS: u32 = 1024;

/// Episode store errors.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph backend error: {0}")]
    Backend(String),
}

/// What an index covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
    Node {
        label: String,
        properties: Vec<String>,
    },
    Edge {
        edge_type: String,
        properties: Vec<String>,
    },
}

/// Index flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    Range,
    Fulltext,
    Vector {
        dimensions: u32,
        similarity: String,
    },
}

/// One index definition over graph node or edge properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub kind: IndexKind,
    pub target: IndexTarget,
}

fn node_index(name: &str, kind: IndexKind, label: &str, properties: &[&str]) -> IndexSpec {
    IndexSpec {
        name: name.to_string(),
        kind,
        target: IndexTarget::Node {
            label: label.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        },
    }
}

fn edge_index(name: &str, kind: IndexKind, edge_type: &str, properties: &[&str]) -> IndexSpec {
    IndexSpec {
        name: name.to_string(),
        kind,
        target: IndexTarget::Edge {
            edge_type: edge_type.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        },
    }
}

fn vector_kind() -> IndexKind {
    IndexKind::Vector {
        dimensions: EMBEDDING_DIMENSIONS,
        similarity: "cosine".to_string(),
    }
}

/// The full index catalog for the knowledge-graph schema: range indices on
/// identity and temporal properties, full-text indices over names and
/// facts, and vector indices over embeddings.
pub fn index_catalog() -> Vec<IndexSpec> {
    vec![
        node_index("entity_uuid", IndexKind::Range, "Entity", &["uuid"]),
        node_index("episode_uuid", IndexKind::Range, "Episodic", &["uuid"]),
        edge_index("relation_uuid", IndexKind::Range, "RELATES_TO", &["uuid"]),
        edge_index("mention_uuid", IndexKind::Range, "MENTIONS", &["uuid"]),
        node_index("name_entity_index", IndexKind::Range, "Entity", &["name"]),
        node_index(
            "created_at_entity_index",
            IndexKind::Range,
            "Entity",
            &["created_at"],
        ),
        node_index(
            "created_at_episodic_index",
            IndexKind::Range,
            "Episodic",
            &["created_at"],
        ),
        node_index(
            "valid_at_episodic_index",
            IndexKind::Range,
            "Episodic",
            &["valid_at"],
        ),
        edge_index("name_edge_index", IndexKind::Range, "RELATES_TO", &["name"]),
        edge_index(
            "created_at_edge_index",
            IndexKind::Range,
            "RELATES_TO",
            &["created_at"],
        ),
        edge_index(
            "expired_at_edge_index",
            IndexKind::Range,
            "RELATES_TO",
            &["expired_at"],
        ),
        edge_index(
            "valid_at_edge_index",
            IndexKind::Range,
            "RELATES_TO",
            &["valid_at"],
        ),
        edge_index(
            "invalid_at_edge_index",
            IndexKind::Range,
            "RELATES_TO",
            &["invalid_at"],
        ),
        node_index(
            "name_and_summary",
            IndexKind::Fulltext,
            "Entity",
            &["name", "summary"],
        ),
        edge_index(
            "name_and_fact",
            IndexKind::Fulltext,
            "RELATES_TO",
            &["name", "fact"],
        ),
        edge_index(
            "fact_embedding",
            vector_kind(),
            "RELATES_TO",
            &["fact_embedding"],
        ),
        node_index("name_embedding", vector_kind(), "Entity", &["name_embedding"]),
    ]
}

/// Storage interface consumed by the extraction pipeline.
///
/// Backends are shared read-only across concurrent invocations; interior
/// mutability is the implementation's concern.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Create the index catalog. Idempotent: re-running yields identical
    /// schema state, with no duplicates and no error.
    async fn build_indices(&self) -> Result<(), GraphError>;

    /// Destructive wipe of all graph data. Index definitions survive.
    async fn clear_all(&self) -> Result<(), GraphError>;

    /// Insert one episodic node.
    async fn add_episode(&self, episode: EpisodicNode) -> Result<(), GraphError>;

    /// Up to `last_n` of the most recently created episodes whose
    /// valid-time is at or before `reference_time`, ordered
    /// oldest-to-newest.
    async fn retrieve_recent_episodes(
        &self,
        reference_time: DateTime<Utc>,
        last_n: usize,
    ) -> Result<Vec<EpisodicNode>, GraphError>;
}

#[derive(Default)]
struct GraphState {
    indices: BTreeMap<String, IndexSpec>,
    episodes: Vec<EpisodicNode>,
}

/// In-memory episode store.
///
/// The bundled reference backend; database-backed stores implement
/// [`EpisodeStore`] with the same observable behavior.
#[derive(Default)]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered indices.
    pub async fn index_count(&self) -> usize {
        self.state.read().await.indices.len()
    }

    /// Names of registered indices, sorted.
    pub async fn index_names(&self) -> Vec<String> {
        self.state.read().await.indices.keys().cloned().collect()
    }

    /// Number of stored episodes.
    pub async fn episode_count(&self) -> usize {
        self.state.read().await.episodes.len()
    }
}

#[async_trait]
impl EpisodeStore for MemoryGraph {
    async fn build_indices(&self) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        for spec in index_catalog() {
            // IF NOT EXISTS semantics: an existing definition wins.
            state.indices.entry(spec.name.clone()).or_insert(spec);
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), GraphError> {
        self.state.write().await.episodes.clear();
        Ok(())
    }

    async fn add_episode(&self, episode: EpisodicNode) -> Result<(), GraphError> {
        self.state.write().await.episodes.push(episode);
        Ok(())
    }

    async fn retrieve_recent_episodes(
        &self,
        reference_time: DateTime<Utc>,
        last_n: usize,
    ) -> Result<Vec<EpisodicNode>, GraphError> {
        let state = self.state.read().await;
        let mut recent: Vec<EpisodicNode> = state
            .episodes
            .iter()
            .filter(|e| e.valid_at <= reference_time)
            .cloned()
            .collect();
        // Most recently created first, then cut the window and restore
        // chronological order.
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(last_n);
        recent.reverse();
        Ok(recent)
    }
}
