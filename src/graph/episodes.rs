//! Episodic node types for the knowledge graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provenance of an episode's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSource {
    /// A conversational message exchange.
    Message,
    /// Free-form text.
    Text,
    /// Structured JSON content.
    Json,
}

/// A timestamped unit of ingested content.
///
/// `created_at` records ingestion time; `valid_at` records when the
/// content became true in the domain, which may lie in the past.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicNode {
    pub uuid: Uuid,
    pub name: String,
    pub content: String,
    pub source: EpisodeSource,
    pub source_description: String,
    pub created_at: DateTime<Utc>,
    pub valid_at: DateTime<Utc>,
}

impl EpisodicNode {
    /// Create an episode ingested now.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        source: EpisodeSource,
        source_description: impl Into<String>,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            source,
            source_description: source_description.into(),
            created_at: Utc::now(),
            valid_at,
        }
    }
}
