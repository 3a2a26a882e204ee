//! Knowledge corpus refresh
//!
//! Reconciles the knowledge catalog against the warehouse table used for
//! retrieval-augmented chat.

mod catalog;
mod job;

pub use catalog::{builtin_entries, KnowledgeCatalog, KnowledgeEntry};
pub use job::{KnowledgeUpsertJob, UpsertResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default warehouse table holding the corpus
pub const DEFAULT_KNOWLEDGE_TABLE: &str = "grokipedia_rag";

/// A catalog entry as stored in the warehouse, keyed by `chunk_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub chunk_id: String,
    pub topic: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub word_count: u32,
    pub batch_id: Uuid,
    pub last_updated: DateTime<Utc>,
}

impl KnowledgeChunk {
    /// True when every field except the batch stamp matches
    pub fn same_content(&self, other: &KnowledgeChunk) -> bool {
        self.chunk_id == other.chunk_id
            && self.topic == other.topic
            && self.title == other.title
            && self.content == other.content
            && self.url == other.url
            && self.word_count == other.word_count
    }
}
