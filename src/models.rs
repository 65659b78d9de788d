//! Core data types used throughout sitebot.
//!
//! These types represent the bots, pages, chunks, and search results that
//! flow through the ingestion and retrieval pipeline.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a bot.
///
/// A bot starts in `Processing` while its website is being ingested,
/// moves to `Ready` on success, and to `Failed` if any pipeline stage
/// errors. `Ready` and `Failed` are stable until an explicit refresh,
/// which transitions back to `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Processing,
    Ready,
    Failed,
}

impl BotStatus {
    /// The lowercase name persisted in the bots table.
    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Processing => "processing",
            BotStatus::Ready => "ready",
            BotStatus::Failed => "failed",
        }
    }

    /// Parse a persisted status name. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(BotStatus::Processing),
            "ready" => Some(BotStatus::Ready),
            "failed" => Some(BotStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One knowledge base tied to exactly one seed website.
#[derive(Debug, Clone)]
pub struct Bot {
    pub id: String,
    pub website_url: String,
    pub status: BotStatus,
    pub index_path: String,
    pub message_count: i64,
    pub last_used_at: Option<i64>,
    pub created_at: i64,
}

impl Bot {
    /// Create a fresh bot record in `Processing` state with a new UUID.
    pub fn new(website_url: &str, index_path: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            website_url: website_url.to_string(),
            status: BotStatus::Processing,
            index_path: index_path.to_string(),
            message_count: 0,
            last_used_at: None,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// A bounded-length passage of normalized text with provenance metadata.
///
/// `chunk_index` is the running ordinal across the whole ingestion run,
/// unique within the run; together with the bot id it forms the stable
/// index entry id `{bot_id}_{chunk_index}`.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub bot_id: String,
    pub page_url: String,
    pub chunk_index: i64,
    pub text: String,
}

/// A single nearest-neighbor result from the vector index, scored by
/// cosine similarity against the query embedding.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub page_url: String,
    pub chunk_index: i64,
    pub text: String,
    pub score: f32,
}

/// A retrieved passage returned to the caller alongside the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    pub text: String,
    pub page_url: String,
}

/// The outcome of a chat query: the generated answer plus the passages
/// it was grounded on, in similarity-descending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_persisted_name() {
        for status in [BotStatus::Processing, BotStatus::Ready, BotStatus::Failed] {
            assert_eq!(BotStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BotStatus::parse("archived"), None);
    }

    #[test]
    fn new_bot_starts_processing_with_zero_usage() {
        let bot = Bot::new("https://example.com/", "/tmp/idx/abc");
        assert_eq!(bot.status, BotStatus::Processing);
        assert_eq!(bot.message_count, 0);
        assert!(bot.last_used_at.is_none());
        assert!(!bot.id.is_empty());
    }
}
