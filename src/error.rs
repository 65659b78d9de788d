//! Error taxonomy for the ingestion and retrieval pipelines.
//!
//! Every failure a pipeline stage can produce maps to one [`BotError`]
//! variant, so callers (the HTTP layer, the CLI) can dispatch on the kind
//! instead of matching message strings. Quota/rate-limit failures from the
//! embedding and generation providers are distinguished from generic
//! provider failures so they can be surfaced differently.

use crate::models::BotStatus;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The seed was unreachable or the crawl fetched zero pages.
    #[error("crawl failed for {url}: {reason}")]
    Crawl { url: String, reason: String },

    /// Pages were fetched but no chunks survived cleaning and chunking.
    #[error("no usable content extracted from {url}")]
    EmptyContent { url: String },

    /// The bot registry or a per-bot vector index could not be read or
    /// written.
    #[error("index storage error: {0}")]
    Index(#[from] sqlx::Error),

    /// An external provider rejected the call for quota or rate-limit
    /// reasons (HTTP 429).
    #[error("provider quota exhausted: {0}")]
    Quota(String),

    /// Any other external provider failure.
    #[error("provider request failed: {0}")]
    Provider(String),

    /// The given string is not a valid absolute URL.
    #[error("invalid website url: {0}")]
    InvalidUrl(String),

    /// No bot exists with the given identifier.
    #[error("bot {0} not found")]
    NotFound(String),

    /// The bot exists but is not in the `ready` state.
    #[error("bot {bot_id} is not ready (status: {status})")]
    NotReady { bot_id: String, status: BotStatus },

    /// The bot is ready but its index returned zero passages, so there is
    /// nothing to ground an answer on.
    #[error("no indexed content available for bot {0}")]
    NoContext(String),
}

impl BotError {
    /// Whether this failure is the provider quota/rate-limit kind.
    pub fn is_quota(&self) -> bool {
        matches!(self, BotError::Quota(_))
    }
}
