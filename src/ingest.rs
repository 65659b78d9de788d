//! Ingestion orchestration and the bot lifecycle state machine.
//!
//! Drives the full pipeline: crawl → normalize + chunk (per page) →
//! embed (batched) → flush into the bot's vector index, transitioning
//! the bot `processing → ready` on success or `processing → failed` on
//! any stage error. The triggering error is persisted as the `failed`
//! transition and re-raised to the caller; no partial success is
//! reported.

use tracing::{info, warn};
use url::Url;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::crawler::Crawler;
use crate::embedding::EmbeddingGateway;
use crate::error::BotError;
use crate::index::VectorIndex;
use crate::models::{Bot, BotStatus, Chunk};
use crate::normalize::Normalizer;
use crate::store::BotStore;

/// Create a knowledge-base bot for a website.
///
/// Idempotent per seed URL: if a bot already exists for `website_url`,
/// it is returned unchanged, whatever its current state, and no new
/// ingestion runs.
pub async fn create_bot(
    config: &Config,
    store: &BotStore,
    index: &VectorIndex,
    embedder: &dyn EmbeddingGateway,
    normalizer: &Normalizer,
    website_url: &str,
) -> Result<Bot, BotError> {
    let seed =
        Url::parse(website_url).map_err(|_| BotError::InvalidUrl(website_url.to_string()))?;

    if let Some(existing) = store.find_by_url(seed.as_str()).await? {
        info!(bot_id = %existing.id, url = %seed, "bot already exists for url, reusing");
        return Ok(existing);
    }

    let mut bot = Bot::new(seed.as_str(), "");
    bot.index_path = index.bot_dir(&bot.id).display().to_string();
    info!(bot_id = %bot.id, url = %seed, "creating bot");
    store.insert(&bot).await?;

    finish_run(
        store,
        &bot.id,
        run_pipeline(config, index, embedder, normalizer, &bot.id, &seed).await,
    )
    .await
}

/// Re-ingest an existing bot's website, fully replacing its index
/// contents. The index is reset before the new crawl so a failed run
/// cannot leave stale chunks from the previous one behind.
pub async fn refresh_bot(
    config: &Config,
    store: &BotStore,
    index: &VectorIndex,
    embedder: &dyn EmbeddingGateway,
    normalizer: &Normalizer,
    bot_id: &str,
) -> Result<Bot, BotError> {
    let bot = store
        .get(bot_id)
        .await?
        .ok_or_else(|| BotError::NotFound(bot_id.to_string()))?;
    let seed =
        Url::parse(&bot.website_url).map_err(|_| BotError::InvalidUrl(bot.website_url.clone()))?;

    info!(bot_id = %bot.id, url = %seed, "refreshing bot");
    store.set_status(&bot.id, BotStatus::Processing).await?;

    let outcome = match index.reset(&bot.id).await {
        Ok(()) => run_pipeline(config, index, embedder, normalizer, &bot.id, &seed).await,
        Err(e) => Err(e),
    };

    finish_run(store, &bot.id, outcome).await
}

/// Delete a bot record together with its self-contained index storage.
pub async fn delete_bot(
    store: &BotStore,
    index: &VectorIndex,
    bot_id: &str,
) -> Result<(), BotError> {
    let bot = store
        .get(bot_id)
        .await?
        .ok_or_else(|| BotError::NotFound(bot_id.to_string()))?;

    store.delete(&bot.id).await?;
    index.remove(&bot.id).await?;
    info!(bot_id = %bot.id, "bot deleted");
    Ok(())
}

/// Persist the terminal lifecycle transition for a run and return the
/// updated bot (success) or the triggering error (failure).
async fn finish_run(
    store: &BotStore,
    bot_id: &str,
    outcome: Result<usize, BotError>,
) -> Result<Bot, BotError> {
    match outcome {
        Ok(chunk_count) => {
            store.set_status(bot_id, BotStatus::Ready).await?;
            info!(bot_id, chunks = chunk_count, "bot ready");
            store
                .get(bot_id)
                .await?
                .ok_or_else(|| BotError::NotFound(bot_id.to_string()))
        }
        Err(e) => {
            warn!(bot_id, error = %e, "ingestion failed, marking bot failed");
            if let Err(persist) = store.set_status(bot_id, BotStatus::Failed).await {
                warn!(bot_id, error = %persist, "could not persist failed status");
            }
            Err(e)
        }
    }
}

/// Run crawl → clean → chunk → embed → index for one bot. Returns the
/// number of chunks written.
async fn run_pipeline(
    config: &Config,
    index: &VectorIndex,
    embedder: &dyn EmbeddingGateway,
    normalizer: &Normalizer,
    bot_id: &str,
    seed: &Url,
) -> Result<usize, BotError> {
    let crawler = Crawler::new(&config.crawl).map_err(|e| BotError::Crawl {
        url: seed.to_string(),
        reason: e.to_string(),
    })?;

    info!(bot_id, url = %seed, max_pages = config.crawl.max_pages, "starting crawl");
    let pages = crawler.crawl(seed).await;
    if pages.is_empty() {
        return Err(BotError::Crawl {
            url: seed.to_string(),
            reason: "no pages could be fetched".to_string(),
        });
    }
    info!(bot_id, pages = pages.len(), "crawl complete");

    let mut all_chunks: Vec<Chunk> = Vec::new();
    let mut all_embeddings: Vec<Vec<f32>> = Vec::new();
    let mut ordinal: i64 = 0;

    for (page_url, raw_text) in &pages {
        let cleaned = normalizer.normalize(raw_text);
        let passages = chunk_text(&cleaned, config.chunking.max_words);
        if passages.is_empty() {
            warn!(bot_id, url = %page_url, "page produced no chunks, skipping");
            continue;
        }

        let mut embeddings = Vec::with_capacity(passages.len());
        for batch in passages.chunks(config.embedding.batch_size) {
            embeddings.extend(embedder.embed(batch).await?);
        }

        for (text, embedding) in passages.into_iter().zip(embeddings) {
            all_chunks.push(Chunk {
                bot_id: bot_id.to_string(),
                page_url: page_url.clone(),
                chunk_index: ordinal,
                text,
            });
            all_embeddings.push(embedding);
            ordinal += 1;
        }
    }

    if all_chunks.is_empty() {
        return Err(BotError::EmptyContent {
            url: seed.to_string(),
        });
    }

    info!(bot_id, chunks = all_chunks.len(), "writing chunks to vector index");
    index.upsert(bot_id, &all_chunks, &all_embeddings).await?;

    Ok(all_chunks.len())
}
