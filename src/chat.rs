//! Query-time retrieval orchestration.
//!
//! Sequences the read path: precondition check → usage accounting →
//! embed the question → nearest-neighbor search → prompt assembly →
//! answer generation. The usage counter is committed as soon as the
//! preconditions pass; a failed retrieval or generation afterwards does
//! not roll it back, and never mutates the bot's lifecycle state.

use tracing::info;

use crate::config::Config;
use crate::embedding::EmbeddingGateway;
use crate::error::BotError;
use crate::generate::AnswerGateway;
use crate::index::VectorIndex;
use crate::models::{BotStatus, ChatAnswer, SourceChunk};
use crate::store::BotStore;

/// Answer a user message against a ready bot's knowledge base.
pub async fn chat(
    config: &Config,
    store: &BotStore,
    index: &VectorIndex,
    embedder: &dyn EmbeddingGateway,
    generator: &dyn AnswerGateway,
    bot_id: &str,
    message: &str,
) -> Result<ChatAnswer, BotError> {
    let bot = store
        .get(bot_id)
        .await?
        .ok_or_else(|| BotError::NotFound(bot_id.to_string()))?;

    if bot.status != BotStatus::Ready {
        return Err(BotError::NotReady {
            bot_id: bot.id,
            status: bot.status,
        });
    }

    // The message-received event is real even if answering fails below.
    store.record_message(&bot.id).await?;

    let query_vec = embedder
        .embed(&[message.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BotError::Provider("empty embedding response".to_string()))?;

    let hits = index
        .query(&bot.id, &query_vec, config.retrieval.top_k)
        .await?;
    if hits.is_empty() {
        return Err(BotError::NoContext(bot.id));
    }
    info!(bot_id = %bot.id, hits = hits.len(), "retrieved grounding context");

    let context: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
    let prompt = build_prompt(&context, message);
    let answer = generator.generate(&prompt).await?;

    let sources = hits
        .into_iter()
        .map(|h| SourceChunk {
            text: h.text,
            page_url: h.page_url,
        })
        .collect();

    Ok(ChatAnswer { answer, sources })
}

/// Assemble the grounded prompt: the retrieved passages are the only
/// permitted source of factual content.
pub fn build_prompt(context_chunks: &[&str], question: &str) -> String {
    let context = context_chunks.join("\n\n");

    format!(
        "You are a helpful AI assistant. Use ONLY the context below to answer.\n\
         \n\
         --- CONTEXT ---\n\
         {context}\n\
         --- END CONTEXT ---\n\
         \n\
         User question: {question}\n\
         \n\
         Provide a clear, accurate answer."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_context_and_question() {
        let prompt = build_prompt(
            &["First retrieved passage.", "Second retrieved passage."],
            "What does the site say?",
        );
        assert!(prompt.contains("--- CONTEXT ---"));
        assert!(prompt.contains("First retrieved passage."));
        assert!(prompt.contains("Second retrieved passage."));
        assert!(prompt.contains("User question: What does the site say?"));
        let ctx_pos = prompt.find("First retrieved").unwrap();
        let q_pos = prompt.find("User question").unwrap();
        assert!(ctx_pos < q_pos);
    }
}
