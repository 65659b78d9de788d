//! Per-bot persistent vector index.
//!
//! Each bot's index lives in its own SQLite file under the index root
//! (`{root}/{bot_id}/index.sqlite`), fully self-contained so a bot's
//! storage can be deleted independently. [`VectorIndex`] is a resource
//! factory: every operation acquires a scoped connection pool for the
//! bot's file and closes it before returning, so no handles are shared
//! across bots or across operations.
//!
//! Entry ids have the stable form `{bot_id}_{chunk_index}`; writing an
//! existing id overwrites it. Queries are brute-force cosine similarity
//! over the stored embedding blobs, which is plenty for per-site indices
//! bounded by the crawl page budget.

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::BotError;
use crate::models::{Chunk, SearchHit};

pub struct VectorIndex {
    root: PathBuf,
}

impl VectorIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the given bot's index file.
    pub fn bot_dir(&self, bot_id: &str) -> PathBuf {
        self.root.join(bot_id)
    }

    fn db_path(&self, bot_id: &str) -> PathBuf {
        self.bot_dir(bot_id).join("index.sqlite")
    }

    async fn open(&self, bot_id: &str) -> Result<SqlitePool, BotError> {
        let path = self.db_path(bot_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                bot_id TEXT NOT NULL,
                page_url TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(pool)
    }

    /// Write chunk/embedding pairs for a bot, overwriting entries that
    /// share an id. The two slices must be parallel.
    pub async fn upsert(
        &self,
        bot_id: &str,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), BotError> {
        if chunks.len() != embeddings.len() {
            return Err(BotError::Provider(format!(
                "embedding count {} does not match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let pool = self.open(bot_id).await?;
        let mut tx = pool.begin().await?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let id = format!("{}_{}", bot_id, chunk.chunk_index);
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO entries (id, bot_id, page_url, chunk_index, text, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&chunk.bot_id)
            .bind(&chunk.page_url)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(vec_to_blob(embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        pool.close().await;
        Ok(())
    }

    /// Clear all entries for a bot. Safe to call for a bot that has no
    /// index yet.
    pub async fn reset(&self, bot_id: &str) -> Result<(), BotError> {
        if !self.db_path(bot_id).exists() {
            return Ok(());
        }

        let pool = self.open(bot_id).await?;
        sqlx::query("DELETE FROM entries").execute(&pool).await?;
        pool.close().await;
        Ok(())
    }

    /// Return the `top_k` entries nearest to `query_vec` by cosine
    /// similarity, best first. A bot with no index yields an empty vec.
    pub async fn query(
        &self,
        bot_id: &str,
        query_vec: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, BotError> {
        if !self.db_path(bot_id).exists() {
            return Ok(Vec::new());
        }

        let pool = self.open(bot_id).await?;
        let rows = sqlx::query("SELECT id, page_url, chunk_index, text, embedding FROM entries")
            .fetch_all(&pool)
            .await?;
        pool.close().await;

        let mut hits: Vec<SearchHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                SearchHit {
                    id: row.get("id"),
                    page_url: row.get("page_url"),
                    chunk_index: row.get("chunk_index"),
                    text: row.get("text"),
                    score: cosine_similarity(query_vec, &vector),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Delete a bot's index directory entirely, reclaiming its storage.
    pub async fn remove(&self, bot_id: &str) -> Result<(), BotError> {
        let dir = self.bot_dir(bot_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(sqlx::Error::Io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(bot_id: &str, index: i64, text: &str) -> Chunk {
        Chunk {
            bot_id: bot_id.to_string(),
            page_url: format!("https://example.com/page{index}"),
            chunk_index: index,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_then_query_returns_self_as_best_hit() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());

        let chunks = vec![
            chunk("bot1", 0, "rust borrow checker"),
            chunk("bot1", 1, "gardening in spring"),
            chunk("bot1", 2, "sourdough starter care"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        index.upsert("bot1", &chunks, &embeddings).await.unwrap();

        let hits = index.query("bot1", &[0.0, 1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "gardening in spring");
        assert_eq!(hits[0].id, "bot1_1");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn query_on_missing_index_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());
        let hits = index.query("ghost", &[1.0, 0.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_entries_and_is_safe_on_fresh_bot() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());

        index.reset("never-written").await.unwrap();

        let chunks = vec![chunk("bot1", 0, "some indexed passage")];
        index
            .upsert("bot1", &chunks, &[vec![1.0, 0.0]])
            .await
            .unwrap();
        index.reset("bot1").await.unwrap();

        let hits = index.query("bot1", &[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn indices_are_bot_scoped() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());

        index
            .upsert("alpha", &[chunk("alpha", 0, "alpha content")], &[vec![1.0, 0.0]])
            .await
            .unwrap();
        index
            .upsert("beta", &[chunk("beta", 0, "beta content")], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let hits = index.query("alpha", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "alpha content");
    }

    #[tokio::test]
    async fn upsert_overwrites_entries_with_same_id() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());

        index
            .upsert("bot1", &[chunk("bot1", 0, "old text")], &[vec![1.0, 0.0]])
            .await
            .unwrap();
        index
            .upsert("bot1", &[chunk("bot1", 0, "new text")], &[vec![0.0, 1.0]])
            .await
            .unwrap();

        let hits = index.query("bot1", &[0.0, 1.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "new text");
    }

    #[tokio::test]
    async fn mismatched_lengths_rejected() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());
        let result = index
            .upsert("bot1", &[chunk("bot1", 0, "text")], &[])
            .await;
        assert!(matches!(result, Err(BotError::Provider(_))));
    }

    #[tokio::test]
    async fn remove_deletes_bot_storage() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(tmp.path());

        index
            .upsert("bot1", &[chunk("bot1", 0, "text")], &[vec![1.0]])
            .await
            .unwrap();
        assert!(index.bot_dir("bot1").exists());

        index.remove("bot1").await.unwrap();
        assert!(!index.bot_dir("bot1").exists());

        let hits = index.query("bot1", &[1.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }
}
