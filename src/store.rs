//! Relational store for bot records.
//!
//! Wraps the shared SQLite pool with typed CRUD over the `bots` table.
//! Usage counters are committed by [`BotStore::record_message`] in a
//! single UPDATE, independent of whatever retrieval or generation does
//! afterwards.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::BotError;
use crate::models::{Bot, BotStatus};

#[derive(Clone)]
pub struct BotStore {
    pool: SqlitePool,
}

impl BotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, bot: &Bot) -> Result<(), BotError> {
        sqlx::query(
            r#"
            INSERT INTO bots (id, website_url, status, index_path, message_count, last_used_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&bot.id)
        .bind(&bot.website_url)
        .bind(bot.status.as_str())
        .bind(&bot.index_path)
        .bind(bot.message_count)
        .bind(bot.last_used_at)
        .bind(bot.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, bot_id: &str) -> Result<Option<Bot>, BotError> {
        let row = sqlx::query("SELECT * FROM bots WHERE id = ?")
            .bind(bot_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| bot_from_row(&r)).transpose().map_err(Into::into)
    }

    pub async fn find_by_url(&self, website_url: &str) -> Result<Option<Bot>, BotError> {
        let row = sqlx::query("SELECT * FROM bots WHERE website_url = ?")
            .bind(website_url)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| bot_from_row(&r)).transpose().map_err(Into::into)
    }

    pub async fn set_status(&self, bot_id: &str, status: BotStatus) -> Result<(), BotError> {
        sqlx::query("UPDATE bots SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(bot_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record one received message: bump the counter and stamp
    /// last_used_at. Commits immediately.
    pub async fn record_message(&self, bot_id: &str) -> Result<(), BotError> {
        sqlx::query(
            "UPDATE bots SET message_count = message_count + 1, last_used_at = ? WHERE id = ?",
        )
        .bind(Utc::now().timestamp())
        .bind(bot_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, bot_id: &str) -> Result<(), BotError> {
        sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(bot_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn bot_from_row(row: &SqliteRow) -> Result<Bot, sqlx::Error> {
    let status_str: String = row.get("status");
    let status = BotStatus::parse(&status_str).ok_or_else(|| {
        sqlx::Error::Decode(format!("unknown bot status: {status_str}").into())
    })?;

    Ok(Bot {
        id: row.get("id"),
        website_url: row.get("website_url"),
        status,
        index_path: row.get("index_path"),
        message_count: row.get("message_count"),
        last_used_at: row.get("last_used_at"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> BotStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        BotStore::new(pool)
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let store = test_store().await;
        let bot = Bot::new("https://example.com/", "/tmp/idx/a");
        store.insert(&bot).await.unwrap();

        let fetched = store.get(&bot.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, bot.id);
        assert_eq!(fetched.website_url, "https://example.com/");
        assert_eq!(fetched.status, BotStatus::Processing);
        assert_eq!(fetched.message_count, 0);
    }

    #[tokio::test]
    async fn duplicate_website_url_rejected() {
        let store = test_store().await;
        store
            .insert(&Bot::new("https://example.com/", "/tmp/a"))
            .await
            .unwrap();
        let result = store.insert(&Bot::new("https://example.com/", "/tmp/b")).await;
        assert!(matches!(result, Err(BotError::Index(_))));
    }

    #[tokio::test]
    async fn find_by_url_misses_unknown_sites() {
        let store = test_store().await;
        assert!(store
            .find_by_url("https://nowhere.example/")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn status_transitions_persist() {
        let store = test_store().await;
        let bot = Bot::new("https://example.com/", "/tmp/a");
        store.insert(&bot).await.unwrap();

        store.set_status(&bot.id, BotStatus::Ready).await.unwrap();
        assert_eq!(
            store.get(&bot.id).await.unwrap().unwrap().status,
            BotStatus::Ready
        );

        store.set_status(&bot.id, BotStatus::Failed).await.unwrap();
        assert_eq!(
            store.get(&bot.id).await.unwrap().unwrap().status,
            BotStatus::Failed
        );
    }

    #[tokio::test]
    async fn record_message_bumps_counter_and_timestamp() {
        let store = test_store().await;
        let bot = Bot::new("https://example.com/", "/tmp/a");
        store.insert(&bot).await.unwrap();

        store.record_message(&bot.id).await.unwrap();
        store.record_message(&bot.id).await.unwrap();

        let fetched = store.get(&bot.id).await.unwrap().unwrap();
        assert_eq!(fetched.message_count, 2);
        assert!(fetched.last_used_at.is_some());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = test_store().await;
        let bot = Bot::new("https://example.com/", "/tmp/a");
        store.insert(&bot).await.unwrap();
        store.delete(&bot.id).await.unwrap();
        assert!(store.get(&bot.id).await.unwrap().is_none());
    }
}
