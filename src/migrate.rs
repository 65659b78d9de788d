use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create bots table. The uniqueness constraint on website_url is the
    // backstop for concurrent duplicate creates: the loser's insert fails.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bots (
            id TEXT PRIMARY KEY,
            website_url TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            index_path TEXT NOT NULL,
            message_count INTEGER NOT NULL DEFAULT 0,
            last_used_at INTEGER,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bots_status ON bots(status)")
        .execute(pool)
        .await?;

    Ok(())
}
