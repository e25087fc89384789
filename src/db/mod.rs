pub mod memory;
pub mod models;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::dispatch::rank::Rank;
use models::UserRecord;

/// Persistent user → rank mapping consulted by the access layer.
///
/// `upsert` must be idempotent: it refreshes the user's names but never
/// touches an existing rank or first-seen chat.
#[async_trait]
pub trait RankStore: Send + Sync {
    async fn get(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>>;

    async fn upsert(&self, record: &UserRecord) -> anyhow::Result<()>;

    /// Returns `false` when the user has never been seen.
    async fn set_rank(&self, user_id: i64, rank: Rank) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                user_id BIGINT PRIMARY KEY,
                handle TEXT,
                display_name TEXT NOT NULL,
                chat_id BIGINT NOT NULL,
                rank SMALLINT NOT NULL DEFAULT 3,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_chat ON users(chat_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RankStore for Database {
    async fn get(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn upsert(&self, record: &UserRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, handle, display_name, chat_id, rank, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                handle = COALESCE(EXCLUDED.handle, users.handle),
                display_name = EXCLUDED.display_name
            "#,
        )
        .bind(record.user_id)
        .bind(record.handle.as_deref())
        .bind(&record.display_name)
        .bind(record.chat_id)
        .bind(record.rank.level())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_rank(&self, user_id: i64, rank: Rank) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET rank = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(rank.level())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
