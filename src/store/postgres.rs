//! PostgreSQL-backed user store.
//!
//! One row per user in `vocab_users` (the current batch is kept as JSON text)
//! and one row per learned word in `vocab_learned_words`. Learned words are
//! only ever inserted, mirroring the in-memory set that only grows.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPool;
use sqlx::Row;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use super::{UserRecord, UserStore};
use crate::errors::{AppError, AppResult};
use crate::level::CefrLevel;
use crate::observability;
use crate::word_source::WordEntry;

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> AppResult<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS vocab_users (
            telegram_id BIGINT PRIMARY KEY,
            level VARCHAR(2),
            daily_words TEXT NOT NULL DEFAULT '[]',
            last_refresh_date DATE,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create vocab_users table: {}", e)))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS vocab_learned_words (
            telegram_id BIGINT NOT NULL REFERENCES vocab_users(telegram_id) ON DELETE CASCADE,
            word VARCHAR(255) NOT NULL,
            learned_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (telegram_id, word)
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::Database(format!("Failed to create vocab_learned_words table: {}", e))
    })?;

    info!("Database schema initialized successfully");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, user_id: i64) -> AppResult<UserRecord> {
        self.load(user_id)
            .instrument(observability::db_span("get_user", "vocab_users"))
            .await
    }

    async fn put(&self, user_id: i64, record: &UserRecord) -> AppResult<()> {
        self.save(user_id, record)
            .instrument(observability::db_span("put_user", "vocab_users"))
            .await
    }

    async fn user_ids(&self) -> AppResult<Vec<i64>> {
        let rows = sqlx::query("SELECT telegram_id FROM vocab_users ORDER BY telegram_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get::<i64, _>(0)).collect())
    }
}

impl PgUserStore {
    async fn load(&self, user_id: i64) -> AppResult<UserRecord> {
        let start = Instant::now();
        debug!(user_id = %user_id, "Loading user record");

        sqlx::query("INSERT INTO vocab_users (telegram_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            "SELECT level, daily_words, last_refresh_date FROM vocab_users WHERE telegram_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let level: Option<String> = row.get(0);
        let daily_words: String = row.get(1);
        let last_refresh_date: Option<NaiveDate> = row.get(2);

        let learned_rows =
            sqlx::query("SELECT word FROM vocab_learned_words WHERE telegram_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        let learned_words: HashSet<String> =
            learned_rows.iter().map(|row| row.get::<String, _>(0)).collect();

        let record = UserRecord {
            level: level.and_then(|l| match l.parse::<CefrLevel>() {
                Ok(level) => Some(level),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Ignoring stored level");
                    None
                }
            }),
            learned_words,
            daily_words: serde_json::from_str::<Vec<WordEntry>>(&daily_words)?,
            last_refresh_date,
        };

        observability::record_db_metrics("get_user", start.elapsed());
        Ok(record)
    }

    async fn save(&self, user_id: i64, record: &UserRecord) -> AppResult<()> {
        let start = Instant::now();
        debug!(user_id = %user_id, learned = record.learned_words.len(), "Saving user record");

        let daily_words = serde_json::to_string(&record.daily_words)?;
        let learned: Vec<String> = record.learned_words.iter().cloned().collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO vocab_users (telegram_id, level, daily_words, last_refresh_date, updated_at)
             VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)
             ON CONFLICT (telegram_id) DO UPDATE SET
                level = EXCLUDED.level,
                daily_words = EXCLUDED.daily_words,
                last_refresh_date = EXCLUDED.last_refresh_date,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(user_id)
        .bind(record.level.map(|l| l.as_str()))
        .bind(daily_words)
        .bind(record.last_refresh_date)
        .execute(&mut *tx)
        .await?;

        if !learned.is_empty() {
            sqlx::query(
                "INSERT INTO vocab_learned_words (telegram_id, word)
                 SELECT $1, UNNEST($2::text[])
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(&learned)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        observability::record_db_metrics("put_user", start.elapsed());
        Ok(())
    }
}
