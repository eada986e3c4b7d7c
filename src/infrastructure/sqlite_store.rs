use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::application::{AppError, AppResult, WatchStore};
use crate::domain::{RewardId, WatchEntry};

type EntryRow = (
    i64,
    i64,
    i64,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    bool,
);

const ENTRY_COLUMNS: &str =
    "id, chat_id, reward_id, available_since, last_notified, is_missing";

/// SQLite-backed chats and reward-watch entries. Every mutation is a single
/// statement, so the command surface and the checker can act on the same entry
/// without interleaving partial updates.
pub struct SqliteWatchStore {
    pool: SqlitePool,
}

impl SqliteWatchStore {
    /// db_url examples:
    /// - "sqlite:data/main.db"
    /// - "sqlite::memory:" (tests)
    pub async fn new(db_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .create_if_missing(true);

        // Writes from the checker and the command surface serialize on one
        // connection instead of surfacing SQLITE_BUSY to callers.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chats (
              chat_id INTEGER PRIMARY KEY,
              created_at TEXT NOT NULL,
              locale TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reward_entries (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              chat_id INTEGER NOT NULL REFERENCES chats(chat_id),
              reward_id INTEGER NOT NULL,
              available_since TEXT,
              last_notified TEXT,
              is_missing INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS unique_reward_per_chat
              ON reward_entries(chat_id, reward_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    fn entry_from_row(row: EntryRow) -> WatchEntry {
        let (id, chat_id, reward_id, available_since, last_notified, is_missing) = row;
        WatchEntry {
            id,
            chat_id,
            reward_id: RewardId(reward_id),
            available_since,
            last_notified,
            is_missing,
        }
    }
}

#[async_trait]
impl WatchStore for SqliteWatchStore {
    async fn list_entries(&self) -> AppResult<Vec<WatchEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM reward_entries ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(rows.into_iter().map(Self::entry_from_row).collect())
    }

    async fn distinct_reward_ids(&self) -> AppResult<Vec<RewardId>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT DISTINCT reward_id FROM reward_entries ORDER BY reward_id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| RewardId(id)).collect())
    }

    async fn entries_for_reward(&self, reward_id: RewardId) -> AppResult<Vec<WatchEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM reward_entries WHERE reward_id = ? ORDER BY id"
        ))
        .bind(reward_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(rows.into_iter().map(Self::entry_from_row).collect())
    }

    async fn find_entry(&self, reward_id: RewardId) -> AppResult<Option<WatchEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM reward_entries WHERE reward_id = ? LIMIT 1"
        ))
        .bind(reward_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(row.map(Self::entry_from_row))
    }

    async fn add_entry(&self, chat_id: i64, reward_id: RewardId) -> AppResult<WatchEntry> {
        sqlx::query(
            r#"
            INSERT INTO reward_entries(chat_id, reward_id)
            VALUES(?, ?)
            ON CONFLICT(chat_id, reward_id) DO NOTHING
            "#,
        )
        .bind(chat_id)
        .bind(reward_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        let row: EntryRow = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM reward_entries WHERE chat_id = ? AND reward_id = ?"
        ))
        .bind(chat_id)
        .bind(reward_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(Self::entry_from_row(row))
    }

    async fn update_entry(&self, entry: &WatchEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reward_entries
            SET available_since = ?, last_notified = ?, is_missing = ?
            WHERE id = ?
            "#,
        )
        .bind(entry.available_since)
        .bind(entry.last_notified)
        .bind(entry.is_missing)
        .bind(entry.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn delete_entry(&self, entry_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM reward_entries WHERE id = ?")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn set_last_notified(
        &self,
        entry_id: i64,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE reward_entries SET last_notified = ? WHERE id = ?")
            .bind(at)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn clear_notification_state(&self, reward_id: RewardId) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reward_entries
            SET is_missing = 0, available_since = NULL, last_notified = NULL
            WHERE reward_id = ?
            "#,
        )
        .bind(reward_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn add_chat(&self, chat_id: i64) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO chats(chat_id, created_at) VALUES(?, ?)")
            .bind(chat_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn chat_locale(&self, chat_id: i64) -> AppResult<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT locale FROM chats WHERE chat_id = ? LIMIT 1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(row.and_then(|(locale,)| locale))
    }

    async fn set_chat_locale(&self, chat_id: i64, locale: &str) -> AppResult<()> {
        sqlx::query("UPDATE chats SET locale = ? WHERE chat_id = ?")
            .bind(locale)
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }
}
