//! SQLite-backed store for the rolling dialogue log.
//!
//! One `dialogues` table holds every conversation, partitioned by
//! `conversation_id`. Retention is applied per partition: the seed record
//! is never deleted, and once a partition grows past the prune threshold
//! everything but the seed and the most recent tail is dropped.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use chrono::Utc;
use tokio_rusqlite::Connection;

use crate::dialogue::config::{StorageConfig, WindowConfig};
use crate::dialogue::errors::{DialogueError, DialogueResult};
use crate::dialogue::record::{ChatMessage, DialogueRole};

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Dialogue log storage trait.
pub trait DialogueStore: Send + Sync {
    /// Seed the conversation partition with the system instruction if it
    /// is empty. Idempotent.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn ensure_seeded(&self, conversation_id: &str) -> StoreFuture<'_, DialogueResult<()>>;

    /// Append one record and return its assigned sequence number.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn append(
        &self,
        conversation_id: &str,
        role: DialogueRole,
        content: &str,
    ) -> StoreFuture<'_, DialogueResult<i64>>;

    /// Return the retention-windowed message list for the conversation,
    /// pruning the partition first when it has grown past the threshold.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn context_window(
        &self,
        conversation_id: &str,
    ) -> StoreFuture<'_, DialogueResult<Vec<ChatMessage>>>;

    /// Delete one record by sequence number. Used to compensate for an
    /// orphaned question when generation fails.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete_record(
        &self,
        conversation_id: &str,
        seq: i64,
    ) -> StoreFuture<'_, DialogueResult<()>>;

    /// Count records in the conversation partition.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn count(&self, conversation_id: &str) -> StoreFuture<'_, DialogueResult<u64>>;
}

/// `SQLite` implementation of dialogue storage.
pub struct SqliteDialogueStore {
    conn: Connection,
    table: String,
    seed_prompt: String,
    window: WindowConfig,
}

impl SqliteDialogueStore {
    /// Initialize the store, creating the table if absent.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub async fn new(storage: &StorageConfig, window: WindowConfig) -> DialogueResult<Self> {
        let conn = Connection::open(&storage.sqlite_path).await?;
        Self::with_connection(conn, storage, window).await
    }

    /// Initialize an in-memory store. Used by tests and local tooling.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub async fn in_memory(storage: &StorageConfig, window: WindowConfig) -> DialogueResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn, storage, window).await
    }

    async fn with_connection(
        conn: Connection,
        storage: &StorageConfig,
        window: WindowConfig,
    ) -> DialogueResult<Self> {
        let table = storage.table.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    conversation_id TEXT NOT NULL,
                    created_at_ms INTEGER NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_conversation
                    ON {table_name} (conversation_id, seq);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            table,
            seed_prompt: storage.seed_prompt.clone(),
            window,
        })
    }
}

impl DialogueStore for SqliteDialogueStore {
    fn ensure_seeded(&self, conversation_id: &str) -> StoreFuture<'_, DialogueResult<()>> {
        let conversation = conversation_id.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let seed = self.seed_prompt.clone();
            let now_ms = Utc::now().timestamp_millis();
            self.conn
                .call(move |conn| {
                    let count: i64 = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE conversation_id = ?1"),
                        rusqlite::params![conversation],
                        |row| row.get(0),
                    )?;
                    if count == 0 {
                        conn.execute(
                            &format!(
                                "INSERT INTO {table} (conversation_id, created_at_ms, role, content)
                                 VALUES (?1, ?2, ?3, ?4)"
                            ),
                            rusqlite::params![
                                conversation,
                                now_ms,
                                DialogueRole::System.as_str(),
                                seed
                            ],
                        )?;
                    }
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn append(
        &self,
        conversation_id: &str,
        role: DialogueRole,
        content: &str,
    ) -> StoreFuture<'_, DialogueResult<i64>> {
        let conversation = conversation_id.to_string();
        let content = content.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let now_ms = Utc::now().timestamp_millis();
            let seq = self
                .conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (conversation_id, created_at_ms, role, content)
                             VALUES (?1, ?2, ?3, ?4)"
                        ),
                        rusqlite::params![conversation, now_ms, role.as_str(), content],
                    )?;
                    Ok(conn.last_insert_rowid())
                })
                .await?;
            Ok(seq)
        })
    }

    fn context_window(
        &self,
        conversation_id: &str,
    ) -> StoreFuture<'_, DialogueResult<Vec<ChatMessage>>> {
        let conversation = conversation_id.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let window = self.window;
            let tail = i64::try_from(window.tail)
                .map_err(|_| DialogueError::InvalidConfig("tail exceeds i64".to_string()))?;
            let threshold = i64::try_from(window.prune_threshold)
                .map_err(|_| DialogueError::InvalidConfig("threshold exceeds i64".to_string()))?;

            let rows = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;

                    let total: i64 = tx.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE conversation_id = ?1"),
                        rusqlite::params![conversation],
                        |row| row.get(0),
                    )?;

                    if total > threshold {
                        tx.execute(
                            &format!(
                                "DELETE FROM {table}
                                 WHERE conversation_id = ?1
                                   AND seq NOT IN (
                                       SELECT MIN(seq) FROM {table} WHERE conversation_id = ?1
                                   )
                                   AND seq NOT IN (
                                       SELECT seq FROM {table}
                                       WHERE conversation_id = ?1
                                       ORDER BY seq DESC LIMIT ?2
                                   )"
                            ),
                            rusqlite::params![conversation, tail],
                        )?;
                    }

                    let rows = if total <= tail {
                        let mut stmt = tx.prepare(&format!(
                            "SELECT role, content FROM {table}
                             WHERE conversation_id = ?1
                             ORDER BY seq"
                        ))?;
                        let rows = stmt
                            .query_map(rusqlite::params![conversation], |row| {
                                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                            })?
                            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                        rows
                    } else {
                        let seed = tx.query_row(
                            &format!(
                                "SELECT role, content FROM {table}
                                 WHERE conversation_id = ?1
                                 ORDER BY seq LIMIT 1"
                            ),
                            rusqlite::params![conversation],
                            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                        )?;

                        let mut stmt = tx.prepare(&format!(
                            "SELECT role, content FROM {table}
                             WHERE conversation_id = ?1
                               AND seq > (SELECT MIN(seq) FROM {table} WHERE conversation_id = ?1)
                             ORDER BY seq DESC LIMIT ?2"
                        ))?;
                        let mut recent = stmt
                            .query_map(rusqlite::params![conversation, tail], |row| {
                                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                            })?
                            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                        recent.reverse();

                        let mut rows = Vec::with_capacity(recent.len() + 1);
                        rows.push(seed);
                        rows.extend(recent);
                        rows
                    };

                    tx.commit()?;
                    Ok(rows)
                })
                .await?;

            let mut messages = Vec::with_capacity(rows.len());
            for (role, content) in rows {
                let role = DialogueRole::from_str(&role)
                    .map_err(|value| DialogueError::InvalidRecord(format!("unknown role: {value}")))?;
                messages.push(ChatMessage { role, content });
            }
            Ok(messages)
        })
    }

    fn delete_record(
        &self,
        conversation_id: &str,
        seq: i64,
    ) -> StoreFuture<'_, DialogueResult<()>> {
        let conversation = conversation_id.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!("DELETE FROM {table} WHERE conversation_id = ?1 AND seq = ?2"),
                        rusqlite::params![conversation, seq],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn count(&self, conversation_id: &str) -> StoreFuture<'_, DialogueResult<u64>> {
        let conversation = conversation_id.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let count: i64 = self
                .conn
                .call(move |conn| {
                    let count = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE conversation_id = ?1"),
                        rusqlite::params![conversation],
                        |row| row.get(0),
                    )?;
                    Ok(count)
                })
                .await?;
            let count = u64::try_from(count)
                .map_err(|_| DialogueError::InvalidRecord("negative record count".to_string()))?;
            Ok(count)
        })
    }
}
