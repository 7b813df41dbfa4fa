//! SQLite-backed chat thread store. Own DB file, survives restarts.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, ErrorCode, OptionalExtension};

use crate::store::{ChatId, ChatThread, ChatThreadStore, StoreError};

/// One table `chat_thread (chat_id PRIMARY KEY, thread_id)`.
///
/// A single connection sits behind a mutex; every call runs on the blocking pool.
pub struct SqliteChatThreadStore {
    db: Arc<Mutex<rusqlite::Connection>>,
}

fn storage(e: impl ToString) -> StoreError {
    StoreError::Storage(e.to_string())
}

impl SqliteChatThreadStore {
    /// Opens or creates the database and table.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path.as_ref()).map_err(storage)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chat_thread (
                chat_id INTEGER PRIMARY KEY,
                thread_id TEXT NOT NULL
            );
            "#,
        )
        .map_err(storage)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock".into()))?;
            f(&conn)
        })
        .await
        .map_err(storage)?
    }
}

#[async_trait]
impl ChatThreadStore for SqliteChatThreadStore {
    async fn put(&self, chat_id: ChatId, thread_id: &str) -> Result<ChatThread, StoreError> {
        let thread_id = thread_id.to_string();
        self.with_conn(move |conn| {
            match conn.execute(
                "INSERT INTO chat_thread (chat_id, thread_id) VALUES (?1, ?2)",
                params![chat_id, thread_id],
            ) {
                Ok(_) => Ok(ChatThread { chat_id, thread_id }),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::AlreadyExists(chat_id))
                }
                Err(e) => Err(storage(e)),
            }
        })
        .await
    }

    async fn get(&self, chat_id: ChatId) -> Result<ChatThread, StoreError> {
        self.with_conn(move |conn| {
            let thread_id: Option<String> = conn
                .query_row(
                    "SELECT thread_id FROM chat_thread WHERE chat_id = ?1",
                    params![chat_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage)?;
            thread_id
                .map(|thread_id| ChatThread { chat_id, thread_id })
                .ok_or(StoreError::NotFound(chat_id))
        })
        .await
    }

    async fn remove(&self, chat_id: ChatId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let n = conn
                .execute("DELETE FROM chat_thread WHERE chat_id = ?1", params![chat_id])
                .map_err(storage)?;
            tracing::debug!(chat_id, removed = n, "chat_thread remove");
            Ok(())
        })
        .await
    }
}
