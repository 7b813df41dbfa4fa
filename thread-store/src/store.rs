//! Store trait and record type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat identity assigned by the transport: a user id or a synthetic group-chat id.
pub type ChatId = i64;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("chat not found: {0}")]
    NotFound(ChatId),
    #[error("chat already exists: {0}")]
    AlreadyExists(ChatId),
    #[error("storage: {0}")]
    Storage(String),
}

impl StoreError {
    /// True only for a plain miss; storage failures are never treated as a miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// One persisted chat -> thread binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    pub chat_id: ChatId,
    pub thread_id: String,
}

/// Durable chat -> thread mapping shared by all message-handling tasks.
#[async_trait]
pub trait ChatThreadStore: Send + Sync {
    /// Inserts a new binding. Fails with [`StoreError::AlreadyExists`] when `chat_id` is taken.
    async fn put(&self, chat_id: ChatId, thread_id: &str) -> Result<ChatThread, StoreError>;

    /// Fetches the binding for `chat_id`, or [`StoreError::NotFound`].
    async fn get(&self, chat_id: ChatId) -> Result<ChatThread, StoreError>;

    /// Deletes the binding if present. No-op when absent.
    async fn remove(&self, chat_id: ChatId) -> Result<(), StoreError>;
}
