//! In-process store with the same contract as the SQLite one. Not durable.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{ChatId, ChatThread, ChatThreadStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryChatThreadStore {
    rows: RwLock<HashMap<ChatId, String>>,
}

impl InMemoryChatThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bindings.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ChatThreadStore for InMemoryChatThreadStore {
    async fn put(&self, chat_id: ChatId, thread_id: &str) -> Result<ChatThread, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&chat_id) {
            return Err(StoreError::AlreadyExists(chat_id));
        }
        rows.insert(chat_id, thread_id.to_string());
        Ok(ChatThread {
            chat_id,
            thread_id: thread_id.to_string(),
        })
    }

    async fn get(&self, chat_id: ChatId) -> Result<ChatThread, StoreError> {
        self.rows
            .read()
            .await
            .get(&chat_id)
            .map(|thread_id| ChatThread {
                chat_id,
                thread_id: thread_id.clone(),
            })
            .ok_or(StoreError::NotFound(chat_id))
    }

    async fn remove(&self, chat_id: ChatId) -> Result<(), StoreError> {
        self.rows.write().await.remove(&chat_id);
        Ok(())
    }
}
