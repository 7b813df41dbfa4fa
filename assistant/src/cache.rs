//! Process-local chat -> live thread cache. No eviction; cleared on restart.

use std::collections::HashMap;

use thread_store::ChatId;
use tokio::sync::RwLock;

use crate::types::AssistantThread;

#[derive(Debug, Default)]
pub struct ThreadCache {
    threads: RwLock<HashMap<ChatId, AssistantThread>>,
}

impl ThreadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, chat_id: ChatId) -> Option<AssistantThread> {
        self.threads.read().await.get(&chat_id).cloned()
    }

    /// Overwrites any previous entry for `chat_id`.
    pub async fn insert(&self, chat_id: ChatId, thread: AssistantThread) {
        self.threads.write().await.insert(chat_id, thread);
    }

    pub async fn invalidate(&self, chat_id: ChatId) -> Option<AssistantThread> {
        self.threads.write().await.remove(&chat_id)
    }

    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}
