//! Chat identity -> live thread resolution: cache, then store, then a new thread.

use std::sync::Arc;

use dashmap::DashMap;
use thread_store::{ChatId, ChatThreadStore, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::ThreadCache;
use crate::client::AssistantClient;
use crate::error::AssistantError;
use crate::types::AssistantThread;

/// Resolves the one canonical thread for a chat.
///
/// Order: cache hit; else store hit resolved through the client; else a new thread that is
/// persisted before it is cached. A store failure other than a miss aborts resolution.
///
/// The miss path runs under a per-chat lock, so concurrent first messages from the same chat
/// create one thread and one durable record. Lock entries, like cache entries, are never
/// evicted: both maps grow with the number of distinct chats seen by the process.
pub struct ConversationResolver {
    client: Arc<AssistantClient>,
    store: Arc<dyn ChatThreadStore>,
    cache: ThreadCache,
    locks: DashMap<ChatId, Arc<Mutex<()>>>,
}

impl ConversationResolver {
    pub fn new(client: Arc<AssistantClient>, store: Arc<dyn ChatThreadStore>) -> Self {
        Self {
            client,
            store,
            cache: ThreadCache::new(),
            locks: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &ThreadCache {
        &self.cache
    }

    fn lock_for(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        self.locks.entry(chat_id).or_default().clone()
    }

    pub async fn resolve(&self, chat_id: ChatId) -> Result<AssistantThread, AssistantError> {
        if let Some(thread) = self.cache.lookup(chat_id).await {
            return Ok(thread);
        }

        let lock = self.lock_for(chat_id);
        let _guard = lock.lock().await;

        // Another task may have finished resolving while we waited.
        if let Some(thread) = self.cache.lookup(chat_id).await {
            return Ok(thread);
        }

        let thread = match self.store.get(chat_id).await {
            Ok(record) => {
                debug!(chat_id, thread_id = %record.thread_id, "thread found in store");
                self.client.retrieve_thread(&record.thread_id).await?
            }
            Err(StoreError::NotFound(_)) => {
                let thread = self.client.create_thread().await?;
                self.store.put(chat_id, &thread.id).await?;
                info!(chat_id, thread_id = %thread.id, "bound chat to new thread");
                thread
            }
            Err(e) => return Err(e.into()),
        };

        self.cache.insert(chat_id, thread.clone()).await;
        Ok(thread)
    }

    /// Administrative reset: drops the durable binding and the cached handle.
    ///
    /// The next message from this chat starts a fresh thread.
    pub async fn reset(&self, chat_id: ChatId) -> Result<(), AssistantError> {
        let lock = self.lock_for(chat_id);
        let _guard = lock.lock().await;
        self.store.remove(chat_id).await?;
        self.cache.invalidate(chat_id).await;
        info!(chat_id, "chat thread reset");
        Ok(())
    }
}
