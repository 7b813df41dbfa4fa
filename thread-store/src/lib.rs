//! Durable binding between a chat identity and an assistant conversation thread.
//!
//! - **ChatThread**: one row per chat identity; `thread_id` is opaque and issued by the assistant API.
//! - **put** is a strict insert: a second `put` for the same chat fails with [`StoreError::AlreadyExists`].
//! - **get** distinguishes a miss ([`StoreError::NotFound`]) from storage failure ([`StoreError::Storage`]).
//! - **remove** is idempotent.

mod memory;
mod sqlite;
mod store;

pub use memory::InMemoryChatThreadStore;
pub use sqlite::SqliteChatThreadStore;
pub use store::{ChatId, ChatThread, ChatThreadStore, StoreError};
