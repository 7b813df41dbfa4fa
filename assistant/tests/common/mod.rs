//! Shared fakes for assistant integration tests: a scripted API and store wrappers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant::{
    AssistantApi, AssistantClient, AssistantDescriptor, AssistantError, AssistantSpec,
    AssistantThread, MessageContent, PollPolicy, Run, RunStatus, TextContent, ThreadMessage,
};
use async_trait::async_trait;
use thread_store::{ChatId, ChatThread, ChatThreadStore, StoreError};

/// Scripted [`AssistantApi`]: counts calls, replays run statuses, returns a fixed reply.
///
/// When the run script runs dry, polls report `completed`.
#[derive(Default)]
pub struct ScriptedApi {
    pub assistants_created: AtomicUsize,
    pub threads_created: AtomicUsize,
    pub threads_retrieved: AtomicUsize,
    pub runs_created: AtomicUsize,
    pub polls: AtomicUsize,
    pub latest_calls: AtomicUsize,
    pub messages: Mutex<Vec<(String, String)>>,
    pub run_script: Mutex<VecDeque<Result<RunStatus, AssistantError>>>,
    pub reply: Mutex<Option<String>>,
    pub missing_threads: Mutex<HashSet<String>>,
    pub create_delay: Duration,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(Some("hello senpai".to_string())),
            ..Self::default()
        }
    }

    pub fn with_create_delay(mut self, d: Duration) -> Self {
        self.create_delay = d;
        self
    }

    pub fn script(self, steps: Vec<Result<RunStatus, AssistantError>>) -> Self {
        *self.run_script.lock().unwrap() = steps.into();
        self
    }

    pub fn reply(self, text: Option<&str>) -> Self {
        *self.reply.lock().unwrap() = text.map(String::from);
        self
    }

    pub fn forget_thread(&self, id: &str) {
        self.missing_threads.lock().unwrap().insert(id.to_string());
    }

    pub fn count(c: &AtomicUsize) -> usize {
        c.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistantApi for ScriptedApi {
    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, AssistantError> {
        let n = self.assistants_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AssistantDescriptor {
            id: format!("asst_{}", n),
            name: Some(spec.name.clone()),
            model: Some(spec.model.clone()),
            instructions: Some(spec.instructions.clone()),
            created_at: Some(1_700_000_000),
        })
    }

    async fn create_thread(&self) -> Result<AssistantThread, AssistantError> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AssistantThread::new(format!("thread_{}", n)))
    }

    async fn retrieve_thread(&self, thread_id: &str) -> Result<AssistantThread, AssistantError> {
        self.threads_retrieved.fetch_add(1, Ordering::SeqCst);
        if self.missing_threads.lock().unwrap().contains(thread_id) {
            return Err(AssistantError::RemoteNotFound(thread_id.to_string()));
        }
        Ok(AssistantThread::new(thread_id))
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError> {
        self.messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        _assistant_id: &str,
    ) -> Result<Run, AssistantError> {
        let n = self.runs_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Run {
            id: format!("run_{}", n),
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .run_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RunStatus::Completed));
        step.map(|status| Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            last_error: None,
        })
    }

    async fn latest_message(
        &self,
        _thread_id: &str,
    ) -> Result<Option<ThreadMessage>, AssistantError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.lock().unwrap().clone().map(|value| ThreadMessage {
            id: "msg_1".to_string(),
            role: "assistant".to_string(),
            content: vec![MessageContent::Text {
                text: TextContent { value },
            }],
        }))
    }
}

/// Millisecond polling so tests finish quickly.
pub fn fast_poll(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        backoff_factor: 1.0,
        max_interval: Duration::from_millis(5),
        max_attempts,
    }
}

pub fn client(api: Arc<ScriptedApi>) -> AssistantClient {
    AssistantClient::new(api, "asst_test").with_poll_policy(fast_poll(20))
}

/// In-memory store that counts `get` calls per chat and can fail on demand.
#[derive(Default)]
pub struct CountingStore {
    rows: Mutex<HashMap<ChatId, String>>,
    pub gets: Mutex<HashMap<ChatId, usize>>,
    pub puts: AtomicUsize,
    pub fail_gets_with: Mutex<Option<String>>,
}

impl CountingStore {
    pub fn with_row(self, chat_id: ChatId, thread_id: &str) -> Self {
        self.rows.lock().unwrap().insert(chat_id, thread_id.to_string());
        self
    }

    pub fn gets_for(&self, chat_id: ChatId) -> usize {
        self.gets.lock().unwrap().get(&chat_id).copied().unwrap_or(0)
    }

    pub fn thread_for(&self, chat_id: ChatId) -> Option<String> {
        self.rows.lock().unwrap().get(&chat_id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatThreadStore for CountingStore {
    async fn put(&self, chat_id: ChatId, thread_id: &str) -> Result<ChatThread, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
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
        *self.gets.lock().unwrap().entry(chat_id).or_default() += 1;
        if let Some(msg) = self.fail_gets_with.lock().unwrap().clone() {
            return Err(StoreError::Storage(msg));
        }
        self.rows
            .lock()
            .unwrap()
            .get(&chat_id)
            .map(|t| ChatThread {
                chat_id,
                thread_id: t.clone(),
            })
            .ok_or(StoreError::NotFound(chat_id))
    }

    async fn remove(&self, chat_id: ChatId) -> Result<(), StoreError> {
        self.rows.lock().unwrap().remove(&chat_id);
        Ok(())
    }
}
