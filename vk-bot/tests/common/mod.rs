#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant::{
    Assistant, AssistantApi, AssistantClient, AssistantDescriptor, AssistantError, AssistantSpec,
    AssistantThread, ChatId, MessageContent, PollPolicy, Run, RunError, RunStatus, TextContent,
    ThreadMessage, ThreadedAssistant,
};
use async_trait::async_trait;
use thread_store::ChatThreadStore;
use vk_bot::{ConversationReset, Dispatcher, OutgoingMessage, Transport, TransportError};

pub enum Behaviour {
    Echo,
    Fail,
    Hang,
}

/// Replies `re: <text>`, fails with a failed run, or never answers.
pub struct FakeAssistant {
    behaviour: Behaviour,
    pub asked: Mutex<Vec<(ChatId, String)>>,
    pub resets: Mutex<Vec<ChatId>>,
}

impl FakeAssistant {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            asked: Mutex::new(Vec::new()),
            resets: Mutex::new(Vec::new()),
        })
    }

    pub fn asked(&self) -> Vec<(ChatId, String)> {
        self.asked.lock().unwrap().clone()
    }

    pub fn resets(&self) -> Vec<ChatId> {
        self.resets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationReset for FakeAssistant {
    async fn reset(&self, chat_id: ChatId) -> Result<(), AssistantError> {
        self.resets.lock().unwrap().push(chat_id);
        Ok(())
    }
}

#[async_trait]
impl Assistant for FakeAssistant {
    async fn ask_personal(&self, chat_id: ChatId, text: &str) -> Result<String, AssistantError> {
        self.asked.lock().unwrap().push((chat_id, text.to_string()));
        match self.behaviour {
            Behaviour::Echo => Ok(format!("re: {}", text)),
            Behaviour::Fail => Err(AssistantError::RunFailed {
                run_id: "run_1".into(),
                status: "failed".into(),
                reason: "server_error".into(),
            }),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("too late".into())
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutgoingMessage>>,
    pub fail: bool,
    pub attempts: AtomicUsize,
}

impl RecordingTransport {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TransportError::Api {
                code: 901,
                message: "can't send messages for users without permission".into(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub const TRIGGER: &str = "[club7|@nagatoro]";

pub fn dispatcher(
    assistant: Arc<dyn Assistant>,
    transport: Arc<RecordingTransport>,
    timeout: Duration,
) -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(
        assistant,
        transport,
        vec![TRIGGER.to_string()],
        timeout,
    ))
}

/// Assistants API double: threads `thread_{n}`, runs walk through `script`
/// (then `completed`), replies with `reply`.
pub struct ScriptedApi {
    pub threads_created: AtomicUsize,
    pub polls: AtomicUsize,
    pub messages: Mutex<Vec<(String, String)>>,
    pub script: Mutex<VecDeque<RunStatus>>,
    pub reply: String,
}

impl ScriptedApi {
    pub fn new(script: Vec<RunStatus>, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            threads_created: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
            script: Mutex::new(script.into()),
            reply: reply.to_string(),
        })
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistantApi for ScriptedApi {
    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, AssistantError> {
        Ok(AssistantDescriptor {
            id: "asst_1".into(),
            name: Some(spec.name.clone()),
            model: Some(spec.model.clone()),
            instructions: Some(spec.instructions.clone()),
            created_at: None,
        })
    }

    async fn create_thread(&self) -> Result<AssistantThread, AssistantError> {
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AssistantThread::new(format!("thread_{}", n)))
    }

    async fn retrieve_thread(&self, thread_id: &str) -> Result<AssistantThread, AssistantError> {
        Ok(AssistantThread::new(thread_id))
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError> {
        self.messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, _assistant_id: &str) -> Result<Run, AssistantError> {
        Ok(Run {
            id: "run_1".into(),
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RunStatus::Completed);
        let last_error = (status == RunStatus::Failed).then(|| RunError {
            code: Some("server_error".into()),
            message: Some("Sorry, something went wrong.".into()),
        });
        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            last_error,
        })
    }

    async fn latest_message(
        &self,
        _thread_id: &str,
    ) -> Result<Option<ThreadMessage>, AssistantError> {
        Ok(Some(ThreadMessage {
            id: "msg_1".into(),
            role: "assistant".into(),
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: self.reply.clone(),
                },
            }],
        }))
    }
}

/// Resolver-backed assistant over `api` and `store`, polling every millisecond.
pub fn threaded(api: Arc<ScriptedApi>, store: Arc<dyn ChatThreadStore>) -> Arc<ThreadedAssistant> {
    let client = AssistantClient::new(api, "asst_1").with_poll_policy(PollPolicy {
        interval: Duration::from_millis(1),
        backoff_factor: 1.0,
        max_interval: Duration::from_millis(5),
        max_attempts: 50,
    });
    Arc::new(ThreadedAssistant::new(Arc::new(client), store))
}
