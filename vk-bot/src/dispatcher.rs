//! Classifies inbound messages, asks the assistant, and sends the reply.
//!
//! Every message is handled on its own task so the callback can be
//! acknowledged immediately. Ordering between messages is not preserved.

use std::sync::Arc;
use std::time::Duration;

use assistant::{Assistant, ChatId};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::event::VkMessage;
use crate::transport::{OutgoingMessage, Transport};

/// VK numbers group conversations as `2_000_000_000 + chat_id`.
pub const GROUP_CHAT_OFFSET: i64 = 2_000_000_000;

/// Where a message came from and how the reply must be addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Personal { user_id: i64 },
    Group { chat_id: i64, reply_to: i64 },
}

impl Route {
    /// Key for the chat's conversation thread.
    pub fn chat_id(&self) -> ChatId {
        match *self {
            Route::Personal { user_id } => user_id,
            Route::Group { chat_id, .. } => chat_id,
        }
    }

    pub fn reply(&self, text: String) -> OutgoingMessage {
        match *self {
            Route::Personal { user_id } => OutgoingMessage::User { user_id, text },
            Route::Group { chat_id, reply_to } => OutgoingMessage::Chat {
                chat_id,
                reply_to,
                text,
            },
        }
    }
}

/// Returns `None` for messages the bot stays silent on: empty text, or a
/// group message that mentions none of the triggers.
pub fn classify(message: &VkMessage, triggers: &[String]) -> Option<Route> {
    if message.text.trim().is_empty() {
        return None;
    }
    if message.peer_id == message.from_id {
        return Some(Route::Personal {
            user_id: message.from_id,
        });
    }
    if !mentions_trigger(&message.text, triggers) {
        return None;
    }
    Some(Route::Group {
        chat_id: message.peer_id - GROUP_CHAT_OFFSET,
        reply_to: message.id,
    })
}

fn mentions_trigger(text: &str, triggers: &[String]) -> bool {
    triggers
        .iter()
        .filter(|t| !t.is_empty())
        .any(|t| text.contains(t.as_str()))
}

/// Result of handling one message, mostly for tests and logs.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Replied,
    AssistantFailed,
    TimedOut,
    SendFailed,
}

pub struct Dispatcher {
    assistant: Arc<dyn Assistant>,
    transport: Arc<dyn Transport>,
    triggers: Vec<String>,
    request_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        assistant: Arc<dyn Assistant>,
        transport: Arc<dyn Transport>,
        triggers: Vec<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            assistant,
            transport,
            triggers,
            request_timeout,
        }
    }

    /// Spawns [`Dispatcher::handle`] and returns at once.
    pub fn dispatch(self: &Arc<Self>, message: VkMessage) -> JoinHandle<Outcome> {
        let this = Arc::clone(self);
        let span = info_span!(
            "message",
            message_id = message.id,
            peer_id = message.peer_id,
            chat_id = tracing::field::Empty
        );
        tokio::spawn(async move { this.handle(message).await }.instrument(span))
    }

    pub async fn handle(&self, message: VkMessage) -> Outcome {
        let Some(route) = classify(&message, &self.triggers) else {
            debug!("message ignored");
            return Outcome::Ignored;
        };
        let chat_id = route.chat_id();
        Span::current().record("chat_id", chat_id);
        let asked = tokio::time::timeout(
            self.request_timeout,
            self.assistant.ask_personal(chat_id, &message.text),
        )
        .await;
        let reply = match asked {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!(chat_id, error = %e, "assistant request failed");
                return Outcome::AssistantFailed;
            }
            Err(_) => {
                warn!(
                    chat_id,
                    timeout_secs = self.request_timeout.as_secs(),
                    "assistant request timed out"
                );
                return Outcome::TimedOut;
            }
        };
        match self.transport.send(&route.reply(reply)).await {
            Ok(()) => {
                info!(chat_id, "reply sent");
                Outcome::Replied
            }
            Err(e) => {
                error!(chat_id, error = %e, "send failed");
                Outcome::SendFailed
            }
        }
    }
}
