//! Outbound side: sending replies through VK `messages.send`.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// A reply addressed either to a user directly or into a group chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingMessage {
    User { user_id: i64, text: String },
    Chat { chat_id: i64, reply_to: i64, text: String },
}

impl OutgoingMessage {
    pub fn text(&self) -> &str {
        match self {
            OutgoingMessage::User { text, .. } | OutgoingMessage::Chat { text, .. } => text,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("vk api error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Sends one outgoing message. Failures are logged by the caller, never retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

#[derive(Deserialize)]
struct VkResponse {
    #[serde(default)]
    response: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<VkError>,
}

#[derive(Deserialize)]
struct VkError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// VK API transport using the group access token.
pub struct VkTransport {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    api_version: String,
}

impl VkTransport {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    fn form(&self, message: &OutgoingMessage) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("access_token", self.access_token.clone()),
            ("v", self.api_version.clone()),
            ("random_id", rand::random::<i32>().to_string()),
            ("message", message.text().to_string()),
        ];
        match message {
            OutgoingMessage::User { user_id, .. } => form.push(("user_id", user_id.to_string())),
            OutgoingMessage::Chat {
                chat_id, reply_to, ..
            } => {
                form.push(("chat_id", chat_id.to_string()));
                form.push(("reply_to", reply_to.to_string()));
            }
        }
        form
    }
}

#[async_trait]
impl Transport for VkTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let url = format!("{}/messages.send", self.base_url);
        let body: VkResponse = self
            .http
            .post(&url)
            .form(&self.form(message))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(err) = body.error {
            return Err(TransportError::Api {
                code: err.error_code,
                message: err.error_msg,
            });
        }
        match body.response {
            Some(id) => {
                debug!(message_id = %id, "vk message sent");
                Ok(())
            }
            None => Err(TransportError::Decode(
                "neither response nor error in messages.send reply".into(),
            )),
        }
    }
}
