//! VK Callback API payloads.
//!
//! Only the fields the bot consumes are modelled; everything else in the
//! callback body is ignored.

use serde::Deserialize;

/// Envelope of every callback VK posts to the server.
#[derive(Clone, Debug, Deserialize)]
pub struct CallbackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub group_id: i64,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub object: serde_json::Value,
}

impl CallbackEvent {
    pub const CONFIRMATION: &'static str = "confirmation";
    pub const MESSAGE_NEW: &'static str = "message_new";

    /// Decodes `object` of a `message_new` event.
    pub fn message(&self) -> Result<VkMessage, serde_json::Error> {
        let wrapped: MessageNew = serde_json::from_value(self.object.clone())?;
        Ok(wrapped.message)
    }
}

#[derive(Deserialize)]
struct MessageNew {
    message: VkMessage,
}

/// Inbound message as delivered in `message_new`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VkMessage {
    #[serde(default)]
    pub id: i64,
    pub from_id: i64,
    pub peer_id: i64,
    #[serde(default)]
    pub text: String,
}
