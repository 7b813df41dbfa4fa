//! VK Callback API front end for the assistant.
//!
//! Inbound `message_new` events are classified ([`classify`]), answered through
//! an [`assistant::Assistant`] on a spawned task, and replied via a [`Transport`].
//!
//! **Public API**: [`serve`], [`build_state`], [`router`], [`Dispatcher`], [`VkTransport`].

mod app;
mod dispatcher;
mod event;
mod service;
mod transport;

pub use app::{
    router, AppState, ConversationReset, ADMIN_RESET_PATH, ADMIN_SECRET_HEADER, CALLBACK_PATH,
};
pub use dispatcher::{classify, Dispatcher, Outcome, Route, GROUP_CHAT_OFFSET};
pub use event::{CallbackEvent, VkMessage};
pub use service::{
    build_state, local_admin_url, poll_policy, request_reset, reset_chat_offline, serve,
    serve_on_listener, transient_policy,
};
pub use transport::{OutgoingMessage, Transport, TransportError, VkTransport};
