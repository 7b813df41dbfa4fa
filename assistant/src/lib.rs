//! # assistant
//!
//! Keeps one assistant-side conversation thread per chat identity and turns the
//! asynchronous run lifecycle of the OpenAI Assistants API into a single awaited call.
//!
//! ## Main pieces
//!
//! - [`AssistantApi`]: the remote surface (assistants, threads, messages, runs). [`OpenAiAssistants`]
//!   talks HTTP; tests substitute their own implementation.
//! - [`AssistantClient`]: `create_thread`, `retrieve_thread`, and [`AssistantClient::ask`], which
//!   submits a message, starts a run and polls it to a terminal status under a [`PollPolicy`].
//! - [`ThreadCache`]: process-local chat -> live thread map.
//! - [`ConversationResolver`]: cache -> store -> create, with a per-chat lock so one chat never
//!   gets two threads.
//! - [`Assistant`]: the narrow capability the dispatcher depends on; [`ThreadedAssistant`] is the
//!   resolver + client implementation.
//! - [`bootstrap`]: startup wiring (preprompt, saved assistant descriptor).

mod api;
mod backend;
mod cache;
mod client;
mod descriptor;
mod error;
mod openai;
mod poll;
mod preprompt;
mod resolver;
mod types;

pub use api::AssistantApi;
pub use backend::{bootstrap, Assistant, AssistantSetup, ThreadedAssistant};
pub use cache::ThreadCache;
pub use client::AssistantClient;
pub use descriptor::{load_or_create_descriptor, AssistantSpec};
pub use error::AssistantError;
pub use openai::{OpenAiAssistants, DEFAULT_OPENAI_BASE_URL};
pub use poll::{PollPolicy, TransientFallback, TransientPollPolicy};
pub use preprompt::{load_preprompt, PREPROMPT_FILE};
pub use resolver::ConversationResolver;
pub use types::{
    AssistantDescriptor, AssistantThread, MessageContent, Run, RunError, RunStatus, TextContent,
    ThreadMessage,
};

pub use thread_store::ChatId;
