//! Errors for assistant calls, thread resolution and run polling.

use thiserror::Error;
use thread_store::StoreError;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// The remote service no longer knows the thread (expired or deleted upstream).
    #[error("remote thread not found: {0}")]
    RemoteNotFound(String),
    #[error("run {run_id} ended with status {status}: {reason}")]
    RunFailed {
        run_id: String,
        status: String,
        reason: String,
    },
    #[error("run {run_id} not finished after {attempts} polls")]
    RunTimeout { run_id: String, attempts: u32 },
    /// Polling kept failing and the policy says to surface it.
    #[error("polling run status: {0}")]
    TransientPoll(String),
    #[error("thread {0} has no text reply")]
    EmptyReply(String),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("http: {0}")]
    Http(String),
    #[error("decode response: {0}")]
    Decode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("assistant descriptor: {0}")]
    Descriptor(String),
    #[error("preprompt: {0}")]
    Preprompt(String),
}

impl AssistantError {
    /// Network failures, rate limits and 5xx responses; worth another poll.
    pub fn is_transient(&self) -> bool {
        match self {
            AssistantError::Http(_) => true,
            AssistantError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AssistantError::Decode(e.to_string())
        } else {
            AssistantError::Http(e.to_string())
        }
    }
}
