//! Remote Assistants API surface. Abstraction for testing.

use async_trait::async_trait;

use crate::descriptor::AssistantSpec;
use crate::error::AssistantError;
use crate::types::{AssistantDescriptor, AssistantThread, Run, ThreadMessage};

/// Calls against the hosted assistant service.
///
/// Implementations: [`crate::OpenAiAssistants`] (HTTP). Thread retrieval must map a
/// missing thread to [`AssistantError::RemoteNotFound`].
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Registers a new assistant (name, model, instructions).
    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, AssistantError>;

    async fn create_thread(&self) -> Result<AssistantThread, AssistantError>;

    async fn retrieve_thread(&self, thread_id: &str) -> Result<AssistantThread, AssistantError>;

    /// Appends a user message to the thread.
    async fn create_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError>;

    /// Starts a run of `assistant_id` on the thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str)
        -> Result<Run, AssistantError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError>;

    /// Most recent message on the thread, if any.
    async fn latest_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<ThreadMessage>, AssistantError>;
}
