//! Assistant client: thread calls plus the message -> run -> poll -> reply exchange.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::api::AssistantApi;
use crate::error::AssistantError;
use crate::poll::{PollPolicy, TransientFallback, TransientPollPolicy};
use crate::types::{AssistantThread, Run, RunStatus};

/// How a poll loop ended without an error.
enum PollOutcome {
    Finished(Run),
    /// Transient failures exhausted; reply with this text.
    SoftReply(String),
}

/// Wraps an [`AssistantApi`] bound to one registered assistant.
pub struct AssistantClient {
    api: Arc<dyn AssistantApi>,
    assistant_id: String,
    poll: PollPolicy,
    transient: TransientPollPolicy,
}

impl AssistantClient {
    pub fn new(api: Arc<dyn AssistantApi>, assistant_id: impl Into<String>) -> Self {
        Self {
            api,
            assistant_id: assistant_id.into(),
            poll: PollPolicy::default(),
            transient: TransientPollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_transient_policy(mut self, transient: TransientPollPolicy) -> Self {
        self.transient = transient;
        self
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub async fn create_thread(&self) -> Result<AssistantThread, AssistantError> {
        let thread = self.api.create_thread().await?;
        info!(thread_id = %thread.id, "created assistant thread");
        Ok(thread)
    }

    /// Fails with [`AssistantError::RemoteNotFound`] when the service dropped the thread.
    pub async fn retrieve_thread(&self, thread_id: &str) -> Result<AssistantThread, AssistantError> {
        self.api.retrieve_thread(thread_id).await
    }

    /// Sends `text` on `thread`, runs the assistant and waits for its reply.
    ///
    /// A run that ends in any non-`completed` terminal status yields
    /// [`AssistantError::RunFailed`]. Transient polling failures follow the
    /// [`TransientPollPolicy`], which may turn them into a soft reply.
    #[instrument(level = "debug", skip_all, fields(thread_id = %thread.id))]
    pub async fn ask(&self, thread: &AssistantThread, text: &str) -> Result<String, AssistantError> {
        self.api.create_message(&thread.id, text).await?;
        let run = self.api.create_run(&thread.id, &self.assistant_id).await?;
        debug!(run_id = %run.id, status = %run.status, "run started");

        let run = match self.wait_for_run(&thread.id, &run.id).await? {
            PollOutcome::Finished(run) => run,
            PollOutcome::SoftReply(text) => return Ok(text),
        };

        if run.status != RunStatus::Completed {
            return Err(AssistantError::RunFailed {
                reason: run.failure_reason(),
                status: run.status.to_string(),
                run_id: run.id,
            });
        }

        let message = self
            .api
            .latest_message(&thread.id)
            .await?
            .ok_or_else(|| AssistantError::EmptyReply(thread.id.clone()))?;
        match message.text() {
            Some(reply) => Ok(reply.to_string()),
            None => Err(AssistantError::EmptyReply(thread.id.clone())),
        }
    }

    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<PollOutcome, AssistantError> {
        let mut failures = 0u32;
        let mut attempts = 0u32;
        for delay in self.poll.delays() {
            tokio::time::sleep(delay).await;
            attempts += 1;
            match self.api.retrieve_run(thread_id, run_id).await {
                Ok(run) if run.status.is_terminal() => {
                    debug!(run_id, status = %run.status, attempts, "run finished");
                    return Ok(PollOutcome::Finished(run));
                }
                Ok(_) => failures = 0,
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if failures <= self.transient.retries {
                        warn!(run_id, error = %e, failures, "run poll failed, retrying");
                        continue;
                    }
                    return match &self.transient.fallback {
                        TransientFallback::Apology(text) => {
                            warn!(run_id, error = %e, "run poll failed, replying with apology");
                            Ok(PollOutcome::SoftReply(text.clone()))
                        }
                        TransientFallback::Fail => Err(AssistantError::TransientPoll(e.to_string())),
                    };
                }
                Err(e) => return Err(e),
            }
        }
        Err(AssistantError::RunTimeout {
            run_id: run_id.to_string(),
            attempts,
        })
    }
}
