//! The capability the dispatcher depends on, and its resolver-backed implementation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thread_store::{ChatId, ChatThreadStore};
use tracing::info;

use crate::api::AssistantApi;
use crate::client::AssistantClient;
use crate::descriptor::{load_or_create_descriptor, AssistantSpec};
use crate::error::AssistantError;
use crate::poll::{PollPolicy, TransientPollPolicy};
use crate::preprompt::load_preprompt;
use crate::resolver::ConversationResolver;

/// Ask the assistant on behalf of one chat and get its reply text.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask_personal(&self, chat_id: ChatId, text: &str) -> Result<String, AssistantError>;
}

/// Resolver + client: continues the chat's thread, creating it on first contact.
pub struct ThreadedAssistant {
    client: Arc<AssistantClient>,
    resolver: ConversationResolver,
}

impl ThreadedAssistant {
    pub fn new(client: Arc<AssistantClient>, store: Arc<dyn ChatThreadStore>) -> Self {
        Self {
            resolver: ConversationResolver::new(client.clone(), store),
            client,
        }
    }

    pub fn resolver(&self) -> &ConversationResolver {
        &self.resolver
    }

    pub fn client(&self) -> &AssistantClient {
        &self.client
    }

    pub async fn reset(&self, chat_id: ChatId) -> Result<(), AssistantError> {
        self.resolver.reset(chat_id).await
    }
}

#[async_trait]
impl Assistant for ThreadedAssistant {
    async fn ask_personal(&self, chat_id: ChatId, text: &str) -> Result<String, AssistantError> {
        let thread = self.resolver.resolve(chat_id).await?;
        self.client.ask(&thread, text).await
    }
}

/// Startup inputs for [`bootstrap`].
#[derive(Clone, Debug)]
pub struct AssistantSetup {
    pub name: String,
    pub model: String,
    pub preprompt_dir: PathBuf,
    pub descriptor_path: PathBuf,
    pub poll: PollPolicy,
    pub transient: TransientPollPolicy,
}

/// Loads the preprompt, reuses or registers the remote assistant, and wires the backend.
pub async fn bootstrap(
    api: Arc<dyn AssistantApi>,
    store: Arc<dyn ChatThreadStore>,
    setup: AssistantSetup,
) -> Result<ThreadedAssistant, AssistantError> {
    let instructions = load_preprompt(&setup.preprompt_dir)?;
    let spec = AssistantSpec {
        name: setup.name,
        model: setup.model,
        instructions,
    };
    let descriptor = load_or_create_descriptor(api.as_ref(), &setup.descriptor_path, &spec).await?;
    info!(assistant_id = %descriptor.id, "assistant ready");

    let client = AssistantClient::new(api, descriptor.id)
        .with_poll_policy(setup.poll)
        .with_transient_policy(setup.transient);
    Ok(ThreadedAssistant::new(Arc::new(client), store))
}
