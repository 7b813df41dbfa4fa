//! Wiring from [`BotConfig`] to a running callback server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use assistant::{
    bootstrap, AssistantSetup, OpenAiAssistants, PollPolicy, ThreadedAssistant,
    TransientFallback, TransientPollPolicy,
};
use config::{BotConfig, PollingSection, TransientFallbackMode};
use thread_store::{ChatId, ChatThreadStore, SqliteChatThreadStore};
use tokio::net::TcpListener;
use tracing::info;

use crate::app::{router, AppState, ADMIN_SECRET_HEADER};
use crate::dispatcher::Dispatcher;
use crate::transport::{Transport, VkTransport};

pub fn poll_policy(polling: &PollingSection) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(polling.interval_ms),
        backoff_factor: polling.backoff_factor,
        max_interval: Duration::from_millis(polling.max_interval_ms),
        max_attempts: polling.max_attempts,
    }
}

pub fn transient_policy(polling: &PollingSection) -> TransientPollPolicy {
    TransientPollPolicy {
        retries: polling.transient_retries,
        fallback: match polling.transient_fallback {
            TransientFallbackMode::Apology => {
                TransientFallback::Apology(polling.apology_text.clone())
            }
            TransientFallbackMode::Fail => TransientFallback::Fail,
        },
    }
}

fn open_store(path: &Path) -> anyhow::Result<Arc<dyn ChatThreadStore>> {
    let store = SqliteChatThreadStore::new(path)
        .with_context(|| format!("open thread store {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Opens the store, registers or reuses the assistant, and builds the dispatcher.
pub async fn build_state(config: &BotConfig) -> anyhow::Result<Arc<AppState>> {
    let store = open_store(&config.database_path)?;
    let api = OpenAiAssistants::new(&config.openai.api_token, config.openai.base_url.clone())
        .context("build assistants client")?;
    let setup = AssistantSetup {
        name: config.openai.assistant_name.clone(),
        model: config.openai.model.clone(),
        preprompt_dir: config.preprompt_dir.clone(),
        descriptor_path: config.descriptor_path.clone(),
        poll: poll_policy(&config.polling),
        transient: transient_policy(&config.polling),
    };
    let backend: Arc<ThreadedAssistant> = Arc::new(
        bootstrap(Arc::new(api), store, setup)
            .await
            .context("assistant bootstrap")?,
    );
    info!(assistant_id = backend.client().assistant_id(), "assistant ready");

    let transport: Arc<dyn Transport> = Arc::new(VkTransport::new(
        config.vk.api_base_url.clone(),
        config.vk.group_api_key.clone(),
        config.vk.api_version.clone(),
    ));
    let dispatcher = Dispatcher::new(
        backend.clone(),
        transport,
        config.vk.group_chat_triggers.clone(),
        Duration::from_secs(config.request_timeout_secs),
    );
    Ok(Arc::new(AppState {
        dispatcher: Arc::new(dispatcher),
        conversations: backend,
        confirmation_key: config.vk.confirmation_key.clone(),
        secret: config.vk.secret.clone().filter(|s| !s.is_empty()),
    }))
}

/// Serves the callback route on `listener` until `shutdown` resolves.
pub async fn serve_on_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("VK callback server listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}

pub async fn serve(config: &BotConfig) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let listener = TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("bind {}", config.address))?;
    serve_on_listener(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("ctrl-c received, shutting down");
    }
}

/// Base URL a local CLI uses to reach the server bound at `address`.
///
/// Wildcard binds (`0.0.0.0`, `::`) are reached over loopback.
pub fn local_admin_url(address: &str) -> String {
    match address.parse::<SocketAddr>() {
        Ok(addr) if addr.ip().is_unspecified() => {
            let loopback = if addr.is_ipv4() { "127.0.0.1" } else { "[::1]" };
            format!("http://{}:{}", loopback, addr.port())
        }
        Ok(addr) => format!("http://{}", addr),
        Err(_) => format!("http://{}", address),
    }
}

/// Asks a running server to reset `chat_id`, clearing both its store row and
/// its cached thread.
pub async fn request_reset(base_url: &str, secret: &str, chat_id: ChatId) -> anyhow::Result<()> {
    let url = format!("{}/admin/reset/{}", base_url.trim_end_matches('/'), chat_id);
    let res = reqwest::Client::new()
        .post(&url)
        .header(ADMIN_SECRET_HEADER, secret)
        .send()
        .await
        .with_context(|| format!("POST {}", url))?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        anyhow::bail!("reset chat {} refused with {}: {}", chat_id, status, body);
    }
    info!(chat_id, "chat reset by server");
    Ok(())
}

/// Deletes the durable chat -> thread record directly in the database.
///
/// Only for a stopped server: a running one would keep answering on its
/// cached thread. Use [`request_reset`] otherwise.
pub async fn reset_chat_offline(database_path: &Path, chat_id: ChatId) -> anyhow::Result<()> {
    let store = open_store(database_path)?;
    store
        .remove(chat_id)
        .await
        .with_context(|| format!("reset chat {}", chat_id))?;
    info!(chat_id, "chat thread binding removed");
    Ok(())
}
