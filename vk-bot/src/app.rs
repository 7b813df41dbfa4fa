//! Axum app: state, router and the handlers.
//!
//! Routes:
//! - `POST /callback`: VK expects the literal body `ok` for every event it
//!   delivers, and the confirmation key for the `confirmation` event.
//! - `POST /admin/reset/:chat_id`: forgets a chat's thread in the running
//!   process (store row and cached handle). Needs `vk.secret` in the
//!   [`ADMIN_SECRET_HEADER`] header; disabled when no secret is configured.

use std::sync::Arc;

use assistant::{AssistantError, ChatId, ThreadedAssistant};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::event::CallbackEvent;

pub const CALLBACK_PATH: &str = "/callback";
pub const ADMIN_RESET_PATH: &str = "/admin/reset/:chat_id";
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Drops a chat's conversation so its next message starts a new thread.
#[async_trait]
pub trait ConversationReset: Send + Sync {
    async fn reset(&self, chat_id: ChatId) -> Result<(), AssistantError>;
}

#[async_trait]
impl ConversationReset for ThreadedAssistant {
    async fn reset(&self, chat_id: ChatId) -> Result<(), AssistantError> {
        ThreadedAssistant::reset(self, chat_id).await
    }
}

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Same backend the dispatcher asks, so a reset also clears its cache.
    pub conversations: Arc<dyn ConversationReset>,
    /// Returned verbatim for `confirmation` events.
    pub confirmation_key: String,
    /// When set, events carrying another secret are rejected.
    pub secret: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CALLBACK_PATH, post(callback))
        .route(ADMIN_RESET_PATH, post(admin_reset))
        .with_state(state)
}

async fn admin_reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(chat_id): Path<ChatId>,
) -> Response {
    let Some(expected) = state.secret.as_deref() else {
        warn!(chat_id, "admin reset refused: no secret configured");
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    };
    let given = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if given != Some(expected) {
        warn!(chat_id, "admin reset secret mismatch");
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    }
    match state.conversations.reset(chat_id).await {
        Ok(()) => {
            info!(chat_id, "admin reset done");
            "ok".into_response()
        }
        Err(e) => {
            error!(chat_id, error = %e, "admin reset failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn callback(State(state): State<Arc<AppState>>, Json(event): Json<CallbackEvent>) -> Response {
    if let Some(expected) = state.secret.as_deref() {
        if event.secret.as_deref() != Some(expected) {
            warn!(group_id = event.group_id, kind = %event.kind, "callback secret mismatch");
            return (StatusCode::FORBIDDEN, "forbidden").into_response();
        }
    }
    match event.kind.as_str() {
        CallbackEvent::CONFIRMATION => state.confirmation_key.clone().into_response(),
        CallbackEvent::MESSAGE_NEW => {
            match event.message() {
                Ok(message) => {
                    state.dispatcher.dispatch(message);
                }
                Err(e) => warn!(error = %e, "malformed message_new payload"),
            }
            "ok".into_response()
        }
        other => {
            debug!(kind = other, "callback event ignored");
            "ok".into_response()
        }
    }
}
