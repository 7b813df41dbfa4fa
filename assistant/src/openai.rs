//! OpenAI Assistants v2 over plain HTTP (reqwest), no SDK.
//!
//! Endpoints: `POST /assistants`, `POST /threads`, `GET /threads/{id}`,
//! `POST /threads/{id}/messages`, `POST /threads/{id}/runs`, `GET /threads/{id}/runs/{run}`,
//! `GET /threads/{id}/messages?order=desc&limit=1`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

use crate::api::AssistantApi;
use crate::descriptor::AssistantSpec;
use crate::error::AssistantError;
use crate::types::{AssistantDescriptor, AssistantThread, Run, ThreadMessage};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for the Assistants endpoints. `base_url` may point at any compatible server.
pub struct OpenAiAssistants {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

impl OpenAiAssistants {
    /// Builds a client with bearer auth and the `OpenAI-Beta: assistants=v2` header.
    pub fn new(api_key: &str, base_url: impl Into<String>) -> Result<Self, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("openai-beta", HeaderValue::from_static("assistants=v2"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AssistantError::Http("api key is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn api_error(resp: Response) -> AssistantError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        AssistantError::Api { status, message }
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, AssistantError> {
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistants {
    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantDescriptor, AssistantError> {
        debug!(name = %spec.name, model = %spec.model, "creating remote assistant");
        let resp = self
            .http
            .post(self.url("assistants"))
            .json(&json!({
                "model": spec.model,
                "name": spec.name,
                "instructions": spec.instructions,
            }))
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn create_thread(&self) -> Result<AssistantThread, AssistantError> {
        let resp = self
            .http
            .post(self.url("threads"))
            .json(&json!({}))
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn retrieve_thread(&self, thread_id: &str) -> Result<AssistantThread, AssistantError> {
        let resp = self
            .http
            .get(self.url(&format!("threads/{}", thread_id)))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AssistantError::RemoteNotFound(thread_id.to_string()));
        }
        Self::parse(resp).await
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError> {
        let resp = self
            .http
            .post(self.url(&format!("threads/{}/messages", thread_id)))
            .json(&json!({ "role": "user", "content": text }))
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(resp).await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<Run, AssistantError> {
        let resp = self
            .http
            .post(self.url(&format!("threads/{}/runs", thread_id)))
            .json(&json!({ "assistant_id": assistant_id }))
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let resp = self
            .http
            .get(self.url(&format!("threads/{}/runs/{}", thread_id, run_id)))
            .send()
            .await?;
        let run: Run = Self::parse(resp).await?;
        trace!(run_id, status = %run.status, "run polled");
        Ok(run)
    }

    async fn latest_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<ThreadMessage>, AssistantError> {
        let resp = self
            .http
            .get(self.url(&format!("threads/{}/messages", thread_id)))
            .query(&[("order", "desc"), ("limit", "1")])
            .send()
            .await?;
        let list: MessageList = Self::parse(resp).await?;
        Ok(list.data.into_iter().next())
    }
}
