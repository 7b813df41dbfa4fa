//! JSON bot config: read once at startup, no hot-reload.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing {0} (set it in the config file or the {1} env var)")]
    MissingSecret(&'static str, &'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level bot configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Address the VK callback listener binds to.
    pub address: String,
    /// Directory holding `init.txt` (assistant instructions).
    pub preprompt_dir: PathBuf,
    /// SQLite file for chat -> thread bindings.
    pub database_path: PathBuf,
    /// Saved remote assistant descriptor, reused across restarts.
    pub descriptor_path: PathBuf,
    /// Upper bound for handling one inbound message, in seconds.
    pub request_timeout_secs: u64,
    pub vk: VkSection,
    pub openai: OpenAiSection,
    pub polling: PollingSection,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
            preprompt_dir: PathBuf::from("preprompts/ru"),
            database_path: PathBuf::from("storage.db"),
            descriptor_path: PathBuf::from("assistant.json"),
            request_timeout_secs: 3600,
            vk: VkSection::default(),
            openai: OpenAiSection::default(),
            polling: PollingSection::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VkSection {
    pub group_api_key: String,
    /// String VK expects back on the `confirmation` callback.
    pub confirmation_key: String,
    /// Callback secret; when set, events carrying another secret are rejected.
    pub secret: Option<String>,
    /// Substrings that make the bot answer in a group chat.
    pub group_chat_triggers: Vec<String>,
    pub api_version: String,
    pub api_base_url: String,
}

impl Default for VkSection {
    fn default() -> Self {
        Self {
            group_api_key: String::new(),
            confirmation_key: String::new(),
            secret: None,
            group_chat_triggers: Vec::new(),
            api_version: "5.199".to_string(),
            api_base_url: "https://api.vk.com/method".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSection {
    pub api_token: String,
    pub assistant_name: String,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiSection {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            assistant_name: "Hayase Nagatoro".to_string(),
            model: "gpt-4-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// What to do once transient poll failures exhaust their retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientFallbackMode {
    /// Reply with `apology_text` as if it were the assistant's answer.
    Apology,
    /// Surface the error; no reply is sent.
    Fail,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSection {
    pub interval_ms: u64,
    pub backoff_factor: f64,
    pub max_interval_ms: u64,
    pub max_attempts: u32,
    pub transient_retries: u32,
    pub transient_fallback: TransientFallbackMode,
    pub apology_text: String,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            backoff_factor: 1.0,
            max_interval_ms: 30_000,
            max_attempts: 1200,
            transient_retries: 0,
            transient_fallback: TransientFallbackMode::Apology,
            apology_text: "Senpai, leave me alone for a bit".to_string(),
        }
    }
}

fn fill_from_env(slot: &mut String, key: &str) {
    if slot.trim().is_empty() {
        if let Ok(v) = std::env::var(key) {
            *slot = v;
        }
    }
}

impl BotConfig {
    /// Reads the JSON file, fills empty secrets from the environment, and validates.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`BotConfig::from_path`] without validation, for commands that only touch storage.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&content)?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// `OPENAI_API_KEY`, `VK_GROUP_API_KEY`, `VK_CONFIRMATION_KEY` fill empty fields.
    pub fn apply_env_fallbacks(&mut self) {
        fill_from_env(&mut self.openai.api_token, "OPENAI_API_KEY");
        fill_from_env(&mut self.vk.group_api_key, "VK_GROUP_API_KEY");
        fill_from_env(&mut self.vk.confirmation_key, "VK_CONFIRMATION_KEY");
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_token.trim().is_empty() {
            return Err(ConfigError::MissingSecret("openai.api_token", "OPENAI_API_KEY"));
        }
        if self.vk.group_api_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret("vk.group_api_key", "VK_GROUP_API_KEY"));
        }
        if self.vk.confirmation_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret(
                "vk.confirmation_key",
                "VK_CONFIRMATION_KEY",
            ));
        }
        if self.vk.group_chat_triggers.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "vk.group_chat_triggers needs at least one non-empty token".into(),
            ));
        }
        let p = &self.polling;
        if p.interval_ms == 0 || p.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_ms and polling.max_attempts must be > 0".into(),
            ));
        }
        if p.backoff_factor.is_nan() || p.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid("polling.backoff_factor must be >= 1.0".into()));
        }
        if p.max_interval_ms < p.interval_ms {
            return Err(ConfigError::Invalid(
                "polling.max_interval_ms must be >= polling.interval_ms".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}
