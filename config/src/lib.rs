//! Configuration for the VK assistant bot.
//!
//! - [`load_and_apply`]: layer XDG `config.toml` and project `.env` into the process
//!   environment with priority **existing env > .env > XDG**.
//! - [`BotConfig`]: the JSON config file (listener address, VK and OpenAI credentials,
//!   polling policy). Secrets left empty in JSON are read from the environment.
//! - [`init_tracing`] (feature `tracing-init`): shared subscriber setup for the binary.

mod bot;
#[cfg(feature = "tracing-init")]
mod tracing_init;
mod xdg_toml;

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

pub use bot::{
    BotConfig, ConfigError, OpenAiSection, PollingSection, TransientFallbackMode, VkSection,
};
#[cfg(feature = "tracing-init")]
pub use tracing_init::{init_tracing, TracingGuard, TracingInitError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(dotenv::Error),
}

/// Reads `.env` from `override_dir` (or the current directory). Missing file yields an empty map.
fn dotenv_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(d) => d,
            Err(_) => return Ok(HashMap::new()),
        },
    };
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let iter = dotenv::from_path_iter(&path).map_err(LoadError::DotenvRead)?;
    iter.collect::<Result<HashMap<_, _>, _>>()
        .map_err(LoadError::DotenvRead)
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set.
///
/// * `app_name`: used for the XDG path `~/.config/<app_name>/config.toml`.
/// * `override_dir`: if `Some`, look for `.env` there instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv_map(override_dir)?;
    apply_layers(&dotenv_map, &xdg_map);
    Ok(())
}

fn apply_layers(dotenv_map: &HashMap<String, String>, xdg_map: &HashMap<String, String>) {
    let mut keys: std::collections::HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var(key).is_ok() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }
}
