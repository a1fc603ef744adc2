//! Session configuration.
//!
//! Values come from the process environment (after loading an optional
//! `.env` file) and fall back to defaults. The persona prompt is one opaque
//! parameter forwarded to the chat endpoint.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;
use validator::Validate;

use crate::error::AppError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";

/// Configuration for one chat session and its transport.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ChatConfig {
    /// URL of the streaming chat endpoint.
    #[validate(url)]
    pub endpoint: String,
    /// Requests allowed per window.
    #[validate(range(min = 1))]
    pub max_requests: usize,
    /// Sliding window length in milliseconds.
    #[validate(range(min = 1))]
    pub window_ms: u64,
    /// Persona/system prompt forwarded to the endpoint, if any.
    pub persona: Option<String>,
    /// Delay between words when revealing a preset answer. 0 disables it.
    #[validate(range(max = 1000))]
    pub typing_delay_ms: u64,
    /// Timeout for the endpoint to start answering.
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    /// Maximum silence between two chunks of an answer.
    #[validate(range(min = 1))]
    pub chunk_timeout_secs: u64,
    /// JSON file with preset answers; the built-in table is used when unset.
    pub presets_path: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_requests: 10,
            window_ms: 120_000,
            persona: None,
            typing_delay_ms: 30,
            request_timeout_secs: 120,
            chunk_timeout_secs: 30,
            presets_path: None,
        }
    }
}

impl ChatConfig {
    /// Loads `.env` (if present), then reads `ZENCHAT_*` variables over the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        if let Ok(path) = dotenv::dotenv() {
            info!("Loaded environment from {:?}", path);
        }

        let defaults = Self::default();
        let config = Self {
            endpoint: env::var("ZENCHAT_ENDPOINT").unwrap_or(defaults.endpoint),
            max_requests: parse_var("ZENCHAT_MAX_REQUESTS", defaults.max_requests)?,
            window_ms: parse_var("ZENCHAT_WINDOW_MS", defaults.window_ms)?,
            persona: env::var("ZENCHAT_PERSONA").ok().filter(|p| !p.trim().is_empty()),
            typing_delay_ms: parse_var("ZENCHAT_TYPING_DELAY_MS", defaults.typing_delay_ms)?,
            request_timeout_secs: parse_var(
                "ZENCHAT_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            chunk_timeout_secs: parse_var("ZENCHAT_CHUNK_TIMEOUT_SECS", defaults.chunk_timeout_secs)?,
            presets_path: env::var_os("ZENCHAT_PRESETS").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn endpoint_url(&self) -> Result<Url, AppError> {
        Ok(Url::parse(&self.endpoint)?)
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} has invalid value {:?}: {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}
