use std::env;
use std::num::ParseIntError;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const SYSTEM_PROMPT: &str =
    "You are an expert Go and Next.js developer. Always provide code examples.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT value {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Read-only process configuration, built once at startup and handed to the
/// router state.
///
/// A missing `api_key` is not a startup error; requests fail with a server
/// misconfiguration instead.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match non_empty("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let base_url = non_empty("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_empty("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            port,
            api_key: non_empty("GROQ_API_KEY"),
            base_url,
            model,
            system_prompt: SYSTEM_PROMPT.to_string(),
        })
    }
}
