use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY missing in environment variables")]
    MissingApiKey,
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, read once at startup and handed to the components
/// that need it.
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub bind_host: String,
    pub port: u16,
    /// Base URL of the completion API, without trailing slash.
    pub base_url: String,
    pub model: String,
    pub http_timeout: Duration,
    /// Map upstream failure kinds to distinct statuses instead of a flat 500.
    pub distinct_upstream_status: bool,
    pub prompt_config_path: Option<String>,
}

// The API key stays out of debug output.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("http_timeout", &self.http_timeout)
            .field("distinct_upstream_status", &self.distinct_upstream_status)
            .field("prompt_config_path", &self.prompt_config_path)
            .finish()
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Environment:
    /// - OPENAI_API_KEY                        -> required
    /// - PORT                                  -> listen port (u16, default 3000)
    /// - BIND_HOST                             -> listen host (default 0.0.0.0)
    /// - OPENAI_BASE_URL                       -> completion API base URL
    /// - SKILLERBOT_MODEL                      -> model identifier
    /// - SKILLERBOT_HTTP_TIMEOUT_SECONDS       -> outbound timeout (u64)
    /// - SKILLERBOT_DISTINCT_UPSTREAM_STATUS   -> 1|true|yes|on
    /// - SKILLERBOT_PROMPT_CONFIG              -> persona override JSON path
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let port = match get("PORT") {
            Some(v) => v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: v.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let http_timeout = match get("SKILLERBOT_HTTP_TIMEOUT_SECONDS") {
            Some(v) => match v.parse::<u64>() {
                Ok(n) if n > 0 => Duration::from_secs(n),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SKILLERBOT_HTTP_TIMEOUT_SECONDS",
                        value: v,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            bind_host: get("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            port,
            base_url,
            model: get("SKILLERBOT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            http_timeout,
            distinct_upstream_status: get("SKILLERBOT_DISTINCT_UPSTREAM_STATUS")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            prompt_config_path: get("SKILLERBOT_PROMPT_CONFIG"),
        })
    }

    /// Configuration pointing at an explicit upstream, with defaults elsewhere.
    pub fn for_upstream(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: api_key.into(),
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            distinct_upstream_status: false,
            prompt_config_path: None,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "BIND_HOST",
                value: self.bind_host.clone(),
            })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Truthy flag values: 1, true, yes, on (case-insensitive).
pub fn is_truthy(v: &str) -> bool {
    let v = v.trim().to_ascii_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "on"
}
