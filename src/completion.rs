//! Completion service seam.
//!
//! Handlers only see [`CompletionClient`]; [`OpenAiClient`] is the production
//! implementation speaking the Chat Completions wire format over reqwest.

use async_trait::async_trait;
use http::header;

use crate::config::AppConfig;
use crate::error::UpstreamError;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, CompletionMessage};

/// Given a message list and a model identifier, return the first completion.
///
/// `Ok(None)` means the upstream answered successfully but produced no
/// content; callers decide what to substitute.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[CompletionMessage],
        model: &str,
    ) -> Result<Option<String>, UpstreamError>;
}

/// Build the outbound HTTP client with the configured timeout.
pub fn build_http_client(config: &AppConfig) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(format!("skillerbot/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(UpstreamError::from)
}

/// Chat Completions client (`POST {base}/chat/completions`).
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            url: config.completions_url(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        Ok(Self::new(build_http_client(config)?, config))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[CompletionMessage],
        model: &str,
    ) -> Result<Option<String>, UpstreamError> {
        let payload = ChatCompletionRequest::single(model, messages);

        tracing::debug!(
            url = %self.url,
            model = %model,
            messages = messages.len(),
            "sending chat completion request"
        );

        let resp = self
            .http
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(UpstreamError::from_status(
                status,
                &String::from_utf8_lossy(&bytes),
            ));
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.first_content().map(str::to_string))
    }
}
