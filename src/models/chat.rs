use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Chat Completions role enumeration.
///
/// Only the roles the relay sends upstream are modelled:
/// "system" | "user"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One entry of the ordered message list sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: Role,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat Completions request (the subset the relay uses).
///
/// Sampling parameters are left at the upstream defaults.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    /// Always a single completion.
    pub n: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn single(model: &str, messages: &[CompletionMessage]) -> Self {
        Self {
            model: model.to_string(),
            messages: messages.to_vec(),
            n: Some(1),
        }
    }
}

// ============================================================================
// Chat Completions Response Models
// ============================================================================

/// Message in a Chat Completions response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Choice in a Chat Completions response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
}

/// Chat Completions API response. Fields the relay does not read are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the upstream produced any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}
