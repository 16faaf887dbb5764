use serde::{Deserialize, Serialize};

/// Body of `POST /skillerbot`.
///
/// Fields are optional on the wire so that a missing value surfaces as a
/// validation error with the relay's own message instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /ask-drill`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillQuestionRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub drill_title: Option<String>,
    #[serde(default)]
    pub drill_instructions: Option<String>,
}

/// Successful reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReply {
    pub reply: String,
}

/// Error envelope shared by every failing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Returns the value when it holds something other than whitespace.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
