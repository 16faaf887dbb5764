use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::completion::{CompletionClient, OpenAiClient};
use crate::config::AppConfig;
use crate::error::{RelayError, UpstreamError};
use crate::models::relay::non_blank;
use crate::models::{ChatRequest, CompletionMessage, CompletionReply, DrillQuestionRequest};
use crate::prompts::PromptBuilder;
use crate::util::cors_layer_from_env;

pub const HEALTH_TEXT: &str = "✅ SkillerBot server is running!";
/// Substituted when the upstream returns no content.
pub const NO_RESPONSE_PLACEHOLDER: &str = "⚠️ No response.";

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const MISSING_FIELDS: &str = "Missing required fields.";
pub const CHAT_FAILED: &str = "SkillerBot failed to respond.";
pub const DRILL_FAILED: &str = "Failed to get drill advice from SkillerBot.";

/// Shared, immutable application state used by the handlers.
pub struct AppState {
    pub completions: Arc<dyn CompletionClient>,
    pub prompts: PromptBuilder,
    pub model: String,
    pub distinct_upstream_status: bool,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        completions: Arc<dyn CompletionClient>,
        prompts: PromptBuilder,
    ) -> Self {
        Self {
            completions,
            prompts,
            model: config.model.clone(),
            distinct_upstream_status: config.distinct_upstream_status,
        }
    }

    /// Production state: OpenAI-compatible upstream and the configured persona.
    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        let client = OpenAiClient::from_config(config)?;
        tracing::info!(upstream = %client.url(), model = %config.model, "completion client ready");
        let prompts = PromptBuilder::from_optional_file(config.prompt_config_path.as_deref());
        Ok(Self::new(config, Arc::new(client), prompts))
    }

    /// Send `messages` upstream and shape the reply, mapping failures to `public`.
    async fn relay(
        &self,
        messages: &[CompletionMessage],
        public: &'static str,
    ) -> Result<CompletionReply, RelayError> {
        match self.completions.complete(messages, &self.model).await {
            Ok(content) => {
                let reply = content
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string());
                Ok(CompletionReply { reply })
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "completion request failed");
                Err(RelayError::Upstream {
                    public,
                    distinct_status: self.distinct_upstream_status,
                    source: e,
                })
            }
        }
    }
}

/// Build the Axum router with `/`, `/status`, `/skillerbot` and `/ask-drill`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/status", get(status))
        .route("/skillerbot", post(skillerbot))
        .route("/ask-drill", post(ask_drill))
        .with_state(state)
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    HEALTH_TEXT
}

/// Service status endpoint exposing the model and available routes.
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let routes = vec!["/", "/status", "/skillerbot", "/ask-drill"];
    Json(serde_json::json!({
        "name": "skillerbot",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model,
        "routes": routes
    }))
}

/// General chat: persona as system message, user text as user message.
async fn skillerbot(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<CompletionReply>, RelayError> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected /skillerbot body");
            return Err(RelayError::Validation(MESSAGE_REQUIRED));
        }
    };
    let message = non_blank(&req.message).ok_or(RelayError::Validation(MESSAGE_REQUIRED))?;

    tracing::info!(user_message = %message, "Received /skillerbot message");

    let messages = [
        CompletionMessage::system(state.prompts.build_general_prompt()),
        CompletionMessage::user(message),
    ];
    state.relay(&messages, CHAT_FAILED).await.map(Json)
}

/// Drill Q&A: a single system message carrying the drill context and question.
async fn ask_drill(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DrillQuestionRequest>, JsonRejection>,
) -> Result<Json<CompletionReply>, RelayError> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected /ask-drill body");
            return Err(RelayError::Validation(MISSING_FIELDS));
        }
    };
    let (Some(question), Some(title), Some(instructions)) = (
        non_blank(&req.question),
        non_blank(&req.drill_title),
        non_blank(&req.drill_instructions),
    ) else {
        return Err(RelayError::Validation(MISSING_FIELDS));
    };

    tracing::info!(question = %question, drill_title = %title, "Received /ask-drill");

    let messages = [CompletionMessage::system(
        state
            .prompts
            .build_drill_prompt(title, instructions, question),
    )];
    state.relay(&messages, DRILL_FAILED).await.map(Json)
}
