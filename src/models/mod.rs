//! Data models for the relay.
//!
//! This module groups two submodules:
//! - `chat`: the subset of the Chat Completions API the relay sends and reads upstream.
//! - `relay`: the JSON bodies accepted and returned by the relay's own routes.

pub mod chat;
pub mod relay;

pub use chat::{ChatCompletionRequest, ChatCompletionResponse, CompletionMessage, Role};
pub use relay::{ChatRequest, CompletionReply, DrillQuestionRequest, ErrorBody};
