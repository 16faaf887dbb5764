#![forbid(unsafe_code)]
#![doc = r#"
SkillerBot

A thin HTTP relay in front of a Chat Completions API. Each request gets the
SkillerBot coaching persona injected as a system message and the first
generated reply is returned to the caller.

Crate highlights
- HTTP server (in `server`): `POST /skillerbot`, `POST /ask-drill`, `GET /` and `GET /status`.
- Completion seam (in `completion`): `CompletionClient` trait with a reqwest-backed `OpenAiClient`.
- Prompts (in `prompts`): fixed persona plus the drill question template.

Modules
- `config`: Startup configuration read once from the environment.
- `completion`: Upstream client trait and the Chat Completions implementation.
- `error`: Upstream failure taxonomy and the route error envelope.
- `models`: Relay request/reply bodies and the upstream wire subset.
- `prompts`: Persona and drill prompt templating.
- `server`: Axum router/handlers.
- `util`: Shared helpers (tracing, CLI flags, CORS).
"#]

pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;
pub mod util;

pub use crate::completion::{CompletionClient, OpenAiClient};
pub use crate::config::AppConfig;
pub use crate::error::{RelayError, UpstreamError};
pub use crate::prompts::PromptBuilder;
pub use crate::server::{build_router, AppState};
