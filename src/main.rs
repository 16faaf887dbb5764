use anyhow::Context;
use skillerbot::server::{build_router, AppState};
use skillerbot::util::{flag_value, init_tracing};
use skillerbot::AppConfig;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("❌ {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    // --prompt-config=<path> takes precedence over SKILLERBOT_PROMPT_CONFIG
    if let Some(path) = flag_value(&args, "prompt-config") {
        config.prompt_config_path = Some(path);
    }
    tracing::debug!(?config, "configuration loaded");

    let state = AppState::from_config(&config).context("failed to build completion client")?;
    let app = build_router(Arc::new(state));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("✅ SkillerBot running on http://localhost:{}", config.port);
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
