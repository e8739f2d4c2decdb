mod analysis;
mod core;
mod directive;
mod llm;
mod report;
mod server;
mod state;

use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use crate::core::config::AppPaths;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = std::sync::Arc::new(AppPaths::new());
    core::logging::init(&paths);

    let state = AppState::initialize(paths).await?;

    // Warm the directive index so the first report does not pay for
    // chunking and embedding. Missing PDF is not fatal at startup.
    match state.directive.ensure_ingested().await {
        Ok(outcome) if outcome.reused => {
            tracing::info!("Directive index reused ({} passages)", outcome.passages)
        }
        Ok(outcome) => tracing::info!("Directive indexed ({} passages)", outcome.passages),
        Err(err) => tracing::warn!("Directive not indexed yet: {}", err),
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(5000);
    let host = state
        .config
        .load_config()
        .ok()
        .and_then(|c| {
            c.get("server")
                .and_then(|s| s.get("host"))
                .and_then(|h| h.as_str())
                .map(|h| h.to_string())
        })
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let bind_addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
