use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let llm_reachable = state.llm.health_check().await.unwrap_or(false);
    let passages = state.directive.passage_count().await.unwrap_or(0);
    let meta = state.directive.ingest_meta().await.unwrap_or(None);

    Ok(Json(json!({
        "llm_provider": state.llm.provider_name(),
        "llm_reachable": llm_reachable,
        "directive_passages": passages,
        "directive_fingerprint": meta.map(|m| m.fingerprint),
        "started_at": state.started_at.to_rfc3339(),
    })))
}
