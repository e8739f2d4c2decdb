use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn directive_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let passages = state.directive.passage_count().await?;
    let meta = state.directive.ingest_meta().await?;

    Ok(Json(json!({
        "passages": passages,
        "fingerprint": meta.as_ref().map(|m| m.fingerprint.clone()),
        "embedding_model": meta.as_ref().map(|m| m.embedding_model.clone()),
    })))
}

pub async fn reindex_directive(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.directive.reindex().await?;
    tracing::info!("Directive reindexed: {} passages", outcome.passages);

    Ok(Json(json!({
        "passages": outcome.passages,
        "fingerprint": outcome.fingerprint,
    })))
}
