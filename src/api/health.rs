use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::error::AppError;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the ledger database answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.repo.ping().await?;
    Ok(Json(serde_json::json!({
        "status": "ready",
        "engineId": state.config.engine_id,
        "assets": state.service.assets().ids().len(),
    })))
}
