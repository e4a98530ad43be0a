use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use rentbook_storage::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health<S: Store + 'static>(State(state): State<Arc<AppState<S>>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: rentbook_core::VERSION.to_string(),
        storage: state.store.name().to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    }))
}
