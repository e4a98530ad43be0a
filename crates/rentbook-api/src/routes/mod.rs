//! Route definitions
//!
//! - `GET /health`
//! - `/api/v1/plates`, `/api/v1/cars`: asset registry
//! - `/api/v1/renters`: renter directory
//! - `/api/v1/leases`, `/api/v1/rentals`: agreements, with `pay`, `freeze`
//!   and `payments` sub-resources
//!
//! Agreement and asset routes are written once, generic over the asset kind.

mod agreements;
mod assets;
mod health;
mod renters;

use crate::error::ApiError;
use crate::state::AppState;
use axum::Router;
use rentbook_core::model::{Car, LicensePlate};
use rentbook_core::LedgerResult;
use rentbook_storage::Store;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use health::HealthResponse;

/// Run a synchronous store operation off the async runtime
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> LedgerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Build the application router
pub fn create_router<S: Store + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health::health::<S>))
        .nest("/api/v1/plates", assets::routes::<S, LicensePlate>())
        .nest("/api/v1/cars", assets::routes::<S, Car>())
        .nest("/api/v1/renters", renters::routes::<S>())
        .nest("/api/v1/leases", agreements::routes::<S, LicensePlate>())
        .nest("/api/v1/rentals", agreements::routes::<S, Car>())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
