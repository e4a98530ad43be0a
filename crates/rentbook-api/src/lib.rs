//! Rentbook API
//!
//! REST server over the Rentbook reconciliation engine.
//!
//! ## Architecture
//!
//! 1. **Config** (`config`): layered server settings (defaults, TOML file,
//!    `RENTBOOK_*` environment).
//! 2. **Routes** (`routes/`): axum handlers; agreement and asset routes are
//!    generic over the asset kind and mounted once per kind.
//! 3. **Extractors** (`extract`): JSON/path/query extractors reporting errors
//!    in the standard envelope, plus `X-User-Email` attribution.
//! 4. **Errors** (`error`): `LedgerError` to HTTP status mapping.
//!
//! Store operations are synchronous and run on tokio's blocking pool.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rentbook_api::{create_router, AppState, ServerConfig};
//! use rentbook_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let state = Arc::new(AppState::new(Arc::new(MemoryStore::new()), &config));
//! let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//! axum::serve(listener, create_router(state)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

pub use config::{ConfigError, LogFormat, ServerConfig};
pub use error::ApiError;
pub use response::{ApiResponse, Deleted, ErrorInfo, ResponseMetadata};
pub use routes::{create_router, HealthResponse};
pub use state::{AppState, PageLimits};
