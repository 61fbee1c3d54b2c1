//! REST API for recommendations.
//!
//! Provides three endpoints:
//! - `GET /health`: liveness probe
//! - `GET /catalog`: the loaded product catalog
//! - `POST /recommend`: intake JSON in, recommendation JSON out

mod handlers;
mod types;

pub use types::{CatalogResponse, ErrorResponse, HealthResponse};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::catalog::Catalog;
use crate::config::{ConfigError, EngineConfig};

/// Where the engine configuration comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Built-in preset by name.
    Preset(String),
    /// TOML file, re-read on every request so edits apply without a restart.
    File(PathBuf),
}

impl ConfigSource {
    /// Loads and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns every `ConfigError` found while loading or validating.
    pub fn load(&self) -> Result<EngineConfig, Vec<ConfigError>> {
        let config = match self {
            Self::Preset(name) => EngineConfig::from_preset(name),
            Self::File(path) => EngineConfig::from_toml_file(path),
        }
        .map_err(|e| vec![e])?;
        let errors = config.validate();
        if errors.is_empty() { Ok(config) } else { Err(errors) }
    }
}

/// Application state shared across all request handlers.
///
/// The catalog is loaded once; configuration is resolved per request.
pub struct AppState {
    pub catalog: Catalog,
    pub config: ConfigSource,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/catalog", get(handlers::get_catalog))
        .route("/recommend", post(handlers::recommend))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    tracing::info!("API server listening on http://{addr}");
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
