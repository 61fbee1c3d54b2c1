//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use super::AppState;
use super::types::{CatalogResponse, ErrorResponse, HealthResponse};
use crate::engine::{Engine, Recommendation};
use crate::error::EngineError;
use crate::intake::IntakeProfile;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, error: String, field: Option<String>) -> ApiError {
    (status, Json(ErrorResponse { error, field }))
}

/// `GET /health` → 200
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        catalog_version: state.catalog.version.clone(),
    })
}

/// `GET /catalog` → 200 + every catalog item
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        version: state.catalog.version.clone(),
        items: state.catalog.items().to_vec(),
    })
}

/// Runs the engine on a posted intake.
///
/// `POST /recommend` → 200 + `Recommendation` JSON
/// invalid intake → 400 + `ErrorResponse` naming the field
/// broken configuration → 500 + `ErrorResponse`
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Recommendation>, ApiError> {
    let intake = IntakeProfile::from_json_value(body).map_err(|e| match e {
        EngineError::InvalidIntake { field, message } => {
            error(StatusCode::BAD_REQUEST, message, Some(field))
        }
        other => error(StatusCode::BAD_REQUEST, other.to_string(), None),
    })?;

    let config = state.config.load().map_err(|errors| {
        for e in &errors {
            warn!("{e}");
        }
        let field = errors.first().map(|e| e.field.clone());
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        error(StatusCode::INTERNAL_SERVER_ERROR, message, field)
    })?;
    let region = config.resolve_region().map_err(|e| {
        error(StatusCode::INTERNAL_SERVER_ERROR, e.message, Some(e.field))
    })?;

    Engine::new(&state.catalog, &region, &config)
        .recommend(&intake)
        .map(Json)
        .map_err(|e| match e {
            EngineError::InvalidIntake { field, message } => {
                error(StatusCode::BAD_REQUEST, message, Some(field))
            }
            other => error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), None),
        })
}
