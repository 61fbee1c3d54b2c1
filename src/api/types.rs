//! API response types.

use serde::Serialize;

use crate::catalog::CatalogItem;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub catalog_version: String,
}

/// Catalog listing. Withdrawn items are included and flagged by `do_not_sell`.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub version: String,
    pub items: Vec<CatalogItem>,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Offending intake or config field, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
