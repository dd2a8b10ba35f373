//! REST API endpoints
//!
//! This module contains all endpoint handlers, the state they share, and the
//! mapping from service errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::config::StatusPolicy;
use crate::database::traits::{WarehouseConnector, WarehouseError};
use crate::schema::ErrorResponse;
use crate::service::MetadataService;

pub mod health;
pub mod metrics;
pub mod schemas;
pub mod tables;

// Re-export handlers for convenience
pub use health::health_handler;
pub use metrics::get_table_metrics_handler;
pub use schemas::list_schemas_handler;
pub use tables::{get_table_metadata_handler, list_tables_handler};

/// State shared by all handlers
pub struct InspectorState<C: WarehouseConnector> {
    /// Service every request is delegated to
    pub service: Arc<MetadataService<C>>,

    /// How failures are mapped to status codes
    pub status_policy: StatusPolicy,
}

impl<C: WarehouseConnector> Clone for InspectorState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            status_policy: self.status_policy,
        }
    }
}

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `state` - Service and status policy shared by the handlers
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router<C: WarehouseConnector>(state: InspectorState<C>) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route("/schemas/{database}", get(list_schemas_handler::<C>))
        .route("/tables/{database}/{schema}", get(list_tables_handler::<C>))
        .route(
            "/table-metadata/{database}/{schema}/{table}",
            get(get_table_metadata_handler::<C>),
        )
        .route(
            "/table-metrics/{database}/{schema}/{table}",
            get(get_table_metrics_handler::<C>),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Status code for a failed operation under `policy`
pub fn status_for(error: &WarehouseError, policy: StatusPolicy) -> StatusCode {
    match policy {
        StatusPolicy::Uniform => StatusCode::INTERNAL_SERVER_ERROR,
        StatusPolicy::Strict if error.is_not_found() => StatusCode::NOT_FOUND,
        StatusPolicy::Strict if error.is_client_error() => StatusCode::BAD_REQUEST,
        StatusPolicy::Strict if error.is_connection_error() => StatusCode::BAD_GATEWAY,
        StatusPolicy::Strict => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error response carrying the full causal chain as `detail`
pub fn error_response(error: &WarehouseError, policy: StatusPolicy) -> Response {
    (
        status_for(error, policy),
        Json(ErrorResponse {
            detail: error.to_string(),
        }),
    )
        .into_response()
}
