//! Schema listing endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::api::{error_response, InspectorState};
use crate::database::traits::WarehouseConnector;

/// Handler for GET /schemas/{database}
///
/// Returns the schema names of a database as a JSON array of strings.
///
/// # Arguments
///
/// * `state` - Shared service state
/// * `database` - Database to list schemas for
pub async fn list_schemas_handler<C: WarehouseConnector>(
    State(state): State<InspectorState<C>>,
    Path(database): Path<String>,
) -> Response {
    match state.service.list_schemas(&database).await {
        Ok(schemas) => (StatusCode::OK, Json(schemas)).into_response(),
        Err(error) => {
            tracing::warn!(%database, %error, "failed to list schemas");
            error_response(&error, state.status_policy)
        }
    }
}
