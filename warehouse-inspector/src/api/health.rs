//! Liveness endpoint

use axum::response::Json;

use crate::schema::HealthResponse;

/// Handler for GET /health
///
/// Always answers `{"status": "OK"}` without touching the warehouse.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
