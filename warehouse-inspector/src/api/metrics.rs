//! Column statistics endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::api::{error_response, InspectorState};
use crate::database::traits::WarehouseConnector;

/// Handler for GET /table-metrics/{database}/{schema}/{table}
///
/// Computes summary statistics for every column. Numeric columns carry
/// `mean`, `min` and `max`; all other columns carry `unique_count`. Stats
/// outside a column's branch are `null`.
///
/// Response:
/// ```json
/// {
///   "ID": {"non_null_count": 2, "mean": 1.5, "min": 1, "max": 2, "unique_count": null},
///   "NAME": {"non_null_count": 2, "mean": null, "min": null, "max": null, "unique_count": 2}
/// }
/// ```
pub async fn get_table_metrics_handler<C: WarehouseConnector>(
    State(state): State<InspectorState<C>>,
    Path((database, schema, table)): Path<(String, String, String)>,
) -> Response {
    match state
        .service
        .compute_column_stats(&table, &schema, &database)
        .await
    {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(error) => {
            tracing::warn!(%database, %schema, %table, %error, "failed to compute table metrics");
            error_response(&error, state.status_policy)
        }
    }
}
