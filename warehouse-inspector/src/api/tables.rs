//! Table listing and column metadata endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::api::{error_response, InspectorState};
use crate::database::traits::WarehouseConnector;

/// Handler for GET /tables/{database}/{schema}
///
/// Returns the table names of a schema. An empty schema yields `[]`.
///
/// # Arguments
///
/// * `state` - Shared service state
/// * `database` - Database containing the schema
/// * `schema` - Schema to list tables for
pub async fn list_tables_handler<C: WarehouseConnector>(
    State(state): State<InspectorState<C>>,
    Path((database, schema)): Path<(String, String)>,
) -> Response {
    match state.service.list_tables(&schema, &database).await {
        Ok(tables) => (StatusCode::OK, Json(tables)).into_response(),
        Err(error) => {
            tracing::warn!(%database, %schema, %error, "failed to list tables");
            error_response(&error, state.status_policy)
        }
    }
}

/// Handler for GET /table-metadata/{database}/{schema}/{table}
///
/// Returns every column of the table in describe order.
///
/// Response:
/// ```json
/// [
///   {"column_name": "ID", "data_type": "NUMBER(38,0)", "description": "No description"},
///   {"column_name": "NAME", "data_type": "VARCHAR(50)", "description": "customer name"}
/// ]
/// ```
pub async fn get_table_metadata_handler<C: WarehouseConnector>(
    State(state): State<InspectorState<C>>,
    Path((database, schema, table)): Path<(String, String, String)>,
) -> Response {
    match state.service.describe_columns(&table, &schema, &database).await {
        Ok(columns) => (StatusCode::OK, Json(columns)).into_response(),
        Err(error) => {
            tracing::warn!(%database, %schema, %table, %error, "failed to describe table");
            error_response(&error, state.status_policy)
        }
    }
}
