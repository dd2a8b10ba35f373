//! # warehouse-inspector
//!
//! A small HTTP API for discovering the structure and basic statistics of
//! tables in a cloud data warehouse, easily integrable as an Axum router.
//!
//! ## Features
//!
//! - List the schemas of a database and the tables of a schema
//! - Describe the columns of a table (name, declared type, comment)
//! - Per-column summary statistics: non-null count, mean, min, max and
//!   distinct count, chosen by the column's type
//! - Snowflake connector over the HTTPS session protocol
//!
//! ## Security Warning
//!
//! - No authentication/authorization built-in
//! - Exposes the schema of every database the configured role can see
//! - Statistics queries scan whole tables, one statement per column
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::Router;
//! use warehouse_inspector::{InspectorLayer, WarehouseConfig};
//!
//! #[tokio::main]
//! async fn main() -> warehouse_inspector::Result<()> {
//!     let config = WarehouseConfig::new("xy12345", "inspector", "secret")
//!         .with_warehouse("COMPUTE_WH");
//!
//!     let app = Router::new().merge(InspectorLayer::snowflake(config)?.into_router());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// Public modules
pub mod api;
pub mod config;
pub mod database;
pub mod decode;
pub mod layer;
pub mod queries;
pub mod schema;
pub mod service;
pub mod types;

// Public exports
pub use config::{StatusPolicy, WarehouseConfig};
pub use layer::InspectorLayer;
pub use schema::{ColumnDescriptor, ColumnStatResult, ColumnStatSpec, StatName, TableMetrics};
pub use service::MetadataService;

// Re-export warehouse connectors
pub use database::snowflake::{SnowflakeConnection, SnowflakeConnector};
pub use database::traits::{Row, WarehouseConnection, WarehouseConnector, WarehouseError};

// Error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}

pub type Result<T> = std::result::Result<T, Error>;
