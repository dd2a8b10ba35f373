//! Warehouse access layer
//!
//! This module provides the connector seam the service is written against
//! and the Snowflake implementation of it.

pub mod snowflake;
pub mod traits;

// Re-export the main traits
pub use traits::{Row, WarehouseConnection, WarehouseConnector, WarehouseError};
