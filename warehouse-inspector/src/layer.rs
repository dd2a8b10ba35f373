//! InspectorLayer - Main Axum integration layer
//!
//! This module provides the entry point for mounting the inspector routes
//! into an Axum application.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{create_api_router, InspectorState};
use crate::config::{StatusPolicy, WarehouseConfig};
use crate::database::snowflake::SnowflakeConnector;
use crate::database::traits::WarehouseConnector;
use crate::service::MetadataService;

/// Main layer for integrating the warehouse inspector into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use warehouse_inspector::{InspectorLayer, WarehouseConfig};
///
/// # fn example() -> warehouse_inspector::Result<()> {
/// let config = WarehouseConfig::new("xy12345", "inspector", "secret");
/// let app = Router::new().merge(InspectorLayer::snowflake(config)?.into_router());
/// # Ok(())
/// # }
/// ```
pub struct InspectorLayer<C: WarehouseConnector> {
    service: Arc<MetadataService<C>>,
    status_policy: StatusPolicy,
}

impl<C: WarehouseConnector> InspectorLayer<C> {
    /// Create a new inspector over the given connector
    ///
    /// # Arguments
    ///
    /// * `connector` - The warehouse connector implementation
    pub fn new(connector: C) -> Self {
        Self {
            service: Arc::new(MetadataService::new(connector)),
            status_policy: StatusPolicy::default(),
        }
    }

    /// Choose how failures are mapped to HTTP status codes
    pub fn with_status_policy(mut self, status_policy: StatusPolicy) -> Self {
        self.status_policy = status_policy;
        self
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes all endpoints at the root path and
    /// permissive CORS middleware.
    pub fn into_router(self) -> Router {
        let state = InspectorState {
            service: self.service,
            status_policy: self.status_policy,
        };

        create_api_router(state).layer(CorsLayer::permissive())
    }
}

impl InspectorLayer<SnowflakeConnector> {
    /// Create a new inspector for a Snowflake account
    ///
    /// # Arguments
    ///
    /// * `config` - Account, credentials and timeouts
    pub fn snowflake(config: WarehouseConfig) -> crate::Result<Self> {
        Ok(Self::new(SnowflakeConnector::new(config)?))
    }
}
