use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use warehouse_inspector::{InspectorLayer, StatusPolicy, WarehouseConfig};

/// Warehouse inspector server
#[derive(Parser, Debug)]
#[command(name = "inspector-server")]
#[command(version)]
#[command(about = "HTTP API for warehouse schemas, columns and column statistics")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "INSPECTOR_LISTEN", default_value = "127.0.0.1:8000")]
    listen: SocketAddr,

    /// Report empty results as 404 and bad identifiers as 400 instead of 500
    #[arg(long, env = "INSPECTOR_STRICT_STATUS")]
    strict_status: bool,

    /// Snowflake account identifier
    #[arg(long, env = "SNOWFLAKE_ACCOUNT")]
    account: String,

    /// Login name
    #[arg(long, env = "SNOWFLAKE_USER")]
    user: String,

    /// Password
    #[arg(long, env = "SNOWFLAKE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Role assumed by every session
    #[arg(long, env = "SNOWFLAKE_ROLE")]
    role: Option<String>,

    /// Virtual warehouse executing the statistics queries
    #[arg(long, env = "SNOWFLAKE_WAREHOUSE")]
    warehouse: Option<String>,

    /// Endpoint override (defaults to https://<account>.snowflakecomputing.com)
    #[arg(long, env = "SNOWFLAKE_BASE_URL")]
    base_url: Option<String>,

    /// Seconds allowed for logging in
    #[arg(long, env = "SNOWFLAKE_LOGIN_TIMEOUT", default_value_t = 30)]
    login_timeout: u64,

    /// Seconds allowed per statement
    #[arg(long, env = "SNOWFLAKE_QUERY_TIMEOUT", default_value_t = 120)]
    query_timeout: u64,
}

impl Args {
    fn warehouse_config(&self) -> WarehouseConfig {
        let mut config = WarehouseConfig::new(&self.account, &self.user, &self.password)
            .with_login_timeout(Duration::from_secs(self.login_timeout))
            .with_query_timeout(Duration::from_secs(self.query_timeout));

        if let Some(role) = &self.role {
            config = config.with_role(role);
        }
        if let Some(warehouse) = &self.warehouse {
            config = config.with_warehouse(warehouse);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        config
    }

    fn status_policy(&self) -> StatusPolicy {
        if self.strict_status {
            StatusPolicy::Strict
        } else {
            StatusPolicy::Uniform
        }
    }
}

#[tokio::main]
async fn main() -> warehouse_inspector::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = args.warehouse_config();
    tracing::info!(?config, "warehouse configuration loaded");

    let inspector = InspectorLayer::snowflake(config)?.with_status_policy(args.status_policy());

    let app = Router::new()
        .merge(inspector.into_router())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!("Server running at http://{}", args.listen);
    tracing::info!("Health check at http://{}/health", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
