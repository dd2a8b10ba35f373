//! Process-wide configuration
//!
//! Credentials and account details are read once at startup, validated, and
//! handed to the connector. Nothing here is mutated afterwards.

use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Connection settings for a Snowflake account
#[derive(Clone)]
pub struct WarehouseConfig {
    /// Account identifier (e.g., "xy12345.eu-central-1")
    pub account: String,

    /// Login name
    pub user: String,

    /// Password for `user`
    pub password: String,

    /// Role to assume for every session (if any)
    pub role: Option<String>,

    /// Virtual warehouse that executes the statistics queries (if any)
    pub warehouse: Option<String>,

    /// Explicit endpoint, overriding the one derived from `account`
    pub base_url: Option<String>,

    /// Upper bound for establishing a session
    pub login_timeout: Duration,

    /// Upper bound for a single statement, including result polling
    pub query_timeout: Duration,

    /// Delay between polls of a statement that is still running
    pub result_poll_interval: Duration,
}

impl WarehouseConfig {
    pub fn new(
        account: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            user: user.into(),
            password: password.into(),
            role: None,
            warehouse: None,
            base_url: None,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            result_poll_interval: DEFAULT_RESULT_POLL_INTERVAL,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_result_poll_interval(mut self, interval: Duration) -> Self {
        self.result_poll_interval = interval;
        self
    }

    /// Check that the mandatory credentials are present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("account", &self.account),
            ("user", &self.user),
            ("password", &self.password),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("missing warehouse {}", name)));
            }
        }

        Ok(())
    }

    /// Endpoint all session requests are sent to, without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.snowflakecomputing.com", self.account),
        }
    }
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WarehouseConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("base_url", &self.base_url)
            .field("login_timeout", &self.login_timeout)
            .field("query_timeout", &self.query_timeout)
            .field("result_poll_interval", &self.result_poll_interval)
            .finish()
    }
}

/// How service failures are mapped onto HTTP status codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Every failure is reported as 500
    #[default]
    Uniform,

    /// Empty results are 404, bad identifiers 400, unreachable warehouse 502
    Strict,
}
