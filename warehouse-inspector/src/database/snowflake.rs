//! Snowflake connector implementation
//!
//! Talks to Snowflake's HTTPS session endpoints directly: a login request
//! yields a session token, statements are posted to the query endpoint, and
//! the session is deleted on close.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::WarehouseConfig;
use crate::database::traits::{Row, WarehouseConnection, WarehouseConnector, WarehouseError};

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";
const SESSION_PATH: &str = "/session";

/// Response codes for statements that are still executing
const QUERY_IN_PROGRESS_CODES: [&str; 2] = ["333333", "333334"];

/// The only result encoding this connector decodes
const RESULT_FORMAT: &str = "JSON";

const CLIENT_APP_ID: &str = env!("CARGO_PKG_NAME");
const CLIENT_APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Envelope shared by every Snowflake session endpoint
#[derive(Debug, Deserialize)]
struct SnowflakeResponse<T> {
    data: Option<T>,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    code: Option<String>,

    #[serde(default)]
    success: bool,
}

impl<T> SnowflakeResponse<T> {
    fn is_in_progress(&self) -> bool {
        self.success
            && self
                .code
                .as_deref()
                .is_some_and(|code| QUERY_IN_PROGRESS_CODES.iter().any(|running| *running == code))
    }

    fn into_data(self) -> Result<T, String> {
        if !self.success {
            let message = self.message.unwrap_or_else(|| "request failed".to_string());
            return Err(match self.code {
                Some(code) => format!("{} (code {})", message, code),
                None => message,
            });
        }
        self.data
            .ok_or_else(|| "response did not contain data".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryData {
    query_result_format: Option<String>,
    rowset: Option<Vec<Vec<serde_json::Value>>>,
    chunks: Option<Vec<ResultChunk>>,
    chunk_headers: Option<HashMap<String, String>>,
    qrmk: Option<String>,
    get_result_url: Option<String>,
    query_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultChunk {
    url: String,
    row_count: Option<u64>,
}

/// Snowflake connector
///
/// Holds the process-wide configuration and a shared HTTP client. Every
/// call to [`WarehouseConnector::open`] logs in a fresh session.
pub struct SnowflakeConnector {
    config: Arc<WarehouseConfig>,
    client: reqwest::Client,
}

impl SnowflakeConnector {
    /// Create a new Snowflake connector
    ///
    /// # Arguments
    ///
    /// * `config` - Account, credentials and timeouts
    pub fn new(config: WarehouseConfig) -> crate::Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .user_agent(format!("{}/{}", CLIENT_APP_ID, CLIENT_APP_VERSION))
            .build()
            .map_err(|error| crate::Error::Config(format!("failed to build HTTP client: {}", error)))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Account locator sent as ACCOUNT_NAME (the part before the region)
    fn account_name(&self) -> &str {
        self.config
            .account
            .split('.')
            .next()
            .unwrap_or(&self.config.account)
    }
}

#[async_trait]
impl WarehouseConnector for SnowflakeConnector {
    type Connection = SnowflakeConnection;

    async fn open(&self, database: &str) -> Result<SnowflakeConnection, WarehouseError> {
        let base_url = self.config.base_url();

        let mut parameters = vec![
            ("databaseName", database.to_string()),
            ("request_id", Uuid::new_v4().to_string()),
        ];
        if let Some(role) = &self.config.role {
            parameters.push(("roleName", role.clone()));
        }
        if let Some(warehouse) = &self.config.warehouse {
            parameters.push(("warehouse", warehouse.clone()));
        }

        let body = serde_json::json!({
            "data": {
                "CLIENT_APP_ID": CLIENT_APP_ID,
                "CLIENT_APP_VERSION": CLIENT_APP_VERSION,
                "ACCOUNT_NAME": self.account_name(),
                "LOGIN_NAME": self.config.user,
                "PASSWORD": self.config.password,
                "CLIENT_ENVIRONMENT": {
                    "APPLICATION": CLIENT_APP_ID,
                },
                "SESSION_PARAMETERS": {
                    "QUERY_RESULT_FORMAT": RESULT_FORMAT,
                },
            }
        });

        let request = self
            .client
            .post(format!("{}{}", base_url, LOGIN_PATH))
            .query(&parameters)
            .header(ACCEPT, "application/json")
            .timeout(self.config.login_timeout)
            .json(&body);

        let response: SnowflakeResponse<LoginData> =
            send(request).await.map_err(WarehouseError::Connection)?;
        let token = response
            .into_data()
            .map_err(WarehouseError::Connection)?
            .token
            .ok_or_else(|| WarehouseError::Connection("login response without a session token".into()))?;

        tracing::debug!(database, "opened warehouse session");

        Ok(SnowflakeConnection {
            client: self.client.clone(),
            base_url,
            database: database.to_string(),
            token: Some(token),
            sequence_id: 0,
            query_timeout: self.config.query_timeout,
            poll_interval: self.config.result_poll_interval,
        })
    }
}

/// A logged-in Snowflake session scoped to one database
pub struct SnowflakeConnection {
    client: reqwest::Client,
    base_url: String,
    database: String,
    token: Option<String>,
    sequence_id: u64,
    query_timeout: Duration,
    poll_interval: Duration,
}

impl SnowflakeConnection {
    /// Database this session was opened for
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_none()
    }

    fn token(&self) -> Result<&str, WarehouseError> {
        self.token
            .as_deref()
            .ok_or_else(|| WarehouseError::QueryExecution("connection is closed".into()))
    }

    /// Follow `getResultUrl` until the statement leaves the running state
    async fn wait_for_result(
        &self,
        mut response: SnowflakeResponse<QueryData>,
        deadline: Instant,
    ) -> Result<SnowflakeResponse<QueryData>, WarehouseError> {
        while response.is_in_progress() {
            let result_url = response
                .data
                .as_ref()
                .and_then(|data| data.get_result_url.clone())
                .ok_or_else(|| {
                    WarehouseError::QueryExecution("running statement without a result URL".into())
                })?;

            if Instant::now() + self.poll_interval > deadline {
                return Err(WarehouseError::QueryExecution(format!(
                    "statement did not finish within {} seconds",
                    self.query_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;

            let request = self
                .client
                .get(format!("{}{}", self.base_url, result_url))
                .header(AUTHORIZATION, authorization(self.token()?))
                .header(ACCEPT, "application/json")
                .timeout(self.query_timeout);
            response = send(request).await.map_err(WarehouseError::QueryExecution)?;
        }

        Ok(response)
    }

    /// Inline rows followed by the rows of every external result chunk
    async fn collect_rows(&self, data: QueryData) -> Result<Vec<Row>, WarehouseError> {
        if let Some(format) = &data.query_result_format {
            if !format.eq_ignore_ascii_case(RESULT_FORMAT) {
                return Err(WarehouseError::QueryExecution(format!(
                    "unsupported result format {:?}, expected {}",
                    format, RESULT_FORMAT
                )));
            }
        }

        let mut rows: Vec<Row> = data.rowset.unwrap_or_default().into_iter().map(to_row).collect();

        let chunks = data.chunks.unwrap_or_default();
        if chunks.is_empty() {
            return Ok(rows);
        }

        let mut headers = data.chunk_headers.unwrap_or_default();
        if headers.is_empty() {
            if let Some(key) = data.qrmk {
                headers.insert(
                    "x-amz-server-side-encryption-customer-algorithm".into(),
                    "AES256".into(),
                );
                headers.insert("x-amz-server-side-encryption-customer-key".into(), key);
            }
        }

        tracing::debug!(
            query_id = data.query_id.as_deref().unwrap_or_default(),
            chunks = chunks.len(),
            "downloading result chunks"
        );

        for chunk in chunks {
            let mut request = self.client.get(&chunk.url).timeout(self.query_timeout);
            for (name, value) in &headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request
                .send()
                .await
                .map_err(|error| WarehouseError::QueryExecution(format!("result chunk download failed: {}", error)))?;
            let status = response.status();
            if !status.is_success() {
                return Err(WarehouseError::QueryExecution(format!(
                    "result chunk download failed with status {}",
                    status
                )));
            }
            let body = response
                .text()
                .await
                .map_err(|error| WarehouseError::QueryExecution(format!("failed to read result chunk: {}", error)))?;

            // Chunk bodies are row arrays separated by commas, without the outer brackets
            let chunk_rows: Vec<Vec<serde_json::Value>> =
                serde_json::from_str(&format!("[{}]", body)).map_err(|error| {
                    WarehouseError::QueryExecution(format!("malformed result chunk: {}", error))
                })?;

            if let Some(expected) = chunk.row_count {
                if expected != chunk_rows.len() as u64 {
                    tracing::warn!(
                        expected,
                        received = chunk_rows.len(),
                        "result chunk row count mismatch"
                    );
                }
            }
            rows.extend(chunk_rows.into_iter().map(to_row));
        }

        Ok(rows)
    }
}

#[async_trait]
impl WarehouseConnection for SnowflakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<Vec<Row>, WarehouseError> {
        let token = self.token()?.to_string();
        self.sequence_id += 1;

        let submitted_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let body = serde_json::json!({
            "sqlText": sql,
            "asyncExec": false,
            "sequenceId": self.sequence_id,
            "querySubmissionTime": submitted_at,
        });

        let deadline = Instant::now() + self.query_timeout;
        let request = self
            .client
            .post(format!("{}{}", self.base_url, QUERY_PATH))
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .header(AUTHORIZATION, authorization(&token))
            .header(ACCEPT, "application/json")
            .timeout(self.query_timeout)
            .json(&body);

        let response: SnowflakeResponse<QueryData> =
            send(request).await.map_err(WarehouseError::QueryExecution)?;
        let response = self.wait_for_result(response, deadline).await?;
        let data = response.into_data().map_err(WarehouseError::QueryExecution)?;

        self.collect_rows(data).await
    }

    async fn close(&mut self) -> Result<(), WarehouseError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };

        delete_session(&self.client, &self.base_url, &token).await?;
        tracing::debug!(database = %self.database, "closed warehouse session");
        Ok(())
    }
}

impl Drop for SnowflakeConnection {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        tracing::warn!(
            database = %self.database,
            "warehouse session dropped without close, logging out in the background"
        );

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let client = self.client.clone();
            let base_url = self.base_url.clone();
            handle.spawn(async move {
                if let Err(error) = delete_session(&client, &base_url, &token).await {
                    tracing::warn!(%error, "background logout failed");
                }
            });
        }
    }
}

fn authorization(token: &str) -> String {
    format!("Snowflake Token=\"{}\"", token)
}

async fn delete_session(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
) -> Result<(), WarehouseError> {
    let response = client
        .post(format!("{}{}", base_url, SESSION_PATH))
        .query(&[("delete", "true")])
        .header(AUTHORIZATION, authorization(token))
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|error| WarehouseError::Connection(format!("logout failed: {}", error)))?;

    if !response.status().is_success() {
        return Err(WarehouseError::Connection(format!(
            "logout failed with status {}",
            response.status()
        )));
    }
    Ok(())
}

/// Send a request and decode the Snowflake envelope
async fn send<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<SnowflakeResponse<T>, String> {
    let response = request
        .send()
        .await
        .map_err(|error| format!("HTTP request failed: {}", error))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| format!("failed to read response body: {}", error))?;

    if !status.is_success() {
        return Err(format!("request failed with status {}: {}", status, body));
    }

    serde_json::from_str(&body).map_err(|error| format!("unexpected response body: {}", error))
}

/// Snowflake renders every value as text; anything else is stringified
fn to_row(values: Vec<serde_json::Value>) -> Row {
    values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
        .collect()
}
