//! Metadata and statistics service
//!
//! Orchestrates the connector, the SQL templates and row decoding. Each
//! operation opens its own connection and closes it before returning,
//! whether the statements succeeded or not.

use std::time::Instant;

use crate::database::traits::{Row, WarehouseConnection, WarehouseConnector, WarehouseError};
use crate::decode;
use crate::queries::{column_stats_query, describe_table_query, list_schemas_query, list_tables_query};
use crate::schema::{ColumnDescriptor, ColumnStatSpec, TableMetrics};

/// A statement plus the context attached to its failure
struct Statement {
    context: Option<String>,
    sql: String,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self { context: None, sql }
    }

    fn with_context(sql: String, context: String) -> Self {
        Self {
            context: Some(context),
            sql,
        }
    }
}

/// Schema discovery and column statistics over a warehouse connector
pub struct MetadataService<C: WarehouseConnector> {
    connector: C,
}

impl<C: WarehouseConnector> MetadataService<C> {
    /// Create a new service
    ///
    /// # Arguments
    ///
    /// * `connector` - Connector used to open one connection per operation
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// List the schemas of a database in warehouse order
    ///
    /// # Errors
    ///
    /// `NotFound` when the warehouse returns no rows; any other failure is
    /// wrapped with "Error fetching schemas".
    #[tracing::instrument(skip(self))]
    pub async fn list_schemas(&self, database: &str) -> Result<Vec<String>, WarehouseError> {
        let fetch = async {
            let sql = list_schemas_query(database)?;
            let rows = self.execute(database, sql).await?;
            if rows.is_empty() {
                return Err(WarehouseError::NotFound(format!(
                    "No schemas found in database {}",
                    database
                )));
            }
            Ok::<_, WarehouseError>(decode::object_names(&rows))
        };

        fetch
            .await
            .map_err(|error| error.context("Error fetching schemas"))
    }

    /// List the tables of a schema; an empty schema yields an empty list
    #[tracing::instrument(skip(self))]
    pub async fn list_tables(
        &self,
        schema: &str,
        database: &str,
    ) -> Result<Vec<String>, WarehouseError> {
        let fetch = async {
            let sql = list_tables_query(schema, database)?;
            let rows = self.execute(database, sql).await?;
            Ok::<_, WarehouseError>(decode::object_names(&rows))
        };

        fetch.await.map_err(|error| {
            error.context(format!("Error fetching tables for schema {}.{}", database, schema))
        })
    }

    /// Describe every column of a table
    ///
    /// # Errors
    ///
    /// `NotFound` when the describe statement returns no rows.
    #[tracing::instrument(skip(self))]
    pub async fn describe_columns(
        &self,
        table: &str,
        schema: &str,
        database: &str,
    ) -> Result<Vec<ColumnDescriptor>, WarehouseError> {
        self.fetch_descriptors(table, schema, database)
            .await
            .map_err(|error| {
                error.context(format!(
                    "Error fetching metadata for table {}.{}.{}",
                    database, schema, table
                ))
            })
    }

    /// Compute summary statistics for every column of a table
    ///
    /// Issues one statement per column over a single connection. The first
    /// failing column aborts the whole operation.
    #[tracing::instrument(skip(self))]
    pub async fn compute_column_stats(
        &self,
        table: &str,
        schema: &str,
        database: &str,
    ) -> Result<TableMetrics, WarehouseError> {
        let compute = async {
            let columns = self.fetch_descriptors(table, schema, database).await?;

            let statements = columns
                .iter()
                .map(|column| -> Result<Statement, WarehouseError> {
                    let spec = ColumnStatSpec::for_column(&column.column_name, &column.data_type)?;
                    let sql = column_stats_query(database, schema, table, &spec)?;
                    Ok(Statement::with_context(
                        sql,
                        format!("Error computing statistics for column {}", column.column_name),
                    ))
                })
                .collect::<Result<Vec<_>, WarehouseError>>()?;

            let started = Instant::now();
            let results = self.execute_all(database, statements).await?;

            let mut metrics = TableMetrics::new();
            for (column, rows) in columns.iter().zip(results) {
                let row = rows.first().ok_or_else(|| {
                    WarehouseError::Decode(format!(
                        "no statistics row returned for column {}",
                        column.column_name
                    ))
                })?;
                metrics.insert(column.column_name.clone(), decode::column_stats(row)?);
            }

            tracing::info!(
                columns = metrics.len(),
                elapsed_milliseconds = started.elapsed().as_millis() as u64,
                "computed column statistics"
            );
            Ok::<_, WarehouseError>(metrics)
        };

        compute.await.map_err(|error| {
            error.context(format!(
                "Error fetching metrics for table {}.{}.{}",
                database, schema, table
            ))
        })
    }

    async fn fetch_descriptors(
        &self,
        table: &str,
        schema: &str,
        database: &str,
    ) -> Result<Vec<ColumnDescriptor>, WarehouseError> {
        let sql = describe_table_query(table, schema, database)?;
        let rows = self.execute(database, sql).await?;
        if rows.is_empty() {
            return Err(WarehouseError::NotFound(format!(
                "No columns found for {} in schema {} of database {}",
                table, schema, database
            )));
        }

        rows.iter().map(decode::column_descriptor).collect()
    }

    async fn execute(&self, database: &str, sql: String) -> Result<Vec<Row>, WarehouseError> {
        let mut results = self.execute_all(database, vec![Statement::new(sql)]).await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Run statements in order on one connection, stopping at the first
    /// failure. The connection is closed on every path.
    async fn execute_all(
        &self,
        database: &str,
        statements: Vec<Statement>,
    ) -> Result<Vec<Vec<Row>>, WarehouseError> {
        let mut connection = self.connector.open(database).await?;

        let mut results = Vec::with_capacity(statements.len());
        let mut failure = None;
        for statement in statements {
            tracing::debug!(database, sql = %statement.sql, "executing statement");
            match connection.execute(&statement.sql).await {
                Ok(rows) => results.push(rows),
                Err(error) => {
                    failure = Some(match statement.context {
                        Some(context) => error.context(context),
                        None => error,
                    });
                    break;
                }
            }
        }

        if let Err(error) = connection.close().await {
            tracing::warn!(database, %error, "failed to close warehouse connection");
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(results),
        }
    }
}
