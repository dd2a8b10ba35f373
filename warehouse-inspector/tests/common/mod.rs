//! In-memory warehouse used by the integration tests
//!
//! Understands exactly the statements this crate generates and answers them
//! from a small table catalogue, recording every connection and statement.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use warehouse_inspector::{Row, WarehouseConnection, WarehouseConnector, WarehouseError};

#[derive(Debug, Clone)]
pub struct FakeColumn {
    pub name: String,
    pub data_type: String,
    pub comment: Option<String>,
    pub values: Vec<Option<String>>,
}

impl FakeColumn {
    pub fn new(name: &str, data_type: &str, values: &[Option<&str>]) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            comment: None,
            values: values.iter().map(|value| value.map(str::to_string)).collect(),
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeTable {
    pub database: String,
    pub schema: String,
    pub name: String,
    pub columns: Vec<FakeColumn>,
}

/// Catalogue plus failure injection
#[derive(Debug, Default)]
pub struct FakeWarehouse {
    /// (database, schema name); a `None` name models a row with a null name field
    pub schemas: Vec<(String, Option<String>)>,
    pub tables: Vec<FakeTable>,
    /// Fail any statement containing this text
    pub fail_on: Option<String>,
    /// Reject every login
    pub refuse_connections: bool,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, database: &str, schema: &str) -> Self {
        self.schemas.push((database.to_string(), Some(schema.to_string())));
        self
    }

    pub fn with_null_schema_row(mut self, database: &str) -> Self {
        self.schemas.push((database.to_string(), None));
        self
    }

    pub fn with_table(mut self, database: &str, schema: &str, name: &str, columns: Vec<FakeColumn>) -> Self {
        self.tables.push(FakeTable {
            database: database.to_string(),
            schema: schema.to_string(),
            name: name.to_string(),
            columns,
        });
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// `DB`.`PUBLIC`.`T` with an `ID NUMBER(38,0)` and a `NAME VARCHAR(50)` column
    pub fn scenario() -> Self {
        Self::new()
            .with_schema("DB", "INFORMATION_SCHEMA")
            .with_schema("DB", "PUBLIC")
            .with_table(
                "DB",
                "PUBLIC",
                "T",
                vec![
                    FakeColumn::new("ID", "NUMBER(38,0)", &[Some("1"), Some("2")]),
                    FakeColumn::new("NAME", "VARCHAR(50)", &[Some("alice"), Some("bob")]),
                ],
            )
    }

    fn answer(&self, database: &str, sql: &str) -> Result<Vec<Row>, WarehouseError> {
        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(WarehouseError::QueryExecution(format!(
                    "SQL compilation error near '{}'",
                    fragment
                )));
            }
        }

        if let Some(target) = sql.strip_prefix("SHOW SCHEMAS IN DATABASE ") {
            return Ok(self
                .schemas
                .iter()
                .filter(|(schema_database, _)| schema_database == target)
                .map(|(_, name)| row(vec![Some("2024-01-01 00:00:00".to_string()), name.clone()]))
                .collect());
        }

        if let Some(target) = sql.strip_prefix("SHOW TABLES IN SCHEMA ") {
            return Ok(self
                .tables
                .iter()
                .filter(|table| format!("{}.{}", table.database, table.schema) == target)
                .map(|table| row(vec![Some("2024-01-01 00:00:00".to_string()), Some(table.name.clone())]))
                .collect());
        }

        if let Some(target) = sql.strip_prefix("DESCRIBE TABLE ") {
            let Some(table) = self.find_table(target) else {
                return Ok(Vec::new());
            };
            return Ok(table.columns.iter().map(describe_row).collect());
        }

        if sql.starts_with("SELECT '") {
            return self.column_stats(database, sql);
        }

        Err(WarehouseError::QueryExecution(format!("unsupported statement: {}", sql)))
    }

    fn find_table(&self, qualified: &str) -> Option<&FakeTable> {
        self.tables.iter().find(|table| {
            format!("{}.{}.{}", table.database, table.schema, table.name) == qualified
        })
    }

    fn column_stats(&self, database: &str, sql: &str) -> Result<Vec<Row>, WarehouseError> {
        let tag = sql
            .strip_prefix("SELECT '")
            .and_then(|rest| rest.split("' AS column_name").next())
            .unwrap_or_default();
        let qualified = sql.rsplit(" FROM ").next().unwrap_or_default();
        let table = self
            .find_table(qualified)
            .filter(|table| table.database == database)
            .ok_or_else(|| WarehouseError::QueryExecution(format!("Object '{}' does not exist", qualified)))?;
        let column = table
            .columns
            .iter()
            .find(|column| column.name == tag)
            .ok_or_else(|| WarehouseError::QueryExecution(format!("invalid identifier '{}'", tag)))?;

        let present: Vec<&str> = column.values.iter().flatten().map(String::as_str).collect();
        let count = Some(present.len().to_string());

        if sql.contains("null AS unique_count") {
            let numbers: Vec<f64> = present.iter().filter_map(|value| value.parse().ok()).collect();
            let mean = (!numbers.is_empty())
                .then(|| format!("{:.6}", numbers.iter().sum::<f64>() / numbers.len() as f64));
            let min = numbers.iter().cloned().reduce(f64::min).map(|value| value.to_string());
            let max = numbers.iter().cloned().reduce(f64::max).map(|value| value.to_string());
            Ok(vec![row(vec![Some(tag.to_string()), count, None, mean, min, max])])
        } else {
            let distinct: HashSet<&str> = present.iter().copied().collect();
            Ok(vec![row(vec![
                Some(tag.to_string()),
                count,
                Some(distinct.len().to_string()),
                None,
                None,
                None,
            ])])
        }
    }
}

fn row(cells: Vec<Option<String>>) -> Row {
    Row::new(cells)
}

fn describe_row(column: &FakeColumn) -> Row {
    row(vec![
        Some(column.name.clone()),
        Some(column.data_type.clone()),
        Some("COLUMN".to_string()),
        Some("Y".to_string()),
        None,
        Some("N".to_string()),
        Some("N".to_string()),
        None,
        None,
        column.comment.clone(),
        None,
    ])
}

/// Connection and statement bookkeeping shared with the test
#[derive(Debug, Default)]
pub struct Activity {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub statements: Mutex<Vec<String>>,
}

impl Activity {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

pub struct FakeConnector {
    warehouse: Arc<FakeWarehouse>,
    pub activity: Arc<Activity>,
}

impl FakeConnector {
    pub fn new(warehouse: FakeWarehouse) -> Self {
        Self {
            warehouse: Arc::new(warehouse),
            activity: Arc::new(Activity::default()),
        }
    }
}

#[async_trait]
impl WarehouseConnector for FakeConnector {
    type Connection = FakeConnection;

    async fn open(&self, database: &str) -> Result<FakeConnection, WarehouseError> {
        if self.warehouse.refuse_connections {
            return Err(WarehouseError::Connection(
                "Incorrect username or password was specified".into(),
            ));
        }

        self.activity.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConnection {
            warehouse: Arc::clone(&self.warehouse),
            activity: Arc::clone(&self.activity),
            database: database.to_string(),
            closed: false,
        })
    }
}

pub struct FakeConnection {
    warehouse: Arc<FakeWarehouse>,
    activity: Arc<Activity>,
    database: String,
    closed: bool,
}

#[async_trait]
impl WarehouseConnection for FakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<Vec<Row>, WarehouseError> {
        assert!(!self.closed, "statement executed on a closed connection");
        self.activity.statements.lock().unwrap().push(sql.to_string());
        self.warehouse.answer(&self.database, sql)
    }

    async fn close(&mut self) -> Result<(), WarehouseError> {
        if !self.closed {
            self.closed = true;
            self.activity.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
