//! Warehouse connector traits
//!
//! These traits define the interface a warehouse client must provide. The
//! service only ever talks to the warehouse through them, which keeps the
//! Snowflake wire protocol out of the query and row-shaping logic.

use async_trait::async_trait;
use thiserror::Error;

/// A single result row as returned by the warehouse
///
/// Cells are kept as nullable text in the order the warehouse produced them.
/// Rows are addressed by position only; see [`crate::decode`] for the
/// offsets this crate relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    /// Create a row from its cells
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Text of the cell at `index`, or `None` when the cell is null or the
    /// row is shorter than `index + 1`
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|cell| cell.as_deref())
    }

    /// Number of cells in the row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for Row {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|cell| cell.map(Into::into)).collect())
    }
}

/// Opens connections to the warehouse
///
/// Implementations hold the process-wide, read-only configuration
/// (credentials, account) and hand out one connection per call.
#[async_trait]
pub trait WarehouseConnector: Send + Sync + 'static {
    /// Connection type produced by this connector
    type Connection: WarehouseConnection;

    /// Open a connection scoped to `database`
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Connection`] when authentication, network or
    /// warehouse-side failures prevent the session from being established.
    async fn open(&self, database: &str) -> Result<Self::Connection, WarehouseError>;
}

/// A live warehouse session
///
/// Owned by exactly one operation. The owner must call [`close`] on every
/// exit path.
///
/// [`close`]: WarehouseConnection::close
#[async_trait]
pub trait WarehouseConnection: Send {
    /// Execute a single SQL statement and return all of its rows
    async fn execute(&mut self, sql: &str) -> Result<Vec<Row>, WarehouseError>;

    /// Release the session. Calling it more than once is a no-op.
    async fn close(&mut self) -> Result<(), WarehouseError>;
}

/// Warehouse error type
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Could not reach or authenticate to the warehouse
    #[error("Connection error: {0}")]
    Connection(String),

    /// The warehouse rejected or failed the statement
    #[error("Error executing query: {0}")]
    QueryExecution(String),

    /// Well-formed request with an empty result set
    #[error("{0}")]
    NotFound(String),

    /// Identifier that cannot be placed into SQL text
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Row shape does not match the positional contract
    #[error("Unexpected row shape: {0}")]
    Decode(String),

    /// An error wrapped with the operation that observed it
    #[error("{context}: {cause}")]
    Context {
        context: String,
        cause: Box<WarehouseError>,
    },
}

impl WarehouseError {
    /// Wrap this error with additional context
    pub fn context(self, context: impl Into<String>) -> Self {
        WarehouseError::Context {
            context: context.into(),
            cause: Box::new(self),
        }
    }

    /// The innermost error of the causal chain
    pub fn root(&self) -> &WarehouseError {
        let mut current = self;
        while let WarehouseError::Context { cause, .. } = current {
            current = cause;
        }
        current
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), WarehouseError::NotFound(_))
    }

    /// Whether the failure was caused by the request itself rather than the
    /// warehouse or this service
    pub fn is_client_error(&self) -> bool {
        matches!(self.root(), WarehouseError::InvalidIdentifier(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self.root(), WarehouseError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_accumulates_a_causal_chain() {
        let error = WarehouseError::QueryExecution("SQL compilation error".into())
            .context("Error fetching metadata for table T")
            .context("describe_columns");

        assert_eq!(
            error.to_string(),
            "describe_columns: Error fetching metadata for table T: Error executing query: SQL compilation error"
        );
        assert!(matches!(error.root(), WarehouseError::QueryExecution(_)));
    }

    #[test]
    fn classification_looks_through_context() {
        let not_found = WarehouseError::NotFound("No schemas found".into()).context("outer");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_client_error());

        let invalid = WarehouseError::InvalidIdentifier(String::new()).context("outer");
        assert!(invalid.is_client_error());

        let connection = WarehouseError::Connection("refused".into()).context("outer");
        assert!(connection.is_connection_error());
        assert!(!connection.is_not_found());
    }

    #[test]
    fn row_cells_are_positional_and_nullable() {
        let row: Row = vec![Some("ID"), None, Some("")].into_iter().collect();

        assert_eq!(row.len(), 3);
        assert_eq!(row.cell(0), Some("ID"));
        assert_eq!(row.cell(1), None);
        assert_eq!(row.cell(2), Some(""));
        assert_eq!(row.cell(9), None);
    }
}
