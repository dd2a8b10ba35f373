//! Schema and statistics types
//!
//! These types represent warehouse metadata and column statistics as they
//! are returned to clients. All of them are request scoped.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::database::traits::WarehouseError;
use crate::queries::quote_identifier;
use crate::types::{classify, NormalizedType};

/// Description text used when a column carries no comment
pub const NO_DESCRIPTION: &str = "No description";

/// A single column of a described table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name exactly as the warehouse reports it
    pub column_name: String,

    /// Declared type including parameters (e.g., "NUMBER(38,0)")
    pub data_type: String,

    /// Column comment, or "No description"
    pub description: String,
}

/// The five statistics computed per column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatName {
    NonNullCount,
    UniqueCount,
    Mean,
    Min,
    Max,
}

impl StatName {
    /// Stat slots in the order they appear in the per-column SELECT list,
    /// after the leading column-name tag
    pub const SELECT_ORDER: [StatName; 5] = [
        StatName::NonNullCount,
        StatName::UniqueCount,
        StatName::Mean,
        StatName::Min,
        StatName::Max,
    ];

    /// Key used in API responses
    pub fn key(self) -> &'static str {
        match self {
            StatName::NonNullCount => "non_null_count",
            StatName::UniqueCount => "unique_count",
            StatName::Mean => "mean",
            StatName::Min => "min",
            StatName::Max => "max",
        }
    }

    /// Column alias in the statistics SELECT list
    ///
    /// `mean`, `min` and `max` are suffixed to stay clear of the aggregate
    /// function names.
    pub fn alias(self) -> &'static str {
        match self {
            StatName::NonNullCount => "non_null_count",
            StatName::UniqueCount => "unique_count",
            StatName::Mean => "mean_",
            StatName::Min => "min_",
            StatName::Max => "max_",
        }
    }

    /// Result field holding this stat, counting the tag at field 0
    pub fn field_index(self) -> usize {
        Self::SELECT_ORDER
            .iter()
            .position(|stat| *stat == self)
            .map(|position| position + 1)
            .unwrap_or_default()
    }
}

/// Which aggregates to compute for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnStatSpec {
    /// Column the aggregates apply to
    pub column_name: String,

    /// Classification that selected the aggregates
    pub kind: NormalizedType,

    /// Stat name to SQL expression; stats not listed are not computed
    pub expressions: Vec<(StatName, String)>,
}

impl ColumnStatSpec {
    /// Select aggregates from the declared type of a column
    ///
    /// Numeric columns get count, mean, min and max. Everything else gets
    /// count and distinct count.
    pub fn for_column(column_name: &str, raw_type: &str) -> Result<Self, WarehouseError> {
        let column = quote_identifier(column_name)?;
        let kind = classify(raw_type);

        let expressions = match kind {
            NormalizedType::Numeric => vec![
                (StatName::NonNullCount, format!("COUNT({})", column)),
                (StatName::Mean, format!("AVG({})", column)),
                (StatName::Min, format!("MIN({})", column)),
                (StatName::Max, format!("MAX({})", column)),
            ],
            NormalizedType::Other => vec![
                (StatName::NonNullCount, format!("COUNT({})", column)),
                (StatName::UniqueCount, format!("COUNT(DISTINCT {})", column)),
            ],
        };

        Ok(Self {
            column_name: column_name.to_string(),
            kind,
            expressions,
        })
    }

    /// SQL expression for `stat`, if this column computes it
    pub fn expression(&self, stat: StatName) -> Option<&str> {
        self.expressions
            .iter()
            .find(|(name, _)| *name == stat)
            .map(|(_, expression)| expression.as_str())
    }
}

/// Statistics fetched for one column
///
/// Stats outside the column's branch are `None` and serialise as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatResult {
    pub non_null_count: Option<serde_json::Value>,
    pub mean: Option<serde_json::Value>,
    pub min: Option<serde_json::Value>,
    pub max: Option<serde_json::Value>,
    pub unique_count: Option<serde_json::Value>,
}

impl ColumnStatResult {
    pub fn get(&self, stat: StatName) -> Option<&serde_json::Value> {
        match stat {
            StatName::NonNullCount => self.non_null_count.as_ref(),
            StatName::UniqueCount => self.unique_count.as_ref(),
            StatName::Mean => self.mean.as_ref(),
            StatName::Min => self.min.as_ref(),
            StatName::Max => self.max.as_ref(),
        }
    }

    pub fn set(&mut self, stat: StatName, value: Option<serde_json::Value>) {
        let slot = match stat {
            StatName::NonNullCount => &mut self.non_null_count,
            StatName::UniqueCount => &mut self.unique_count,
            StatName::Mean => &mut self.mean,
            StatName::Min => &mut self.min,
            StatName::Max => &mut self.max,
        };
        *slot = value;
    }
}

/// Statistics for every column of a table, in describe order
///
/// Serialises as a JSON object keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableMetrics {
    columns: Vec<(String, ColumnStatResult)>,
}

impl TableMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the statistics of a column
    pub fn insert(&mut self, column_name: impl Into<String>, result: ColumnStatResult) {
        let column_name = column_name.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column_name) {
            Some((_, existing)) => *existing = result,
            None => self.columns.push((column_name, result)),
        }
    }

    pub fn get(&self, column_name: &str) -> Option<&ColumnStatResult> {
        self.columns
            .iter()
            .find(|(name, _)| name == column_name)
            .map(|(_, result)| result)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStatResult)> {
        self.columns
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }
}

impl Serialize for TableMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, result) in &self.columns {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

/// Response body of the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Response body for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message including its causal chain
    pub detail: String,
}
