//! Positional row decoding
//!
//! The warehouse returns rows without usable field names, so every offset
//! this crate depends on lives here:
//!
//! | Statement             | Field | Meaning              |
//! |-----------------------|-------|----------------------|
//! | `SHOW SCHEMAS`        | 1     | schema name          |
//! | `SHOW TABLES`         | 1     | table name           |
//! | `DESCRIBE TABLE`      | 0     | column name          |
//! | `DESCRIBE TABLE`      | 1     | declared type        |
//! | `DESCRIBE TABLE`      | 9     | comment              |
//! | column statistics     | 0     | column-name tag      |
//! | column statistics     | 1..=5 | [`StatName::SELECT_ORDER`] |

use crate::database::traits::{Row, WarehouseError};
use crate::schema::{ColumnDescriptor, ColumnStatResult, StatName, NO_DESCRIPTION};

const SHOW_NAME_FIELD: usize = 1;
const DESCRIBE_NAME_FIELD: usize = 0;
const DESCRIBE_TYPE_FIELD: usize = 1;
const DESCRIBE_COMMENT_FIELD: usize = 9;

/// Name field of `SHOW SCHEMAS` / `SHOW TABLES` rows, skipping null names
pub fn object_names(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.cell(SHOW_NAME_FIELD))
        .map(str::to_string)
        .collect()
}

/// Decode one `DESCRIBE TABLE` row
///
/// A null or empty comment becomes "No description".
pub fn column_descriptor(row: &Row) -> Result<ColumnDescriptor, WarehouseError> {
    let column_name = row.cell(DESCRIBE_NAME_FIELD).ok_or_else(|| {
        WarehouseError::Decode(format!(
            "describe row without a column name ({} fields)",
            row.len()
        ))
    })?;
    let data_type = row.cell(DESCRIBE_TYPE_FIELD).ok_or_else(|| {
        WarehouseError::Decode(format!("describe row for {} without a type", column_name))
    })?;

    let description = match row.cell(DESCRIBE_COMMENT_FIELD) {
        Some(comment) if !comment.is_empty() => comment,
        _ => NO_DESCRIPTION,
    };

    Ok(ColumnDescriptor {
        column_name: column_name.to_string(),
        data_type: data_type.to_string(),
        description: description.to_string(),
    })
}

/// Decode the single row of a column statistics query
pub fn column_stats(row: &Row) -> Result<ColumnStatResult, WarehouseError> {
    let expected = StatName::SELECT_ORDER.len() + 1;
    if row.len() < expected {
        return Err(WarehouseError::Decode(format!(
            "statistics row has {} fields, expected {}",
            row.len(),
            expected
        )));
    }

    let mut result = ColumnStatResult::default();
    for stat in StatName::SELECT_ORDER {
        result.set(stat, row.cell(stat.field_index()).map(stat_value));
    }
    Ok(result)
}

/// Interpret a statistics cell as a JSON number where possible
///
/// Integers and finite floats become numbers; anything else (dates,
/// timestamps, text) is kept as a string. Decimals a float cannot carry
/// without losing digits are kept as strings too.
pub fn stat_value(text: &str) -> serde_json::Value {
    if let Ok(integer) = text.parse::<i64>() {
        return serde_json::Value::from(integer);
    }
    if let Ok(integer) = text.parse::<u64>() {
        return serde_json::Value::from(integer);
    }

    text.parse::<f64>()
        .ok()
        .filter(|float| significant_digits(&float.to_string()) == significant_digits(text))
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(text.to_string()))
}

/// Mantissa digits without sign, point, exponent or padding zeros
fn significant_digits(text: &str) -> String {
    let mantissa = text.split(['e', 'E']).next().unwrap_or_default();
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn describe_row(name: &str, data_type: &str, comment: Option<&str>) -> Row {
        vec![
            Some(name),
            Some(data_type),
            Some("COLUMN"),
            Some("Y"),
            None,
            Some("N"),
            Some("N"),
            None,
            None,
            comment,
            None,
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn object_names_skip_null_names() {
        let rows: Vec<Row> = vec![
            vec![Some("2024-01-01"), Some("INFORMATION_SCHEMA")].into_iter().collect(),
            vec![Some("2024-01-01"), None].into_iter().collect(),
            vec![Some("2024-01-01"), Some("PUBLIC")].into_iter().collect(),
        ];

        assert_eq!(object_names(&rows), vec!["INFORMATION_SCHEMA", "PUBLIC"]);
    }

    #[test]
    fn descriptor_reads_offsets_zero_one_and_nine() {
        let descriptor = column_descriptor(&describe_row("ID", "NUMBER(38,0)", Some("primary id")))
            .unwrap();

        assert_eq!(
            descriptor,
            ColumnDescriptor {
                column_name: "ID".into(),
                data_type: "NUMBER(38,0)".into(),
                description: "primary id".into(),
            }
        );
    }

    #[test]
    fn missing_or_empty_comment_defaults() {
        let null_comment = column_descriptor(&describe_row("NAME", "VARCHAR(50)", None)).unwrap();
        assert_eq!(null_comment.description, NO_DESCRIPTION);

        let empty_comment =
            column_descriptor(&describe_row("NAME", "VARCHAR(50)", Some(""))).unwrap();
        assert_eq!(empty_comment.description, NO_DESCRIPTION);

        let short_row: Row = vec![Some("NAME"), Some("VARCHAR(50)")].into_iter().collect();
        assert_eq!(column_descriptor(&short_row).unwrap().description, NO_DESCRIPTION);
    }

    #[test]
    fn descriptor_without_name_is_a_decode_error() {
        let row: Row = vec![None, Some("VARCHAR")].into_iter().collect();
        assert!(matches!(column_descriptor(&row), Err(WarehouseError::Decode(_))));
    }

    #[test]
    fn numeric_stats_row_populates_mean_min_max() {
        let row: Row = vec![Some("ID"), Some("2"), None, Some("1.5"), Some("1"), Some("2")]
            .into_iter()
            .collect();

        let result = column_stats(&row).unwrap();
        assert_eq!(result.non_null_count, Some(json!(2)));
        assert_eq!(result.unique_count, None);
        assert_eq!(result.mean, Some(json!(1.5)));
        assert_eq!(result.min, Some(json!(1)));
        assert_eq!(result.max, Some(json!(2)));
    }

    #[test]
    fn categorical_stats_row_populates_unique_count() {
        let row: Row = vec![Some("NAME"), Some("2"), Some("2"), None, None, None]
            .into_iter()
            .collect();

        let result = column_stats(&row).unwrap();
        assert_eq!(result.non_null_count, Some(json!(2)));
        assert_eq!(result.unique_count, Some(json!(2)));
        assert_eq!(result.mean, None);
        assert_eq!(result.min, None);
        assert_eq!(result.max, None);
    }

    #[test]
    fn short_stats_row_is_rejected() {
        let row: Row = vec![Some("ID"), Some("2")].into_iter().collect();
        assert!(matches!(column_stats(&row), Err(WarehouseError::Decode(_))));
    }

    #[test]
    fn stat_values_prefer_numbers() {
        assert_eq!(stat_value("42"), json!(42));
        assert_eq!(stat_value("-3.250000"), json!(-3.25));
        assert_eq!(stat_value("2024-05-01"), json!("2024-05-01"));
        assert_eq!(stat_value("NaN"), json!("NaN"));
        assert_eq!(stat_value("0.000000"), json!(0.0));
        assert_eq!(stat_value("1.5e3"), json!(1500.0));
        assert_eq!(stat_value("18446744073709551615"), json!(18446744073709551615u64));
    }

    #[test]
    fn wide_decimals_are_not_rounded() {
        assert_eq!(
            stat_value("123456789012345678901234567890"),
            json!("123456789012345678901234567890")
        );
        assert_eq!(
            stat_value("-98765432109876543210"),
            json!("-98765432109876543210")
        );
        assert_eq!(
            stat_value("12345.678901234567890123"),
            json!("12345.678901234567890123")
        );
        assert_eq!(stat_value("0.1"), json!(0.1));
        assert_eq!(stat_value("3.333333"), json!(3.333333));
    }
}
