//! SQL templates
//!
//! Pure string builders for the statements sent to the warehouse. Every
//! identifier passes through [`render_identifier`] or [`quote_identifier`]
//! before it is placed into SQL text.

use crate::database::traits::WarehouseError;
use crate::schema::{ColumnStatSpec, StatName};

/// Keywords the warehouse refuses as unquoted identifiers
const RESERVED_KEYWORDS: &[&str] = &[
    "ACCOUNT", "ALL", "ALTER", "AND", "ANY", "AS", "ASOF", "BETWEEN", "BY", "CASE", "CAST",
    "CHECK", "COLUMN", "CONNECT", "CONNECTION", "CONSTRAINT", "CREATE", "CROSS", "CURRENT",
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DATABASE", "DELETE",
    "DISTINCT", "DROP", "ELSE", "EXISTS", "FALSE", "FOLLOWING", "FOR", "FROM", "FULL", "GRANT",
    "GROUP", "GSCLUSTER", "HAVING", "ILIKE", "IN", "INCREMENT", "INNER", "INSERT", "INTERSECT",
    "INTO", "IS", "ISSUE", "JOIN", "LATERAL", "LEFT", "LIKE", "LOCALTIME", "LOCALTIMESTAMP",
    "MATCH_CONDITION", "MINUS", "NATURAL", "NOT", "NULL", "OF", "ON", "OR", "ORDER",
    "ORGANIZATION", "QUALIFY", "REGEXP", "REVOKE", "RIGHT", "RLIKE", "ROW", "ROWS", "SAMPLE",
    "SCHEMA", "SELECT", "SET", "SOME", "START", "TABLE", "TABLESAMPLE", "THEN", "TO", "TRIGGER",
    "TRUE", "TRY_CAST", "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN",
    "WHENEVER", "WHERE", "WITH",
];

/// Place an identifier into SQL, keeping plain names bare
///
/// Names matching `[A-Za-z_][A-Za-z0-9_$]*` are emitted unchanged so the
/// warehouse resolves them case-insensitively. Reserved keywords are quoted
/// in upper case, which is how the warehouse stores an unquoted name.
/// Anything else is quoted verbatim.
pub fn render_identifier(identifier: &str) -> Result<String, WarehouseError> {
    validate_identifier(identifier)?;

    if !is_plain_identifier(identifier) {
        return Ok(quote_double(identifier));
    }

    if is_reserved_keyword(identifier) {
        Ok(quote_double(&identifier.to_ascii_uppercase()))
    } else {
        Ok(identifier.to_string())
    }
}

/// Quote an identifier so it matches exactly, including case
pub fn quote_identifier(identifier: &str) -> Result<String, WarehouseError> {
    validate_identifier(identifier)?;
    Ok(quote_double(identifier))
}

/// Quote a string literal with single quotes
///
/// Backslash is an escape character inside warehouse string constants, so it
/// is doubled before single quotes are.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
}

fn quote_double(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn validate_identifier(identifier: &str) -> Result<(), WarehouseError> {
    if identifier.is_empty() || identifier.contains('\0') {
        return Err(WarehouseError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}

fn is_reserved_keyword(identifier: &str) -> bool {
    RESERVED_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(identifier))
}

fn is_plain_identifier(identifier: &str) -> bool {
    let mut characters = identifier.chars();
    match characters.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    characters.all(|character| character.is_ascii_alphanumeric() || character == '_' || character == '$')
}

/// List the schemas of a database
pub fn list_schemas_query(database: &str) -> Result<String, WarehouseError> {
    Ok(format!("SHOW SCHEMAS IN DATABASE {}", render_identifier(database)?))
}

/// List the tables of a schema
pub fn list_tables_query(schema: &str, database: &str) -> Result<String, WarehouseError> {
    Ok(format!(
        "SHOW TABLES IN SCHEMA {}.{}",
        render_identifier(database)?,
        render_identifier(schema)?
    ))
}

/// Describe every column of a table
pub fn describe_table_query(
    table: &str,
    schema: &str,
    database: &str,
) -> Result<String, WarehouseError> {
    Ok(format!(
        "DESCRIBE TABLE {}.{}.{}",
        render_identifier(database)?,
        render_identifier(schema)?,
        render_identifier(table)?
    ))
}

/// Statistics query for a single column
///
/// Selects one row: the column-name tag followed by every stat slot in
/// [`StatName::SELECT_ORDER`], with `null` in slots the column does not
/// compute.
pub fn column_stats_query(
    database: &str,
    schema: &str,
    table: &str,
    spec: &ColumnStatSpec,
) -> Result<String, WarehouseError> {
    let mut select_list = vec![format!("{} AS column_name", quote_literal(&spec.column_name))];

    for stat in StatName::SELECT_ORDER {
        let expression = spec.expression(stat).unwrap_or("null");
        select_list.push(format!("{} AS {}", expression, stat.alias()));
    }

    Ok(format!(
        "SELECT {} FROM {}.{}.{}",
        select_list.join(", "),
        render_identifier(database)?,
        render_identifier(schema)?,
        render_identifier(table)?
    ))
}
