//! Data type normalisation
//!
//! Warehouse type names carry parameters (`VARCHAR(16)`, `NUMBER(38,0)`).
//! Statistics only need a coarse numeric / non-numeric split, so the
//! parameter list is stripped before classification.

/// Base type names that receive mean/min/max statistics
///
/// Matching is exact: casing and whitespace are not normalised, so a type the
/// warehouse reports in a different spelling falls into the categorical branch.
pub const NUMERIC_TYPES: [&str; 5] = ["NUMBER", "INTEGER", "DECIMAL", "FLOAT", "DOUBLE"];

/// Coarse classification of a column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedType {
    Numeric,
    Other,
}

/// Strip the parameter list from a raw type name
///
/// Returns the prefix before the first `(`, or the input unchanged when there
/// is none.
pub fn normalize(raw_type: &str) -> &str {
    match raw_type.find('(') {
        Some(index) => &raw_type[..index],
        None => raw_type,
    }
}

/// Classify a raw type name for statistics selection
pub fn classify(raw_type: &str) -> NormalizedType {
    let base = normalize(raw_type);
    if NUMERIC_TYPES.iter().any(|numeric| *numeric == base) {
        NormalizedType::Numeric
    } else {
        NormalizedType::Other
    }
}
