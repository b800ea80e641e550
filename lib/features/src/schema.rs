//! Column schema of the joined transaction rows
//!
//! Rows are JSON objects keyed by the external column names. Values may be
//! native JSON numbers or the strings a CSV reader hands over; both parse.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lookalike_core::SchemaError;
use serde_json::Value;

pub const CUSTOMER_ID: &str = "CustomerID";
pub const REGION: &str = "Region";
pub const SIGNUP_DATE: &str = "SignupDate";
pub const TRANSACTION_ID: &str = "TransactionID";
pub const PRODUCT_ID: &str = "ProductID";
pub const QUANTITY: &str = "Quantity";
pub const TOTAL_VALUE: &str = "TotalValue";
pub const TRANSACTION_DATE: &str = "TransactionDate";
pub const CATEGORY: &str = "Category";

/// Columns the feature builder reads from every joined row
pub const REQUIRED_COLUMNS: [&str; 8] = [
    CUSTOMER_ID,
    REGION,
    SIGNUP_DATE,
    TRANSACTION_ID,
    QUANTITY,
    TOTAL_VALUE,
    TRANSACTION_DATE,
    CATEGORY,
];

/// Check that every row is an object carrying all required columns
pub fn require_columns(rows: &[Value]) -> Result<(), SchemaError> {
    for (index, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| SchemaError::InvalidValue {
            column: "*".to_string(),
            row: index,
            reason: "row is not an object".to_string(),
        })?;
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !object.contains_key(**c)) {
            return Err(SchemaError::MissingColumn(missing.to_string()));
        }
    }
    Ok(())
}

fn field<'a>(row: &'a Value, column: &str) -> Result<&'a Value, SchemaError> {
    row.get(column)
        .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))
}

fn invalid(column: &str, row: usize, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidValue {
        column: column.to_string(),
        row,
        reason: reason.into(),
    }
}

/// Non-empty string cell. Numbers are accepted and rendered as text.
pub fn string_field(row: &Value, column: &str, index: usize) -> Result<String, SchemaError> {
    match field(row, column)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid(column, index, format!("expected text, got {}", other))),
    }
}

pub fn f64_field(row: &Value, column: &str, index: usize) -> Result<f64, SchemaError> {
    let value = match field(row, column)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(column, index, "expected a finite number"))
}

/// Whole, non-negative count such as a quantity
pub fn count_field(row: &Value, column: &str, index: usize) -> Result<u32, SchemaError> {
    let value = f64_field(row, column, index)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(invalid(column, index, format!("expected a whole count, got {}", value)));
    }
    Ok(value as u32)
}

pub fn date_field(row: &Value, column: &str, index: usize) -> Result<NaiveDate, SchemaError> {
    let text = string_field(row, column, index)?;
    parse_date(&text).ok_or_else(|| invalid(column, index, format!("unrecognized date '{}'", text)))
}

pub fn timestamp_field(row: &Value, column: &str, index: usize) -> Result<NaiveDateTime, SchemaError> {
    let text = string_field(row, column, index)?;
    parse_timestamp(&text)
        .ok_or_else(|| invalid(column, index, format!("unrecognized timestamp '{}'", text)))
}

/// Parse a calendar date; a full timestamp is truncated to its date
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(text).map(|ts| ts.date()))
}

/// Parse a timestamp; a bare date maps to midnight
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
