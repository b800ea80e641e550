//! CSV readers for the three input tables

use crate::error::{Result, StorageError};
use lookalike_core::SchemaError;
use lookalike_features::schema::{
    CATEGORY, CUSTOMER_ID, PRODUCT_ID, QUANTITY, REGION, SIGNUP_DATE, TOTAL_VALUE,
    TRANSACTION_DATE, TRANSACTION_ID,
};
use lookalike_features::{CustomerRecord, ProductRecord, TransactionRecord};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

pub const CUSTOMER_COLUMNS: [&str; 3] = [CUSTOMER_ID, REGION, SIGNUP_DATE];
pub const PRODUCT_COLUMNS: [&str; 2] = [PRODUCT_ID, CATEGORY];
pub const TRANSACTION_COLUMNS: [&str; 6] = [
    TRANSACTION_ID,
    CUSTOMER_ID,
    PRODUCT_ID,
    TRANSACTION_DATE,
    QUANTITY,
    TOTAL_VALUE,
];

pub fn read_customers<P: AsRef<Path>>(path: P) -> Result<Vec<CustomerRecord>> {
    read_table(path.as_ref(), &CUSTOMER_COLUMNS)
}

pub fn read_products<P: AsRef<Path>>(path: P) -> Result<Vec<ProductRecord>> {
    read_table(path.as_ref(), &PRODUCT_COLUMNS)
}

pub fn read_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<TransactionRecord>> {
    read_table(path.as_ref(), &TRANSACTION_COLUMNS)
}

/// Read a headed CSV file into typed records.
///
/// Columns are matched by name, so extra columns and any column order are
/// accepted. A missing required column is a schema error, raised before any
/// row is read.
fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| StorageError::csv(path, e))?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(lookalike_core::Error::from(SchemaError::MissingColumn(column.to_string())).into());
        }
    }

    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record.map_err(|e| StorageError::csv(path, e))?);
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "table loaded");
    Ok(records)
}
