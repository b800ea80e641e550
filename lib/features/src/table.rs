use chrono::{NaiveDate, NaiveDateTime};
use lookalike_core::{Error, Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TENURE: &str = "tenure";
pub const TOTAL_SPEND: &str = "total_spend";
pub const PURCHASE_FREQ: &str = "purchase_freq";
pub const AVG_BASKET_SIZE: &str = "avg_basket_size";

/// Numeric attributes in their canonical column order
pub const NUMERIC_COLUMNS: [&str; 4] = [TENURE, TOTAL_SPEND, PURCHASE_FREQ, AVG_BASKET_SIZE];

/// Behavioral profile of a single customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeatureVector {
    pub customer_id: String,
    pub region: String,
    pub signup_date: NaiveDate,
    /// Whole days between signup and the reference instant
    pub tenure: i64,
    pub total_spend: f64,
    pub purchase_freq: u32,
    pub avg_basket_size: f64,
    pub last_purchase: NaiveDateTime,
    /// Transaction counts aligned with [`FeatureTable::categories`]
    pub category_counts: Vec<u32>,
}

impl CustomerFeatureVector {
    /// Look up a numeric attribute by column name
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            TENURE => Some(self.tenure as f64),
            TOTAL_SPEND => Some(self.total_spend),
            PURCHASE_FREQ => Some(self.purchase_freq as f64),
            AVG_BASKET_SIZE => Some(self.avg_basket_size),
            _ => None,
        }
    }
}

/// One profile per customer plus the global category column set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    categories: Vec<String>,
    rows: Vec<CustomerFeatureVector>,
}

impl FeatureTable {
    pub fn new(categories: Vec<String>, rows: Vec<CustomerFeatureVector>) -> Result<Self> {
        let mut seen_categories = HashSet::with_capacity(categories.len());
        if let Some(dup) = categories.iter().find(|c| !seen_categories.insert(c.as_str())) {
            return Err(Error::Invariant(format!("duplicate category column '{}'", dup)));
        }

        let mut seen_ids = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.category_counts.len() != categories.len() {
                return Err(SchemaError::WidthMismatch {
                    expected: categories.len(),
                    actual: row.category_counts.len(),
                }
                .into());
            }
            if !seen_ids.insert(row.customer_id.as_str()) {
                return Err(Error::Invariant(format!(
                    "duplicate customer id '{}' in feature table",
                    row.customer_id
                )));
            }
        }

        Ok(Self { categories, rows })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn rows(&self) -> &[CustomerFeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Customer IDs in row order, index-aligned with any matrix encoded from this table
    pub fn customer_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.customer_id.clone()).collect()
    }

    pub fn get(&self, customer_id: &str) -> Option<&CustomerFeatureVector> {
        self.rows.iter().find(|r| r.customer_id == customer_id)
    }

    /// Count for a named category column; zero for categories outside this table
    pub fn category_count(&self, row: &CustomerFeatureVector, category: &str) -> u32 {
        self.categories
            .iter()
            .position(|c| c == category)
            .and_then(|i| row.category_counts.get(i).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, counts: Vec<u32>) -> CustomerFeatureVector {
        CustomerFeatureVector {
            customer_id: id.to_string(),
            region: "Asia".to_string(),
            signup_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            tenure: 10,
            total_spend: 100.0,
            purchase_freq: 2,
            avg_basket_size: 1.5,
            last_purchase: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            category_counts: counts,
        }
    }

    #[test]
    fn test_table_width_checked() {
        let err = FeatureTable::new(vec!["Books".to_string()], vec![profile("C1", vec![1, 2])]).unwrap_err();
        assert_eq!(
            err,
            Error::Schema(SchemaError::WidthMismatch { expected: 1, actual: 2 })
        );
    }

    #[test]
    fn test_table_duplicate_ids() {
        let err = FeatureTable::new(
            vec!["Books".to_string()],
            vec![profile("C1", vec![1]), profile("C1", vec![0])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn test_category_count_lookup() {
        let table = FeatureTable::new(
            vec!["Books".to_string(), "Toys".to_string()],
            vec![profile("C1", vec![3, 1])],
        )
        .unwrap();
        let row = &table.rows()[0];
        assert_eq!(table.category_count(row, "Toys"), 1);
        assert_eq!(table.category_count(row, "Garden"), 0);
    }

    #[test]
    fn test_numeric_lookup() {
        let row = profile("C1", vec![]);
        assert_eq!(row.numeric(TENURE), Some(10.0));
        assert_eq!(row.numeric(PURCHASE_FREQ), Some(2.0));
        assert_eq!(row.numeric("region"), None);
    }
}
