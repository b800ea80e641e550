//! Feature builder
//!
//! Aggregates joined transaction rows into one [`CustomerFeatureVector`] per
//! customer. The build is a pure function of the rows and the reference
//! instant: nothing here reads the wall clock.

use crate::schema::{
    count_field, date_field, f64_field, require_columns, string_field, timestamp_field,
    CATEGORY, CUSTOMER_ID, QUANTITY, REGION, SIGNUP_DATE, TOTAL_VALUE, TRANSACTION_DATE,
    TRANSACTION_ID,
};
use crate::table::{CustomerFeatureVector, FeatureTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lookalike_core::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const SECONDS_PER_DAY: i64 = 86_400;

/// First-seen demographic attributes of a customer
#[derive(Debug, Clone)]
struct Demographics {
    region: String,
    signup_date: NaiveDate,
}

/// Running transactional aggregates of a customer
#[derive(Debug, Clone)]
struct Activity {
    total_spend: f64,
    transactions: u32,
    quantity: u64,
    last_purchase: NaiveDateTime,
}

impl Activity {
    fn new(total_value: f64, quantity: u32, date: NaiveDateTime) -> Self {
        Self {
            total_spend: total_value,
            transactions: 1,
            quantity: quantity as u64,
            last_purchase: date,
        }
    }

    fn record(&mut self, total_value: f64, quantity: u32, date: NaiveDateTime) {
        self.total_spend += total_value;
        self.transactions += 1;
        self.quantity += quantity as u64;
        self.last_purchase = self.last_purchase.max(date);
    }

    fn avg_basket_size(&self) -> f64 {
        self.quantity as f64 / self.transactions as f64
    }
}

/// Builds customer profiles relative to a fixed reference instant
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    reference: NaiveDateTime,
}

impl FeatureBuilder {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    /// Floor of the day difference between the reference and signup at midnight
    pub fn tenure_days(&self, signup_date: NaiveDate) -> i64 {
        let signup = signup_date.and_time(NaiveTime::default());
        (self.reference - signup).num_seconds().div_euclid(SECONDS_PER_DAY)
    }

    /// Build the feature table from joined transaction rows.
    ///
    /// Customers are emitted in ascending ID order and the category columns are
    /// the sorted set of every category seen in `rows`.
    pub fn build(&self, rows: &[Value]) -> Result<FeatureTable> {
        if rows.is_empty() {
            return Err(Error::EmptyInput("no transactions to aggregate".to_string()));
        }
        require_columns(rows)?;

        let mut demographics: BTreeMap<String, Demographics> = BTreeMap::new();
        let mut activity: BTreeMap<String, Activity> = BTreeMap::new();
        let mut pivot: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
        let mut categories: BTreeSet<String> = BTreeSet::new();

        for (index, row) in rows.iter().enumerate() {
            let customer_id = string_field(row, CUSTOMER_ID, index)?;
            let region = string_field(row, REGION, index)?;
            let signup_date = date_field(row, SIGNUP_DATE, index)?;
            string_field(row, TRANSACTION_ID, index)?;
            let quantity = count_field(row, QUANTITY, index)?;
            let total_value = f64_field(row, TOTAL_VALUE, index)?;
            let date = timestamp_field(row, TRANSACTION_DATE, index)?;
            let category = string_field(row, CATEGORY, index)?;

            demographics
                .entry(customer_id.clone())
                .or_insert(Demographics { region, signup_date });

            activity
                .entry(customer_id.clone())
                .and_modify(|a| a.record(total_value, quantity, date))
                .or_insert_with(|| Activity::new(total_value, quantity, date));

            *pivot
                .entry(customer_id)
                .or_default()
                .entry(category.clone())
                .or_insert(0) += 1;
            categories.insert(category);
        }

        let categories: Vec<String> = categories.into_iter().collect();
        let profiles = self.join(&categories, demographics, activity, pivot);

        tracing::info!(
            transactions = rows.len(),
            customers = profiles.len(),
            categories = categories.len(),
            reference = %self.reference,
            "built customer features"
        );

        FeatureTable::new(categories, profiles)
    }

    /// Inner join of the three per-customer views on CustomerID
    fn join(
        &self,
        categories: &[String],
        demographics: BTreeMap<String, Demographics>,
        mut activity: BTreeMap<String, Activity>,
        mut pivot: BTreeMap<String, BTreeMap<String, u32>>,
    ) -> Vec<CustomerFeatureVector> {
        demographics
            .into_iter()
            .filter_map(|(customer_id, demo)| {
                let stats = activity.remove(&customer_id)?;
                let counts = pivot.remove(&customer_id)?;
                let category_counts = categories
                    .iter()
                    .map(|c| counts.get(c).copied().unwrap_or(0))
                    .collect();

                Some(CustomerFeatureVector {
                    tenure: self.tenure_days(demo.signup_date),
                    customer_id,
                    region: demo.region,
                    signup_date: demo.signup_date,
                    total_spend: stats.total_spend,
                    purchase_freq: stats.transactions,
                    avg_basket_size: stats.avg_basket_size(),
                    last_purchase: stats.last_purchase,
                    category_counts,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookalike_core::SchemaError;
    use serde_json::json;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tx(customer: &str, region: &str, category: &str, qty: u32, value: f64, date: &str) -> Value {
        json!({
            "CustomerID": customer,
            "Region": region,
            "SignupDate": "2024-12-01",
            "TransactionID": format!("T-{}-{}", customer, date),
            "Quantity": qty,
            "TotalValue": value,
            "TransactionDate": date,
            "Category": category
        })
    }

    #[test]
    fn test_build_aggregates() {
        let rows = vec![
            tx("C2", "Asia", "Books", 2, 50.0, "2024-12-05 10:00:00"),
            tx("C1", "Europe", "Toys", 1, 20.0, "2024-12-03 10:00:00"),
            tx("C2", "Asia", "Toys", 4, 150.0, "2024-12-20 08:30:00"),
        ];
        let table = FeatureBuilder::new(reference()).build(&rows).unwrap();

        assert_eq!(table.categories(), &["Books".to_string(), "Toys".to_string()]);
        assert_eq!(table.customer_ids(), vec!["C1".to_string(), "C2".to_string()]);

        let c2 = table.get("C2").unwrap();
        assert_eq!(c2.region, "Asia");
        assert_eq!(c2.purchase_freq, 2);
        assert!((c2.total_spend - 200.0).abs() < 1e-9);
        assert!((c2.avg_basket_size - 3.0).abs() < 1e-9);
        assert_eq!(c2.category_counts, vec![1, 1]);
        assert_eq!(c2.last_purchase.to_string(), "2024-12-20 08:30:00");

        let c1 = table.get("C1").unwrap();
        assert_eq!(c1.category_counts, vec![0, 1]);
    }

    #[test]
    fn test_tenure_relative_to_reference() {
        let rows = vec![tx("C1", "Asia", "Books", 1, 10.0, "2024-12-02 00:00:00")];
        let table = FeatureBuilder::new(reference()).build(&rows).unwrap();
        // 2024-12-01 -> 2025-01-01 12:00 is 31.5 days
        assert_eq!(table.rows()[0].tenure, 31);
    }

    #[test]
    fn test_tenure_floors_before_signup() {
        let builder = FeatureBuilder::new(reference());
        let signup = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(builder.tenure_days(signup), -1);
    }

    #[test]
    fn test_first_seen_demographics() {
        let mut later = tx("C1", "Europe", "Books", 1, 10.0, "2024-12-09 00:00:00");
        later["SignupDate"] = json!("2020-01-01");
        let rows = vec![tx("C1", "Asia", "Books", 1, 10.0, "2024-12-08 00:00:00"), later];

        let table = FeatureBuilder::new(reference()).build(&rows).unwrap();
        let c1 = &table.rows()[0];
        assert_eq!(c1.region, "Asia");
        assert_eq!(c1.signup_date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
    }

    #[test]
    fn test_empty_input() {
        let err = FeatureBuilder::new(reference()).build(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyInput(_)));
    }

    #[test]
    fn test_missing_column() {
        let mut row = tx("C1", "Asia", "Books", 1, 10.0, "2024-12-08 00:00:00");
        row.as_object_mut().unwrap().remove("Category");

        let err = FeatureBuilder::new(reference()).build(&[row]).unwrap_err();
        assert_eq!(err, Error::Schema(SchemaError::MissingColumn("Category".to_string())));
    }

    #[test]
    fn test_malformed_value() {
        let mut row = tx("C1", "Asia", "Books", 1, 10.0, "2024-12-08 00:00:00");
        row["TotalValue"] = json!("lots");

        let err = FeatureBuilder::new(reference()).build(&[row]).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::InvalidValue { ref column, row: 0, .. }) if column == "TotalValue"
        ));
    }

    #[test]
    fn test_build_is_deterministic() {
        let rows = vec![
            tx("C3", "Asia", "Garden", 1, 5.0, "2024-12-05 10:00:00"),
            tx("C1", "Europe", "Toys", 1, 20.0, "2024-12-03 10:00:00"),
            tx("C2", "Asia", "Books", 2, 50.0, "2024-12-04 10:00:00"),
        ];
        let builder = FeatureBuilder::new(reference());
        assert_eq!(builder.build(&rows).unwrap(), builder.build(&rows).unwrap());
    }
}
