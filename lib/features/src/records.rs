//! Input records and the inner join that feeds the feature builder

use crate::schema::{
    CATEGORY, CUSTOMER_ID, PRODUCT_ID, QUANTITY, REGION, SIGNUP_DATE, TOTAL_VALUE,
    TRANSACTION_DATE, TRANSACTION_ID,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the customer table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "CustomerName", default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(rename = "Region")]
    pub region: String,
    /// Kept as text; parsed by the builder so bad dates surface as schema errors
    #[serde(rename = "SignupDate")]
    pub signup_date: String,
}

/// One row of the product catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "ProductName", default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// One row of the transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "TransactionDate")]
    pub transaction_date: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "TotalValue")]
    pub total_value: f64,
    #[serde(rename = "Price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Outcome of [`join_tables`]
#[derive(Debug, Clone, Default)]
pub struct JoinedRows {
    pub rows: Vec<Value>,
    /// Transactions dropped because their customer was unknown
    pub unmatched_customers: usize,
    /// Transactions dropped because their product was unknown
    pub unmatched_products: usize,
}

/// Inner-join transactions with their customer and product.
///
/// Output rows keep transaction order. When an ID appears more than once in
/// the customer or product table, the first row wins.
pub fn join_tables(
    customers: &[CustomerRecord],
    transactions: &[TransactionRecord],
    products: &[ProductRecord],
) -> JoinedRows {
    let mut customer_lookup: AHashMap<&str, &CustomerRecord> = AHashMap::with_capacity(customers.len());
    for customer in customers {
        customer_lookup.entry(customer.customer_id.as_str()).or_insert(customer);
    }
    let mut product_lookup: AHashMap<&str, &ProductRecord> = AHashMap::with_capacity(products.len());
    for product in products {
        product_lookup.entry(product.product_id.as_str()).or_insert(product);
    }

    let mut joined = JoinedRows {
        rows: Vec::with_capacity(transactions.len()),
        ..JoinedRows::default()
    };

    for tx in transactions {
        let Some(customer) = customer_lookup.get(tx.customer_id.as_str()) else {
            joined.unmatched_customers += 1;
            continue;
        };
        let Some(product) = product_lookup.get(tx.product_id.as_str()) else {
            joined.unmatched_products += 1;
            continue;
        };

        let mut row = Map::new();
        row.insert(TRANSACTION_ID.to_string(), Value::from(tx.transaction_id.clone()));
        row.insert(CUSTOMER_ID.to_string(), Value::from(tx.customer_id.clone()));
        row.insert(PRODUCT_ID.to_string(), Value::from(tx.product_id.clone()));
        row.insert(TRANSACTION_DATE.to_string(), Value::from(tx.transaction_date.clone()));
        row.insert(QUANTITY.to_string(), Value::from(tx.quantity));
        row.insert(TOTAL_VALUE.to_string(), Value::from(tx.total_value));
        row.insert(REGION.to_string(), Value::from(customer.region.clone()));
        row.insert(SIGNUP_DATE.to_string(), Value::from(customer.signup_date.clone()));
        row.insert(CATEGORY.to_string(), Value::from(product.category.clone()));
        joined.rows.push(Value::Object(row));
    }

    if joined.unmatched_customers + joined.unmatched_products > 0 {
        tracing::warn!(
            unmatched_customers = joined.unmatched_customers,
            unmatched_products = joined.unmatched_products,
            "dropped transactions without a matching customer or product"
        );
    }
    tracing::debug!(rows = joined.rows.len(), "joined transaction rows");

    joined
}
