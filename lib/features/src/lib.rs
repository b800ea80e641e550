//! # Lookalike Features
//!
//! Turns raw customer, product and transaction records into encoded feature rows.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Records   │────>│    Join     │────>│   Builder   │────>│   Encoder   │
//! │ (3 tables)  │     │ (JSON rows) │     │ (profiles)  │     │  (matrix)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lookalike_features::{FeatureBuilder, FeatureEncoder};
//! use chrono::NaiveDate;
//! use serde_json::json;
//!
//! let rows = vec![
//!     json!({
//!         "CustomerID": "C0001", "Region": "Europe", "SignupDate": "2022-07-10",
//!         "TransactionID": "T00001", "Quantity": 2, "TotalValue": 300.68,
//!         "TransactionDate": "2024-01-19 03:12:55", "Category": "Books"
//!     }),
//!     json!({
//!         "CustomerID": "C0002", "Region": "Asia", "SignupDate": "2022-02-13",
//!         "TransactionID": "T00002", "Quantity": 1, "TotalValue": 95.35,
//!         "TransactionDate": "2024-03-02 11:00:00", "Category": "Electronics"
//!     }),
//! ];
//!
//! let reference = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let table = FeatureBuilder::new(reference).build(&rows).unwrap();
//! let (matrix, state) = FeatureEncoder::new().fit_transform(&table).unwrap();
//!
//! // 4 numeric + 2 regions + 2 categories
//! assert_eq!(matrix.dim(), 8);
//! assert_eq!(state.dim(), 8);
//! ```

pub mod builder;
pub mod encoder;
pub mod records;
pub mod schema;
pub mod table;

pub use builder::FeatureBuilder;
pub use encoder::{ColumnStats, EncoderState, FeatureEncoder};
pub use records::{join_tables, CustomerRecord, JoinedRows, ProductRecord, TransactionRecord};
pub use table::{CustomerFeatureVector, FeatureTable, NUMERIC_COLUMNS};
