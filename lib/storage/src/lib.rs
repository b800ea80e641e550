//! # Lookalike Storage
//!
//! File adapters around the lookalike pipeline:
//!
//! - **Tables**: headed CSV readers for customers, products and transactions
//! - **Reports**: CSV (`CustomerID, Lookalike1, Score1, ...`) and JSON export
//! - **Encoder state**: JSON save/load so new customers can be encoded later
//!
//! All writes are atomic (temp file + rename).

pub mod error;
pub mod export;
pub mod tables;

pub use error::{Result, StorageError};
pub use export::{load_encoder_state, save_encoder_state, write_report_csv, write_report_json};
pub use tables::{read_customers, read_products, read_transactions};
