//! # lookalike
//!
//! A customer lookalike engine: turns purchase history into behavioral
//! feature vectors and ranks every customer's nearest neighbors.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! lookalike --customers data/Customers.csv \
//!           --transactions data/Transactions.csv \
//!           --products data/Products.csv \
//!           --reference 2025-01-27 --first 20 --top-n 3
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use lookalike::prelude::*;
//! use chrono::NaiveDate;
//!
//! let customers = vec![
//!     CustomerRecord { customer_id: "C1".into(), customer_name: None, region: "Asia".into(), signup_date: "2024-01-01".into() },
//!     CustomerRecord { customer_id: "C2".into(), customer_name: None, region: "Asia".into(), signup_date: "2024-02-01".into() },
//!     CustomerRecord { customer_id: "C3".into(), customer_name: None, region: "Europe".into(), signup_date: "2023-01-01".into() },
//! ];
//! let products = vec![
//!     ProductRecord { product_id: "P1".into(), product_name: None, category: "Books".into(), price: None },
//! ];
//! let transactions: Vec<TransactionRecord> = ["C1", "C2", "C3"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, customer)| TransactionRecord {
//!         transaction_id: format!("T{}", i),
//!         customer_id: customer.to_string(),
//!         product_id: "P1".into(),
//!         transaction_date: "2024-06-01 10:00:00".into(),
//!         quantity: 1 + i as u32,
//!         total_value: 10.0 * (1 + i) as f64,
//!         price: None,
//!     })
//!     .collect();
//!
//! let reference = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let config = PipelineConfig::new(reference).with_top_n(2).with_targets(TargetSelection::All);
//! let output = Pipeline::new(config).run(&customers, &transactions, &products).unwrap();
//!
//! assert_eq!(output.report.rows.len(), 3);
//! assert!(output.report.rows.iter().all(|row| row.lookalikes.len() == 2));
//! ```
//!
//! ## Crate Structure
//!
//! - `lookalike-core` - Errors, vectors, distance metrics, the exhaustive similarity index
//! - `lookalike-features` - Input records, join, feature builder and encoder
//! - `lookalike-similarity` - Lookalike service, batch queries, reports, pipeline
//! - `lookalike-storage` - CSV readers, report export, encoder state persistence
//!
//! ## Features
//!
//! - **Deterministic**: identical inputs and reference instant give identical reports
//! - **Exact search**: exhaustive ranking with stable tie-breaking by CustomerID
//! - **Batch isolation**: an unknown customer fails only its own entry
//! - **Parallel batches**: rayon-backed, with cancellation and deadlines

// Re-export core types
pub use lookalike_core::{
    cosine_distance, Distance, EncodedMatrix, Error, Neighbor, NeighborIndex, Result,
    SchemaError, SimilarityIndex, Vector,
};

// Re-export feature engineering
pub use lookalike_features::{
    join_tables, CustomerFeatureVector, CustomerRecord, EncoderState, FeatureBuilder,
    FeatureEncoder, FeatureTable, JoinedRows, ProductRecord, TransactionRecord, NUMERIC_COLUMNS,
};

// Re-export similarity search
pub use lookalike_similarity::{
    BatchEntry, BatchResult, CancellationToken, FittedPipeline, Lookalike, LookalikeReport,
    LookalikeService, Pipeline, PipelineConfig, PipelineOutput, TargetSelection,
};

// Re-export storage
pub use lookalike_storage::{
    load_encoder_state, read_customers, read_products, read_transactions, save_encoder_state,
    write_report_csv, write_report_json, StorageError,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CustomerRecord, Distance, EncoderState, Error, FeatureBuilder, FeatureEncoder,
        FeatureTable, LookalikeReport, LookalikeService, Pipeline, PipelineConfig,
        ProductRecord, Result, SimilarityIndex, TargetSelection, TransactionRecord,
        load_encoder_state, read_customers, read_products, read_transactions,
        save_encoder_state, write_report_csv, write_report_json,
    };
}
