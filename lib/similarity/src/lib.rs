//! # Lookalike Similarity
//!
//! Ranked lookalike search over fitted customer profiles.
//!
//! ## Features
//!
//! - **Self-exclusion by identity**: a customer never appears among its own lookalikes,
//!   while a distinct customer with an identical profile still does
//! - **Bounded scores**: distances map to `1 / (1 + d)`, so scores lie in (0, 1]
//! - **Batch isolation**: an unknown customer fails its own entry, not the batch
//! - **Parallel batches**: entries fan out on rayon with an optional deadline
//! - **Tabular reports**: `CustomerID, Lookalike1, Score1, ...` rows with 4-digit scores
//!
//! ## Example
//!
//! ```rust
//! use lookalike_core::{EncodedMatrix, SimilarityIndex};
//! use lookalike_similarity::{LookalikeReport, LookalikeService};
//!
//! let matrix = EncodedMatrix::from_rows(vec![
//!     vec![1.0, 0.0],
//!     vec![0.9, 0.2],
//!     vec![0.0, 1.0],
//! ]).unwrap();
//! let ids = vec!["C0001".to_string(), "C0002".to_string(), "C0003".to_string()];
//! let service = LookalikeService::new(SimilarityIndex::fit(matrix, ids).unwrap());
//!
//! let best = service.find_similar("C0001", 1).unwrap();
//! assert_eq!(best[0].customer_id, "C0002");
//!
//! let batch = service.batch_find_similar(&["C0001", "C9999"], 1).unwrap();
//! let report = LookalikeReport::from_batch(&batch);
//! assert_eq!(report.rows.len(), 1);
//! assert_eq!(report.failures.len(), 1);
//! ```

pub mod cancel;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod service;

pub use cancel::CancellationToken;
pub use config::{PipelineConfig, TargetSelection};
pub use pipeline::{FittedPipeline, Pipeline, PipelineOutput};
pub use report::{round_score, FailedQuery, LookalikeReport, LookalikeRow, ReportStats, SCORE_DECIMALS};
pub use service::{similarity_score, BatchEntry, BatchResult, Lookalike, LookalikeService};
