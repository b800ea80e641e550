//! # Lookalike Core
//!
//! Core library for the lookalike engine.
//!
//! This crate provides the numeric building blocks shared by the pipeline:
//!
//! - [`Vector`] - Dense encoded feature row
//! - [`EncodedMatrix`] - Fixed-width rows, index-aligned with an external ID array
//! - [`Distance`] - Cosine and Euclidean distance metrics
//! - [`NeighborIndex`] - Read-only k-nearest-neighbor interface
//! - [`SimilarityIndex`] - Exhaustive implementation of [`NeighborIndex`]
//!
//! ## Example
//!
//! ```rust
//! use lookalike_core::{EncodedMatrix, NeighborIndex, SimilarityIndex};
//!
//! let matrix = EncodedMatrix::from_rows(vec![
//!     vec![1.0, 0.0],
//!     vec![0.9, 0.1],
//!     vec![0.0, 1.0],
//! ]).unwrap();
//! let ids = vec!["C0001".to_string(), "C0002".to_string(), "C0003".to_string()];
//! let index = SimilarityIndex::fit(matrix, ids).unwrap();
//!
//! // Query row first, then its closest neighbor
//! let neighbors = index.query(0, 1).unwrap();
//! assert_eq!(neighbors[1].customer_id, "C0002");
//! ```

pub mod distance;
pub mod error;
pub mod index;
pub mod matrix;
pub mod vector;

pub use distance::{cosine_distance, Distance};
pub use error::{Error, Result, SchemaError};
pub use index::{Neighbor, NeighborIndex, SimilarityIndex};
pub use matrix::EncodedMatrix;
pub use vector::Vector;
