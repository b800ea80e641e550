//! Exhaustive k-nearest-neighbor index
//!
//! [`SimilarityIndex`] scans every row per query, which is O(N·D) and fine for
//! populations in the thousands. Callers talk to it through [`NeighborIndex`]
//! so a tree or graph based index can be dropped in later.

use crate::{Distance, EncodedMatrix, Error, Result, Vector};
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Ordering;

/// One entry of a neighbor query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// Row of the neighbor in the fitted matrix
    pub row: usize,
    pub customer_id: String,
    pub distance: f64,
}

/// Read-only nearest-neighbor lookups over a fitted population
pub trait NeighborIndex: Send + Sync {
    /// Number of indexed rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the indexed rows
    fn dim(&self) -> usize;

    /// Row index of a customer, if it was part of the fit
    fn position(&self, customer_id: &str) -> Option<usize>;

    fn customer_id(&self, row: usize) -> Option<&str>;

    /// The `k + 1` rows closest to `row_index`, the query row itself first.
    ///
    /// Fails with `OutOfRange` for a bad row and `InvalidArgument` unless
    /// `1 <= k < len()`.
    fn query(&self, row_index: usize, k: usize) -> Result<Vec<Neighbor>>;

    /// The `limit` rows closest to an arbitrary encoded vector
    fn search(&self, query: &Vector, limit: usize) -> Result<Vec<Neighbor>>;
}

/// Brute-force index owning the encoded matrix and its parallel ID array
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    matrix: EncodedMatrix,
    customer_ids: Vec<String>,
    positions: AHashMap<String, usize>,
    distance: Distance,
}

impl SimilarityIndex {
    /// Fit a cosine-distance index
    pub fn fit(matrix: EncodedMatrix, customer_ids: Vec<String>) -> Result<Self> {
        Self::fit_with_distance(matrix, customer_ids, Distance::Cosine)
    }

    pub fn fit_with_distance(
        matrix: EncodedMatrix,
        customer_ids: Vec<String>,
        distance: Distance,
    ) -> Result<Self> {
        if matrix.len() != customer_ids.len() {
            return Err(Error::Invariant(format!(
                "matrix has {} rows but {} customer ids were given",
                matrix.len(),
                customer_ids.len()
            )));
        }

        let mut positions = AHashMap::with_capacity(customer_ids.len());
        for (row, id) in customer_ids.iter().enumerate() {
            if positions.insert(id.clone(), row).is_some() {
                return Err(Error::Invariant(format!("duplicate customer id '{}'", id)));
            }
        }

        tracing::debug!(
            rows = matrix.len(),
            dim = matrix.dim(),
            distance = %distance,
            "similarity index fitted"
        );

        Ok(Self {
            matrix,
            customer_ids,
            positions,
            distance,
        })
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn matrix(&self) -> &EncodedMatrix {
        &self.matrix
    }

    pub fn customer_ids(&self) -> &[String] {
        &self.customer_ids
    }

    /// Rank every row against `target`.
    ///
    /// Ordering is ascending distance, then the `anchor` row (if any), then
    /// ascending customer id. The key is total, so the output is fully
    /// determined by the input.
    fn rank(&self, target: &Vector, anchor: Option<usize>, take: usize) -> Vec<Neighbor> {
        let mut scored: Vec<(f64, usize)> = self
            .matrix
            .rows()
            .iter()
            .enumerate()
            .map(|(row, vector)| {
                let distance = if Some(row) == anchor {
                    0.0
                } else {
                    self.distance.between(target, vector)
                };
                (distance, row)
            })
            .collect();

        let compare = |a: &(f64, usize), b: &(f64, usize)| -> Ordering {
            OrderedFloat(a.0)
                .cmp(&OrderedFloat(b.0))
                .then_with(|| (Some(b.1) == anchor).cmp(&(Some(a.1) == anchor)))
                .then_with(|| self.customer_ids[a.1].cmp(&self.customer_ids[b.1]))
        };

        let take = take.min(scored.len());
        if take == 0 {
            return Vec::new();
        }
        if take < scored.len() {
            scored.select_nth_unstable_by(take - 1, compare);
            scored.truncate(take);
        }
        scored.sort_unstable_by(compare);

        scored
            .into_iter()
            .map(|(distance, row)| Neighbor {
                row,
                customer_id: self.customer_ids[row].clone(),
                distance,
            })
            .collect()
    }
}

impl NeighborIndex for SimilarityIndex {
    fn len(&self) -> usize {
        self.matrix.len()
    }

    fn dim(&self) -> usize {
        self.matrix.dim()
    }

    fn position(&self, customer_id: &str) -> Option<usize> {
        self.positions.get(customer_id).copied()
    }

    fn customer_id(&self, row: usize) -> Option<&str> {
        self.customer_ids.get(row).map(String::as_str)
    }

    fn query(&self, row_index: usize, k: usize) -> Result<Vec<Neighbor>> {
        let len = self.len();
        let target = self.matrix.row(row_index).ok_or(Error::OutOfRange {
            index: row_index,
            len,
        })?;
        if k < 1 || k >= len {
            return Err(Error::InvalidArgument(format!(
                "k must satisfy 1 <= k < {}, got {}",
                len, k
            )));
        }

        Ok(self.rank(target, Some(row_index), k + 1))
    }

    fn search(&self, query: &Vector, limit: usize) -> Result<Vec<Neighbor>> {
        if query.dim() != self.dim() {
            return Err(Error::InvalidDimension {
                expected: self.dim(),
                actual: query.dim(),
            });
        }
        if limit < 1 || limit > self.len() {
            return Err(Error::InvalidArgument(format!(
                "limit must satisfy 1 <= limit <= {}, got {}",
                self.len(),
                limit
            )));
        }

        Ok(self.rank(query, None, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample_index() -> SimilarityIndex {
        let matrix = EncodedMatrix::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        SimilarityIndex::fit(matrix, ids(&["A", "B", "C", "D"])).unwrap()
    }

    #[test]
    fn test_fit_length_mismatch() {
        let matrix = EncodedMatrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        let err = SimilarityIndex::fit(matrix, ids(&["A"])).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn test_fit_duplicate_ids() {
        let matrix = EncodedMatrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        let err = SimilarityIndex::fit(matrix, ids(&["A", "A"])).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn test_query_returns_self_first() {
        let index = sample_index();
        let result = index.query(0, 2).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].customer_id, "A");
        assert_eq!(result[0].distance, 0.0);
        assert_eq!(result[1].customer_id, "B");
    }

    #[test]
    fn test_query_sorted_ascending() {
        let index = sample_index();
        let result = index.query(1, 3).unwrap();
        for pair in result.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_ties_broken_by_customer_id() {
        let matrix = EncodedMatrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ])
        .unwrap();
        let index = SimilarityIndex::fit(matrix, ids(&["Q", "Z", "M", "B"])).unwrap();

        let result = index.query(0, 3).unwrap();
        let order: Vec<&str> = result.iter().map(|n| n.customer_id.as_str()).collect();
        assert_eq!(order, vec!["Q", "B", "M", "Z"]);
    }

    #[test]
    fn test_duplicate_vector_does_not_displace_query_row() {
        // "A" sorts before "B" but B is the query row, so B still leads
        let matrix = EncodedMatrix::from_rows(vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![0.0, 1.0]]).unwrap();
        let index = SimilarityIndex::fit(matrix, ids(&["A", "B", "C"])).unwrap();

        let result = index.query(1, 1).unwrap();
        assert_eq!(result[0].customer_id, "B");
        assert_eq!(result[1].customer_id, "A");
        assert!(result[1].distance.abs() < 1e-12);
    }

    #[test]
    fn test_query_out_of_range() {
        let index = sample_index();
        assert_eq!(
            index.query(4, 1).unwrap_err(),
            Error::OutOfRange { index: 4, len: 4 }
        );
    }

    #[test]
    fn test_query_invalid_k() {
        let index = sample_index();
        assert!(matches!(index.query(0, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(index.query(0, 4), Err(Error::InvalidArgument(_))));
        assert_eq!(index.query(0, 3).unwrap().len(), 4);
    }

    #[test]
    fn test_search_external_vector() {
        let index = sample_index();
        let result = index.search(&Vector::new(vec![0.0, 0.0, 2.0]), 2).unwrap();
        assert_eq!(result[0].customer_id, "D");
        assert_eq!(result.len(), 2);

        let err = index.search(&Vector::new(vec![1.0]), 1).unwrap_err();
        assert_eq!(err, Error::InvalidDimension { expected: 3, actual: 1 });
    }

    #[test]
    fn test_euclidean_index() {
        let matrix = EncodedMatrix::from_rows(vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let index =
            SimilarityIndex::fit_with_distance(matrix, ids(&["A", "B", "C"]), Distance::Euclidean).unwrap();

        let result = index.query(0, 2).unwrap();
        assert_eq!(result[1].customer_id, "C");
        assert!((result[1].distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_lookup() {
        let index = sample_index();
        assert_eq!(index.position("C"), Some(2));
        assert_eq!(index.position("nope"), None);
        assert_eq!(index.customer_id(3), Some("D"));
    }
}
