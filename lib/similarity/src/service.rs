//! Lookalike service
//!
//! Answers "who resembles this customer" over a fitted [`NeighborIndex`].
//! All methods take `&self` and never mutate the index, so a single service
//! can be shared freely across threads.

use crate::cancel::CancellationToken;
use lookalike_core::{Error, Neighbor, NeighborIndex, Result, SimilarityIndex, Vector};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// A ranked neighbor with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookalike {
    pub customer_id: String,
    /// `1 / (1 + distance)`, in (0, 1]
    pub score: f64,
    pub distance: f64,
}

impl From<Neighbor> for Lookalike {
    fn from(neighbor: Neighbor) -> Self {
        Self {
            score: similarity_score(neighbor.distance),
            customer_id: neighbor.customer_id,
            distance: neighbor.distance,
        }
    }
}

/// Map a non-negative distance to a score: 0 becomes 1.0, larger distances decay toward 0
#[inline]
pub fn similarity_score(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}

/// Outcome of one customer within a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub customer_id: String,
    pub outcome: Result<Vec<Lookalike>>,
}

/// Per-customer results of a batch, in request order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    top_n: usize,
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Result for a single customer of the batch
    pub fn get(&self, customer_id: &str) -> Option<&Result<Vec<Lookalike>>> {
        self.entries
            .iter()
            .find(|e| e.customer_id == customer_id)
            .map(|e| &e.outcome)
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &[Lookalike])> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            Ok(found) => Some((e.customer_id.as_str(), found.as_slice())),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            Ok(_) => None,
            Err(err) => Some((e.customer_id.as_str(), err)),
        })
    }
}

/// Ranked lookalike queries over a fitted index
#[derive(Debug, Clone)]
pub struct LookalikeService<I: NeighborIndex = SimilarityIndex> {
    index: I,
    parallel: bool,
}

impl<I: NeighborIndex> LookalikeService<I> {
    /// Create a service that runs batches in parallel
    pub fn new(index: I) -> Self {
        Self {
            index,
            parallel: true,
        }
    }

    /// Toggle parallel batch execution; results are identical either way
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Population size of the underlying index
    pub fn population(&self) -> usize {
        self.index.len()
    }

    fn validate_n(&self, n: usize) -> Result<()> {
        let others = self.index.len().saturating_sub(1);
        if n < 1 || n > others {
            return Err(Error::InvalidArgument(format!(
                "n must satisfy 1 <= n <= {} (other customers), got {}",
                others, n
            )));
        }
        Ok(())
    }

    /// The `n` customers most similar to `customer_id`, best first.
    ///
    /// The query customer is excluded by identity, never by position, so a
    /// distinct customer with an identical profile is still returned.
    pub fn find_similar(&self, customer_id: &str, n: usize) -> Result<Vec<Lookalike>> {
        self.validate_n(n)?;
        self.lookup(customer_id, n)
    }

    fn lookup(&self, customer_id: &str, n: usize) -> Result<Vec<Lookalike>> {
        let row = self
            .index
            .position(customer_id)
            .ok_or_else(|| Error::NotFound(customer_id.to_string()))?;

        let found: Vec<Lookalike> = self
            .index
            .query(row, n)?
            .into_iter()
            .filter(|neighbor| neighbor.customer_id != customer_id)
            .take(n)
            .map(Lookalike::from)
            .collect();

        if found.len() != n {
            return Err(Error::Invariant(format!(
                "expected {} lookalikes for '{}', index yielded {}",
                n,
                customer_id,
                found.len()
            )));
        }

        tracing::debug!(customer_id, n, best = found[0].score, "lookalikes resolved");
        Ok(found)
    }

    /// The `n` indexed customers closest to an encoded profile that need not
    /// be part of the index (e.g. a new customer encoded with a saved state)
    pub fn find_similar_to_vector(&self, vector: &Vector, n: usize) -> Result<Vec<Lookalike>> {
        Ok(self
            .index
            .search(vector, n)?
            .into_iter()
            .map(Lookalike::from)
            .collect())
    }

    /// Run [`find_similar`](Self::find_similar) for every ID.
    ///
    /// A bad `n` fails the whole call. Unknown IDs fail only their own entry.
    /// Repeated IDs are answered once, at their first position.
    pub fn batch_find_similar<S: AsRef<str> + Sync>(&self, customer_ids: &[S], n: usize) -> Result<BatchResult> {
        self.batch_find_similar_with(customer_ids, n, &CancellationToken::new())
    }

    /// Like [`batch_find_similar`](Self::batch_find_similar), but entries that
    /// have not started when `token` fires report [`Error::Cancelled`]
    pub fn batch_find_similar_with<S: AsRef<str> + Sync>(
        &self,
        customer_ids: &[S],
        n: usize,
        token: &CancellationToken,
    ) -> Result<BatchResult> {
        self.validate_n(n)?;

        let mut seen = HashSet::with_capacity(customer_ids.len());
        let unique: Vec<&str> = customer_ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .collect();

        let run = |customer_id: &&str| -> BatchEntry {
            let outcome = if token.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                self.lookup(customer_id, n)
            };
            BatchEntry {
                customer_id: customer_id.to_string(),
                outcome,
            }
        };

        let entries: Vec<BatchEntry> = if self.parallel {
            unique.par_iter().map(run).collect()
        } else {
            unique.iter().map(run).collect()
        };

        let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
        for entry in &entries {
            if let Err(err) = &entry.outcome {
                tracing::warn!(customer_id = %entry.customer_id, error = %err, "lookalike query failed");
            }
        }
        tracing::info!(
            requested = entries.len(),
            resolved = entries.len() - failed,
            failed,
            n,
            "batch lookalike search finished"
        );

        Ok(BatchResult { top_n: n, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookalike_core::EncodedMatrix;

    fn service(rows: Vec<Vec<f64>>, ids: &[&str]) -> LookalikeService {
        let matrix = EncodedMatrix::from_rows(rows).unwrap();
        let ids = ids.iter().map(|s| s.to_string()).collect();
        LookalikeService::new(SimilarityIndex::fit(matrix, ids).unwrap())
    }

    fn sample() -> LookalikeService {
        service(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.1, 0.9, 0.2],
                vec![0.0, 0.0, 1.0],
            ],
            &["A", "B", "C", "D", "E"],
        )
    }

    #[test]
    fn test_score_mapping() {
        assert_eq!(similarity_score(0.0), 1.0);
        assert_eq!(similarity_score(1.0), 0.5);
        assert!(similarity_score(2.0) < similarity_score(1.0));
    }

    #[test]
    fn test_find_similar_excludes_self() {
        let svc = sample();
        let found = svc.find_similar("A", 3).unwrap();

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].customer_id, "B");
        assert!(found.iter().all(|l| l.customer_id != "A"));
        for pair in found.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_identical_profile_is_kept() {
        // B duplicates A exactly; excluding by position could drop B instead of A
        let svc = service(
            vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![0.0, 1.0]],
            &["B", "A", "C"],
        );
        let found = svc.find_similar("A", 1).unwrap();

        assert_eq!(found[0].customer_id, "B");
        assert!((found[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_customer() {
        let svc = sample();
        assert_eq!(
            svc.find_similar("Z", 1).unwrap_err(),
            Error::NotFound("Z".to_string())
        );
    }

    #[test]
    fn test_count_invariant() {
        let svc = sample();
        assert_eq!(svc.find_similar("C", 4).unwrap().len(), 4);
        assert!(matches!(svc.find_similar("C", 5), Err(Error::InvalidArgument(_))));
        assert!(matches!(svc.find_similar("C", 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let svc = sample();
        let batch = svc.batch_find_similar(&["A", "Z"], 1).unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch.get("A").unwrap().is_ok());
        assert_eq!(
            batch.get("Z").unwrap().as_ref().unwrap_err(),
            &Error::NotFound("Z".to_string())
        );
        assert_eq!(batch.successes().count(), 1);
        assert_eq!(batch.failures().count(), 1);
    }

    #[test]
    fn test_batch_invalid_n_is_fatal() {
        let svc = sample();
        assert!(matches!(
            svc.batch_find_similar(&["A"], 10),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_batch_dedup_preserves_order() {
        let svc = sample();
        let batch = svc.batch_find_similar(&["D", "A", "D"], 2).unwrap();
        let order: Vec<&str> = batch.entries().iter().map(|e| e.customer_id.as_str()).collect();
        assert_eq!(order, vec!["D", "A"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ids = ["A", "B", "C", "D", "E", "missing"];
        let parallel = sample().batch_find_similar(&ids, 2).unwrap();
        let sequential = sample().with_parallel(false).batch_find_similar(&ids, 2).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_cancelled_batch() {
        let svc = sample();
        let token = CancellationToken::new();
        token.cancel();

        let batch = svc.batch_find_similar_with(&["A", "B"], 1, &token).unwrap();
        assert!(batch
            .entries()
            .iter()
            .all(|e| e.outcome == Err(Error::Cancelled)));
    }

    #[test]
    fn test_find_similar_to_vector() {
        let svc = sample();
        let found = svc
            .find_similar_to_vector(&Vector::new(vec![0.0, 0.0, 5.0]), 2)
            .unwrap();
        assert_eq!(found[0].customer_id, "E");
        assert_eq!(found[0].score, 1.0);
        assert_eq!(found.len(), 2);
    }
}
