//! Tabular lookalike report
//!
//! Flattens a [`BatchResult`] into the output shape
//! `CustomerID, Lookalike1, Score1, ..., LookalikeN, ScoreN`, with failed
//! customers listed separately alongside the reason.

use crate::service::{BatchResult, Lookalike};
use serde::Serialize;

/// Decimal digits kept on emitted scores
pub const SCORE_DECIMALS: i32 = 4;

/// Round a score to [`SCORE_DECIMALS`] digits
#[inline]
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score * factor).round() / factor
}

/// A resolved customer and its ranked lookalikes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookalikeRow {
    pub customer_id: String,
    pub lookalikes: Vec<Lookalike>,
}

/// A customer whose query did not produce lookalikes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedQuery {
    pub customer_id: String,
    pub reason: String,
}

/// Summary statistics for a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStats {
    pub resolved: usize,
    pub failed: usize,
    /// Mean score of each resolved customer's best lookalike
    pub mean_top_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookalikeReport {
    pub top_n: usize,
    pub rows: Vec<LookalikeRow>,
    pub failures: Vec<FailedQuery>,
}

impl LookalikeReport {
    pub fn from_batch(batch: &BatchResult) -> Self {
        let rows = batch
            .successes()
            .map(|(customer_id, found)| LookalikeRow {
                customer_id: customer_id.to_string(),
                lookalikes: found
                    .iter()
                    .map(|l| Lookalike {
                        score: round_score(l.score),
                        ..l.clone()
                    })
                    .collect(),
            })
            .collect();

        let failures = batch
            .failures()
            .map(|(customer_id, err)| FailedQuery {
                customer_id: customer_id.to_string(),
                reason: err.to_string(),
            })
            .collect();

        Self {
            top_n: batch.top_n(),
            rows,
            failures,
        }
    }

    /// `CustomerID, Lookalike1, Score1, ...` for `top_n` pairs
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(1 + 2 * self.top_n);
        header.push("CustomerID".to_string());
        for k in 1..=self.top_n {
            header.push(format!("Lookalike{}", k));
            header.push(format!("Score{}", k));
        }
        header
    }

    /// One string record per resolved customer, matching [`header`](Self::header)
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Vec::with_capacity(1 + 2 * self.top_n);
                record.push(row.customer_id.clone());
                for lookalike in &row.lookalikes {
                    record.push(lookalike.customer_id.clone());
                    record.push(format!("{:.*}", SCORE_DECIMALS as usize, lookalike.score));
                }
                record
            })
            .collect()
    }

    pub fn stats(&self) -> ReportStats {
        let tops: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|row| row.lookalikes.first().map(|l| l.score))
            .collect();
        let mean_top_score = if tops.is_empty() {
            0.0
        } else {
            tops.iter().sum::<f64>() / tops.len() as f64
        };

        ReportStats {
            resolved: self.rows.len(),
            failed: self.failures.len(),
            mean_top_score,
        }
    }
}

impl From<&BatchResult> for LookalikeReport {
    fn from(batch: &BatchResult) -> Self {
        Self::from_batch(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::LookalikeService;
    use lookalike_core::{EncodedMatrix, SimilarityIndex};

    fn batch() -> BatchResult {
        let matrix = EncodedMatrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.8, 0.3],
            vec![0.0, 1.0],
            vec![0.2, 1.0],
        ])
        .unwrap();
        let ids = ["C0001", "C0002", "C0003", "C0004"].iter().map(|s| s.to_string()).collect();
        let service = LookalikeService::new(SimilarityIndex::fit(matrix, ids).unwrap());
        service.batch_find_similar(&["C0001", "C0404", "C0003"], 2).unwrap()
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.123456), 0.1235);
        assert_eq!(round_score(1.0), 1.0);
    }

    #[test]
    fn test_header() {
        let report = LookalikeReport::from_batch(&batch());
        assert_eq!(
            report.header(),
            vec!["CustomerID", "Lookalike1", "Score1", "Lookalike2", "Score2"]
        );
    }

    #[test]
    fn test_rows_and_failures_split() {
        let report = LookalikeReport::from_batch(&batch());

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].customer_id, "C0001");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].customer_id, "C0404");
        assert_eq!(report.failures[0].reason, "Customer not found: C0404");
    }

    #[test]
    fn test_records_use_four_decimals() {
        let report = LookalikeReport::from_batch(&batch());
        let records = report.records();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.len(), report.header().len());
            for score in record.iter().skip(2).step_by(2) {
                let decimals = score.split('.').nth(1).unwrap();
                assert_eq!(decimals.len(), 4);
            }
        }
    }

    #[test]
    fn test_stats() {
        let report = LookalikeReport::from_batch(&batch());
        let stats = report.stats();

        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.failed, 1);
        assert!(stats.mean_top_score > 0.0 && stats.mean_top_score <= 1.0);
    }

    #[test]
    fn test_report_serializes() {
        let report = LookalikeReport::from_batch(&batch());
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"rows\""));
        assert!(json.contains("\"failures\""));
        assert!(json.contains("\"lookalikes\""));
    }
}
