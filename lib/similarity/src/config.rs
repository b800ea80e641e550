//! Pipeline configuration
//!
//! Loaded from JSON and/or assembled from command-line flags. The reference
//! instant has no default: tenure must be computed against an explicit
//! point in time for runs to be reproducible.

use chrono::NaiveDateTime;
use lookalike_core::{Distance, Error, Result};
use lookalike_features::NUMERIC_COLUMNS;
use serde::{Deserialize, Serialize};

fn default_top_n() -> usize {
    3
}

fn default_parallel() -> bool {
    true
}

fn default_numeric_columns() -> Vec<String> {
    NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Which customers to produce lookalikes for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSelection {
    /// Every customer in the feature table
    All,
    /// The first `n` customers in feature table order
    First(usize),
    /// An explicit list; unknown IDs are reported per entry
    Ids(Vec<String>),
}

impl Default for TargetSelection {
    fn default() -> Self {
        TargetSelection::First(20)
    }
}

impl TargetSelection {
    /// Resolve against the customer IDs of the fitted population
    pub fn resolve(&self, population: &[String]) -> Vec<String> {
        match self {
            TargetSelection::All => population.to_vec(),
            TargetSelection::First(n) => population.iter().take(*n).cloned().collect(),
            TargetSelection::Ids(ids) => ids.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// "Now" for tenure computation
    pub reference_instant: NaiveDateTime,

    /// Lookalikes per target customer
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub targets: TargetSelection,

    #[serde(default)]
    pub distance: Distance,

    /// Numeric attributes to standardize, in column order
    #[serde(default = "default_numeric_columns")]
    pub numeric_columns: Vec<String>,

    /// Run batch queries on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Budget for the whole batch; entries not started in time are cancelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn new(reference_instant: NaiveDateTime) -> Self {
        Self {
            reference_instant,
            top_n: default_top_n(),
            targets: TargetSelection::default(),
            distance: Distance::default(),
            numeric_columns: default_numeric_columns(),
            parallel: default_parallel(),
            deadline_ms: None,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[must_use]
    pub fn with_targets(mut self, targets: TargetSelection) -> Self {
        self.targets = targets;
        self
    }

    #[must_use]
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n < 1 {
            return Err(Error::InvalidArgument("top_n must be at least 1".to_string()));
        }
        if self.numeric_columns.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one numeric column is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 27)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config = PipelineConfig::from_json(r#"{ "reference_instant": "2025-01-27T00:00:00" }"#).unwrap();

        assert_eq!(config, PipelineConfig::new(reference()));
        assert_eq!(config.top_n, 3);
        assert_eq!(config.targets, TargetSelection::First(20));
        assert_eq!(config.distance, Distance::Cosine);
        assert_eq!(config.numeric_columns.len(), 4);
    }

    #[test]
    fn test_reference_instant_required() {
        assert!(PipelineConfig::from_json(r#"{ "top_n": 5 }"#).is_err());
    }

    #[test]
    fn test_full_json() {
        let config = PipelineConfig::from_json(
            r#"{
                "reference_instant": "2025-01-27T00:00:00",
                "top_n": 5,
                "targets": { "ids": ["C0001", "C0002"] },
                "distance": "euclidean",
                "numeric_columns": ["total_spend"],
                "parallel": false,
                "deadline_ms": 250
            }"#,
        )
        .unwrap();

        assert_eq!(config.top_n, 5);
        assert_eq!(
            config.targets,
            TargetSelection::Ids(vec!["C0001".to_string(), "C0002".to_string()])
        );
        assert_eq!(config.distance, Distance::Euclidean);
        assert!(!config.parallel);
        assert_eq!(config.deadline_ms, Some(250));
    }

    #[test]
    fn test_target_resolution() {
        let population: Vec<String> = ["C1", "C2", "C3"].iter().map(|s| s.to_string()).collect();

        assert_eq!(TargetSelection::All.resolve(&population).len(), 3);
        assert_eq!(TargetSelection::First(2).resolve(&population), vec!["C1", "C2"]);
        assert_eq!(TargetSelection::First(10).resolve(&population).len(), 3);
        assert_eq!(
            TargetSelection::Ids(vec!["C9".to_string()]).resolve(&population),
            vec!["C9"]
        );
    }

    #[test]
    fn test_validate() {
        assert!(PipelineConfig::new(reference()).validate().is_ok());
        assert!(PipelineConfig::new(reference()).with_top_n(0).validate().is_err());
    }
}
