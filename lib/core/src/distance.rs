//! Distance metrics used by the neighbor index
//!
//! Every metric returns a non-negative distance where 0.0 means identical.

use crate::Vector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// 1 - cosine similarity, clamped to [0, 2]
    #[default]
    Cosine,
    Euclidean,
}

impl Distance {
    /// Distance between two encoded rows
    #[inline]
    pub fn between(&self, a: &Vector, b: &Vector) -> f64 {
        match self {
            Distance::Cosine => cosine_distance(a, b),
            Distance::Euclidean => a.l2_distance(b),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Distance::Cosine => "cosine",
            Distance::Euclidean => "euclidean",
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cosine distance: 1 - cosine similarity.
///
/// Rounding can push the similarity of parallel vectors a hair above 1.0,
/// so the result is clamped to keep distances non-negative.
#[inline]
pub fn cosine_distance(a: &Vector, b: &Vector) -> f64 {
    (1.0 - a.cosine_similarity(b)).clamp(0.0, 2.0)
}
