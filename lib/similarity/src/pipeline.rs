//! End-to-end lookalike pipeline
//!
//! ```text
//! records ─> join ─> FeatureBuilder ─> FeatureEncoder ─> SimilarityIndex ─> LookalikeService ─> report
//! ```
//!
//! Stage errors (schema, empty input, invariants) abort the run. Per-customer
//! query errors end up in [`LookalikeReport::failures`].

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::report::LookalikeReport;
use crate::service::LookalikeService;
use lookalike_core::{Result, SimilarityIndex};
use lookalike_features::{
    join_tables, CustomerRecord, EncoderState, FeatureBuilder, FeatureEncoder, FeatureTable,
    ProductRecord, TransactionRecord,
};
use serde_json::Value;
use std::time::Duration;

/// Everything produced by a fitted pipeline, ready to answer queries
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    pub features: FeatureTable,
    pub state: EncoderState,
    pub service: LookalikeService,
}

impl FittedPipeline {
    /// Lookalikes for an explicit set of customers
    pub fn query<S: AsRef<str> + Sync>(&self, targets: &[S], top_n: usize, deadline: Option<Duration>) -> Result<LookalikeReport> {
        let token = match deadline {
            Some(timeout) => CancellationToken::with_timeout(timeout),
            None => CancellationToken::new(),
        };
        let batch = self.service.batch_find_similar_with(targets, top_n, &token)?;
        Ok(LookalikeReport::from_batch(&batch))
    }
}

/// Output of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: FeatureTable,
    pub state: EncoderState,
    pub report: LookalikeReport,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build features, fit the encoder and the index from joined rows
    pub fn fit(&self, rows: &[Value]) -> Result<FittedPipeline> {
        self.config.validate()?;

        let features = FeatureBuilder::new(self.config.reference_instant).build(rows)?;
        let encoder = FeatureEncoder::with_numeric_columns(&self.config.numeric_columns)?;
        let (matrix, state) = encoder.fit_transform(&features)?;
        let index = SimilarityIndex::fit_with_distance(matrix, features.customer_ids(), self.config.distance)?;
        let service = LookalikeService::new(index).with_parallel(self.config.parallel);

        tracing::info!(
            customers = features.len(),
            dim = state.dim(),
            distance = %self.config.distance,
            "pipeline fitted"
        );

        Ok(FittedPipeline {
            features,
            state,
            service,
        })
    }

    /// Fit on joined rows and query the configured targets
    pub fn run_joined(&self, rows: &[Value]) -> Result<PipelineOutput> {
        let fitted = self.fit(rows)?;
        let targets = self.config.targets.resolve(&fitted.features.customer_ids());
        let deadline = self.config.deadline_ms.map(Duration::from_millis);
        let report = fitted.query(&targets, self.config.top_n, deadline)?;

        let stats = report.stats();
        tracing::info!(
            resolved = stats.resolved,
            failed = stats.failed,
            mean_top_score = stats.mean_top_score,
            "lookalike report ready"
        );

        Ok(PipelineOutput {
            features: fitted.features,
            state: fitted.state,
            report,
        })
    }

    /// Join the three input tables, then [`run_joined`](Self::run_joined)
    pub fn run(
        &self,
        customers: &[CustomerRecord],
        transactions: &[TransactionRecord],
        products: &[ProductRecord],
    ) -> Result<PipelineOutput> {
        let joined = join_tables(customers, transactions, products);
        self.run_joined(&joined.rows)
    }
}
