use anyhow::{anyhow, Context};
use clap::Parser;
use lookalike::prelude::*;
use lookalike_features::schema::parse_timestamp;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Find the most similar customers from purchase history
#[derive(Parser, Debug)]
#[command(name = "lookalike")]
#[command(about = "Customer lookalike engine", long_about = None)]
struct Args {
    /// Customer table (CustomerID, Region, SignupDate, ...)
    #[arg(long, default_value = "data/Customers.csv")]
    customers: PathBuf,

    /// Transaction table (TransactionID, CustomerID, ProductID, TransactionDate, Quantity, TotalValue, ...)
    #[arg(long, default_value = "data/Transactions.csv")]
    transactions: PathBuf,

    /// Product catalog (ProductID, Category, ...)
    #[arg(long, default_value = "data/Products.csv")]
    products: PathBuf,

    /// Where to write the report
    #[arg(short, long, default_value = "Lookalike.csv")]
    output: PathBuf,

    /// Pipeline configuration as JSON; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference instant for tenure, e.g. 2025-01-27 or "2025-01-27 00:00:00"
    #[arg(long)]
    reference: Option<String>,

    /// Lookalikes per customer
    #[arg(long)]
    top_n: Option<usize>,

    /// Explicit target customers, comma separated, or "all"
    #[arg(long, value_delimiter = ',', conflicts_with = "first")]
    targets: Option<Vec<String>>,

    /// Query the first N customers in ID order
    #[arg(long)]
    first: Option<usize>,

    /// Rank by Euclidean instead of cosine distance
    #[arg(long)]
    euclidean: bool,

    /// Budget for the whole batch in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Write the report as JSON instead of CSV
    #[arg(long)]
    json: bool,

    /// Save the fitted encoder state to this path
    #[arg(long)]
    encoder_state: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let reference = self
            .reference
            .as_deref()
            .map(|text| parse_timestamp(text).ok_or_else(|| anyhow!("invalid --reference '{}'", text)))
            .transpose()?;

        let mut config = match (&self.config, reference) {
            (Some(path), _) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                PipelineConfig::from_json(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            (None, Some(reference)) => PipelineConfig::new(reference),
            (None, None) => {
                return Err(anyhow!(
                    "a reference instant is required: pass --reference or set reference_instant in --config"
                ))
            }
        };

        if let Some(reference) = reference {
            config.reference_instant = reference;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(first) = self.first {
            config.targets = TargetSelection::First(first);
        }
        if let Some(targets) = &self.targets {
            config.targets = match targets.as_slice() {
                [only] if only.eq_ignore_ascii_case("all") => TargetSelection::All,
                ids => TargetSelection::Ids(ids.to_vec()),
            };
        }
        if self.euclidean {
            config.distance = Distance::Euclidean;
        }
        if let Some(deadline_ms) = self.deadline_ms {
            config.deadline_ms = Some(deadline_ms);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting lookalike v{}", env!("CARGO_PKG_VERSION"));

    let config = args.pipeline_config()?;
    info!(
        reference = %config.reference_instant,
        top_n = config.top_n,
        distance = %config.distance,
        "configuration loaded"
    );

    let customers = read_customers(&args.customers)?;
    let products = read_products(&args.products)?;
    let transactions = read_transactions(&args.transactions)?;
    info!(
        customers = customers.len(),
        products = products.len(),
        transactions = transactions.len(),
        "input tables loaded"
    );

    let output = Pipeline::new(config).run(&customers, &transactions, &products)?;

    if args.json {
        write_report_json(&args.output, &output.report)?;
    } else {
        write_report_csv(&args.output, &output.report)?;
    }
    if let Some(path) = &args.encoder_state {
        save_encoder_state(path, &output.state)?;
        info!("Encoder state saved to {:?}", path);
    }

    for failure in &output.report.failures {
        warn!("No lookalikes for {}: {}", failure.customer_id, failure.reason);
    }

    let stats = output.report.stats();
    info!(
        "Wrote {} rows to {:?} ({} failed, mean top score {:.4})",
        stats.resolved, args.output, stats.failed, stats.mean_top_score
    );
    Ok(())
}
