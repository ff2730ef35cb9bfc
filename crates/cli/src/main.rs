mod cli;
mod config;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use basket_compute::{run_sweep, Algorithm, MiningEngine, SweepPlan};
use basket_core::config::load_dotenv;
use basket_core::TransactionStore;
use basket_ingest::InputFormat;

use crate::cli::{CliArgs, Command, InputArgs};
use crate::config::CliConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let config = CliConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        Command::Mine {
            input,
            mining,
            rules,
            algorithm,
            output_dir,
            top,
            rank_by,
        } => {
            let store = load_store(&input)?;
            let engine = MiningEngine::new(
                mining.apply(config.mining_config()),
                rules.apply(config.rule_config()),
            )
            .context("invalid mining parameters")?;
            let report = engine
                .run(&store, Algorithm::from(algorithm))
                .context("mining failed")?;

            println!("{}", report::format_summary(&report));
            print!("{}", report::format_top_rules(&report.rules, store.universe(), rank_by, top));
            print!("{}", report::format_metric_summaries(&report::metric_summaries(&report.rules)));

            if let Some(dir) = output_dir {
                for path in report::write_mining_report(&dir, &report, store.universe())? {
                    println!("wrote {}", path.display());
                }
            }
        }
        Command::Compare { input, mining } => {
            let store = load_store(&input)?;
            let engine = MiningEngine::new(mining.apply(config.mining_config()), config.rule_config())
                .context("invalid mining parameters")?;
            let check = engine.cross_check(&store).context("cross-check failed")?;
            println!("{}", report::format_cross_check(&check));
        }
        Command::Sweep {
            input,
            mining,
            supports,
            confidences,
            fractions,
            algorithms,
            seed,
            output,
        } => {
            let store = load_store(&input)?;
            let plan = sweep_plan(config.sweep.clone(), supports, confidences, fractions, algorithms, seed);
            let sweep = run_sweep(&store, &plan, &mining.apply(config.mining_config()))
                .context("sweep failed")?;

            match output {
                Some(path) => {
                    report::write_json(&path, &sweep)?;
                    println!("wrote {}", path.display());
                }
                None => print!("{}", report::format_sweep(&sweep)),
            }
        }
    }

    Ok(())
}

fn load_store(input: &InputArgs) -> Result<TransactionStore> {
    let format = match &input.format {
        Some(name) => InputFormat::from_name(name)?,
        None => InputFormat::detect(&input.input),
    };
    let store = basket_ingest::load(&input.input, format)
        .with_context(|| format!("failed to load {}", input.input.display()))?;
    info!(
        transactions = store.len(),
        items = store.universe().len(),
        density = store.density(),
        "Transactions loaded"
    );
    Ok(store)
}

/// Non-empty flag lists replace the matching axis of the configured plan.
fn sweep_plan(
    mut plan: SweepPlan,
    supports: Vec<f64>,
    confidences: Vec<f64>,
    fractions: Vec<f64>,
    algorithms: Vec<cli::AlgorithmArg>,
    seed: Option<u64>,
) -> SweepPlan {
    if !supports.is_empty() {
        plan.min_supports = supports;
    }
    if !confidences.is_empty() {
        plan.min_confidences = confidences;
    }
    if !fractions.is_empty() {
        plan.fractions = fractions;
    }
    if !algorithms.is_empty() {
        plan.algorithms = algorithms.into_iter().map(Algorithm::from).collect();
    }
    if let Some(seed) = seed {
        plan.seed = seed;
    }
    plan
}
