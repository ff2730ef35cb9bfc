use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use basket_compute::Algorithm;
use basket_core::{MetricThreshold, MiningConfig, RuleConfig, RuleMetric};

/// Frequent itemset and association rule mining over transaction files.
#[derive(Parser, Debug)]
#[command(name = "basket", version, about = "Frequent itemset and association rule mining")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/basket/config.toml)
    #[arg(long, global = true, env = "BASKET_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mine frequent itemsets and rules with one algorithm.
    Mine {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        mining: MiningArgs,

        #[command(flatten)]
        rules: RuleArgs,

        /// Algorithm to run
        #[arg(long, value_enum, default_value = "fpgrowth")]
        algorithm: AlgorithmArg,

        /// Directory for itemsets.json, rules.json, cooccurrence.json, metrics.json and summary.json
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of rules to print
        #[arg(long, default_value = "10")]
        top: usize,

        /// Metric the printed rules are ranked by
        #[arg(long, default_value = "lift", value_parser = parse_metric)]
        rank_by: RuleMetric,
    },

    /// Run both algorithms, check that they agree, and compare timings.
    Compare {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        mining: MiningArgs,
    },

    /// Time mining and rule generation over a grid of thresholds and data fractions.
    Sweep {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        mining: MiningArgs,

        /// Minimum supports to try (comma separated)
        #[arg(long, value_delimiter = ',')]
        supports: Vec<f64>,

        /// Minimum confidences to try (comma separated)
        #[arg(long, value_delimiter = ',')]
        confidences: Vec<f64>,

        /// Data fractions to try (comma separated)
        #[arg(long, value_delimiter = ',')]
        fractions: Vec<f64>,

        /// Algorithms to run (comma separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        algorithms: Vec<AlgorithmArg>,

        /// Seed for the data subsets
        #[arg(long)]
        seed: Option<u64>,

        /// Write the sweep report as JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Transaction file
    pub input: PathBuf,

    /// Input format: basket, tsv, json, invoice or invoice-csv (default: from extension)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct MiningArgs {
    /// Minimum support ratio in (0, 1]
    #[arg(long)]
    pub min_support: Option<f64>,

    /// Largest itemset size to mine
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Disable rayon parallelism
    #[arg(long)]
    pub sequential: bool,

    /// Abort when an Apriori level generates more candidates than this
    #[arg(long)]
    pub max_candidates: Option<u64>,

    /// Abort when any FP-tree grows beyond this many nodes
    #[arg(long)]
    pub max_tree_nodes: Option<u64>,

    /// Abort a mining call after this many milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,
}

impl MiningArgs {
    /// Overlay flags that were given on top of `base`.
    pub fn apply(&self, mut base: MiningConfig) -> MiningConfig {
        if let Some(s) = self.min_support {
            base.min_support = s;
        }
        if self.max_len.is_some() {
            base.max_len = self.max_len;
        }
        if self.sequential {
            base.parallel = false;
        }
        if self.max_candidates.is_some() {
            base.limits.max_candidates = self.max_candidates;
        }
        if self.max_tree_nodes.is_some() {
            base.limits.max_tree_nodes = self.max_tree_nodes;
        }
        if self.time_limit_ms.is_some() {
            base.limits.time_limit_ms = self.time_limit_ms;
        }
        base
    }
}

#[derive(Args, Debug, Default)]
pub struct RuleArgs {
    /// Minimum confidence in (0, 1]
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Minimum lift
    #[arg(long)]
    pub min_lift: Option<f64>,

    /// Extra filter as metric=min, e.g. leverage=0.01 (repeatable)
    #[arg(long = "filter", value_parser = parse_metric_threshold)]
    pub filters: Vec<MetricThreshold>,
}

impl RuleArgs {
    /// Overlay flags on `base`; filters are added to any already configured.
    pub fn apply(self, mut base: RuleConfig) -> RuleConfig {
        if let Some(c) = self.min_confidence {
            base.min_confidence = c;
        }
        if self.min_lift.is_some() {
            base.min_lift = self.min_lift;
        }
        base.metric_filters.extend(self.filters);
        base
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmArg {
    Apriori,
    Fpgrowth,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Apriori => Algorithm::Apriori,
            AlgorithmArg::Fpgrowth => Algorithm::FpGrowth,
        }
    }
}

fn parse_metric(s: &str) -> Result<RuleMetric, String> {
    s.parse().map_err(|e: basket_core::MiningError| e.to_string())
}

fn parse_metric_threshold(s: &str) -> Result<MetricThreshold, String> {
    let (metric, min) = s
        .split_once('=')
        .ok_or_else(|| format!("expected metric=min, got '{s}'"))?;
    let metric = parse_metric(metric.trim())?;
    let min = min
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad threshold '{min}': {e}"))?;
    Ok(MetricThreshold { metric, min })
}
