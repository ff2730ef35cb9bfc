//! Parameter sweep: re-run mining and rule generation over a grid of
//! thresholds and data fractions, recording counts and timings per cell.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use basket_core::error::check_unit_threshold;
use basket_core::{MiningConfig, MiningError, Result, RuleConfig, TransactionStore};

use crate::algorithms::rules::association_rules;
use crate::engine::Algorithm;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    #[serde(default = "default_supports")]
    pub min_supports: Vec<f64>,
    #[serde(default = "default_confidences")]
    pub min_confidences: Vec<f64>,
    /// Fractions of the store to mine; 1.0 is the whole store.
    #[serde(default = "default_fractions")]
    pub fractions: Vec<f64>,
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,
    /// Seed for the deterministic subsets.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_supports() -> Vec<f64> {
    vec![0.01, 0.02, 0.03]
}

fn default_confidences() -> Vec<f64> {
    vec![0.2, 0.3, 0.4]
}

fn default_fractions() -> Vec<f64> {
    vec![1.0]
}

fn default_algorithms() -> Vec<Algorithm> {
    Algorithm::ALL.to_vec()
}

fn default_seed() -> u64 {
    1
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            min_supports: default_supports(),
            min_confidences: default_confidences(),
            fractions: default_fractions(),
            algorithms: default_algorithms(),
            seed: default_seed(),
        }
    }
}

impl SweepPlan {
    pub fn validate(&self) -> Result<()> {
        let axes = [
            ("min_supports", self.min_supports.is_empty()),
            ("min_confidences", self.min_confidences.is_empty()),
            ("fractions", self.fractions.is_empty()),
            ("algorithms", self.algorithms.is_empty()),
        ];
        if let Some((name, _)) = axes.iter().find(|(_, empty)| *empty) {
            return Err(MiningError::EmptyInput(format!("sweep axis '{name}' has no values")));
        }
        for &s in &self.min_supports {
            check_unit_threshold("min_support", s)?;
        }
        for &c in &self.min_confidences {
            check_unit_threshold("min_confidence", c)?;
        }
        for &f in &self.fractions {
            check_unit_threshold("fraction", f)?;
        }
        Ok(())
    }

    pub fn cells(&self) -> usize {
        self.min_supports.len() * self.min_confidences.len() * self.fractions.len() * self.algorithms.len()
    }
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub algorithm: Algorithm,
    pub fraction: f64,
    pub transactions: usize,
    pub min_support: f64,
    pub min_confidence: f64,
    /// Mining time for this support plus rule time for this confidence.
    pub runtime_secs: f64,
    pub num_frequent_itemsets: usize,
    pub num_rules: usize,
    /// Set when the cell ran out of budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub plan: SweepPlan,
    pub rows: Vec<SweepRow>,
}

impl SweepReport {
    pub fn rows_for(&self, algorithm: Algorithm) -> impl Iterator<Item = &SweepRow> {
        self.rows.iter().filter(move |r| r.algorithm == algorithm)
    }
}

/// Run every cell of `plan` against `store`.
///
/// `base` supplies `max_len`, `parallel` and resource limits for each call;
/// its `min_support` is replaced per cell. Itemsets are mined once per
/// (fraction, algorithm, support) and reused for every confidence.
/// A cell that exhausts its budget is recorded with `error` set and the sweep
/// moves on. Any other error aborts the sweep.
pub fn run_sweep(store: &TransactionStore, plan: &SweepPlan, base: &MiningConfig) -> Result<SweepReport> {
    plan.validate()?;
    let run_id = Uuid::new_v4();
    info!(%run_id, cells = plan.cells(), transactions = store.len(), "Sweep starting");

    let mut rows = Vec::with_capacity(plan.cells());
    for &fraction in &plan.fractions {
        let subset = store.sample(fraction, plan.seed)?;
        debug!(fraction, transactions = subset.len(), "Sweep subset drawn");

        for &algorithm in &plan.algorithms {
            for &min_support in &plan.min_supports {
                let config = MiningConfig {
                    min_support,
                    ..base.clone()
                };
                let row = |min_confidence: f64| SweepRow {
                    algorithm,
                    fraction,
                    transactions: subset.len(),
                    min_support,
                    min_confidence,
                    runtime_secs: 0.0,
                    num_frequent_itemsets: 0,
                    num_rules: 0,
                    error: None,
                };

                let start = Instant::now();
                let itemsets = match algorithm.mine(&subset, &config) {
                    Ok(itemsets) => itemsets,
                    Err(err) if err.is_resource_exhausted() => {
                        warn!(%algorithm, fraction, min_support, error = %err, "Sweep cell over budget");
                        rows.extend(plan.min_confidences.iter().map(|&c| SweepRow {
                            error: Some(err.to_string()),
                            ..row(c)
                        }));
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                let mining_secs = start.elapsed().as_secs_f64();

                for &min_confidence in &plan.min_confidences {
                    let start = Instant::now();
                    let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(min_confidence))?;
                    rows.push(SweepRow {
                        runtime_secs: mining_secs + start.elapsed().as_secs_f64(),
                        num_frequent_itemsets: itemsets.len(),
                        num_rules: rules.len(),
                        ..row(min_confidence)
                    });
                }
            }
        }
    }

    info!(%run_id, rows = rows.len(), "Sweep complete");
    Ok(SweepReport {
        run_id,
        generated_at: Utc::now(),
        plan: plan.clone(),
        rows,
    })
}
