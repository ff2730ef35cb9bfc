use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use basket_compute::{pair_cooccurrence, top_rules, CrossCheck, MiningReport, SweepReport};
use basket_core::{ItemUniverse, Rule, RuleMetric};

/// One unordered item pair and how many rules mention both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairRow {
    pub a: String,
    pub b: String,
    pub rules: usize,
}

pub fn cooccurrence_rows(rules: &[Rule], universe: &ItemUniverse) -> Vec<PairRow> {
    pair_cooccurrence(rules)
        .into_iter()
        .map(|((a, b), count)| {
            let [a, b]: [String; 2] = [a, b].map(|id| universe.labels_of(&[id]).remove(0));
            PairRow { a, b, rules: count }
        })
        .collect()
}

/// count / mean / std / min / quartiles / max of one rule metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: RuleMetric,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; 0 for a single rule.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Metrics summarised in the `mine` report.
pub const SUMMARY_METRICS: [RuleMetric; 3] = [RuleMetric::Support, RuleMetric::Confidence, RuleMetric::Lift];

/// `None` when there are no rules.
pub fn metric_summary(rules: &[Rule], metric: RuleMetric) -> Option<MetricSummary> {
    let values: Vec<f64> = rules.iter().map(|r| r.metric(metric)).collect();
    describe(&values).map(|(count, mean, std, [min, q25, median, q75, max])| MetricSummary {
        metric,
        count,
        mean,
        std,
        min,
        q25,
        median,
        q75,
        max,
    })
}

fn describe(values: &[f64]) -> Option<(usize, f64, f64, [f64; 5])> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = if n < 2 {
        0.0
    } else {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    };
    // Linear interpolation between closest ranks.
    let quantile = |q: f64| {
        let pos = q * (n - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    };
    Some((n, mean, std, [sorted[0], quantile(0.25), quantile(0.5), quantile(0.75), sorted[n - 1]]))
}

pub fn metric_summaries(rules: &[Rule]) -> Vec<MetricSummary> {
    SUMMARY_METRICS
        .iter()
        .filter_map(|&metric| metric_summary(rules, metric))
        .collect()
}

pub fn format_metric_summaries(summaries: &[MetricSummary]) -> String {
    let mut out = String::new();
    if summaries.is_empty() {
        return out;
    }
    let _ = writeln!(
        out,
        "{:<10} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "metric", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<10} {:>6} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4}",
            s.metric.to_string(),
            s.count,
            s.mean,
            s.std,
            s.min,
            s.q25,
            s.median,
            s.q75,
            s.max
        );
    }
    out
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Write the itemset, rule, co-occurrence, metric and summary tables into `dir`.
pub fn write_mining_report(dir: &Path, report: &MiningReport, universe: &ItemUniverse) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let itemsets = dir.join("itemsets.json");
    write_json(&itemsets, &report.itemset_rows(universe))?;
    let rules = dir.join("rules.json");
    write_json(&rules, &report.rule_rows(universe))?;
    let pairs = dir.join("cooccurrence.json");
    write_json(&pairs, &cooccurrence_rows(&report.rules, universe))?;
    let metrics = dir.join("metrics.json");
    write_json(&metrics, &metric_summaries(&report.rules))?;
    let summary = dir.join("summary.json");
    write_json(&summary, &report.summary())?;

    info!(dir = %dir.display(), "Mining report written");
    Ok(vec![itemsets, rules, pairs, metrics, summary])
}

pub fn format_summary(report: &MiningReport) -> String {
    let s = report.summary();
    format!(
        "{}: {} transactions, {} frequent itemsets (largest {}), {} rules; mining {:.3}s, rules {:.3}s",
        s.algorithm, s.transactions, s.itemsets, s.largest_itemset, s.rules, s.mining_secs, s.rule_secs
    )
}

pub fn format_top_rules(rules: &[Rule], universe: &ItemUniverse, metric: RuleMetric, n: usize) -> String {
    let mut out = String::new();
    let top = top_rules(rules, metric, n);
    if top.is_empty() {
        out.push_str("no rules\n");
        return out;
    }
    let _ = writeln!(out, "top {} rules by {}:", top.len(), metric);
    for rule in &top {
        let _ = writeln!(
            out,
            "  {{{}}} -> {{{}}}  support={:.4} confidence={:.4} lift={:.4} {}={:.4}",
            universe.labels_of(&rule.antecedent).join(", "),
            universe.labels_of(&rule.consequent).join(", "),
            rule.support,
            rule.confidence,
            rule.lift,
            metric,
            rule.metric(metric),
        );
    }
    out
}

pub fn format_cross_check(check: &CrossCheck) -> String {
    format!(
        "apriori and fpgrowth agree on {} itemsets; apriori {:.3}s, fpgrowth {:.3}s",
        check.itemsets, check.apriori_secs, check.fpgrowth_secs
    )
}

pub fn format_sweep(report: &SweepReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<9} {:>8} {:>7} {:>8} {:>8} {:>9} {:>8} {:>7}",
        "algorithm", "fraction", "txns", "support", "conf", "secs", "itemsets", "rules"
    );
    for row in &report.rows {
        let _ = write!(
            out,
            "{:<9} {:>8.2} {:>7} {:>8.3} {:>8.2} {:>9.4} {:>8} {:>7}",
            row.algorithm,
            row.fraction,
            row.transactions,
            row.min_support,
            row.min_confidence,
            row.runtime_secs,
            row.num_frequent_itemsets,
            row.num_rules
        );
        if let Some(err) = &row.error {
            let _ = write!(out, "  ({err})");
        }
        out.push('\n');
    }
    out
}
