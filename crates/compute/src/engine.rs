use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use basket_core::{
    FrequentItemsets, ItemId, ItemUniverse, ItemsetRow, MiningConfig, MiningError, Result, Rule,
    RuleConfig, RuleRow, TransactionStore,
};

use crate::algorithms::{apriori, fpgrowth, rules};

/// Which frequent itemset miner to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Apriori,
    FpGrowth,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Apriori, Algorithm::FpGrowth];

    pub fn mine(self, store: &TransactionStore, config: &MiningConfig) -> Result<FrequentItemsets> {
        match self {
            Algorithm::Apriori => apriori::apriori(store, config),
            Algorithm::FpGrowth => fpgrowth::fpgrowth(store, config),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Apriori => write!(f, "apriori"),
            Algorithm::FpGrowth => write!(f, "fpgrowth"),
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = MiningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "apriori" => Ok(Algorithm::Apriori),
            "fpgrowth" => Ok(Algorithm::FpGrowth),
            other => Err(MiningError::InvalidParameter(format!(
                "unknown algorithm '{other}'"
            ))),
        }
    }
}

/// Result of one mining + rule generation call.
#[derive(Debug, Clone)]
pub struct MiningReport {
    pub algorithm: Algorithm,
    pub itemsets: FrequentItemsets,
    pub rules: Vec<Rule>,
    pub mining_time: Duration,
    pub rule_time: Duration,
}

/// Counts and timings of a [`MiningReport`], for logs and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningSummary {
    pub algorithm: Algorithm,
    pub transactions: usize,
    pub itemsets: usize,
    pub rules: usize,
    pub largest_itemset: usize,
    pub mining_secs: f64,
    pub rule_secs: f64,
}

impl MiningReport {
    pub fn summary(&self) -> MiningSummary {
        MiningSummary {
            algorithm: self.algorithm,
            transactions: self.itemsets.total_transactions(),
            itemsets: self.itemsets.len(),
            rules: self.rules.len(),
            largest_itemset: self.itemsets.max_len(),
            mining_secs: self.mining_time.as_secs_f64(),
            rule_secs: self.rule_time.as_secs_f64(),
        }
    }

    pub fn itemset_rows(&self, universe: &ItemUniverse) -> Vec<ItemsetRow> {
        self.itemsets.to_rows(universe)
    }

    pub fn rule_rows(&self, universe: &ItemUniverse) -> Vec<RuleRow> {
        self.rules.iter().map(|r| r.to_row(universe)).collect()
    }
}

/// Outcome of running both miners on the same store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCheck {
    pub itemsets: usize,
    pub apriori_secs: f64,
    pub fpgrowth_secs: f64,
}

/// Validated mining and rule settings for repeated calls.
#[derive(Debug, Clone)]
pub struct MiningEngine {
    mining: MiningConfig,
    rules: RuleConfig,
}

impl MiningEngine {
    pub fn new(mining: MiningConfig, rules: RuleConfig) -> Result<Self> {
        mining.validate()?;
        rules.validate()?;
        Ok(Self { mining, rules })
    }

    pub fn mining_config(&self) -> &MiningConfig {
        &self.mining
    }

    pub fn rule_config(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn frequent_itemsets(&self, store: &TransactionStore, algorithm: Algorithm) -> Result<FrequentItemsets> {
        algorithm.mine(store, &self.mining)
    }

    pub fn rules(&self, itemsets: &FrequentItemsets) -> Result<Vec<Rule>> {
        rules::association_rules(itemsets, &self.rules)
    }

    /// Mine itemsets, check them, and derive rules.
    pub fn run(&self, store: &TransactionStore, algorithm: Algorithm) -> Result<MiningReport> {
        let start = Instant::now();
        let itemsets = self.frequent_itemsets(store, algorithm)?;
        verify_anti_monotone(&itemsets)?;
        let mining_time = start.elapsed();

        let start = Instant::now();
        let rules = self.rules(&itemsets)?;
        let rule_time = start.elapsed();

        let report = MiningReport {
            algorithm,
            itemsets,
            rules,
            mining_time,
            rule_time,
        };
        let summary = report.summary();
        info!(
            algorithm = %algorithm,
            transactions = summary.transactions,
            itemsets = summary.itemsets,
            rules = summary.rules,
            mining_secs = summary.mining_secs,
            "Mining run complete"
        );
        Ok(report)
    }

    /// Run both miners and require identical `(itemset, count)` sets.
    pub fn cross_check(&self, store: &TransactionStore) -> Result<CrossCheck> {
        let start = Instant::now();
        let a = self.frequent_itemsets(store, Algorithm::Apriori)?;
        let apriori_secs = start.elapsed().as_secs_f64();

        let start = Instant::now();
        let f = self.frequent_itemsets(store, Algorithm::FpGrowth)?;
        let fpgrowth_secs = start.elapsed().as_secs_f64();

        let a_pairs: BTreeSet<(Vec<ItemId>, u64)> = a.to_pairs().into_iter().collect();
        let f_pairs: BTreeSet<(Vec<ItemId>, u64)> = f.to_pairs().into_iter().collect();
        if a_pairs != f_pairs {
            let only_apriori = a_pairs.difference(&f_pairs).count();
            let only_fpgrowth = f_pairs.difference(&a_pairs).count();
            let first = a_pairs.symmetric_difference(&f_pairs).next().cloned();
            warn!(only_apriori, only_fpgrowth, "Miners disagree");
            return Err(MiningError::InternalInvariantViolation(format!(
                "apriori and fpgrowth disagree: {only_apriori} itemsets only from apriori, \
                 {only_fpgrowth} only from fpgrowth (first: {first:?})"
            )));
        }

        Ok(CrossCheck {
            itemsets: a_pairs.len(),
            apriori_secs,
            fpgrowth_secs,
        })
    }
}

/// Check that no itemset is more frequent than any of its immediate subsets.
///
/// Immediate subsets suffice since the relation is transitive. A missing
/// subset also counts as a violation: every subset of a frequent itemset is
/// frequent.
pub fn verify_anti_monotone(itemsets: &FrequentItemsets) -> Result<()> {
    let mut subset = Vec::new();
    for entry in itemsets {
        if entry.items.len() < 2 {
            continue;
        }
        for skip in 0..entry.items.len() {
            subset.clear();
            subset.extend(
                entry
                    .items
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != skip)
                    .map(|(_, &item)| item),
            );
            match itemsets.count_of(&subset) {
                Some(count) if count >= entry.count => {}
                Some(count) => {
                    return Err(MiningError::InternalInvariantViolation(format!(
                        "itemset {:?} has count {} above its subset {:?} ({})",
                        entry.items, entry.count, subset, count
                    )))
                }
                None => {
                    return Err(MiningError::InternalInvariantViolation(format!(
                        "subset {:?} of frequent itemset {:?} is missing",
                        subset, entry.items
                    )))
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grocery() -> TransactionStore {
        TransactionStore::from_baskets(vec![
            vec!["milk", "bread"],
            vec!["milk", "bread", "butter"],
            vec!["bread"],
            vec!["milk"],
        ])
    }

    fn engine(min_support: f64, min_confidence: f64) -> MiningEngine {
        MiningEngine::new(
            MiningConfig::with_min_support(min_support),
            RuleConfig::with_min_confidence(min_confidence),
        )
        .unwrap()
    }

    #[test]
    fn new_validates_both_configs() {
        assert!(MiningEngine::new(
            MiningConfig::with_min_support(0.0),
            RuleConfig::default()
        )
        .is_err());
        assert!(MiningEngine::new(
            MiningConfig::default(),
            RuleConfig::with_min_confidence(2.0)
        )
        .is_err());
    }

    #[test]
    fn run_produces_itemsets_and_rules() {
        let store = grocery();
        for algorithm in Algorithm::ALL {
            let report = engine(0.5, 0.6).run(&store, algorithm).unwrap();
            assert_eq!(report.itemsets.len(), 3);
            assert_eq!(report.rules.len(), 2);

            let rows = report.rule_rows(store.universe());
            assert!(rows
                .iter()
                .any(|r| r.antecedent == vec!["milk"] && r.consequent == vec!["bread"]));
            let summary = report.summary();
            assert_eq!(summary.transactions, 4);
            assert_eq!(summary.largest_itemset, 2);
        }
    }

    #[test]
    fn run_on_empty_store_is_empty() {
        let report = engine(0.5, 0.5)
            .run(&TransactionStore::default(), Algorithm::FpGrowth)
            .unwrap();
        assert!(report.itemsets.is_empty());
        assert!(report.rules.is_empty());
    }

    #[test]
    fn cross_check_agrees_on_grocery() {
        let check = engine(0.25, 0.5).cross_check(&grocery()).unwrap();
        assert_eq!(check.itemsets, 7);
    }

    #[test]
    fn anti_monotone_violation_is_detected() {
        let broken = FrequentItemsets::from_counts(
            4,
            vec![
                (vec![ItemId(0)], 1),
                (vec![ItemId(1)], 3),
                (vec![ItemId(0), ItemId(1)], 2),
            ],
        );
        assert!(matches!(
            verify_anti_monotone(&broken),
            Err(MiningError::InternalInvariantViolation(_))
        ));

        let missing = FrequentItemsets::from_counts(4, vec![(vec![ItemId(0), ItemId(1)], 2)]);
        assert!(verify_anti_monotone(&missing).is_err());
    }

    #[test]
    fn algorithm_names_parse() {
        assert_eq!("apriori".parse::<Algorithm>().unwrap(), Algorithm::Apriori);
        assert_eq!("fp-growth".parse::<Algorithm>().unwrap(), Algorithm::FpGrowth);
        assert_eq!("FPGrowth".parse::<Algorithm>().unwrap(), Algorithm::FpGrowth);
        assert!("eclat".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::FpGrowth.to_string(), "fpgrowth");
    }
}
