//! Association rules derived from a finalized frequent itemset table.

pub mod metrics;
mod tests;

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::info;

use basket_core::{
    canonical_cmp, FrequentItemset, FrequentItemsets, ItemId, MiningError, Result, Rule,
    RuleConfig, RuleMetric,
};

use metrics::score;

/// Derive every rule `A -> I \ A` over frequent itemsets `I` with `|I| >= 2`.
///
/// A rule is kept when its confidence reaches `min_confidence`, its lift
/// reaches `min_lift` (if set), and every extra metric filter passes.
/// Output is ordered by itemset size, then antecedent, then consequent, all
/// in canonical order.
///
/// Every subset of a frequent itemset must itself be in the table; a missing
/// or zero-support subset fails the call with `InternalInvariantViolation`.
pub fn association_rules(itemsets: &FrequentItemsets, config: &RuleConfig) -> Result<Vec<Rule>> {
    config.validate()?;

    let per_itemset = itemsets
        .as_slice()
        .par_iter()
        .filter(|entry| entry.items.len() >= 2)
        .map(|entry| rules_for(entry, itemsets, config))
        .collect::<Result<Vec<Vec<Rule>>>>()?;

    let mut rules: Vec<Rule> = per_itemset.into_iter().flatten().collect();
    rules.sort_by(|a, b| {
        a.len()
            .cmp(&b.len())
            .then_with(|| canonical_cmp(&a.antecedent, &b.antecedent))
            .then_with(|| canonical_cmp(&a.consequent, &b.consequent))
    });

    info!(
        itemsets = itemsets.len(),
        rules = rules.len(),
        min_confidence = config.min_confidence,
        "Rule generation complete"
    );
    Ok(rules)
}

fn rules_for(entry: &FrequentItemset, itemsets: &FrequentItemsets, config: &RuleConfig) -> Result<Vec<Rule>> {
    let items = &entry.items;
    let total = itemsets.total_transactions();
    let mut rules = Vec::new();

    for size in 1..items.len() {
        for antecedent in combinations(items, size) {
            let consequent: Vec<ItemId> = items
                .iter()
                .copied()
                .filter(|item| antecedent.binary_search(item).is_err())
                .collect();

            let count_antecedent = subset_count(itemsets, &antecedent, items)?;
            let count_consequent = subset_count(itemsets, &consequent, items)?;
            let s = score(entry.count, count_antecedent, count_consequent, total)?;

            if s.confidence < config.min_confidence {
                continue;
            }
            if config.min_lift.is_some_and(|min| s.lift < min) {
                continue;
            }

            let rule = Rule {
                antecedent,
                consequent,
                antecedent_support: s.antecedent_support,
                consequent_support: s.consequent_support,
                support: s.support,
                confidence: s.confidence,
                lift: s.lift,
                leverage: s.leverage,
                conviction: s.conviction,
                zhangs_metric: s.zhangs_metric,
            };
            if config
                .metric_filters
                .iter()
                .all(|filter| rule.metric(filter.metric) >= filter.min)
            {
                rules.push(rule);
            }
        }
    }
    Ok(rules)
}

fn subset_count(itemsets: &FrequentItemsets, subset: &[ItemId], parent: &[ItemId]) -> Result<u64> {
    itemsets.count_of(subset).ok_or_else(|| {
        MiningError::InternalInvariantViolation(format!(
            "subset {subset:?} of frequent itemset {parent:?} is missing from the table"
        ))
    })
}

/// All `size`-combinations of `items`, in lexicographic order.
fn combinations(items: &[ItemId], size: usize) -> Vec<Vec<ItemId>> {
    let n = items.len();
    if size == 0 || size > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..size).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i]).collect());

        // Rightmost index that can still advance.
        let Some(pos) = (0..size).rev().find(|&i| idx[i] != i + n - size) else {
            return out;
        };
        idx[pos] += 1;
        for i in pos + 1..size {
            idx[i] = idx[i - 1] + 1;
        }
    }
}

/// The `n` best rules by `metric`, highest first. Ties keep their canonical order.
pub fn top_rules(rules: &[Rule], metric: RuleMetric, n: usize) -> Vec<Rule> {
    let mut ranked: Vec<Rule> = rules.to_vec();
    ranked.sort_by(|a, b| b.metric(metric).total_cmp(&a.metric(metric)));
    ranked.truncate(n);
    ranked
}

/// For each unordered item pair, how many rules' itemsets contain both.
pub fn pair_cooccurrence(rules: &[Rule]) -> BTreeMap<(ItemId, ItemId), usize> {
    let mut counts = BTreeMap::new();
    for rule in rules {
        let items = rule.itemset();
        for (i, &a) in items.iter().enumerate() {
            for &b in &items[i + 1..] {
                *counts.entry((a, b)).or_insert(0) += 1;
            }
        }
    }
    counts
}
