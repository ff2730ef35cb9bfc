//! Level-wise frequent itemset search with candidate generation.

mod candidates;
mod counting;

use std::time::Instant;

use tracing::{debug, info};

use basket_core::{min_count_for, FrequentItemsets, ItemId, MiningConfig, Result, TransactionStore};

use crate::budget::Budget;

use candidates::generate_candidates;
use counting::{count_candidates, count_items};

/// Find every itemset whose support meets `config.min_support` using Apriori.
///
/// Level 1 is a full scan over single items. Each further level joins the
/// previous level's itemsets on a shared prefix, prunes any candidate with an
/// infrequent subset, and counts the survivors. Stops at the first empty level
/// or at `config.max_len`.
///
/// An empty store or universe yields an empty table.
pub fn apriori(store: &TransactionStore, config: &MiningConfig) -> Result<FrequentItemsets> {
    config.validate()?;

    let total = store.len();
    let universe_len = store.universe().len();
    if total == 0 || universe_len == 0 {
        debug!(total, universe_len, "Apriori on empty input");
        return Ok(FrequentItemsets::empty(total));
    }

    let start = Instant::now();
    let budget = Budget::new(&config.limits);
    let min_count = min_count_for(config.min_support, total);
    let max_len = config.max_len.unwrap_or(usize::MAX);

    let slices: Vec<&[ItemId]> = store.transactions().iter().map(|t| t.items()).collect();
    let item_counts = count_items(&slices, universe_len, config.parallel);

    let mut found: Vec<(Vec<ItemId>, u64)> = Vec::new();
    let mut level: Vec<Vec<ItemId>> = Vec::new();
    for (idx, &count) in item_counts.iter().enumerate() {
        if count >= min_count {
            let itemset = vec![ItemId(idx as u32)];
            found.push((itemset.clone(), count));
            level.push(itemset);
        }
    }
    debug!(level = 1, frequent = level.len(), min_count, "Apriori level complete");

    // Later levels never need infrequent items or baskets too short to hold a pair.
    let mut reduced: Vec<Vec<ItemId>> = store
        .transactions()
        .iter()
        .map(|t| {
            t.items()
                .iter()
                .copied()
                .filter(|item| item_counts[item.index()] >= min_count)
                .collect::<Vec<_>>()
        })
        .filter(|items| items.len() >= 2)
        .collect();

    let mut k = 2;
    while !level.is_empty() && k <= max_len {
        budget.check_deadline()?;

        let candidates = generate_candidates(&level, &budget)?;
        if candidates.is_empty() {
            break;
        }

        let counts = count_candidates(&reduced, &candidates, universe_len, config.parallel);
        let candidate_count = candidates.len();

        level = Vec::new();
        for (candidate, count) in candidates.into_iter().zip(counts) {
            if count >= min_count {
                found.push((candidate.clone(), count));
                level.push(candidate);
            }
        }

        debug!(
            level = k,
            candidates = candidate_count,
            frequent = level.len(),
            "Apriori level complete"
        );

        reduced.retain(|t| t.len() > k);
        k += 1;
    }

    let itemsets = FrequentItemsets::from_counts(total, found);
    info!(
        itemsets = itemsets.len(),
        total,
        min_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Apriori mining complete"
    );
    Ok(itemsets)
}
