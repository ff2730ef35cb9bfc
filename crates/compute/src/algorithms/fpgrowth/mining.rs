use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use basket_core::{min_count_for, FrequentItemsets, ItemId, MiningConfig, Result, TransactionStore};

use crate::budget::Budget;

use super::tree::FpTree;

type Found = Vec<(Vec<ItemId>, u64)>;

/// Settings shared by every level of the recursion.
struct MineContext<'a> {
    min_count: u64,
    max_len: usize,
    parallel: bool,
    budget: &'a Budget,
}

/// Find every itemset whose support meets `config.min_support` using FP-Growth.
///
/// Produces exactly the itemsets and counts [`apriori`](crate::algorithms::apriori::apriori)
/// does. The initial tree is read-only once built; with `config.parallel`
/// each top-level header item is mined on its own rayon task, each building
/// and dropping its own conditional trees.
pub fn fpgrowth(store: &TransactionStore, config: &MiningConfig) -> Result<FrequentItemsets> {
    config.validate()?;

    let total = store.len();
    if total == 0 || store.universe().is_empty() {
        debug!(total, "FP-Growth on empty input");
        return Ok(FrequentItemsets::empty(total));
    }

    let start = Instant::now();
    let budget = Budget::new(&config.limits);
    let ctx = MineContext {
        min_count: min_count_for(config.min_support, total),
        max_len: config.max_len.unwrap_or(usize::MAX),
        parallel: config.parallel,
        budget: &budget,
    };

    let paths: Vec<(&[ItemId], u64)> = store
        .transactions()
        .iter()
        .map(|t| (t.items(), 1))
        .collect();
    let tree = FpTree::build(&paths, ctx.min_count, &budget)?;
    debug!(
        nodes = tree.node_count(),
        items = tree.header().len(),
        min_count = ctx.min_count,
        "FP-tree built"
    );

    let found = if tree.is_empty() {
        Vec::new()
    } else {
        mine_tree(&tree, &[], &ctx)?
    };

    let itemsets = FrequentItemsets::from_counts(total, found);
    info!(
        itemsets = itemsets.len(),
        total,
        min_count = ctx.min_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "FP-Growth mining complete"
    );
    Ok(itemsets)
}

/// Mine a (possibly conditional) tree whose itemsets all extend `suffix`.
fn mine_tree(tree: &FpTree, suffix: &[ItemId], ctx: &MineContext<'_>) -> Result<Found> {
    ctx.budget.check_deadline()?;

    if let Some(path) = tree.single_path() {
        return enumerate_single_path(&path, suffix, ctx.max_len, ctx.budget);
    }

    // Rarest item first.
    let positions: Vec<usize> = (0..tree.header().len()).rev().collect();

    if ctx.parallel && suffix.is_empty() {
        let parts = positions
            .into_par_iter()
            .map(|pos| mine_item(tree, pos, suffix, ctx))
            .collect::<Result<Vec<Found>>>()?;
        Ok(parts.concat())
    } else {
        let mut found = Vec::new();
        for pos in positions {
            found.extend(mine_item(tree, pos, suffix, ctx)?);
        }
        Ok(found)
    }
}

/// Emit `suffix + item` and everything its conditional tree yields.
fn mine_item(tree: &FpTree, pos: usize, suffix: &[ItemId], ctx: &MineContext<'_>) -> Result<Found> {
    let entry = &tree.header()[pos];
    let mut itemset = Vec::with_capacity(suffix.len() + 1);
    itemset.extend_from_slice(suffix);
    itemset.push(entry.item);

    let mut found = vec![(itemset.clone(), entry.count)];
    if itemset.len() >= ctx.max_len {
        return Ok(found);
    }

    let base = tree.conditional_pattern_base(pos);
    if base.is_empty() {
        return Ok(found);
    }

    let conditional = FpTree::build(&base, ctx.min_count, ctx.budget)?;
    if !conditional.is_empty() {
        found.extend(mine_tree(&conditional, &itemset, ctx)?);
    }
    Ok(found)
}

/// Emitted itemsets between deadline checks while enumerating a single path.
const DEADLINE_CHECK_INTERVAL: usize = 4096;

/// Every non-empty combination of a single path's items, joined with `suffix`.
///
/// Counts along a chain never increase going down, so a combination's
/// support is the count of its deepest node. A path of n items yields up to
/// 2^n - 1 itemsets, so the deadline is re-checked as they are emitted.
fn enumerate_single_path(
    path: &[(ItemId, u64)],
    suffix: &[ItemId],
    max_len: usize,
    budget: &Budget,
) -> Result<Found> {
    let room = max_len.saturating_sub(suffix.len());
    let mut found = Vec::new();
    let mut chosen: Vec<ItemId> = Vec::new();
    extend_combinations(path, 0, room, suffix, &mut chosen, &mut found, budget)?;
    Ok(found)
}

fn extend_combinations(
    path: &[(ItemId, u64)],
    from: usize,
    room: usize,
    suffix: &[ItemId],
    chosen: &mut Vec<ItemId>,
    found: &mut Found,
    budget: &Budget,
) -> Result<()> {
    if chosen.len() == room {
        return Ok(());
    }
    for idx in from..path.len() {
        let (item, count) = path[idx];
        chosen.push(item);

        let mut itemset = Vec::with_capacity(suffix.len() + chosen.len());
        itemset.extend_from_slice(suffix);
        itemset.extend_from_slice(chosen);
        found.push((itemset, count));
        if found.len() % DEADLINE_CHECK_INTERVAL == 0 {
            budget.check_deadline()?;
        }

        extend_combinations(path, idx + 1, room, suffix, chosen, found, budget)?;
        chosen.pop();
    }
    Ok(())
}
