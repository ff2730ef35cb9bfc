use std::ops::Range;

use rayon::prelude::*;

use basket_core::ItemId;

/// Transactions per rayon shard.
const SHARD_SIZE: usize = 1024;

/// Count how many transactions contain each item of the universe.
pub(crate) fn count_items(transactions: &[&[ItemId]], universe_len: usize, parallel: bool) -> Vec<u64> {
    let count_shard = |shard: &[&[ItemId]]| {
        let mut counts = vec![0u64; universe_len];
        for transaction in shard {
            for item in transaction.iter() {
                counts[item.index()] += 1;
            }
        }
        counts
    };

    if parallel {
        transactions
            .par_chunks(SHARD_SIZE)
            .map(count_shard)
            .reduce(|| vec![0u64; universe_len], merge_counts)
    } else {
        count_shard(transactions)
    }
}

/// Count the support of each candidate.
///
/// `candidates` must be sorted lexicographically and all of one length. Each
/// shard marks the items of one transaction at a time in a dense scratch
/// vector, then tests only candidates whose first item is in the transaction.
/// Shard results are merged by summation.
pub(crate) fn count_candidates(
    transactions: &[Vec<ItemId>],
    candidates: &[Vec<ItemId>],
    universe_len: usize,
    parallel: bool,
) -> Vec<u64> {
    let Some(k) = candidates.first().map(Vec::len) else {
        return Vec::new();
    };
    let by_first = first_item_ranges(candidates, universe_len);

    let count_shard = |shard: &[Vec<ItemId>]| {
        let mut counts = vec![0u64; candidates.len()];
        let mut present = vec![false; universe_len];

        for transaction in shard {
            if transaction.len() < k {
                continue;
            }
            for item in transaction {
                present[item.index()] = true;
            }
            for item in &transaction[..=transaction.len() - k] {
                let Some(range) = by_first[item.index()].clone() else {
                    continue;
                };
                for idx in range {
                    if candidates[idx][1..].iter().all(|i| present[i.index()]) {
                        counts[idx] += 1;
                    }
                }
            }
            for item in transaction {
                present[item.index()] = false;
            }
        }
        counts
    };

    if parallel {
        transactions
            .par_chunks(SHARD_SIZE)
            .map(count_shard)
            .reduce(|| vec![0u64; candidates.len()], merge_counts)
    } else {
        count_shard(transactions)
    }
}

fn merge_counts(mut a: Vec<u64>, b: Vec<u64>) -> Vec<u64> {
    for (x, y) in a.iter_mut().zip(b) {
        *x += y;
    }
    a
}

fn first_item_ranges(candidates: &[Vec<ItemId>], universe_len: usize) -> Vec<Option<Range<usize>>> {
    let mut ranges: Vec<Option<Range<usize>>> = vec![None; universe_len];
    for (idx, candidate) in candidates.iter().enumerate() {
        let slot = &mut ranges[candidate[0].index()];
        match slot {
            Some(range) => range.end = idx + 1,
            None => *slot = Some(idx..idx + 1),
        }
    }
    ranges
}
