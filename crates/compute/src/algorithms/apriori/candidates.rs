use std::collections::HashSet;

use basket_core::{ItemId, Result};

use crate::budget::Budget;

/// Generate level-k candidates from the frequent (k-1)-itemsets of the previous level.
///
/// `previous` must be sorted lexicographically, every itemset in canonical
/// order and of the same length. Two itemsets are joined only when they share
/// their first k-2 items, so each candidate is produced exactly once and the
/// output is itself sorted. A candidate survives only if every (k-1)-subset is
/// in `previous`.
pub(crate) fn generate_candidates(previous: &[Vec<ItemId>], budget: &Budget) -> Result<Vec<Vec<ItemId>>> {
    let Some(first) = previous.first() else {
        return Ok(Vec::new());
    };
    let prefix_len = first.len() - 1;
    let known: HashSet<&[ItemId]> = previous.iter().map(Vec::as_slice).collect();

    let mut candidates = Vec::new();
    let mut subset = Vec::with_capacity(first.len());

    for (i, left) in previous.iter().enumerate() {
        for right in &previous[i + 1..] {
            if left[..prefix_len] != right[..prefix_len] {
                // Sorted input: once the prefix changes no later itemset can match.
                break;
            }

            let mut candidate = Vec::with_capacity(left.len() + 1);
            candidate.extend_from_slice(left);
            candidate.push(right[prefix_len]);

            if has_infrequent_subset(&candidate, &known, &mut subset) {
                continue;
            }

            candidates.push(candidate);
            budget.check_candidates(candidates.len())?;
        }
    }

    Ok(candidates)
}

/// The two subsets obtained by dropping one of the last two items are the
/// join parents, so only the others need a lookup.
fn has_infrequent_subset(
    candidate: &[ItemId],
    known: &HashSet<&[ItemId]>,
    scratch: &mut Vec<ItemId>,
) -> bool {
    let len = candidate.len();
    if len < 3 {
        return false;
    }
    (0..len - 2).any(|skip| {
        scratch.clear();
        scratch.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &item)| item),
        );
        !known.contains(scratch.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_core::ResourceLimits;

    fn set(raw: &[u32]) -> Vec<ItemId> {
        raw.iter().map(|&i| ItemId(i)).collect()
    }

    #[test]
    fn joins_singletons_into_all_pairs() {
        let previous = vec![set(&[0]), set(&[1]), set(&[2])];
        let candidates = generate_candidates(&previous, &Budget::unbounded()).unwrap();
        assert_eq!(candidates, vec![set(&[0, 1]), set(&[0, 2]), set(&[1, 2])]);
    }

    #[test]
    fn joins_only_on_shared_prefix() {
        let previous = vec![set(&[0, 1]), set(&[0, 2]), set(&[1, 2]), set(&[1, 3])];
        let candidates = generate_candidates(&previous, &Budget::unbounded()).unwrap();
        // {1,2}+{1,3} joins to {1,2,3}, which is pruned because {2,3} is missing.
        assert_eq!(candidates, vec![set(&[0, 1, 2])]);
    }

    #[test]
    fn prunes_candidates_with_infrequent_subsets() {
        // {0,1,2} joins from {0,1}+{0,2} but {1,2} is not frequent.
        let previous = vec![set(&[0, 1]), set(&[0, 2])];
        let candidates = generate_candidates(&previous, &Budget::unbounded()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn candidate_ceiling_is_enforced() {
        let previous: Vec<Vec<ItemId>> = (0..10).map(|i| set(&[i])).collect();
        let budget = Budget::new(&ResourceLimits {
            max_candidates: Some(10),
            ..ResourceLimits::default()
        });
        let err = generate_candidates(&previous, &budget).unwrap_err();
        assert!(err.is_resource_exhausted());
    }
}
