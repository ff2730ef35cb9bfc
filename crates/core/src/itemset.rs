use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, ItemUniverse};

/// Canonical itemset order: size ascending, then item-wise by canonical item order.
pub fn canonical_cmp(a: &[ItemId], b: &[ItemId]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Smallest transaction count whose ratio meets `min_support`.
///
/// A small tolerance absorbs representation error, so `0.3` of 10
/// transactions is 3 rather than 4.
pub fn min_count_for(min_support: f64, total: usize) -> u64 {
    let raw = min_support * total as f64;
    ((raw - 1e-9).ceil().max(1.0)) as u64
}

/// A frequent itemset with its exact support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemset {
    /// Items in canonical order.
    pub items: Vec<ItemId>,
    /// Number of transactions containing every item.
    pub count: u64,
    /// `count / total transactions`.
    pub support: f64,
}

/// Labelled row of the itemset output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsetRow {
    pub itemset: Vec<String>,
    pub count: u64,
    pub support: f64,
}

/// The finalized result of a mining call, in canonical order.
#[derive(Debug, Clone, Default)]
pub struct FrequentItemsets {
    total_transactions: usize,
    entries: Vec<FrequentItemset>,
    index: HashMap<Vec<ItemId>, usize>,
}

impl FrequentItemsets {
    /// Build the table from raw `(items, count)` pairs. Items inside each
    /// set are sorted and the table is put in canonical order.
    pub fn from_counts(total_transactions: usize, raw: Vec<(Vec<ItemId>, u64)>) -> Self {
        let mut entries: Vec<FrequentItemset> = raw
            .into_iter()
            .map(|(mut items, count)| {
                items.sort_unstable();
                let support = if total_transactions == 0 {
                    0.0
                } else {
                    count as f64 / total_transactions as f64
                };
                FrequentItemset {
                    items,
                    count,
                    support,
                }
            })
            .collect();
        entries.sort_by(|a, b| canonical_cmp(&a.items, &b.items));

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.items.clone(), i))
            .collect();

        Self {
            total_transactions,
            entries,
            index,
        }
    }

    pub fn empty(total_transactions: usize) -> Self {
        Self::from_counts(total_transactions, Vec::new())
    }

    pub fn total_transactions(&self) -> usize {
        self.total_transactions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequentItemset> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[FrequentItemset] {
        &self.entries
    }

    /// Look up an itemset given in canonical order.
    pub fn get(&self, items: &[ItemId]) -> Option<&FrequentItemset> {
        self.index.get(items).map(|&i| &self.entries[i])
    }

    pub fn count_of(&self, items: &[ItemId]) -> Option<u64> {
        self.get(items).map(|e| e.count)
    }

    /// Size of the largest itemset, 0 when empty.
    pub fn max_len(&self) -> usize {
        self.entries.last().map_or(0, |e| e.items.len())
    }

    /// Number of itemsets per size; index 0 is always 0.
    pub fn len_histogram(&self) -> Vec<usize> {
        let mut histogram = vec![0; self.max_len() + 1];
        for entry in &self.entries {
            histogram[entry.items.len()] += 1;
        }
        histogram
    }

    /// `(items, count)` pairs, handy for set comparison across algorithms.
    pub fn to_pairs(&self) -> Vec<(Vec<ItemId>, u64)> {
        self.entries
            .iter()
            .map(|e| (e.items.clone(), e.count))
            .collect()
    }

    pub fn to_rows(&self, universe: &ItemUniverse) -> Vec<ItemsetRow> {
        self.entries
            .iter()
            .map(|e| ItemsetRow {
                itemset: universe.labels_of(&e.items),
                count: e.count,
                support: e.support,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a FrequentItemset;
    type IntoIter = std::slice::Iter<'a, FrequentItemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
