use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{check_unit_threshold, Result};
use crate::item::{ItemId, ItemUniverse};

/// An unordered set of items, stored sorted in canonical order without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    items: Vec<ItemId>,
}

impl Transaction {
    pub fn new(mut items: Vec<ItemId>) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.binary_search(&item).is_ok()
    }
}

/// Immutable collection of transactions over a fixed item universe.
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    universe: ItemUniverse,
    transactions: Vec<Transaction>,
}

impl TransactionStore {
    /// Build a store from baskets of labels; the universe is every label seen.
    pub fn from_baskets<B, I, S>(baskets: B) -> Self
    where
        B: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<Vec<String>> = baskets
            .into_iter()
            .map(|basket| basket.into_iter().map(Into::into).collect())
            .collect();
        let universe = ItemUniverse::from_labels(raw.iter().flatten().cloned());
        let transactions = raw
            .iter()
            .map(|basket| {
                Transaction::new(basket.iter().filter_map(|l| universe.id_of(l)).collect())
            })
            .collect();
        Self {
            universe,
            transactions,
        }
    }

    /// Build a store against an explicit universe. Labels outside it are rejected.
    pub fn with_universe<B, I, S>(universe: ItemUniverse, baskets: B) -> Result<Self>
    where
        B: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut transactions = Vec::new();
        for basket in baskets {
            let ids = basket
                .into_iter()
                .map(|label| universe.require(label.as_ref()))
                .collect::<Result<Vec<_>>>()?;
            transactions.push(Transaction::new(ids));
        }
        Ok(Self {
            universe,
            transactions,
        })
    }

    pub fn universe(&self) -> &ItemUniverse {
        &self.universe
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Mean basket size over universe size; 0 for an empty store or universe.
    pub fn density(&self) -> f64 {
        if self.transactions.is_empty() || self.universe.is_empty() {
            return 0.0;
        }
        let total: usize = self.transactions.iter().map(Transaction::len).sum();
        total as f64 / self.transactions.len() as f64 / self.universe.len() as f64
    }

    /// Deterministic subset of exactly `round(fraction * len)` transactions.
    ///
    /// Each transaction `i` is ranked by the leading 8 bytes of
    /// `SHA-256(seed || i)`, read as a big-endian integer and scaled into
    /// `[0, 1)`; the lowest-ranked ones are kept, in their original order.
    /// A fraction of 1.0 keeps everything. The universe is shared with the
    /// parent store.
    pub fn sample(&self, fraction: f64, seed: u64) -> Result<Self> {
        check_unit_threshold("fraction", fraction)?;
        if fraction >= 1.0 {
            return Ok(self.clone());
        }
        let keep = (fraction * self.transactions.len() as f64).round() as usize;

        let mut ranked: Vec<(f64, usize)> = (0..self.transactions.len())
            .map(|i| (unit_hash(seed, i as u64), i))
            .collect();
        ranked.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut chosen: Vec<usize> = ranked.into_iter().take(keep).map(|(_, i)| i).collect();
        chosen.sort_unstable();

        let transactions: Vec<Transaction> = chosen
            .into_iter()
            .map(|i| self.transactions[i].clone())
            .collect();
        debug!(fraction, seed, kept = transactions.len(), of = self.transactions.len(), "Sampled transactions");
        Ok(Self {
            universe: self.universe.clone(),
            transactions,
        })
    }
}

fn unit_hash(seed: u64, index: u64) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_be_bytes());
    hasher.update(index.to_be_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MiningError;

    fn grocery() -> TransactionStore {
        TransactionStore::from_baskets(vec![
            vec!["milk", "bread"],
            vec!["milk", "bread", "butter"],
            vec!["bread"],
            vec!["milk"],
        ])
    }

    #[test]
    fn from_baskets_interns_labels() {
        let store = grocery();
        assert_eq!(store.len(), 4);
        assert_eq!(store.universe().len(), 3);
        let bread = store.universe().id_of("bread").unwrap();
        assert!(store.transactions()[2].contains(bread));
    }

    #[test]
    fn transactions_are_sorted_sets() {
        let t = Transaction::new(vec![ItemId(3), ItemId(1), ItemId(3), ItemId(2)]);
        assert_eq!(t.items(), &[ItemId(1), ItemId(2), ItemId(3)]);
    }

    #[test]
    fn with_universe_rejects_unknown_items() {
        let universe = ItemUniverse::from_labels(["a", "b"]);
        let err = TransactionStore::with_universe(universe, vec![vec!["a", "c"]]).unwrap_err();
        assert!(matches!(err, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn with_universe_keeps_unused_items() {
        let universe = ItemUniverse::from_labels(["a", "b", "c"]);
        let store = TransactionStore::with_universe(universe, vec![vec!["a"]]).unwrap();
        assert_eq!(store.universe().len(), 3);
        assert!((store.density() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn density_of_empty_store_is_zero() {
        assert_eq!(TransactionStore::default().density(), 0.0);
    }

    #[test]
    fn sample_is_deterministic() {
        let baskets: Vec<Vec<String>> = (0..200).map(|i| vec![format!("i{}", i % 7)]).collect();
        let store = TransactionStore::from_baskets(baskets);

        let a = store.sample(0.3, 42).unwrap();
        let b = store.sample(0.3, 42).unwrap();
        assert_eq!(a.transactions(), b.transactions());
        assert_eq!(a.len(), 60);
        assert_ne!(a.transactions(), store.sample(0.3, 43).unwrap().transactions());
        assert_eq!(store.sample(1.0, 42).unwrap().len(), 200);
        assert!(store.sample(0.0, 42).is_err());
    }

    #[test]
    fn sample_size_is_rounded_fraction() {
        let baskets: Vec<Vec<String>> = (0..7).map(|i| vec![format!("i{i}")]).collect();
        let store = TransactionStore::from_baskets(baskets);
        assert_eq!(store.sample(0.5, 1).unwrap().len(), 4);
        assert_eq!(store.sample(0.1, 1).unwrap().len(), 1);
        assert_eq!(store.sample(0.01, 1).unwrap().len(), 0);

        // Kept transactions stay in store order.
        let half = store.sample(0.5, 1).unwrap();
        let labels: Vec<String> = half
            .transactions()
            .iter()
            .map(|t| half.universe().labels_of(t.items()).remove(0))
            .collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }
}
