use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{MiningError, Result};

/// Dense item identifier. Ids are handed out in canonical label order, so
/// comparing two `ItemId`s compares their labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed universe of item labels known at mining time.
///
/// The canonical total order over items is byte-wise lexicographic order of
/// their labels. It is fixed when the universe is built and every output
/// ordering (itemsets, rules, header-table tie breaks) derives from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUniverse {
    labels: IndexSet<String>,
}

impl ItemUniverse {
    /// Build a universe from any collection of labels. Duplicates collapse.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self {
            labels: sorted.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn id_of(&self, label: &str) -> Option<ItemId> {
        self.labels.get_index_of(label).map(|i| ItemId(i as u32))
    }

    /// Look up a label, failing with `InvalidParameter` when it is not part of the universe.
    pub fn require(&self, label: &str) -> Result<ItemId> {
        self.id_of(label).ok_or_else(|| {
            MiningError::InvalidParameter(format!("item '{label}' is not in the item universe"))
        })
    }

    pub fn label(&self, id: ItemId) -> Option<&str> {
        self.labels.get_index(id.index()).map(String::as_str)
    }

    /// Labels for a slice of ids, in the order given. Unknown ids render as `#n`.
    pub fn labels_of(&self, ids: &[ItemId]) -> Vec<String> {
        ids.iter()
            .map(|&id| match self.label(id) {
                Some(label) => label.to_owned(),
                None => id.to_string(),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| (ItemId(i as u32), label.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_label_order() {
        let universe = ItemUniverse::from_labels(["milk", "bread", "butter", "bread"]);
        assert_eq!(universe.len(), 3);
        assert_eq!(universe.id_of("bread"), Some(ItemId(0)));
        assert_eq!(universe.id_of("butter"), Some(ItemId(1)));
        assert_eq!(universe.id_of("milk"), Some(ItemId(2)));
        assert!(universe.id_of("eggs").is_none());
    }

    #[test]
    fn labels_round_trip_through_ids() {
        let universe = ItemUniverse::from_labels(["b", "a"]);
        let ids = vec![ItemId(1), ItemId(0), ItemId(7)];
        assert_eq!(universe.labels_of(&ids), vec!["b", "a", "#7"]);
    }

    #[test]
    fn require_rejects_unknown_label() {
        let universe = ItemUniverse::from_labels(["a"]);
        assert!(matches!(
            universe.require("z"),
            Err(MiningError::InvalidParameter(_))
        ));
    }
}
