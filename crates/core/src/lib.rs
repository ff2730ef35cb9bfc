pub mod config;
pub mod error;
pub mod item;
pub mod itemset;
pub mod rule;
pub mod transaction;

pub use config::{MetricThreshold, MiningConfig, ResourceLimits, RuleConfig};
pub use error::*;
pub use item::{ItemId, ItemUniverse};
pub use itemset::{canonical_cmp, min_count_for, FrequentItemset, FrequentItemsets, ItemsetRow};
pub use rule::{Rule, RuleMetric, RuleRow};
pub use transaction::{Transaction, TransactionStore};
