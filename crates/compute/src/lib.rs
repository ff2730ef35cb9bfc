pub mod algorithms;
pub mod budget;
pub mod engine;
pub mod sweep;

pub use algorithms::apriori::apriori;
pub use algorithms::fpgrowth::fpgrowth;
pub use algorithms::rules::{association_rules, pair_cooccurrence, top_rules};
pub use budget::Budget;
pub use engine::{verify_anti_monotone, Algorithm, CrossCheck, MiningEngine, MiningReport, MiningSummary};
pub use sweep::{run_sweep, SweepPlan, SweepReport, SweepRow};
