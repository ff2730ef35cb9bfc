//! Frequent itemset mining over a compressed prefix tree, without candidate generation.

pub mod mining;
pub mod tree;

pub use mining::fpgrowth;
pub use tree::{FpNode, FpTree, HeaderEntry, NodeIdx};
