use std::collections::HashMap;

use basket_core::{ItemId, Result};

use crate::budget::Budget;

/// Index of a node in an [`FpTree`] arena.
pub type NodeIdx = usize;

const ROOT: NodeIdx = 0;

/// One arena slot. Parent, children and node-link are arena indices, so the
/// arena alone owns every node and dropping it frees the whole tree.
#[derive(Debug, Clone)]
pub struct FpNode {
    /// `None` only for the root.
    pub item: Option<ItemId>,
    pub count: u64,
    pub parent: Option<NodeIdx>,
    pub children: Vec<(ItemId, NodeIdx)>,
    /// Next node carrying the same item.
    pub next: Option<NodeIdx>,
}

impl FpNode {
    fn root() -> Self {
        Self {
            item: None,
            count: 0,
            parent: None,
            children: Vec::new(),
            next: None,
        }
    }

    fn child(&self, item: ItemId) -> Option<NodeIdx> {
        self.children
            .iter()
            .find(|(child_item, _)| *child_item == item)
            .map(|&(_, idx)| idx)
    }
}

/// Header-table row: an item's total frequency in this tree and its node-link chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub item: ItemId,
    pub count: u64,
    pub head: Option<NodeIdx>,
    tail: Option<NodeIdx>,
}

/// Frequency-ordered prefix tree over weighted item paths.
#[derive(Debug, Clone)]
pub struct FpTree {
    nodes: Vec<FpNode>,
    /// Sorted by descending count, ties broken by canonical item order.
    header: Vec<HeaderEntry>,
    rank: HashMap<ItemId, usize>,
}

impl FpTree {
    /// Build a tree from weighted paths.
    ///
    /// Items whose weighted count falls below `min_count` are dropped. Every
    /// path is reordered by descending global count (canonical order breaks
    /// ties) before insertion, so identical item sets always share a branch.
    /// Transactions are paths of weight 1; conditional pattern bases carry
    /// the count of the node they were collected from.
    pub fn build<P: AsRef<[ItemId]>>(paths: &[(P, u64)], min_count: u64, budget: &Budget) -> Result<Self> {
        let mut counts: HashMap<ItemId, u64> = HashMap::new();
        for (path, weight) in paths {
            for &item in path.as_ref() {
                *counts.entry(item).or_insert(0) += weight;
            }
        }

        let mut header: Vec<HeaderEntry> = counts
            .into_iter()
            .filter(|&(_, count)| count >= min_count)
            .map(|(item, count)| HeaderEntry {
                item,
                count,
                head: None,
                tail: None,
            })
            .collect();
        header.sort_by(|a, b| b.count.cmp(&a.count).then(a.item.cmp(&b.item)));

        let rank = header
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.item, pos))
            .collect();

        let mut tree = Self {
            nodes: vec![FpNode::root()],
            header,
            rank,
        };

        let mut ordered: Vec<(usize, ItemId)> = Vec::new();
        for (path, weight) in paths {
            ordered.clear();
            ordered.extend(
                path.as_ref()
                    .iter()
                    .filter_map(|item| tree.rank.get(item).map(|&pos| (pos, *item))),
            );
            if ordered.is_empty() {
                continue;
            }
            ordered.sort_unstable();
            tree.insert(&ordered, *weight, budget)?;
        }

        Ok(tree)
    }

    fn insert(&mut self, ordered: &[(usize, ItemId)], weight: u64, budget: &Budget) -> Result<()> {
        let mut current = ROOT;
        for &(pos, item) in ordered {
            current = match self.nodes[current].child(item) {
                Some(existing) => {
                    self.nodes[existing].count += weight;
                    existing
                }
                None => {
                    let created = self.nodes.len();
                    self.nodes.push(FpNode {
                        item: Some(item),
                        count: weight,
                        parent: Some(current),
                        children: Vec::new(),
                        next: None,
                    });
                    self.nodes[current].children.push((item, created));
                    self.link(pos, created);
                    budget.check_tree_nodes(self.node_count())?;
                    created
                }
            };
        }
        Ok(())
    }

    /// Append a node to the node-link chain of the header entry at `pos`.
    fn link(&mut self, pos: usize, node: NodeIdx) {
        let entry = &mut self.header[pos];
        match entry.tail {
            Some(tail) => self.nodes[tail].next = Some(node),
            None => entry.head = Some(node),
        }
        entry.tail = Some(node);
    }

    /// True when no item survived the support filter.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Allocated nodes, excluding the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn node(&self, idx: NodeIdx) -> &FpNode {
        &self.nodes[idx]
    }

    pub fn header(&self) -> &[HeaderEntry] {
        &self.header
    }

    pub fn header_entry(&self, item: ItemId) -> Option<&HeaderEntry> {
        self.rank.get(&item).map(|&pos| &self.header[pos])
    }

    /// Nodes on the node-link chain of the header entry at `pos`, in insertion order.
    pub fn node_links(&self, pos: usize) -> NodeLinks<'_> {
        NodeLinks {
            tree: self,
            next: self.header[pos].head,
        }
    }

    /// Prefix paths (root-side first) leading to each occurrence of the
    /// header item at `pos`, weighted by that occurrence's count. Empty
    /// prefixes are skipped.
    pub fn conditional_pattern_base(&self, pos: usize) -> Vec<(Vec<ItemId>, u64)> {
        let mut base = Vec::new();
        for idx in self.node_links(pos) {
            let node = &self.nodes[idx];
            let mut path = Vec::new();
            let mut cursor = node.parent;
            while let Some(parent) = cursor {
                let parent_node = &self.nodes[parent];
                match parent_node.item {
                    Some(item) => path.push(item),
                    None => break,
                }
                cursor = parent_node.parent;
            }
            if !path.is_empty() {
                path.reverse();
                base.push((path, node.count));
            }
        }
        base
    }

    /// When the tree is a single chain, its `(item, count)` pairs from the root down.
    pub fn single_path(&self) -> Option<Vec<(ItemId, u64)>> {
        let mut path = Vec::new();
        let mut current = ROOT;
        loop {
            match self.nodes[current].children.as_slice() {
                [] => return Some(path),
                [(item, child)] => {
                    path.push((*item, self.nodes[*child].count));
                    current = *child;
                }
                _ => return None,
            }
        }
    }
}

/// Iterator over one item's node-link chain.
pub struct NodeLinks<'a> {
    tree: &'a FpTree,
    next: Option<NodeIdx>,
}

impl Iterator for NodeLinks<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        let current = self.next?;
        self.next = self.tree.nodes[current].next;
        Some(current)
    }
}
