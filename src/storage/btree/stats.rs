use serde::Serialize;

use super::node::BTreeNode;

/// Totals gathered by walking a decoded tree.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Records on all pages, separators included.
    pub records: u64,
    /// Pages of either kind.
    pub nodes: u64,
    /// Leaf pages.
    pub leaves: u64,
    /// Internal pages.
    pub internal: u64,
    /// Depth of the shallowest leaf (root is 0).
    pub min_leaf_depth: u32,
    /// Depth of the deepest leaf.
    pub max_leaf_depth: u32,
}

impl TreeStats {
    /// Walks `root` and collects totals.
    pub fn collect(root: &BTreeNode) -> Self {
        let mut stats = TreeStats {
            min_leaf_depth: u32::MAX,
            ..TreeStats::default()
        };
        stats.visit(root, 0);
        if stats.leaves == 0 {
            stats.min_leaf_depth = 0;
        }
        stats
    }

    fn visit(&mut self, node: &BTreeNode, depth: u32) {
        self.nodes += 1;
        match node {
            BTreeNode::Leaf { records } => {
                self.leaves += 1;
                self.records += records.len() as u64;
                self.min_leaf_depth = self.min_leaf_depth.min(depth);
                self.max_leaf_depth = self.max_leaf_depth.max(depth);
            }
            BTreeNode::Internal { entries, trailing } => {
                self.internal += 1;
                self.records += entries.len() as u64;
                for entry in entries {
                    self.visit(&entry.child.node, depth + 1);
                }
                self.visit(&trailing.node, depth + 1);
            }
        }
    }

    /// Whether every leaf sits at the same depth.
    pub fn is_balanced(&self) -> bool {
        self.min_leaf_depth == self.max_leaf_depth
    }
}
