use crate::storage::record::Record;

use super::node::BTreeNode;

enum Step<'a> {
    Node(&'a BTreeNode),
    Record(&'a Record),
}

/// In-order iterator over every record of a decoded tree.
///
/// Each child subtree is yielded before the separator record that follows
/// it, and an internal page's trailing child comes last, so records appear
/// in the tree's key order (filename, then record type).
pub struct Records<'a> {
    stack: Vec<Step<'a>>,
}

impl<'a> Records<'a> {
    pub(crate) fn new(root: &'a BTreeNode) -> Self {
        Self {
            stack: vec![Step::Node(root)],
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Step::Record(record) => return Some(record),
                Step::Node(BTreeNode::Leaf { records }) => {
                    self.stack.extend(records.iter().rev().map(Step::Record));
                }
                Step::Node(BTreeNode::Internal { entries, trailing }) => {
                    self.stack.push(Step::Node(&trailing.node));
                    for entry in entries.iter().rev() {
                        self.stack.push(Step::Record(&entry.record));
                        self.stack.push(Step::Node(&entry.child.node));
                    }
                }
            }
        }
    }
}
