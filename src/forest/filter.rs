use std::collections::BTreeSet;

use super::builder::TreeNode;
use crate::properties::NodeId;

/// Prunes `forest` to the nodes in `keep` plus the ancestor chains connecting them to a root.
///
/// A kept node retains its filtered children, whether or not any survived. A node outside `keep`
/// survives only as a connective ancestor of something kept. The output does not distinguish the
/// two. Relative order and ancestry of surviving nodes are unchanged.
pub fn filter_forest(forest: Vec<TreeNode>, keep: &BTreeSet<NodeId>) -> Vec<TreeNode> {
    forest
        .into_iter()
        .filter_map(|tree| filter_tree(tree, keep))
        .collect()
}

fn filter_tree(mut tree: TreeNode, keep: &BTreeSet<NodeId>) -> Option<TreeNode> {
    tree.children = filter_forest(std::mem::take(&mut tree.children), keep);
    if keep.contains(&tree.id) || !tree.children.is_empty() {
        Some(tree)
    } else {
        None
    }
}
