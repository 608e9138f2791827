//! Cross-partition annotations, e.g. which notes carry a tag, attached to tree nodes for read
//! views. Annotations never influence the shape of the forest.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

use super::builder::TreeNode;
use crate::properties::{Node, NodeId, RelationKind};

/// Annotations grouped by the node they belong to, each list in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Associations<T> {
    by_node: BTreeMap<NodeId, Vec<T>>,
}

impl<T> Default for Associations<T> {
    fn default() -> Self {
        Associations {
            by_node: BTreeMap::new(),
        }
    }
}

impl<T> Associations<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, value: T) {
        self.by_node.entry(node).or_default().push(value);
    }

    pub fn get(&self, node: NodeId) -> &[T] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of nodes carrying at least one annotation.
    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    pub fn sort_each_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        for values in self.by_node.values_mut() {
            values.sort_by(&mut compare);
        }
    }
}

impl<T> FromIterator<(NodeId, T)> for Associations<T> {
    fn from_iter<I: IntoIterator<Item = (NodeId, T)>>(iter: I) -> Self {
        let mut associations = Associations::new();
        for (node, value) in iter {
            associations.insert(node, value);
        }
        associations
    }
}

/// A tree node with its annotations attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AnnotatedNode<T> {
    pub id: NodeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_kind: Option<RelationKind>,
    #[serde(default)]
    pub annotations: Vec<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AnnotatedNode<T>>,
}

pub fn annotate_forest<T: Clone>(
    forest: Vec<TreeNode>,
    associations: &Associations<T>,
) -> Vec<AnnotatedNode<T>> {
    forest
        .into_iter()
        .map(|tree| AnnotatedNode {
            annotations: associations.get(tree.id).to_vec(),
            id: tree.id,
            label: tree.label,
            relation_kind: tree.relation_kind,
            children: annotate_forest(tree.children, associations),
        })
        .collect()
}

/// Flat view of every node with its annotations, ordered by label then id.
pub fn annotate_flat<T: Clone>(
    nodes: &[Node],
    associations: &Associations<T>,
) -> Vec<AnnotatedNode<T>> {
    let mut sorted = nodes.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
    sorted
        .into_iter()
        .map(|node| AnnotatedNode {
            id: node.id,
            label: node.label.clone(),
            relation_kind: None,
            annotations: associations.get(node.id).to_vec(),
            children: Vec::new(),
        })
        .collect()
}
