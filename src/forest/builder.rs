//! Forest reconstruction from the flat node and edge lists of one partition.

use serde::{Deserialize, Serialize};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt,
};

use crate::properties::{Edge, Node, NodeId, RelationKind};

/// Sibling normalisation applied after a forest is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingOrder {
    /// Order of the underlying node query.
    #[default]
    Insertion,
    /// Alphabetical by label, ties broken by id.
    Label,
}

/// Ephemeral tree view of a node. Rebuilt on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub label: String,
    /// Kind of the edge that attached this node to its parent. Always `None` on roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_kind: Option<RelationKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(node: &Node) -> Self {
        TreeNode {
            id: node.id,
            label: node.label.clone(),
            relation_kind: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Ids in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.id];
        for child in self.children.iter() {
            ids.extend(child.ids());
        }
        ids
    }

    pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// The parent/child relations this tree encodes, in pre-order.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for child in self.children.iter() {
            edges.push(Edge {
                parent: self.id,
                child: child.id,
                kind: child.relation_kind,
            });
            edges.extend(child.edges());
        }
        edges
    }

    fn write_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}- {} [{}]", "", self.label, self.id, indent = depth * 2)?;
        if let Some(kind) = self.relation_kind {
            write!(f, " ({kind})")?;
        }
        writeln!(f)?;
        for child in self.children.iter() {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Reorders roots and, recursively, every sibling list.
pub fn sort_forest(forest: &mut [TreeNode], order: SiblingOrder) {
    match order {
        SiblingOrder::Insertion => {}
        SiblingOrder::Label => {
            forest.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
            for tree in forest.iter_mut() {
                sort_forest(&mut tree.children, order);
            }
        }
    }
}

/// Rebuilds the forest of a partition, one [`TreeNode`] per root.
///
/// Roots and siblings follow the order of `nodes`. Edges whose parent or child has no node are
/// dropped, so a child under a missing parent stays a root. Inconsistent stored state never
/// fails the read: a second parent edge for the same child is ignored, and a node trapped in a
/// cycle of stored edges is promoted to a root.
pub fn build_forest(nodes: &[Node], edges: &[Edge]) -> Vec<TreeNode> {
    let mut index: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut unique: Vec<&Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match index.entry(node.id) {
            Entry::Vacant(entry) => {
                entry.insert(unique.len());
                unique.push(node);
            }
            Entry::Occupied(_) => {
                tracing::warn!("[build_forest] duplicate node {} ignored", node.id);
            }
        }
    }

    let mut parent_of: Vec<Option<(usize, Option<RelationKind>)>> = vec![None; unique.len()];
    for edge in edges {
        let Some(&child) = index.get(&edge.child) else {
            tracing::debug!("[build_forest] dropping edge {edge}: no node {}", edge.child);
            continue;
        };
        let Some(&parent) = index.get(&edge.parent) else {
            tracing::debug!("[build_forest] dropping edge {edge}: no node {}", edge.parent);
            continue;
        };
        if let Some((existing, _)) = parent_of[child] {
            tracing::warn!(
                "[build_forest] node {} already attached under {}; ignoring edge {edge}",
                edge.child,
                unique[existing].id
            );
            continue;
        }
        parent_of[child] = Some((parent, edge.kind));
    }

    break_stored_cycles(&mut parent_of, &unique);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); unique.len()];
    for (idx, link) in parent_of.iter().enumerate() {
        if let Some((parent, _)) = link {
            children[*parent].push(idx);
        }
    }

    (0..unique.len())
        .filter(|idx| parent_of[*idx].is_none())
        .map(|root| assemble(root, &unique, &parent_of, &children))
        .collect()
}

/// Walks every parent chain once. A chain that loops back onto itself is cut at its earliest
/// member in node order, which becomes a root.
fn break_stored_cycles(parent_of: &mut [Option<(usize, Option<RelationKind>)>], nodes: &[&Node]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const ROOTED: u8 = 2;

    let mut state = vec![UNSEEN; parent_of.len()];
    for start in 0..parent_of.len() {
        if state[start] == ROOTED {
            continue;
        }
        let mut path = Vec::new();
        let mut current = start;
        loop {
            if state[current] == ROOTED {
                break;
            }
            if state[current] == ON_PATH {
                let loop_start = path.iter().position(|idx| *idx == current).unwrap_or(0);
                let cut = path[loop_start..].iter().copied().min().unwrap_or(current);
                tracing::warn!(
                    "[build_forest] stored edges form a cycle through node {}; promoting it to a root",
                    nodes[cut].id
                );
                parent_of[cut] = None;
                break;
            }
            state[current] = ON_PATH;
            path.push(current);
            match parent_of[current] {
                Some((parent, _)) => current = parent,
                None => break,
            }
        }
        for idx in path {
            state[idx] = ROOTED;
        }
    }
}

fn assemble(
    idx: usize,
    nodes: &[&Node],
    parent_of: &[Option<(usize, Option<RelationKind>)>],
    children: &[Vec<usize>],
) -> TreeNode {
    TreeNode {
        relation_kind: parent_of[idx].and_then(|(_, kind)| kind),
        children: children[idx]
            .iter()
            .map(|child| assemble(*child, nodes, parent_of, children))
            .collect(),
        ..TreeNode::leaf(nodes[idx])
    }
}
