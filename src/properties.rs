//! Node, edge and partition types shared by every hierarchy component.
//!
//! Relation kind is a property of the [`Edge`], never of the [`Node`]: the same note can be a
//! `page` under one parent today and a `block` under another tomorrow.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::error::HierarchyError;

/// Stable identifier assigned by the graph store when a note or tag is created.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        NodeId(id)
    }
}

impl FromStr for NodeId {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(NodeId)
            .map_err(|e| HierarchyError::Serialization(format!("Invalid node id '{s}': {e}")))
    }
}

/// Identity of a stored hierarchy entry.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EdgeId(pub i64);

impl Display for EdgeId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An independent acyclic graph domain. No edge ever crosses partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Notes,
    Tags,
}

impl Partition {
    pub fn all() -> &'static [Partition] {
        &[Partition::Notes, Partition::Tags]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Notes => "notes",
            Partition::Tags => "tags",
        }
    }

    /// Only note hierarchies classify their edges.
    pub fn carries_relation_kind(&self) -> bool {
        matches!(self, Partition::Notes)
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Partition {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notes" | "note" => Ok(Partition::Notes),
            "tags" | "tag" => Ok(Partition::Tags),
            other => Err(HierarchyError::Serialization(format!(
                "Unknown partition '{other}', expected 'notes' or 'tags'"
            ))),
        }
    }
}

/// How a child note is presented under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Page,
    Block,
    Subpage,
}

impl RelationKind {
    pub fn all() -> &'static [RelationKind] {
        &[RelationKind::Page, RelationKind::Block, RelationKind::Subpage]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Page => "page",
            RelationKind::Block => "block",
            RelationKind::Subpage => "subpage",
        }
    }

    /// Validate a raw, caller-supplied kind against the closed enumeration for `partition`.
    ///
    /// Absent kinds are always accepted. Tag hierarchies reject any supplied kind.
    pub fn validate(
        partition: Partition,
        raw: Option<&str>,
    ) -> Result<Option<RelationKind>, HierarchyError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        if !partition.carries_relation_kind() {
            return Err(HierarchyError::InvalidRelationKind(format!(
                "'{raw}' given for the {partition} hierarchy, which carries no relation kind"
            )));
        }
        raw.parse::<RelationKind>().map(Some)
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exact match only: the HTTP layer never normalises case.
        RelationKind::all()
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| {
                HierarchyError::InvalidRelationKind(format!(
                    "'{s}', must be 'page', 'block', or 'subpage'"
                ))
            })
    }
}

/// A note or tag as read from the graph store. The core never creates or destroys nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Note title or tag name.
    pub label: String,
}

impl Node {
    pub fn new<S: Into<String>>(id: NodeId, label: S) -> Self {
        Node {
            id,
            label: label.into(),
        }
    }
}

/// A parent/child hierarchy entry. Unique per `child`: a node has at most one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RelationKind>,
}

impl Edge {
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Edge {
            parent,
            child,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: RelationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn as_pair(&self) -> (NodeId, NodeId) {
        (self.parent, self.child)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} -[{}]-> {}", self.parent, kind, self.child),
            None => write!(f, "{} -> {}", self.parent, self.child),
        }
    }
}
