use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::properties::{Edge, EdgeId, NodeId, Partition};

/// A committed change to one partition's edge set. Consumers use these to invalidate cached
/// tree views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HierarchyEvent {
    /// Partition, stored entry id, new edge
    EdgeAdded(Partition, EdgeId, Edge),
    /// Partition, previous parent, replacement edge
    EdgeUpdated(Partition, NodeId, Edge),
    /// Partition, removed edge
    EdgeRemoved(Partition, Edge),
}

impl HierarchyEvent {
    pub fn partition(&self) -> Partition {
        match self {
            HierarchyEvent::EdgeAdded(partition, _, _) => *partition,
            HierarchyEvent::EdgeUpdated(partition, _, _) => *partition,
            HierarchyEvent::EdgeRemoved(partition, _) => *partition,
        }
    }

    /// The child whose parent link changed.
    pub fn child(&self) -> NodeId {
        match self {
            HierarchyEvent::EdgeAdded(_, _, edge) => edge.child,
            HierarchyEvent::EdgeUpdated(_, _, edge) => edge.child,
            HierarchyEvent::EdgeRemoved(_, edge) => edge.child,
        }
    }
}

impl Display for HierarchyEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            HierarchyEvent::EdgeAdded(partition, id, edge) => {
                write!(f, "EdgeAdded({partition}#{id}: {edge})")
            }
            HierarchyEvent::EdgeUpdated(partition, old_parent, edge) => {
                write!(f, "EdgeUpdated({partition}: {edge}, was under {old_parent})")
            }
            HierarchyEvent::EdgeRemoved(partition, edge) => {
                write!(f, "EdgeRemoved({partition}: {edge})")
            }
        }
    }
}
