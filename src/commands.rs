use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use crate::{
    engine::HierarchyEngine,
    error::HierarchyError,
    forest::{AnnotatedNode, TreeNode},
    properties::{EdgeId, Node, NodeId, Partition},
    store::GraphStore,
};

/// Command interface between a transport (HTTP handlers, the CLI) and a [`HierarchyEngine`].
///
/// ```json
/// {"op": "add_edge", "partition": "notes", "parent_id": 1, "child_id": 2, "relation_kind": "page"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    AddEdge {
        partition: Partition,
        parent_id: NodeId,
        child_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation_kind: Option<String>,
    },
    /// Re-parent `child_id` under `parent_id`.
    UpdateEdge {
        partition: Partition,
        child_id: NodeId,
        parent_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation_kind: Option<String>,
    },
    DeleteEdge {
        partition: Partition,
        child_id: NodeId,
    },
    /// Clear every hierarchy entry naming `node_id`, ahead of deleting the node.
    DetachNode {
        partition: Partition,
        node_id: NodeId,
    },
    GetForest {
        partition: Partition,
    },
    GetFilteredForest {
        partition: Partition,
        #[serde(default)]
        keep: BTreeSet<NodeId>,
    },
    GetTagTree,
    GetTagsWithNotes,
}

impl Op {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Op::AddEdge { .. }
                | Op::UpdateEdge { .. }
                | Op::DeleteEdge { .. }
                | Op::DetachNode { .. }
        )
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Op::AddEdge {
                partition,
                parent_id,
                child_id,
                relation_kind,
            } => write!(
                f,
                "AddEdge({partition}: {parent_id} -> {child_id}, kind: {})",
                relation_kind.as_deref().unwrap_or("none")
            ),
            Op::UpdateEdge {
                partition,
                child_id,
                parent_id,
                relation_kind,
            } => write!(
                f,
                "UpdateEdge({partition}: {child_id} under {parent_id}, kind: {})",
                relation_kind.as_deref().unwrap_or("none")
            ),
            Op::DeleteEdge {
                partition,
                child_id,
            } => write!(f, "DeleteEdge({partition}: {child_id})"),
            Op::DetachNode { partition, node_id } => {
                write!(f, "DetachNode({partition}: {node_id})")
            }
            Op::GetForest { partition } => write!(f, "GetForest({partition})"),
            Op::GetFilteredForest { partition, keep } => write!(
                f,
                "GetFilteredForest({partition}, keep: {})",
                keep.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Op::GetTagTree => write!(f, "GetTagTree"),
            Op::GetTagsWithNotes => write!(f, "GetTagsWithNotes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpResult {
    Ok,
    EdgeCreated(EdgeId),
    Detached(usize),
    Forest(Vec<TreeNode>),
    Annotated(Vec<AnnotatedNode<Node>>),
}

impl Display for OpResult {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            OpResult::Ok => write!(f, "Ok"),
            OpResult::EdgeCreated(id) => write!(f, "EdgeCreated({id})"),
            OpResult::Detached(count) => write!(f, "Detached({count} entries)"),
            OpResult::Forest(forest) => write!(
                f,
                "Forest({} roots, {} nodes)",
                forest.len(),
                forest.iter().map(TreeNode::node_count).sum::<usize>()
            ),
            OpResult::Annotated(nodes) => write!(
                f,
                "Annotated({} nodes, {} annotations)",
                nodes.len(),
                nodes.iter().map(|n| n.annotations.len()).sum::<usize>()
            ),
        }
    }
}

impl<S: GraphStore> HierarchyEngine<S> {
    /// Runs one command against the engine.
    pub async fn execute(&self, op: Op) -> Result<OpResult, HierarchyError> {
        tracing::debug!("[execute] {op}");
        let result = match op {
            Op::AddEdge {
                partition,
                parent_id,
                child_id,
                relation_kind,
            } => OpResult::EdgeCreated(
                self.add_edge(partition, parent_id, child_id, relation_kind.as_deref())
                    .await?,
            ),
            Op::UpdateEdge {
                partition,
                child_id,
                parent_id,
                relation_kind,
            } => {
                self.update_edge(partition, child_id, parent_id, relation_kind.as_deref())
                    .await?;
                OpResult::Ok
            }
            Op::DeleteEdge {
                partition,
                child_id,
            } => {
                self.delete_edge(partition, child_id).await?;
                OpResult::Ok
            }
            Op::DetachNode { partition, node_id } => {
                OpResult::Detached(self.detach_node(partition, node_id).await?)
            }
            Op::GetForest { partition } => OpResult::Forest(self.forest(partition).await?),
            Op::GetFilteredForest { partition, keep } => {
                OpResult::Forest(self.filtered_forest(partition, &keep).await?)
            }
            Op::GetTagTree => OpResult::Annotated(self.tag_tree().await?),
            Op::GetTagsWithNotes => OpResult::Annotated(self.tags_with_notes().await?),
        };
        tracing::debug!("[execute] -> {result}");
        Ok(result)
    }
}
