//! The graph store seam: the durable home of nodes and hierarchy edges.
//!
//! The store holds no hierarchy logic. [`GraphStore::begin`] opens one atomic boundary and every
//! read-check-write sequence of the mutator runs on the returned [`GraphTxn`]; without that
//! boundary two concurrent re-parents could jointly close a cycle neither check could see.
//!
//! [`MemoryStore`] is the in-process implementation; the SQLite one lives in `db` behind the
//! `service` feature.

use std::{future::Future, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::HierarchyError,
    properties::{Edge, EdgeId, Node, NodeId, Partition},
};

pub trait GraphStore: Sync {
    type Txn: GraphTxn;

    fn begin(&self) -> impl Future<Output = Result<Self::Txn, HierarchyError>> + Send;
}

/// One open transaction against a graph store. Dropping it without [`GraphTxn::commit`] discards
/// every staged write.
pub trait GraphTxn: Send {
    /// Nodes of `partition` in the store's natural (insertion) order.
    fn list_nodes(
        &mut self,
        partition: Partition,
    ) -> impl Future<Output = Result<Vec<Node>, HierarchyError>> + Send;

    fn list_edges(
        &mut self,
        partition: Partition,
    ) -> impl Future<Output = Result<Vec<Edge>, HierarchyError>> + Send;

    /// `(tag id, note)` pairs for every note carrying a tag.
    fn list_tagged_notes(
        &mut self,
    ) -> impl Future<Output = Result<Vec<(NodeId, Node)>, HierarchyError>> + Send;

    fn insert_edge(
        &mut self,
        partition: Partition,
        edge: Edge,
    ) -> impl Future<Output = Result<EdgeId, HierarchyError>> + Send;

    /// Replaces the entry keyed by `edge.child`. Returns `false` if there was none.
    fn replace_edge(
        &mut self,
        partition: Partition,
        edge: Edge,
    ) -> impl Future<Output = Result<bool, HierarchyError>> + Send;

    /// Removes the entry keyed by `child`. Returns `false` if there was none.
    fn delete_edge(
        &mut self,
        partition: Partition,
        child: NodeId,
    ) -> impl Future<Output = Result<bool, HierarchyError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), HierarchyError>> + Send
    where
        Self: Sized;

    /// Nodes and edges of `partition` read inside this transaction.
    fn snapshot(
        &mut self,
        partition: Partition,
    ) -> impl Future<Output = Result<(Vec<Node>, Vec<Edge>), HierarchyError>> + Send
    where
        Self: Sized,
    {
        async move {
            let nodes = self.list_nodes(partition).await?;
            let edges = self.list_edges(partition).await?;
            Ok((nodes, edges))
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PartitionState {
    nodes: Vec<Node>,
    edges: Vec<(EdgeId, Edge)>,
    next_node_id: i64,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    notes: PartitionState,
    tags: PartitionState,
    /// (note, tag)
    note_tags: Vec<(NodeId, NodeId)>,
    next_edge_id: i64,
}

impl StoreState {
    fn partition(&self, partition: Partition) -> &PartitionState {
        match partition {
            Partition::Notes => &self.notes,
            Partition::Tags => &self.tags,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut PartitionState {
        match partition {
            Partition::Notes => &mut self.notes,
            Partition::Tags => &mut self.tags,
        }
    }
}

/// In-memory graph store. Transactions are serialised on one async mutex. The first write of a
/// transaction stages a copy of the state, so a commit is all-or-nothing and reads copy nothing.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Arc<Mutex<StoreState>>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a note or tag, standing in for the external node CRUD.
    pub async fn insert_node(&self, partition: Partition, label: &str) -> NodeId {
        let mut state = self.0.lock().await;
        let part = state.partition_mut(partition);
        part.next_node_id += 1;
        let id = NodeId(part.next_node_id);
        part.nodes.push(Node::new(id, label));
        id
    }

    /// Removes the node record only. Hierarchy entries naming it are left for the caller to
    /// detach; any left behind become dangling edges.
    pub async fn remove_node(&self, partition: Partition, id: NodeId) -> bool {
        let mut state = self.0.lock().await;
        let part = state.partition_mut(partition);
        let before = part.nodes.len();
        part.nodes.retain(|node| node.id != id);
        let removed = part.nodes.len() != before;
        if removed {
            state.note_tags.retain(|(note, tag)| match partition {
                Partition::Notes => *note != id,
                Partition::Tags => *tag != id,
            });
        }
        removed
    }

    pub async fn tag_note(&self, note: NodeId, tag: NodeId) {
        let mut state = self.0.lock().await;
        if !state.note_tags.contains(&(note, tag)) {
            state.note_tags.push((note, tag));
        }
    }

    /// Loads nodes and edges verbatim, without any hierarchy validation. Node ids are taken as
    /// given. Intended for importing existing data and for reproducing inconsistent state.
    pub async fn load_unchecked(&self, partition: Partition, nodes: Vec<Node>, edges: Vec<Edge>) {
        let mut state = self.0.lock().await;
        let mut next_edge_id = state.next_edge_id;
        let part = state.partition_mut(partition);
        part.next_node_id = nodes
            .iter()
            .map(|node| node.id.0)
            .chain(std::iter::once(part.next_node_id))
            .max()
            .unwrap_or_default();
        part.nodes.extend(nodes);
        for edge in edges {
            next_edge_id += 1;
            part.edges.push((EdgeId(next_edge_id), edge));
        }
        state.next_edge_id = next_edge_id;
    }

    /// Committed edges of `partition`, outside any transaction.
    pub async fn edges(&self, partition: Partition) -> Vec<Edge> {
        let state = self.0.lock().await;
        state
            .partition(partition)
            .edges
            .iter()
            .map(|(_, edge)| *edge)
            .collect()
    }
}

impl GraphStore for MemoryStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, HierarchyError> {
        let guard = self.0.clone().lock_owned().await;
        Ok(MemoryTxn {
            guard,
            staged: None,
        })
    }
}

pub struct MemoryTxn {
    guard: OwnedMutexGuard<StoreState>,
    /// `None` until the first write.
    staged: Option<StoreState>,
}

impl MemoryTxn {
    fn state(&self) -> &StoreState {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> &mut StoreState {
        let guard = &self.guard;
        self.staged.get_or_insert_with(|| StoreState::clone(guard))
    }
}

impl GraphTxn for MemoryTxn {
    async fn list_nodes(&mut self, partition: Partition) -> Result<Vec<Node>, HierarchyError> {
        Ok(self.state().partition(partition).nodes.clone())
    }

    async fn list_edges(&mut self, partition: Partition) -> Result<Vec<Edge>, HierarchyError> {
        Ok(self
            .state()
            .partition(partition)
            .edges
            .iter()
            .map(|(_, edge)| *edge)
            .collect())
    }

    async fn list_tagged_notes(&mut self) -> Result<Vec<(NodeId, Node)>, HierarchyError> {
        let state = self.state();
        let notes = &state.notes.nodes;
        Ok(state
            .note_tags
            .iter()
            .filter_map(|(note_id, tag_id)| {
                notes
                    .iter()
                    .find(|note| note.id == *note_id)
                    .map(|note| (*tag_id, note.clone()))
            })
            .collect())
    }

    async fn insert_edge(
        &mut self,
        partition: Partition,
        edge: Edge,
    ) -> Result<EdgeId, HierarchyError> {
        let part = self.state().partition(partition);
        if part.edges.iter().any(|(_, stored)| stored.child == edge.child) {
            return Err(HierarchyError::Store(format!(
                "UNIQUE constraint failed: {partition} hierarchy child {}",
                edge.child
            )));
        }
        let state = self.state_mut();
        state.next_edge_id += 1;
        let id = EdgeId(state.next_edge_id);
        state.partition_mut(partition).edges.push((id, edge));
        Ok(id)
    }

    async fn replace_edge(
        &mut self,
        partition: Partition,
        edge: Edge,
    ) -> Result<bool, HierarchyError> {
        let part = self.state_mut().partition_mut(partition);
        match part
            .edges
            .iter_mut()
            .find(|(_, stored)| stored.child == edge.child)
        {
            Some((_, stored)) => {
                *stored = edge;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_edge(
        &mut self,
        partition: Partition,
        child: NodeId,
    ) -> Result<bool, HierarchyError> {
        let part = self.state_mut().partition_mut(partition);
        let before = part.edges.len();
        part.edges.retain(|(_, stored)| stored.child != child);
        Ok(part.edges.len() != before)
    }

    async fn commit(self) -> Result<(), HierarchyError> {
        let MemoryTxn { mut guard, staged } = self;
        if let Some(staged) = staged {
            *guard = staged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test(tokio::test)]
    async fn test_uncommitted_writes_are_discarded() -> Result<(), HierarchyError> {
        let store = MemoryStore::new();
        let a = store.insert_node(Partition::Tags, "rust").await;
        let b = store.insert_node(Partition::Tags, "lang").await;

        {
            let mut txn = store.begin().await?;
            txn.insert_edge(Partition::Tags, Edge::new(b, a)).await?;
            assert_eq!(txn.list_edges(Partition::Tags).await?.len(), 1);
        }
        assert!(store.edges(Partition::Tags).await.is_empty());

        let mut txn = store.begin().await?;
        txn.insert_edge(Partition::Tags, Edge::new(b, a)).await?;
        txn.commit().await?;
        assert_eq!(store.edges(Partition::Tags).await, vec![Edge::new(b, a)]);
        Ok(())
    }

    #[test(tokio::test)]
    async fn test_reads_do_not_stage_a_copy() -> Result<(), HierarchyError> {
        let store = MemoryStore::new();
        let a = store.insert_node(Partition::Notes, "Inbox").await;
        let b = store.insert_node(Partition::Notes, "Draft").await;

        let mut txn = store.begin().await?;
        txn.snapshot(Partition::Notes).await?;
        txn.list_tagged_notes().await?;
        assert!(txn.staged.is_none());
        txn.commit().await?;

        let mut txn = store.begin().await?;
        txn.insert_edge(Partition::Notes, Edge::new(a, b)).await?;
        assert!(txn.staged.is_some());
        // Reads after the first write see the staged state.
        assert_eq!(txn.list_edges(Partition::Notes).await?, vec![Edge::new(a, b)]);
        txn.commit().await?;
        assert_eq!(store.edges(Partition::Notes).await, vec![Edge::new(a, b)]);
        Ok(())
    }

    #[test(tokio::test)]
    async fn test_partitions_are_independent() -> Result<(), HierarchyError> {
        let store = MemoryStore::new();
        let note = store.insert_node(Partition::Notes, "Journal").await;
        let tag = store.insert_node(Partition::Tags, "journal").await;
        // Ids are assigned per partition, like separate serial columns.
        assert_eq!(note, tag);

        let mut txn = store.begin().await?;
        assert_eq!(txn.list_nodes(Partition::Notes).await?.len(), 1);
        assert_eq!(txn.list_nodes(Partition::Tags).await?.len(), 1);
        assert!(txn.list_edges(Partition::Notes).await?.is_empty());
        Ok(())
    }

    #[test(tokio::test)]
    async fn test_store_rejects_second_row_for_child() -> Result<(), HierarchyError> {
        let store = MemoryStore::new();
        let mut txn = store.begin().await?;
        txn.insert_edge(Partition::Notes, Edge::new(NodeId(1), NodeId(2)))
            .await?;
        let err = txn
            .insert_edge(Partition::Notes, Edge::new(NodeId(3), NodeId(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::Store(_)));
        assert!(
            txn.replace_edge(Partition::Notes, Edge::new(NodeId(3), NodeId(2)))
                .await?
        );
        assert!(
            !txn.replace_edge(Partition::Notes, Edge::new(NodeId(3), NodeId(9)))
                .await?
        );
        assert!(txn.delete_edge(Partition::Notes, NodeId(2)).await?);
        assert!(!txn.delete_edge(Partition::Notes, NodeId(2)).await?);
        Ok(())
    }

    #[test(tokio::test)]
    async fn test_tagged_notes_follow_node_removal() -> Result<(), HierarchyError> {
        let store = MemoryStore::new();
        let note = store.insert_node(Partition::Notes, "Recipe").await;
        let tag = store.insert_node(Partition::Tags, "cooking").await;
        store.tag_note(note, tag).await;
        store.tag_note(note, tag).await;

        let mut txn = store.begin().await?;
        assert_eq!(
            txn.list_tagged_notes().await?,
            vec![(tag, Node::new(note, "Recipe"))]
        );
        drop(txn);

        assert!(store.remove_node(Partition::Notes, note).await);
        let mut txn = store.begin().await?;
        assert!(txn.list_tagged_notes().await?.is_empty());
        Ok(())
    }
}
