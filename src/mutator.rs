//! The hierarchy mutator: validated edge writes inside one graph store transaction.
//!
//! Every operation validates its input, reads the partition's current edges, runs the cycle
//! check where a parent link changes, and only then issues exactly one write per affected edge.
//! A rejected operation leaves the transaction untouched.
//!
//! Adding an edge for a child that already has a parent is rejected with
//! [`HierarchyError::DuplicateChild`]; re-parenting goes through
//! [`HierarchyMutator::update_edge`].

use crate::{
    error::HierarchyError,
    event::HierarchyEvent,
    forest::would_create_cycle,
    properties::{Edge, EdgeId, NodeId, Partition, RelationKind},
    store::GraphTxn,
};

pub struct HierarchyMutator<T> {
    txn: T,
    events: Vec<HierarchyEvent>,
}

impl<T: GraphTxn> HierarchyMutator<T> {
    pub fn new(txn: T) -> Self {
        HierarchyMutator {
            txn,
            events: Vec::new(),
        }
    }

    pub fn txn_mut(&mut self) -> &mut T {
        &mut self.txn
    }

    /// Changes staged so far, in the order they were made.
    pub fn events(&self) -> &[HierarchyEvent] {
        &self.events
    }

    /// Inserts `parent -> child`. `relation_kind` is the raw value supplied by the caller.
    #[tracing::instrument(skip(self))]
    pub async fn add_edge(
        &mut self,
        partition: Partition,
        parent: NodeId,
        child: NodeId,
        relation_kind: Option<&str>,
    ) -> Result<EdgeId, HierarchyError> {
        let kind = RelationKind::validate(partition, relation_kind)?;
        let edges = self.txn.list_edges(partition).await?;

        if would_create_cycle(edges.iter().map(Edge::as_pair), (parent, child)) {
            return Err(HierarchyError::CycleDetected { parent, child });
        }
        if let Some(existing) = edges.iter().find(|edge| edge.child == child) {
            return Err(HierarchyError::DuplicateChild {
                child,
                parent: existing.parent,
            });
        }

        let edge = Edge {
            parent,
            child,
            kind,
        };
        let id = self.txn.insert_edge(partition, edge).await?;
        tracing::debug!("[add_edge] staged {partition} entry {id}: {edge}");
        self.events
            .push(HierarchyEvent::EdgeAdded(partition, id, edge));
        Ok(id)
    }

    /// Re-points the entry for `child` at `new_parent`. The stored kind becomes `relation_kind`.
    #[tracing::instrument(skip(self))]
    pub async fn update_edge(
        &mut self,
        partition: Partition,
        child: NodeId,
        new_parent: NodeId,
        relation_kind: Option<&str>,
    ) -> Result<(), HierarchyError> {
        let kind = RelationKind::validate(partition, relation_kind)?;
        let edges = self.txn.list_edges(partition).await?;

        let remaining = edges
            .iter()
            .filter(|edge| edge.child != child)
            .map(Edge::as_pair);
        if would_create_cycle(remaining, (new_parent, child)) {
            return Err(HierarchyError::CycleDetected {
                parent: new_parent,
                child,
            });
        }
        let Some(current) = edges.iter().find(|edge| edge.child == child).copied() else {
            return Err(HierarchyError::NotFound(child));
        };

        let edge = Edge {
            parent: new_parent,
            child,
            kind,
        };
        if !self.txn.replace_edge(partition, edge).await? {
            return Err(HierarchyError::NotFound(child));
        }
        tracing::debug!(
            "[update_edge] staged {partition} {edge} (was under {})",
            current.parent
        );
        self.events
            .push(HierarchyEvent::EdgeUpdated(partition, current.parent, edge));
        Ok(())
    }

    /// Removes the entry for `child`, which becomes a root. Its own children keep their edges.
    #[tracing::instrument(skip(self))]
    pub async fn delete_edge(
        &mut self,
        partition: Partition,
        child: NodeId,
    ) -> Result<Edge, HierarchyError> {
        let edges = self.txn.list_edges(partition).await?;
        let Some(current) = edges.iter().find(|edge| edge.child == child).copied() else {
            return Err(HierarchyError::NotFound(child));
        };
        if !self.txn.delete_edge(partition, child).await? {
            return Err(HierarchyError::NotFound(child));
        }
        tracing::debug!("[delete_edge] staged removal of {partition} {current}");
        self.events
            .push(HierarchyEvent::EdgeRemoved(partition, current));
        Ok(current)
    }

    /// Clears every entry naming `node`, as required before the node itself is deleted: its own
    /// parent edge and the edges to its direct children, which become roots. Returns the number
    /// of entries removed.
    #[tracing::instrument(skip(self))]
    pub async fn detach_node(
        &mut self,
        partition: Partition,
        node: NodeId,
    ) -> Result<usize, HierarchyError> {
        let edges = self.txn.list_edges(partition).await?;
        let mut removed = 0;
        for edge in edges
            .iter()
            .filter(|edge| edge.child == node || edge.parent == node)
        {
            if self.txn.delete_edge(partition, edge.child).await? {
                removed += 1;
                self.events
                    .push(HierarchyEvent::EdgeRemoved(partition, *edge));
            }
        }
        tracing::debug!("[detach_node] staged removal of {removed} {partition} entries for {node}");
        Ok(removed)
    }

    /// Commits the transaction and hands back the changes it made durable.
    pub async fn commit(self) -> Result<Vec<HierarchyEvent>, HierarchyError> {
        let HierarchyMutator { txn, events } = self;
        txn.commit().await?;
        if !events.is_empty() {
            tracing::info!("Committed {} hierarchy change(s)", events.len());
        }
        Ok(events)
    }
}
