//! Shared test utilities for hierarchy testing

use crate::{
    error::HierarchyError,
    properties::{Edge, EdgeId, Node, NodeId, Partition},
    store::{GraphStore, GraphTxn, MemoryStore},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn n(id: i64, label: &str) -> Node {
    Node::new(NodeId(id), label)
}

pub fn e(parent: i64, child: i64) -> Edge {
    Edge::new(NodeId(parent), NodeId(child))
}

/// Sorted `(parent, child)` pairs, for comparing edge sets regardless of storage order.
pub fn pairs(edges: &[Edge]) -> Vec<(i64, i64)> {
    let mut pairs = edges
        .iter()
        .map(|edge| (edge.parent.0, edge.child.0))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs
}

/// Store holding notes 1..=4 ("One".."Four") and the given note edges.
pub async fn note_store(edges: &[(i64, i64)]) -> MemoryStore {
    init_logging();
    let store = MemoryStore::new();
    store
        .load_unchecked(
            Partition::Notes,
            vec![n(1, "One"), n(2, "Two"), n(3, "Three"), n(4, "Four")],
            edges.iter().map(|(p, c)| e(*p, *c)).collect(),
        )
        .await;
    store
}

/// A transaction that fails every call, for asserting an operation never reached the store.
pub struct FailingTxn;

fn untouchable<T>() -> Result<T, HierarchyError> {
    Err(HierarchyError::Store("store must not be touched".to_string()))
}

impl GraphTxn for FailingTxn {
    async fn list_nodes(&mut self, _partition: Partition) -> Result<Vec<Node>, HierarchyError> {
        untouchable()
    }

    async fn list_edges(&mut self, _partition: Partition) -> Result<Vec<Edge>, HierarchyError> {
        untouchable()
    }

    async fn list_tagged_notes(&mut self) -> Result<Vec<(NodeId, Node)>, HierarchyError> {
        untouchable()
    }

    async fn insert_edge(
        &mut self,
        _partition: Partition,
        _edge: Edge,
    ) -> Result<EdgeId, HierarchyError> {
        untouchable()
    }

    async fn replace_edge(
        &mut self,
        _partition: Partition,
        _edge: Edge,
    ) -> Result<bool, HierarchyError> {
        untouchable()
    }

    async fn delete_edge(
        &mut self,
        _partition: Partition,
        _child: NodeId,
    ) -> Result<bool, HierarchyError> {
        untouchable()
    }

    async fn commit(self) -> Result<(), HierarchyError> {
        untouchable()
    }
}

pub struct FailingStore;

impl GraphStore for FailingStore {
    type Txn = FailingTxn;

    async fn begin(&self) -> Result<FailingTxn, HierarchyError> {
        untouchable()
    }
}
