//! The hierarchy engine: the store-backed entry point used by the HTTP layer and the CLI.
//!
//! The engine owns its [`GraphStore`] handle; nothing is process-global. Every write opens one
//! transaction, runs the matching [`HierarchyMutator`] operation and commits, so the
//! fetch-check-persist sequence is atomic with respect to the store. Committed changes are
//! forwarded to an optional event channel.

use std::collections::BTreeSet;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    config::HierarchyConfig,
    error::HierarchyError,
    event::HierarchyEvent,
    forest::{
        annotate_flat, annotate_forest, build_forest, filter_forest, sort_forest, AnnotatedNode,
        Associations, SiblingOrder, TreeNode,
    },
    mutator::HierarchyMutator,
    properties::{EdgeId, Node, NodeId, Partition, RelationKind},
    store::{GraphStore, GraphTxn},
};

pub struct HierarchyEngine<S> {
    store: S,
    order: SiblingOrder,
    events: Option<UnboundedSender<HierarchyEvent>>,
}

impl<S: GraphStore> HierarchyEngine<S> {
    pub fn new(store: S) -> Self {
        HierarchyEngine {
            store,
            order: SiblingOrder::default(),
            events: None,
        }
    }

    pub fn with_config(store: S, config: &HierarchyConfig) -> Self {
        Self::new(store).with_sibling_order(config.sibling_order)
    }

    pub fn with_sibling_order(mut self, order: SiblingOrder) -> Self {
        self.order = order;
        self
    }

    /// Committed [`HierarchyEvent`]s are sent to `tx` after each successful write.
    pub fn with_events(mut self, tx: UnboundedSender<HierarchyEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn add_edge(
        &self,
        partition: Partition,
        parent: NodeId,
        child: NodeId,
        relation_kind: Option<&str>,
    ) -> Result<EdgeId, HierarchyError> {
        // Reject malformed kinds before a transaction is even opened.
        RelationKind::validate(partition, relation_kind)?;
        let mut mutator = HierarchyMutator::new(self.store.begin().await?);
        let id = mutator
            .add_edge(partition, parent, child, relation_kind)
            .await?;
        self.finish(mutator).await?;
        Ok(id)
    }

    pub async fn update_edge(
        &self,
        partition: Partition,
        child: NodeId,
        new_parent: NodeId,
        relation_kind: Option<&str>,
    ) -> Result<(), HierarchyError> {
        RelationKind::validate(partition, relation_kind)?;
        let mut mutator = HierarchyMutator::new(self.store.begin().await?);
        mutator
            .update_edge(partition, child, new_parent, relation_kind)
            .await?;
        self.finish(mutator).await
    }

    pub async fn delete_edge(
        &self,
        partition: Partition,
        child: NodeId,
    ) -> Result<(), HierarchyError> {
        let mut mutator = HierarchyMutator::new(self.store.begin().await?);
        mutator.delete_edge(partition, child).await?;
        self.finish(mutator).await
    }

    pub async fn detach_node(
        &self,
        partition: Partition,
        node: NodeId,
    ) -> Result<usize, HierarchyError> {
        let mut mutator = HierarchyMutator::new(self.store.begin().await?);
        let removed = mutator.detach_node(partition, node).await?;
        self.finish(mutator).await?;
        Ok(removed)
    }

    async fn finish(&self, mutator: HierarchyMutator<S::Txn>) -> Result<(), HierarchyError> {
        let events = mutator.commit().await?;
        if let Some(tx) = self.events.as_ref() {
            for event in events {
                if let Err(e) = tx.send(event) {
                    tracing::warn!("Hierarchy event receiver closed, dropping {}", e.0);
                    break;
                }
            }
        }
        Ok(())
    }

    /// The full forest of `partition`, siblings normalised per the configured order.
    #[tracing::instrument(skip(self))]
    pub async fn forest(&self, partition: Partition) -> Result<Vec<TreeNode>, HierarchyError> {
        let mut txn = self.store.begin().await?;
        let (nodes, edges) = txn.snapshot(partition).await?;
        drop(txn);
        let mut forest = build_forest(&nodes, &edges);
        sort_forest(&mut forest, self.order);
        tracing::debug!(
            "Built {partition} forest: {} nodes, {} edges, {} roots",
            nodes.len(),
            edges.len(),
            forest.len()
        );
        Ok(forest)
    }

    /// The forest of `partition` pruned to `keep` and the ancestors connecting it to a root.
    pub async fn filtered_forest(
        &self,
        partition: Partition,
        keep: &BTreeSet<NodeId>,
    ) -> Result<Vec<TreeNode>, HierarchyError> {
        Ok(filter_forest(self.forest(partition).await?, keep))
    }

    /// The tag forest with every tag carrying the notes tagged with it.
    #[tracing::instrument(skip(self))]
    pub async fn tag_tree(&self) -> Result<Vec<AnnotatedNode<Node>>, HierarchyError> {
        let mut txn = self.store.begin().await?;
        let (tags, edges) = txn.snapshot(Partition::Tags).await?;
        let tagged: Associations<Node> = txn.list_tagged_notes().await?.into_iter().collect();
        drop(txn);
        let mut forest = build_forest(&tags, &edges);
        sort_forest(&mut forest, self.order);
        Ok(annotate_forest(forest, &tagged))
    }

    /// Every tag with its notes, tags by name and notes by title.
    pub async fn tags_with_notes(&self) -> Result<Vec<AnnotatedNode<Node>>, HierarchyError> {
        let mut txn = self.store.begin().await?;
        let tags = txn.list_nodes(Partition::Tags).await?;
        let mut associations: Associations<Node> =
            txn.list_tagged_notes().await?.into_iter().collect();
        drop(txn);
        associations.sort_each_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
        Ok(annotate_flat(&tags, &associations))
    }
}
