//! SQLite graph store tests: schema setup, transactional writes and the same hierarchy
//! behaviour the in-memory store shows.

#![cfg(feature = "service")]

use tempfile::tempdir;
use test_log::test;

use noteforest::{
    db::{db_init, DbConnection},
    engine::HierarchyEngine,
    properties::{Edge, Partition, RelationKind},
    store::{GraphStore, GraphTxn},
    HierarchyError,
};

mod common;

#[test(tokio::test)]
async fn test_db_init_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();
    let dir = tempdir()?;
    let db_path = dir.path().join("notes.db");

    let db = DbConnection(db_init(&db_path).await?);
    db.insert_node(Partition::Notes, "Inbox").await?;
    db.0.close().await;

    // Re-opening runs no migration twice and keeps the data.
    let db = DbConnection::open(&db_path).await?;
    assert_eq!(db.counts(Partition::Notes).await?, (1, 0));
    assert_eq!(db.counts(Partition::Tags).await?, (0, 0));
    Ok(())
}

#[test(tokio::test)]
async fn test_db_hierarchy_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();
    let dir = tempdir()?;
    let db = DbConnection::open(dir.path().join("notes.db")).await?;
    let one = db.insert_node(Partition::Notes, "One").await?;
    let two = db.insert_node(Partition::Notes, "Two").await?;
    let three = db.insert_node(Partition::Notes, "Three").await?;
    let engine = HierarchyEngine::new(db.clone());

    engine
        .add_edge(Partition::Notes, one, two, Some("page"))
        .await?;
    engine.add_edge(Partition::Notes, one, three, None).await?;

    // Re-parent 3 under 2, then try to close the loop.
    engine
        .update_edge(Partition::Notes, three, two, Some("block"))
        .await?;
    let err = engine
        .update_edge(Partition::Notes, one, three, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::CycleDetected { .. }));

    let forest = engine.forest(Partition::Notes).await?;
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].ids(), vec![one, two, three]);
    assert_eq!(
        forest[0].edges(),
        vec![
            Edge::new(one, two).with_kind(RelationKind::Page),
            Edge::new(two, three).with_kind(RelationKind::Block),
        ]
    );

    let err = engine
        .add_edge(Partition::Notes, one, three, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::DuplicateChild { .. }));

    engine.delete_edge(Partition::Notes, two).await?;
    let forest = engine.forest(Partition::Notes).await?;
    assert_eq!(forest.len(), 2);
    assert_eq!(db.counts(Partition::Notes).await?, (3, 1));
    Ok(())
}

#[test(tokio::test)]
async fn test_db_rollback_on_drop() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();
    let dir = tempdir()?;
    let db = DbConnection::open(dir.path().join("notes.db")).await?;
    let a = db.insert_node(Partition::Tags, "a").await?;
    let b = db.insert_node(Partition::Tags, "b").await?;

    {
        let mut txn = db.begin().await?;
        txn.insert_edge(Partition::Tags, Edge::new(a, b)).await?;
        assert_eq!(txn.list_edges(Partition::Tags).await?.len(), 1);
    }
    assert_eq!(db.counts(Partition::Tags).await?, (2, 0));

    // The UNIQUE child column backs single-parenthood even without the mutator.
    let mut txn = db.begin().await?;
    txn.insert_edge(Partition::Tags, Edge::new(a, b)).await?;
    let err = txn
        .insert_edge(Partition::Tags, Edge::new(b, b))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Store(_)));
    Ok(())
}

#[test(tokio::test)]
async fn test_db_tag_views() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();
    let dir = tempdir()?;
    let db = DbConnection::open(dir.path().join("notes.db")).await?;
    let note_b = db.insert_node(Partition::Notes, "Borrowing").await?;
    let note_a = db.insert_node(Partition::Notes, "Async").await?;
    let lang = db.insert_node(Partition::Tags, "lang").await?;
    let rust = db.insert_node(Partition::Tags, "rust").await?;
    db.tag_note(note_b, rust).await?;
    db.tag_note(note_a, rust).await?;
    db.tag_note(note_a, rust).await?;

    let engine = HierarchyEngine::new(db.clone());
    engine.add_edge(Partition::Tags, lang, rust, None).await?;

    let tree = engine.tag_tree().await?;
    assert_eq!(tree[0].id, lang);
    assert_eq!(tree[0].children[0].annotations.len(), 2);

    let flat = engine.tags_with_notes().await?;
    assert_eq!(flat[1].id, rust);
    assert_eq!(
        flat[1]
            .annotations
            .iter()
            .map(|note| note.label.as_str())
            .collect::<Vec<_>>(),
        vec!["Async", "Borrowing"]
    );

    assert!(db.remove_node(Partition::Notes, note_a).await?);
    assert_eq!(engine.tags_with_notes().await?[1].annotations.len(), 1);
    Ok(())
}
