//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use noteforest::{
    properties::{NodeId, Partition},
    store::MemoryStore,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Ids handed out by [`knowledge_base`].
#[allow(dead_code)]
pub struct Fixture {
    pub projects: NodeId,
    pub roadmap: NodeId,
    pub meeting: NodeId,
    pub journal: NodeId,
    pub lang: NodeId,
    pub rust: NodeId,
    pub go: NodeId,
}

/// A store with four notes and three tags, no hierarchy entries, and a few tagged notes:
/// "Roadmap" and "Meeting notes" carry `rust`, "Journal" carries `go`.
#[allow(dead_code)]
pub async fn knowledge_base() -> (MemoryStore, Fixture) {
    init_logging();
    let store = MemoryStore::new();
    let fixture = Fixture {
        projects: store.insert_node(Partition::Notes, "Projects").await,
        roadmap: store.insert_node(Partition::Notes, "Roadmap").await,
        meeting: store.insert_node(Partition::Notes, "Meeting notes").await,
        journal: store.insert_node(Partition::Notes, "Journal").await,
        lang: store.insert_node(Partition::Tags, "lang").await,
        rust: store.insert_node(Partition::Tags, "rust").await,
        go: store.insert_node(Partition::Tags, "go").await,
    };
    store.tag_note(fixture.roadmap, fixture.rust).await;
    store.tag_note(fixture.meeting, fixture.rust).await;
    store.tag_note(fixture.journal, fixture.go).await;
    (store, fixture)
}
