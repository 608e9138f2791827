//! # noteforest
//!
//! A hierarchy engine for a personal knowledge base: notes and tags each form a forest, and this
//! crate keeps those forests well formed and renders them as trees.
//!
//! ## Overview
//!
//! Nodes (notes or tags) are created and deleted elsewhere; noteforest owns the parent→child
//! entries between them. Every node has at most one parent, the parent relation never loops, and
//! note entries may carry a relation kind (`page`, `block` or `subpage`). Reads rebuild a nested
//! forest from the flat node and edge lists on every call; nothing tree-shaped is persisted.
//!
//! ## Architecture
//!
//! - **[`forest`]**: Pure algorithms: cycle checking, forest building, filtering, annotation
//! - **[`mutator`]**: Validated edge writes inside one store transaction
//! - **[`store`]**: The [`store::GraphStore`] seam and the in-memory implementation
//! - **[`engine`]**: [`engine::HierarchyEngine`], the store-backed entry point for reads and writes
//! - **[`commands`]**: Serializable [`commands::Op`] requests dispatched by the engine
//! - **[`properties`]**: Node and edge identifiers, partitions and relation kinds
//! - **[`event`]**: Change notifications emitted after a commit
//! - **`db`**: SQLite-backed store (requires `service` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use noteforest::{engine::HierarchyEngine, properties::Partition, store::MemoryStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let inbox = store.insert_node(Partition::Notes, "Inbox").await;
//!     let draft = store.insert_node(Partition::Notes, "Draft").await;
//!
//!     let engine = HierarchyEngine::new(store);
//!     engine.add_edge(Partition::Notes, inbox, draft, Some("page")).await?;
//!
//!     // Closing the loop is refused.
//!     assert!(engine.add_edge(Partition::Notes, draft, inbox, None).await.is_err());
//!
//!     let forest = engine.forest(Partition::Notes).await?;
//!     assert_eq!(forest[0].children[0].id, draft);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **default**: Engine, forest algorithms and the in-memory store
//! - **service**: SQLite graph store (`sqlx`)
//! - **bin**: The `noteforest` command line tool

pub mod commands;
pub mod config;
#[cfg(feature = "service")]
pub mod db;
pub mod engine;
pub mod error;
pub mod event;
pub mod forest;
pub mod mutator;
pub mod properties;
pub mod store;
#[cfg(test)]
mod tests;

pub use error::*;
