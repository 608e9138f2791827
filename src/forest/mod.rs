//! Forest module: pure hierarchy algorithms over in-memory node and edge lists.
//!
//! Nothing in here touches a store or blocks; every function takes a snapshot handed in by the
//! caller and returns a fresh value.
//!
//! # Module Organization
//!
//! - [`cycle`]: Cycle checking for candidate edges
//! - [`builder`]: Forest reconstruction from flat node and edge lists (`TreeNode`)
//! - [`filter`]: Pruning a forest down to interesting nodes plus their ancestor chains
//! - [`annotate`]: Attaching cross-partition annotations (notes per tag) onto tree nodes
//!
//! ```rust
//! use noteforest::forest::{build_forest, filter_forest, would_create_cycle};
//! use noteforest::properties::{Edge, Node, NodeId};
//! use std::collections::BTreeSet;
//!
//! let nodes = vec![Node::new(NodeId(1), "Inbox"), Node::new(NodeId(2), "Draft")];
//! let edges = vec![Edge::new(NodeId(1), NodeId(2))];
//!
//! assert!(would_create_cycle(edges.iter().map(Edge::as_pair), (NodeId(2), NodeId(1))));
//!
//! let forest = build_forest(&nodes, &edges);
//! let keep = BTreeSet::from([NodeId(2)]);
//! assert_eq!(filter_forest(forest, &keep)[0].children[0].id, NodeId(2));
//! ```

mod annotate;
mod builder;
mod cycle;
mod filter;


pub use annotate::{annotate_flat, annotate_forest, AnnotatedNode, Associations};
pub use builder::{build_forest, sort_forest, SiblingOrder, TreeNode};
pub use cycle::{find_back_edge, would_create_cycle, EdgeGraph};
pub use filter::filter_forest;
