//! Performance benchmarks for hierarchy operations
//!
//! - Cycle checking a candidate edge against a large partition
//! - Forest building and filtering from flat node and edge lists
//! - A full engine round trip (validated write plus forest read) over the in-memory store
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use noteforest::{
    engine::HierarchyEngine,
    forest::{build_forest, filter_forest, would_create_cycle},
    properties::{Edge, Node, NodeId, Partition},
    store::MemoryStore,
};
use std::collections::BTreeSet;

/// `size` nodes arranged as a complete tree with fan-out 4, plus the edges connecting them.
fn wide_tree(size: i64) -> (Vec<Node>, Vec<Edge>) {
    let nodes = (1..=size)
        .map(|id| Node::new(NodeId(id), format!("Note {id}")))
        .collect();
    let edges = (2..=size)
        .map(|child| Edge::new(NodeId((child - 2) / 4 + 1), NodeId(child)))
        .collect();
    (nodes, edges)
}

fn bench_cycle_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("would_create_cycle");
    for size in [100i64, 1_000, 10_000] {
        let (_, edges) = wide_tree(size);
        let pairs = edges.iter().map(Edge::as_pair).collect::<Vec<_>>();
        // Root under its deepest descendant: the worst case, a full traversal.
        let candidate = (NodeId(size), NodeId(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &pairs, |b, pairs| {
            b.iter(|| would_create_cycle(black_box(pairs.iter().copied()), candidate))
        });
    }
    group.finish();
}

fn bench_build_and_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_forest");
    for size in [100i64, 1_000, 10_000] {
        let (nodes, edges) = wide_tree(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(nodes.clone(), edges.clone()),
            |b, (nodes, edges)| b.iter(|| build_forest(black_box(nodes), black_box(edges))),
        );

        let forest = build_forest(&nodes, &edges);
        let keep = (1..=size)
            .step_by(97)
            .map(NodeId)
            .collect::<BTreeSet<NodeId>>();
        group.bench_function(BenchmarkId::new("filtered", size), |b| {
            b.iter(|| filter_forest(black_box(forest.clone()), &keep))
        });
    }
    group.finish();
}

fn bench_engine_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (nodes, edges) = wide_tree(1_000);
    let store = MemoryStore::new();
    rt.block_on(store.load_unchecked(Partition::Notes, nodes, edges));
    let engine = HierarchyEngine::new(store);

    c.bench_function("engine_move_and_read", |b| {
        b.to_async(&rt).iter(|| async {
            engine
                .update_edge(Partition::Notes, NodeId(1_000), NodeId(2), None)
                .await
                .unwrap();
            let forest = engine.forest(Partition::Notes).await.unwrap();
            black_box(forest);
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(50);
    targets =
        bench_cycle_check,
        bench_build_and_filter,
        bench_engine_round_trip
}

criterion_main!(benches);
