//! Benchmarks for the per-message hot paths of a ring node.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ringkv_core::{hash, Message, NodeDescriptor, RingCore, Topology};

fn build_ring(size: u16) -> Topology {
    let mut topology = Topology::new();
    for port in 0..size {
        topology
            .join_any(RingCore::new(NodeDescriptor::new("10.0.0.1", 9000 + port)))
            .expect("join");
    }
    topology
}

fn bench_hash(c: &mut Criterion) {
    c.bench_function("hash_key", |b| b.iter(|| hash(black_box(b"user:12345:profile"))));
}

fn bench_ownership(c: &mut Criterion) {
    let topology = build_ring(2);
    let node = topology.cores().next().expect("node").clone();
    c.bench_function("responsible_for_key", |b| {
        b.iter(|| node.responsible_for_key(black_box("user:12345:profile")))
    });
}

fn bench_join(c: &mut Criterion) {
    c.bench_function("join_16_nodes", |b| b.iter(|| build_ring(black_box(16))));
}

fn bench_election(c: &mut Criterion) {
    let mut topology = build_ring(16);
    let initiator = NodeDescriptor::new("10.0.0.1", 9003);
    c.bench_function("election_16_nodes", |b| {
        b.iter(|| {
            topology
                .deliver(Message::Election {
                    destination: initiator.clone(),
                    participants: Vec::new(),
                })
                .expect("election");
            topology.clear_log();
        })
    });
}

criterion_group!(benches, bench_hash, bench_ownership, bench_join, bench_election);
criterion_main!(benches);
