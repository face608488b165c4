//! Benchmarks for change propagation
//!
//! Measures the cost of one leaf mutation travelling up a nested tree,
//! the same mutations batched in a transaction, and element handle
//! lookups through the reference cache.
//!
//! Run with: cargo bench -p observable-core --bench propagation

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use observable_core::container::Vector;
use observable_core::observable::{Binder, Class, ClassModel, Member, Observe, Value};

#[derive(Clone, Default)]
struct Leaf {
    count: u64,
}

#[derive(Clone, Default)]
struct Branch {
    leaf: Leaf,
    items: Vec<u64>,
}

struct Count;
struct LeafTag;
struct Items;

struct BranchMembers {
    leaf: Class<Leaf>,
    items: Vector<u64>,
}

impl ClassModel for Leaf {
    type Members = Value<u64>;

    fn bind_members(b: &Binder<Self>) -> Value<u64> {
        b.field(|l| &l.count, |l| &mut l.count)
    }
}

impl Member<Count> for Leaf {
    type Adapter = Value<u64>;

    fn member(members: &Value<u64>) -> &Value<u64> {
        members
    }
}

impl Observe for Leaf {
    type Observer = Class<Leaf>;
}

impl ClassModel for Branch {
    type Members = BranchMembers;

    fn bind_members(b: &Binder<Self>) -> BranchMembers {
        BranchMembers {
            leaf: b.field(|m| &m.leaf, |m| &mut m.leaf),
            items: b.field(|m| &m.items, |m| &mut m.items),
        }
    }
}

impl Member<LeafTag> for Branch {
    type Adapter = Class<Leaf>;

    fn member(members: &BranchMembers) -> &Class<Leaf> {
        &members.leaf
    }
}

impl Member<Items> for Branch {
    type Adapter = Vector<u64>;

    fn member(members: &BranchMembers) -> &Vector<u64> {
        &members.items
    }
}

// =============================================================================
// Leaf to root
// =============================================================================

fn bench_leaf_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/leaf_set");

    for subscribers in [0usize, 1, 8] {
        let branch = Class::new(Branch::default());
        for _ in 0..subscribers {
            branch.on_change(|m| {
                black_box(m.leaf.count);
            });
            branch.get::<LeafTag>().on_change(|l| {
                black_box(l.count);
            });
        }

        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &branch,
            |b, branch| {
                let mut n = 0u64;
                b.iter(|| {
                    n += 1;
                    branch.get::<LeafTag>().set::<Count>(black_box(n));
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// Transaction batching
// =============================================================================

fn bench_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/transaction");

    for mutations in [1u64, 16, 256] {
        let branch = Class::new(Branch::default());
        branch.on_change(|m| {
            black_box(m.items.len());
        });

        group.bench_with_input(
            BenchmarkId::new("mutations", mutations),
            &mutations,
            |b, &mutations| {
                b.iter(|| {
                    if let Ok(tx) = branch.transaction() {
                        let leaf = tx.class().get::<LeafTag>();
                        for n in 0..mutations {
                            leaf.set::<Count>(n);
                        }
                    }
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// Element handles
// =============================================================================

fn bench_element_lookup(c: &mut Criterion) {
    let vector = Vector::new((0..1024u64).collect());
    let held: Vec<_> = (0..1024).filter_map(|i| vector.element(i)).collect();

    c.bench_function("propagation/element_hit", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % 1024;
            black_box(vector.element(i));
        })
    });

    c.bench_function("propagation/element_set", |b| {
        b.iter(|| held[black_box(512)].set(7));
    });
}

criterion_group!(benches, bench_leaf_set, bench_transaction, bench_element_lookup);
criterion_main!(benches);
