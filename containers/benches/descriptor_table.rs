//! Benchmarks for the bindless descriptor table allocator
//!
//! Covers bulk allocation (including growth from an empty table), deduplicated lookups and
//! release/reallocate churn across a few table sizes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use keel_containers::prelude::{BindingTable, DescriptorContent, DescriptorIndex, DescriptorTableAllocator};
use std::hint::black_box;

#[derive(Clone, Default)]
struct Binding(Option<u64>);

impl DescriptorContent for Binding {
    type Key = Option<u64>;

    fn key(&self) -> Self::Key {
        self.0
    }
}

#[derive(Default)]
struct NullTable {
    capacity: u32,
}

impl BindingTable<Binding> for NullTable {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn resize(&mut self, capacity: u32) {
        self.capacity = capacity;
    }

    fn write(&mut self, index: DescriptorIndex, content: &Binding) {
        black_box((index, content.0));
    }
}

fn benchmark_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor_create");
    for size in [100u64, 1000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("from_empty", size), size, |b, &size| {
            b.iter(|| {
                let mut table = DescriptorTableAllocator::new(NullTable::default());
                for i in 0..size {
                    black_box(table.create_descriptor(Binding(Some(i))));
                }
                black_box(table)
            });
        });

        group.bench_with_input(BenchmarkId::new("dedup_hit", size), size, |b, &size| {
            let mut table = DescriptorTableAllocator::new(NullTable::default());
            for i in 0..size {
                table.create_descriptor(Binding(Some(i)));
            }
            b.iter(|| {
                for i in 0..size {
                    black_box(table.create_descriptor(Binding(Some(black_box(i)))));
                }
            });
        });
    }
    group.finish();
}

fn benchmark_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor_churn");
    for size in [100u64, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("release_reallocate", size), size, |b, &size| {
            let mut table = DescriptorTableAllocator::new(NullTable::default());
            let indices: Vec<_> = (0..size)
                .map(|i| table.create_descriptor(Binding(Some(i))))
                .collect();
            let mut next = size;
            b.iter(|| {
                // free every other slot then refill them
                for index in indices.iter().step_by(2) {
                    if table.is_allocated(*index) {
                        table.release_descriptor(*index).unwrap();
                    }
                }
                for _ in indices.iter().step_by(2) {
                    black_box(table.create_descriptor(Binding(Some(next))));
                    next += 1;
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_create, benchmark_churn);
criterion_main!(benches);
