//! Benchmark for the split-ordered hash set and map with epoch-based reclamation.
//!
//! Run with: cargo bench --package coral-crossbeam --bench hash_set_benchmark

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use mimalloc::MiMalloc;
use std::sync::Arc;
use std::thread;

use coral_core::data_structures::SplitOrderedConfig;
use coral_crossbeam::{LockFreeHashMap, LockFreeHashSet};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const OPS_PER_THREAD: usize = 10_000;

// ============================================================================
// Concurrent insert benchmark
// ============================================================================

fn hash_set_insert(set: Arc<LockFreeHashSet<usize>>, thread_count: usize, ops_per_thread: usize) {
    let handles: Vec<_> = (0..thread_count)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    set.insert(t * ops_per_thread + i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(set.len(), thread_count * ops_per_thread);
}

// ============================================================================
// Mixed operations benchmark (insert + contains + remove)
// ============================================================================

fn hash_set_mixed(thread_count: usize, ops_per_thread: usize) {
    let set: Arc<LockFreeHashSet<usize>> = Arc::new(LockFreeHashSet::new());

    for i in 0..(thread_count * ops_per_thread / 2) {
        set.insert(i);
    }

    let handles: Vec<_> = (0..thread_count)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                let base = t * ops_per_thread;
                for i in 0..ops_per_thread {
                    match i % 3 {
                        0 => {
                            set.insert(base + i + 1_000_000);
                        }
                        1 => {
                            black_box(set.contains(&(base / 2 + i)));
                        }
                        _ => {
                            set.remove(&(base / 2 + i));
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// High contention benchmark
// ============================================================================

fn hash_map_contention(thread_count: usize, ops_per_thread: usize) {
    let map: Arc<LockFreeHashMap<usize, String>> = Arc::new(LockFreeHashMap::new());
    let key_range = 100usize;

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = i % key_range;
                    if i % 2 == 0 {
                        map.insert(key, format!("value_{}", i));
                    } else {
                        map.remove(&key);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Criterion benchmark groups
// ============================================================================

fn concurrent_insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_set_concurrent_insert");

    for thread_count in [1, 2, 4, 8, 16] {
        group.bench_with_input(
            BenchmarkId::new("growing", thread_count),
            &thread_count,
            |b, &thread_count| {
                b.iter(|| hash_set_insert(Arc::new(LockFreeHashSet::new()), thread_count, OPS_PER_THREAD))
            },
        );

        // Presized: no sentinel recursion or resizing on the hot path.
        group.bench_with_input(
            BenchmarkId::new("presized", thread_count),
            &thread_count,
            |b, &thread_count| {
                b.iter(|| {
                    let config = SplitOrderedConfig::with_capacity(thread_count * OPS_PER_THREAD);
                    let set = LockFreeHashSet::with_config(config).unwrap();
                    hash_set_insert(Arc::new(set), thread_count, OPS_PER_THREAD)
                })
            },
        );
    }

    group.finish();
}

fn mixed_operations_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_set_mixed_operations");

    for thread_count in [1, 2, 4, 8, 16] {
        let bench_name = format!("split_ordered_hash_set_{:0>2}_10000", thread_count);
        group.bench_function(bench_name, |b| {
            b.iter(|| hash_set_mixed(black_box(thread_count), black_box(OPS_PER_THREAD)))
        });
    }

    group.finish();
}

fn contention_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_map_high_contention");

    for thread_count in [1, 2, 4, 8, 16] {
        let bench_name = format!("split_ordered_hash_map_{:0>2}_10000", thread_count);
        group.bench_function(bench_name, |b| {
            b.iter(|| hash_map_contention(black_box(thread_count), black_box(OPS_PER_THREAD)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    concurrent_insert_benchmark,
    mixed_operations_benchmark,
    contention_benchmark
);
criterion_main!(benches);
