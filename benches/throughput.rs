use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::sync::Mutex;
use std::thread;

const SIZE: usize = 10_000;

// A random key iterator.
#[derive(Clone, Copy)]
struct RandomKeys {
    state: usize,
}

impl RandomKeys {
    fn new() -> Self {
        RandomKeys { state: 0 }
    }
}

impl Iterator for RandomKeys {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        // Add 1 then multiply by some 32 bit prime.
        self.state = self.state.wrapping_add(1).wrapping_mul(3_787_392_781);
        Some(self.state)
    }
}

fn lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    group.bench_function("quince", |b| {
        let set = quince::HashSet::new();
        let set = set.pin();
        for i in RandomKeys::new().take(SIZE) {
            set.insert(i);
        }

        b.iter(|| {
            for i in RandomKeys::new().take(SIZE) {
                black_box(assert!(set.contains(&i)));
            }
        });
    });

    group.bench_function("mutex-std", |b| {
        let set = Mutex::new(std::collections::HashSet::new());
        for i in RandomKeys::new().take(SIZE) {
            set.lock().unwrap().insert(i);
        }

        b.iter(|| {
            for i in RandomKeys::new().take(SIZE) {
                black_box(assert!(set.lock().unwrap().contains(&i)));
            }
        });
    });

    group.finish();
}

fn insert_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_remove");

    group.bench_function("quince", |b| {
        let set = quince::HashSet::new();
        let set = set.pin();

        b.iter(|| {
            for i in RandomKeys::new().take(SIZE) {
                set.insert(i);
            }
            for i in RandomKeys::new().take(SIZE) {
                set.remove(&i);
            }
        });
    });

    group.bench_function("mutex-std", |b| {
        let set = Mutex::new(std::collections::HashSet::new());

        b.iter(|| {
            for i in RandomKeys::new().take(SIZE) {
                set.lock().unwrap().insert(i);
            }
            for i in RandomKeys::new().take(SIZE) {
                set.lock().unwrap().remove(&i);
            }
        });
    });

    group.finish();
}

fn concurrent_insert(c: &mut Criterion) {
    let threads = thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(4)
        .min(8);

    let mut group = c.benchmark_group("concurrent_insert");

    group.bench_function("quince", |b| {
        b.iter(|| {
            let set = quince::HashSet::new();
            thread::scope(|s| {
                for t in 0..threads {
                    let set = &set;
                    s.spawn(move || {
                        let guard = set.guard();
                        for i in RandomKeys::new().skip(t).take(SIZE / threads) {
                            set.insert(i, &guard);
                        }
                    });
                }
            });
            black_box(set);
        });
    });

    group.bench_function("mutex-std", |b| {
        b.iter(|| {
            let set = Mutex::new(std::collections::HashSet::new());
            thread::scope(|s| {
                for t in 0..threads {
                    let set = &set;
                    s.spawn(move || {
                        for i in RandomKeys::new().skip(t).take(SIZE / threads) {
                            set.lock().unwrap().insert(i);
                        }
                    });
                }
            });
            black_box(set);
        });
    });

    group.finish();
}

criterion_group!(benches, lookup, insert_remove, concurrent_insert);
criterion_main!(benches);
