#![allow(dead_code)]

use quince::HashSet;

// Run the test on different configurations of a `HashSet`.
pub fn with_set<T>(mut test: impl FnMut(&dyn Fn() -> HashSet<T>)) {
    // Default configuration.
    test(&(|| HashSet::new()));

    // A single bucket and a single stripe lock, to maximize chain
    // collisions and growth pressure.
    test(&(|| HashSet::builder().capacity(1).concurrency(1).build()));

    // A small table with more stripes than buckets would suggest,
    // to exercise stripe contention during growth.
    test(&(|| HashSet::builder().capacity(3).concurrency(16).build()));
}

// Hashes integers to themselves, for tests that pin values to buckets.
#[derive(Default)]
pub struct IdentityHasher(u64);

impl std::hash::Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _: &[u8]) {
        unimplemented!("identity hashing supports integers only")
    }

    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn write_usize(&mut self, i: usize) {
        self.0 = i as u64;
    }
}

// Prints a log message if `RUST_LOG=debug` is set.
#[macro_export]
macro_rules! debug {
    ($($x:tt)*) => {
        if std::env::var("RUST_LOG").as_deref() == Ok("debug") {
            println!($($x)*);
        }
    };
}

// Returns the number of threads to use for stress testing.
pub fn threads() -> usize {
    if cfg!(miri) {
        2
    } else {
        std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4)
            .next_power_of_two()
    }
}
