mod utils;

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::mem::{self, ManuallyDrop};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::Mutex;

use seize::{Collector, Guard};

use self::utils::CachePadded;

/// The number of buckets in a table that was not given an
/// explicit capacity.
pub const DEFAULT_CAPACITY: usize = 31;

/// The maximum number of buckets a generation may hold, bounded
/// by the maximum allocation size of `isize::MAX` bytes.
const MAX_BUCKETS: usize = isize::MAX as usize / mem::size_of::<usize>();

/// How sparse a table must be, relative to its bucket count, for an
/// exhausted growth budget to be treated as insert/remove churn and
/// absorbed by doubling the budget instead of reallocating.
///
/// The exact threshold is a heuristic, not a contract.
const SPARSE_FACTOR: usize = 4;

/// A lock-striped hash set with lock-free reads.
pub struct HashSet<T, S> {
    /// A pointer to the current table generation.
    table: AtomicPtr<Table<T>>,

    /// The stripe locks.
    ///
    /// Sized once at construction and shared by every generation.
    /// A bucket is permanently assigned to the lock at
    /// `bucket % locks.len()` for a generation's lifetime, so a
    /// collision chain is owned by exactly one lock, and only a
    /// thread holding that lock may write the bucket's head pointer
    /// or its stripe counter.
    locks: Box<[Mutex<()>]>,

    /// Collector for memory reclamation.
    collector: Collector,

    /// Hasher for elements.
    pub hasher: S,
}

// Safety: We only ever hand out `&T` through shared references to the
// set. Removal and `clear` can drop a `T` on a thread other than the
// one that inserted it, so sending or sharing the set requires `T: Send`.
unsafe impl<T: Send, S: Send> Send for HashSet<T, S> {}
unsafe impl<T: Send + Sync, S: Sync> Sync for HashSet<T, S> {}

/// A node in a bucket's collision chain.
struct Node<T> {
    /// The element stored in this node.
    value: T,

    /// The element's hash, cached at insertion time.
    hash: u64,

    /// The next node in the chain.
    ///
    /// Never written again once the node is reachable from a bucket;
    /// structural changes rebuild the prefix of the chain with fresh
    /// nodes instead. This is what makes concurrent chain traversal
    /// safe without per-node locking.
    next: *mut Node<T>,
}

impl<T> Node<T> {
    /// Reclaims an unlinked node along with its element.
    ///
    /// # Safety
    ///
    /// `node` must have been allocated with `Box` and unreachable
    /// from every bucket before it was retired.
    unsafe fn reclaim(node: *mut Node<T>, _collector: &Collector) {
        let _: Box<Node<T>> = unsafe { Box::from_raw(node) };
    }

    /// Reclaims a node whose element was moved into a replacement
    /// node, freeing the allocation without dropping the element.
    ///
    /// # Safety
    ///
    /// `node` must have been allocated with `Box`, and its element
    /// must have been moved out with `ptr::read` before retirement.
    unsafe fn reclaim_moved(node: *mut Node<T>, _collector: &Collector) {
        let _: Box<ManuallyDrop<Node<T>>> =
            unsafe { Box::from_raw(node.cast::<ManuallyDrop<Node<T>>>()) };
    }
}

/// A table generation.
///
/// A generation is immutable once published, except for bucket head
/// pointers and stripe counters, written under the owning stripe lock,
/// and the growth budget, written while every stripe lock is held.
/// Growth and `clear` replace the generation as a whole.
struct Table<T> {
    /// The bucket array. Each slot is the head of a collision chain.
    buckets: Box<[AtomicPtr<Node<T>>]>,

    /// Per-stripe element counts.
    counts: Box<[CachePadded<AtomicUsize>]>,

    /// The number of insertions a single stripe tolerates before the
    /// table is considered for growth.
    budget: AtomicUsize,
}

impl<T> Table<T> {
    fn new(len: usize, stripes: usize) -> Table<T> {
        debug_assert!(len >= stripes);

        Table {
            buckets: (0..len).map(|_| AtomicPtr::new(ptr::null_mut())).collect(),
            counts: (0..stripes).map(|_| CachePadded::default()).collect(),
            budget: AtomicUsize::new((len / stripes).max(1)),
        }
    }

    /// Returns the bucket for the given hash within this generation.
    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Returns the sum of the stripe counters.
    ///
    /// Exact when no mutations are in flight.
    #[inline]
    fn len(&self) -> usize {
        self.counts
            .iter()
            .map(|count| count.value.load(Ordering::Relaxed))
            .sum()
    }

    /// Reclaims a dead generation along with its chains and elements.
    ///
    /// # Safety
    ///
    /// The generation must be unreachable, with no nodes shared with
    /// any live generation.
    unsafe fn reclaim(table: *mut Table<T>, _collector: &Collector) {
        let table = unsafe { Box::from_raw(table) };

        for bucket in table.buckets.iter() {
            let mut node = bucket.load(Ordering::Relaxed);

            while !node.is_null() {
                // Safety: We have unique access to the dead generation,
                // and every node in it was allocated with `Box`.
                let boxed = unsafe { Box::from_raw(node) };
                node = boxed.next;
            }
        }
    }

    /// Reclaims a generation superseded by a resize.
    ///
    /// The elements were moved into the replacement generation's fresh
    /// nodes, so the chains are freed without dropping them.
    ///
    /// # Safety
    ///
    /// Every element in the generation must have been moved out with
    /// `ptr::read` before the generation was retired.
    unsafe fn reclaim_moved(table: *mut Table<T>, _collector: &Collector) {
        let table = unsafe { Box::from_raw(table) };

        for bucket in table.buckets.iter() {
            let mut node = bucket.load(Ordering::Relaxed);

            while !node.is_null() {
                // Safety: We have unique access to the dead generation.
                let next = unsafe { (*node).next };

                // Safety: The node was allocated with `Box` and its
                // element has already been moved out.
                let _: Box<ManuallyDrop<Node<T>>> =
                    unsafe { Box::from_raw(node.cast::<ManuallyDrop<Node<T>>>()) };

                node = next;
            }
        }
    }
}

impl<T, S> HashSet<T, S> {
    /// Creates a set with the given options.
    ///
    /// A capacity below the concurrency level is raised to match it.
    ///
    /// # Panics
    ///
    /// Panics if `concurrency` is zero.
    pub fn new(capacity: usize, concurrency: usize, hasher: S, collector: Collector) -> HashSet<T, S> {
        assert!(concurrency > 0, "concurrency level must be at least one");

        let capacity = capacity.max(concurrency);
        let table = Box::into_raw(Box::new(Table::new(capacity, concurrency)));

        HashSet {
            table: AtomicPtr::new(table),
            locks: (0..concurrency).map(|_| Mutex::new(())).collect(),
            collector,
            hasher,
        }
    }

    /// Returns a reference to the collector.
    #[inline]
    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Returns the concurrency level, i.e. the number of stripe locks.
    #[inline]
    pub fn concurrency(&self) -> usize {
        self.locks.len()
    }

    /// Verify that a guard is valid to use with this set.
    #[inline]
    pub fn check_guard(&self, guard: &impl Guard) {
        assert_eq!(
            *guard.collector(),
            self.collector,
            "attempted to access the set with an incorrect guard"
        );
    }

    /// Returns the number of elements in the set.
    ///
    /// The count is derived from the live stripe counters of the
    /// current generation; it is exact whenever no operations are in
    /// flight.
    #[inline]
    pub fn len(&self) -> usize {
        let guard = self.collector.enter();
        let table = guard.protect(&self.table, Ordering::Acquire);

        // Safety: The table pointer always refers to a valid generation,
        // kept alive by the guard entered above.
        unsafe { (*table).len() }
    }

    /// Returns the stripe lock index owning the given bucket.
    ///
    /// Deriving the stripe from the bucket, rather than from the hash
    /// directly, is what guarantees that all values sharing a bucket
    /// contend on the same lock; the bucket count is not a multiple of
    /// the lock count.
    #[inline]
    fn stripe_index(&self, bucket: usize) -> usize {
        bucket % self.locks.len()
    }

    /// Removes every element from the set.
    ///
    /// # Safety
    ///
    /// The guard must belong to this set's collector.
    pub unsafe fn clear(&self, guard: &impl Guard) {
        // Lock every stripe, in ascending order everywhere to avoid
        // deadlock with concurrent growth.
        let _stripes: Vec<_> = self.locks.iter().map(|lock| lock.lock().unwrap()).collect();

        let capacity = DEFAULT_CAPACITY.max(self.locks.len());
        let table = Box::into_raw(Box::new(Table::new(capacity, self.locks.len())));

        let old = self.table.swap(table, Ordering::AcqRel);

        // Readers mid-traversal keep the old generation alive until
        // their guards are dropped; mutators blocked on a stripe lock
        // re-capture the new generation once unblocked.
        //
        // Safety: The swap above made the old generation unreachable,
        // and none of its nodes are shared with the new one.
        unsafe { guard.defer_retire(old, Table::reclaim) };
    }

    /// Grows the generation at `old` if it is still current.
    ///
    /// Expects to be called without any stripe lock held.
    fn try_resize(&self, old: *mut Table<T>, guard: &impl Guard) {
        // Lock every stripe in ascending order, taking total mutual
        // exclusion over mutations.
        let _stripes: Vec<_> = self.locks.iter().map(|lock| lock.lock().unwrap()).collect();

        // Someone else already replaced this generation. Note that the
        // caller's guard protects `old`, so its allocation cannot have
        // been reused for a new generation.
        if self.table.load(Ordering::Acquire) != old {
            return;
        }

        // Safety: `old` is the current generation, verified above.
        let table = unsafe { &*old };
        let len = table.buckets.len();
        let count = table.len();

        // The budget was exhausted by insert/remove churn rather than
        // by real occupancy. Grow the budget instead of the table so
        // that churn alone cannot reallocate without bound.
        if count < len / SPARSE_FACTOR {
            let budget = table.budget.load(Ordering::Relaxed);
            table
                .budget
                .store(budget.saturating_mul(2), Ordering::Relaxed);
            return;
        }

        // Double the bucket array. If the new length would overflow or
        // exceed the maximum table size, stop resizing for good and
        // accept longer chains over unbounded memory growth.
        let new_len = match len.checked_mul(2).and_then(|len| len.checked_add(1)) {
            Some(len) if len <= MAX_BUCKETS => len,
            _ => {
                table.budget.store(usize::MAX, Ordering::Relaxed);
                return;
            }
        };

        let new = Table::new(new_len, self.locks.len());

        // Rehash every element into a fresh node. Nodes are never
        // reused across generations, so readers still traversing the
        // old generation see fully intact chains until it is reclaimed.
        for bucket in table.buckets.iter() {
            let mut node = bucket.load(Ordering::Acquire);

            while !node.is_null() {
                // Safety: We hold every stripe lock, and published
                // nodes are immutable.
                let current = unsafe { &*node };
                let i = new.bucket_index(current.hash);

                // The new generation is still private to this thread,
                // so the stores do not need to synchronize; the table
                // is published below with a `Release` swap.
                let head = new.buckets[i].load(Ordering::Relaxed);

                // Safety: The old node is only retired with
                // `reclaim_moved` below, which will not drop the
                // element a second time.
                let copy = Box::into_raw(Box::new(Node {
                    value: unsafe { ptr::read(&current.value) },
                    hash: current.hash,
                    next: head,
                }));

                new.buckets[i].store(copy, Ordering::Relaxed);
                new.counts[self.stripe_index(i)]
                    .value
                    .fetch_add(1, Ordering::Relaxed);

                node = current.next;
            }
        }

        // Publish the new generation with a single atomic swap.
        let new = Box::into_raw(Box::new(new));
        self.table.store(new, Ordering::Release);

        // Safety: The store above made the old generation unreachable,
        // and every element in it was moved into the new generation.
        unsafe { guard.defer_retire(old, Table::reclaim_moved) };
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Returns a reference to the stored element equal to the given
    /// key, if any.
    ///
    /// Lock-free: this never blocks and never retries.
    ///
    /// # Safety
    ///
    /// The guard must belong to this set's collector.
    pub unsafe fn get<'g, Q>(&self, key: &Q, guard: &'g impl Guard) -> Option<&'g T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);

        // Capture the current generation.
        let table = guard.protect(&self.table, Ordering::Acquire);

        // Safety: The table pointer always refers to a valid generation,
        // kept alive by the guard.
        let table = unsafe { &*table };

        let i = table.bucket_index(hash);
        let mut node = guard.protect(&table.buckets[i], Ordering::Acquire);

        while !node.is_null() {
            // Safety: We performed a protected load of the bucket head
            // with `Acquire`, and published nodes are never mutated, so
            // the whole chain is valid for reads while the guard is held.
            let current = unsafe { &*node };

            if current.hash == hash && current.value.borrow() == key {
                return Some(&current.value);
            }

            node = current.next;
        }

        None
    }

    /// Inserts an element into the set.
    ///
    /// Returns `true` if it was newly inserted, or `false` if an equal
    /// element was already present, in which case the stored element is
    /// left untouched.
    ///
    /// # Safety
    ///
    /// The guard must belong to this set's collector.
    pub unsafe fn insert(&self, value: T, guard: &impl Guard) -> bool {
        let hash = self.hasher.hash_one(&value);

        loop {
            // Capture the current generation; bucket and stripe indices
            // are computed against this one capture.
            let captured = guard.protect(&self.table, Ordering::Acquire);

            // Safety: The table pointer always refers to a valid
            // generation, kept alive by the guard.
            let table = unsafe { &*captured };

            let i = table.bucket_index(hash);
            let stripe = self.stripe_index(i);
            let _stripe = self.locks[stripe].lock().unwrap();

            // A resize swapped the generation between the capture and
            // the lock acquisition; retry against the new one. The
            // guard protects `captured`, so the comparison cannot be
            // confused by a reused allocation.
            if self.table.load(Ordering::Acquire) != captured {
                continue;
            }

            let head = table.buckets[i].load(Ordering::Acquire);

            let mut node = head;
            while !node.is_null() {
                // Safety: We hold the stripe lock owning this bucket.
                let current = unsafe { &*node };

                if current.hash == hash && current.value == value {
                    return false;
                }

                node = current.next;
            }

            // Publish a fresh head in front of the existing chain.
            let new = Box::into_raw(Box::new(Node {
                value,
                hash,
                next: head,
            }));
            table.buckets[i].store(new, Ordering::Release);

            let count = table.counts[stripe].value.fetch_add(1, Ordering::Relaxed) + 1;
            let budget = table.budget.load(Ordering::Relaxed);
            drop(_stripe);

            // This stripe crossed its share of the growth budget.
            if count >= budget {
                self.try_resize(captured, guard);
            }

            return true;
        }
    }

    /// Removes the element equal to the given key from the set.
    ///
    /// Returns `true` if an element was removed.
    ///
    /// # Safety
    ///
    /// The guard must belong to this set's collector.
    pub unsafe fn remove<Q>(&self, key: &Q, guard: &impl Guard) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);

        loop {
            let captured = guard.protect(&self.table, Ordering::Acquire);

            // Safety: The table pointer always refers to a valid
            // generation, kept alive by the guard.
            let table = unsafe { &*captured };

            let i = table.bucket_index(hash);
            let stripe = self.stripe_index(i);
            let _stripe = self.locks[stripe].lock().unwrap();

            // Lost a race with a resize, retry against the new
            // generation.
            if self.table.load(Ordering::Acquire) != captured {
                continue;
            }

            let head = table.buckets[i].load(Ordering::Acquire);

            // Find the node to unlink.
            let mut target = head;
            while !target.is_null() {
                // Safety: We hold the stripe lock owning this bucket.
                let current = unsafe { &*target };

                if current.hash == hash && current.value.borrow() == key {
                    break;
                }

                target = current.next;
            }

            if target.is_null() {
                return false;
            }

            // Safety: `target` is a non-null node in this bucket.
            let tail = unsafe { (*target).next };

            if target == head {
                // Unlinking the head is a single pointer swing.
                table.buckets[i].store(tail, Ordering::Release);
            } else {
                // Published `next` pointers are never rewritten, so
                // removing from the middle of the chain copies the
                // prefix and shares the tail after the target. A reader
                // already positioned past the removal point keeps
                // walking a valid chain.
                //
                // Safety: We hold the stripe lock owning this bucket,
                // `head` is non-null, and `target` is reachable from it.
                unsafe {
                    let new_head = copy_node(head);
                    let mut last = new_head;

                    let mut node = (*head).next;
                    while node != target {
                        let copy = copy_node(node);
                        (*last).next = copy;
                        last = copy;
                        node = (*node).next;
                    }

                    (*last).next = tail;
                    table.buckets[i].store(new_head, Ordering::Release);

                    // Retire the superseded prefix. The elements now
                    // live in the copies, so the old allocations are
                    // freed without dropping them.
                    let mut node = head;
                    while node != target {
                        let next = (*node).next;
                        guard.defer_retire(node, Node::reclaim_moved);
                        node = next;
                    }
                }
            }

            table.counts[stripe].value.fetch_sub(1, Ordering::Relaxed);

            // Safety: The store above made `target` unreachable from
            // the bucket, and its element was not moved anywhere.
            unsafe { guard.defer_retire(target, Node::reclaim) };

            return true;
        }
    }

    /// Returns an iterator over a capture of the current generation.
    ///
    /// # Safety
    ///
    /// The guard must belong to this set's collector.
    pub unsafe fn iter<'g, G>(&'g self, guard: &'g G) -> Iter<'g, T, G>
    where
        G: Guard,
    {
        Iter {
            // Safety: The table pointer always refers to a valid
            // generation, kept alive by the guard.
            table: unsafe { &*guard.protect(&self.table, Ordering::Acquire) },
            root: &self.table,
            guard,
            i: 0,
            node: ptr::null_mut(),
        }
    }
}

/// Copies a node for a chain rebuild, moving its element.
///
/// # Safety
///
/// `node` must be valid, and once the copy is published the original
/// may only be retired with [`Node::reclaim_moved`].
unsafe fn copy_node<T>(node: *mut Node<T>) -> *mut Node<T> {
    // Safety: Guaranteed by the caller.
    let node = unsafe { &*node };

    Box::into_raw(Box::new(Node {
        // Safety: The original is retired with `reclaim_moved`, which
        // will not drop the element a second time.
        value: unsafe { ptr::read(&node.value) },
        hash: node.hash,
        next: ptr::null_mut(),
    }))
}

impl<T, S> Drop for HashSet<T, S> {
    fn drop(&mut self) {
        // Make sure all retired objects are reclaimed before the
        // collector is dropped.
        //
        // Safety: We have a unique reference to the collector.
        unsafe { self.collector.reclaim_all() };

        // Safety: We have unique access to the current generation, and
        // it is not accessed after this call.
        unsafe { Table::reclaim(*self.table.get_mut(), &self.collector) };
    }
}

/// A lock-free iterator over a captured table generation.
///
/// The iterator is allocation-free and is *not* a snapshot: mutations
/// racing with it on the captured generation are reflected according to
/// whatever each bucket's chain shows when the bucket is visited. If the
/// set grows concurrently, the iterator runs its captured generation to
/// completion rather than switching mid-traversal.
pub struct Iter<'g, T, G> {
    table: &'g Table<T>,
    root: &'g AtomicPtr<Table<T>>,
    guard: &'g G,
    i: usize,
    node: *mut Node<T>,
}

impl<'g, T, G> Iter<'g, T, G>
where
    G: Guard,
{
    /// Restarts the iterator from the beginning, against the set's
    /// then-current generation.
    pub fn restart(&mut self) {
        // Safety: The root pointer always refers to a valid generation,
        // kept alive by the guard.
        self.table = unsafe { &*self.guard.protect(self.root, Ordering::Acquire) };
        self.i = 0;
        self.node = ptr::null_mut();
    }
}

impl<'g, T: 'g, G> Iterator for Iter<'g, T, G>
where
    G: Guard,
{
    type Item = &'g T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.node.is_null() {
                // Safety: The node was reached from a protected load of
                // a bucket head with `Acquire`, and published nodes are
                // never mutated, so it is valid for reads as long as
                // the guard is held.
                let node = unsafe { &*self.node };
                self.node = node.next;
                return Some(&node.value);
            }

            // Scan forward to the next non-empty bucket. Once the
            // bucket array is exhausted the iterator keeps returning
            // `None`.
            if self.i >= self.table.buckets.len() {
                return None;
            }

            self.node = self
                .guard
                .protect(&self.table.buckets[self.i], Ordering::Acquire);
            self.i += 1;
        }
    }
}

// Safety: An iterator yields shared references to elements, and holds a
// shared reference to its guard.
unsafe impl<T: Sync, G: Sync> Send for Iter<'_, T, G> {}
unsafe impl<T: Sync, G: Sync> Sync for Iter<'_, T, G> {}

impl<T, G> Clone for Iter<'_, T, G> {
    #[inline]
    fn clone(&self) -> Self {
        Iter {
            table: self.table,
            root: self.root,
            guard: self.guard,
            i: self.i,
            node: self.node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    #[test]
    fn budget_saturates_instead_of_wrapping() {
        let set: HashSet<usize, RandomState> =
            HashSet::new(64, 8, RandomState::new(), Collector::new());
        let guard = set.collector.enter();

        let table = guard.protect(&set.table, Ordering::Acquire);

        // Safety: The guard keeps the generation alive.
        unsafe { (*table).budget.store(usize::MAX, Ordering::Relaxed) };

        // The table is empty, so the exhausted budget reads as churn
        // and is doubled; doubling the maximum must clamp, not wrap
        // around to a tiny budget.
        set.try_resize(table, &guard);

        // Safety: The guard keeps the generation alive.
        let budget = unsafe { (*table).budget.load(Ordering::Relaxed) };
        assert_eq!(budget, usize::MAX);
    }
}
