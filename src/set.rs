use crate::raw;
use seize::{Collector, Guard, LocalGuard, OwnedGuard};

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::OnceLock;

/// A concurrent hash set.
///
/// Most hash set operations require a [`Guard`](crate::Guard), which can be acquired through
/// [`HashSet::guard`] or using the [`HashSet::pin`] API. See the [crate-level documentation](crate#usage)
/// for details.
pub struct HashSet<T, S = RandomState> {
    raw: raw::HashSet<T, S>,
}

/// A builder for a [`HashSet`].
///
/// # Examples
///
/// ```rust
/// use quince::HashSet;
/// use seize::Collector;
/// use std::collections::hash_map::RandomState;
///
/// let set: HashSet<i32> = HashSet::builder()
///     // Set the initial capacity.
///     .capacity(2048)
///     // Set the concurrency level, i.e. the number of stripe locks.
///     .concurrency(8)
///     // Set the hasher.
///     .hasher(RandomState::new())
///     // Set a custom garbage collector.
///     .collector(Collector::new())
///     // Construct the hash set.
///     .build();
/// ```
pub struct HashSetBuilder<T, S = RandomState> {
    hasher: S,
    capacity: usize,
    concurrency: Option<usize>,
    collector: Collector,
    _t: PhantomData<T>,
}

impl<T> HashSetBuilder<T> {
    /// Set the hash builder used to hash elements.
    ///
    /// Warning: `hasher` is normally randomly generated, and is designed
    /// to allow HashSets to be resistant to attacks that cause many collisions
    /// and very poor performance. Setting it manually using this function can
    /// expose a DoS attack vector.
    ///
    /// The `hasher` passed should implement the [`BuildHasher`] trait for
    /// the HashSet to be useful, see its documentation for details.
    pub fn hasher<S>(self, hasher: S) -> HashSetBuilder<T, S> {
        HashSetBuilder {
            hasher,
            capacity: self.capacity,
            concurrency: self.concurrency,
            collector: self.collector,
            _t: PhantomData,
        }
    }
}

impl<T, S> HashSetBuilder<T, S> {
    /// Set the initial capacity of the set.
    ///
    /// The capacity is the number of buckets in the initial table generation.
    /// A capacity below the concurrency level is silently raised to match it.
    pub fn capacity(self, capacity: usize) -> HashSetBuilder<T, S> {
        HashSetBuilder {
            capacity,
            hasher: self.hasher,
            concurrency: self.concurrency,
            collector: self.collector,
            _t: PhantomData,
        }
    }

    /// Set the concurrency level, i.e. the number of stripe locks.
    ///
    /// This is the estimated number of threads that will mutate the set
    /// concurrently. It is fixed for the lifetime of the set and defaults
    /// to the available parallelism.
    ///
    /// Note that `build` will panic if the concurrency level is zero.
    pub fn concurrency(self, concurrency: usize) -> HashSetBuilder<T, S> {
        HashSetBuilder {
            concurrency: Some(concurrency),
            hasher: self.hasher,
            capacity: self.capacity,
            collector: self.collector,
            _t: PhantomData,
        }
    }

    /// Set the [`seize::Collector`] used for garbage collection.
    ///
    /// This method may be useful when you want more control over garbage collection.
    ///
    /// Note that all `Guard` references used to access the set must be produced by
    /// the provided `collector`.
    pub fn collector(self, collector: Collector) -> Self {
        HashSetBuilder {
            collector,
            hasher: self.hasher,
            capacity: self.capacity,
            concurrency: self.concurrency,
            _t: PhantomData,
        }
    }

    /// Construct a [`HashSet`] from the builder, using the configured options.
    ///
    /// # Panics
    ///
    /// Panics if the configured concurrency level is zero.
    pub fn build(self) -> HashSet<T, S> {
        let concurrency = self.concurrency.unwrap_or_else(default_concurrency);

        HashSet {
            raw: raw::HashSet::new(self.capacity, concurrency, self.hasher, self.collector),
        }
    }
}

impl<T, S> fmt::Debug for HashSetBuilder<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashSetBuilder")
            .field("capacity", &self.capacity)
            .field("concurrency", &self.concurrency)
            .field("collector", &self.collector)
            .finish()
    }
}

/// Returns the default concurrency level.
fn default_concurrency() -> usize {
    // `available_parallelism` is quite slow (microseconds).
    static CPUS: OnceLock<usize> = OnceLock::new();

    *CPUS.get_or_init(|| {
        std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1)
    })
}

impl<T> HashSet<T> {
    /// Creates an empty `HashSet`.
    ///
    /// The set is created with a default capacity of 31 buckets and a
    /// concurrency level matching the available parallelism.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    /// let set: HashSet<&str> = HashSet::new();
    /// ```
    pub fn new() -> HashSet<T> {
        HashSet::with_capacity_and_hasher(raw::DEFAULT_CAPACITY, RandomState::new())
    }

    /// Creates an empty `HashSet` with the specified capacity.
    ///
    /// A capacity below the concurrency level is silently raised to match it.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    /// let set: HashSet<&str> = HashSet::with_capacity(10);
    /// ```
    pub fn with_capacity(capacity: usize) -> HashSet<T> {
        HashSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `HashSet`.
    ///
    /// The builder can be used for more complex configuration, such as using
    /// a custom [`Collector`] or concurrency level.
    pub fn builder() -> HashSetBuilder<T> {
        HashSetBuilder {
            capacity: raw::DEFAULT_CAPACITY,
            concurrency: None,
            hasher: RandomState::default(),
            collector: Collector::new(),
            _t: PhantomData,
        }
    }
}

impl<T, S> Default for HashSet<T, S>
where
    S: Default,
{
    fn default() -> Self {
        HashSet::with_hasher(S::default())
    }
}

impl<T, S> HashSet<T, S> {
    /// Creates an empty `HashSet` which will use the given hash builder to
    /// hash elements.
    ///
    /// Warning: `hash_builder` is normally randomly generated, and is designed
    /// to allow HashSets to be resistant to attacks that cause many collisions
    /// and very poor performance. Setting it manually using this function can
    /// expose a DoS attack vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let s = RandomState::new();
    /// let set = HashSet::with_hasher(s);
    /// set.pin().insert(1);
    /// ```
    pub fn with_hasher(hash_builder: S) -> HashSet<T, S> {
        HashSet::with_capacity_and_hasher(raw::DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty `HashSet` with at least the specified capacity, using
    /// `hash_builder` to hash the elements.
    ///
    /// A capacity below the concurrency level is silently raised to match it.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let s = RandomState::new();
    /// let set = HashSet::with_capacity_and_hasher(10, s);
    /// set.pin().insert(1);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> HashSet<T, S> {
        HashSet {
            raw: raw::HashSet::new(
                capacity,
                default_concurrency(),
                hash_builder,
                Collector::default(),
            ),
        }
    }

    /// Returns the concurrency level of the set, i.e. the number of
    /// stripe locks guarding its buckets.
    #[inline]
    pub fn concurrency(&self) -> usize {
        self.raw.concurrency()
    }

    /// Returns a pinned reference to the set.
    ///
    /// The returned reference manages a guard internally, preventing garbage collection
    /// for as long as it is held. See the [crate-level documentation](crate#usage) for details.
    #[inline]
    pub fn pin(&self) -> HashSetRef<'_, T, S, LocalGuard<'_>> {
        HashSetRef {
            guard: self.guard(),
            set: self,
        }
    }

    /// Returns a pinned reference to the set.
    ///
    /// Unlike [`HashSet::pin`], the returned reference implements `Send` and `Sync`,
    /// allowing it to be held across `.await` points in work-stealing schedulers.
    /// This is especially useful for iterators.
    ///
    /// The returned reference manages a guard internally, preventing garbage collection
    /// for as long as it is held. See the [crate-level documentation](crate#usage) for details.
    #[inline]
    pub fn pin_owned(&self) -> HashSetRef<'_, T, S, OwnedGuard<'_>> {
        HashSetRef {
            guard: self.owned_guard(),
            set: self,
        }
    }

    /// Returns a guard for use with this set.
    ///
    /// Note that holding on to a guard prevents garbage collection.
    /// See the [crate-level documentation](crate#usage) for details.
    #[inline]
    pub fn guard(&self) -> LocalGuard<'_> {
        self.raw.collector().enter()
    }

    /// Returns an owned guard for use with this set.
    ///
    /// Owned guards implement `Send` and `Sync`, allowing them to be held across
    /// `.await` points in work-stealing schedulers. This is especially useful
    /// for iterators.
    ///
    /// Note that holding on to a guard prevents garbage collection.
    /// See the [crate-level documentation](crate#usage) for details.
    #[inline]
    pub fn owned_guard(&self) -> OwnedGuard<'_> {
        self.raw.collector().enter_owned()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Returns the number of elements in the set.
    ///
    /// The count is derived from live per-stripe counters, so it is a close
    /// approximation while mutations are in flight, and exact at quiescence
    /// and immediately after [`clear`](HashSet::clear).
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    ///
    /// set.pin().insert(1);
    /// set.pin().insert(2);
    /// assert!(set.len() == 2);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the set is empty. Otherwise returns `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    /// assert!(set.is_empty());
    /// set.pin().insert("a");
    /// assert!(!set.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the set contains the specified element.
    ///
    /// The key may be any borrowed form of the set's element type, but
    /// [`Hash`] and [`Eq`] on the borrowed form *must* match those for
    /// the element type.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    /// let guard = set.guard();
    /// set.insert(1, &guard);
    /// assert_eq!(set.contains(&1, &guard), true);
    /// assert_eq!(set.contains(&2, &guard), false);
    /// ```
    #[inline]
    pub fn contains<Q>(&self, key: &Q, guard: &impl Guard) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key, guard).is_some()
    }

    /// Returns a reference to the stored element equal to the given key,
    /// if any.
    ///
    /// Note that this returns the *stored* instance, which for types with
    /// custom equality may differ from the lookup key. For example, a set
    /// of case-insensitive strings returns the originally inserted casing.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    /// let guard = set.guard();
    /// set.insert(1, &guard);
    /// assert_eq!(set.get(&1, &guard), Some(&1));
    /// assert_eq!(set.get(&2, &guard), None);
    /// ```
    #[inline]
    pub fn get<'g, Q>(&self, key: &Q, guard: &'g impl Guard) -> Option<&'g T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.check_guard(guard);

        // Safety: Checked the guard above.
        unsafe { self.raw.get(key, guard) }
    }

    /// Inserts a value into the set.
    ///
    /// If the set did not have this value present, `true` is returned.
    ///
    /// If the set did have this value present, `false` is returned and the
    /// stored value is not updated. This matters for types that can be `==`
    /// without being identical. See the [standard library documentation] for
    /// details.
    ///
    /// [standard library documentation]: https://doc.rust-lang.org/std/collections/index.html#insert-and-complex-keys
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    /// assert_eq!(set.pin().insert(37), true);
    /// assert_eq!(set.pin().insert(37), false);
    /// assert_eq!(set.pin().get(&37), Some(&37));
    /// ```
    #[inline]
    pub fn insert(&self, value: T, guard: &impl Guard) -> bool {
        self.raw.check_guard(guard);

        // Safety: Checked the guard above.
        unsafe { self.raw.insert(value, guard) }
    }

    /// Removes an element from the set.
    ///
    /// Returns `true` if an equal element was present. Removing an absent
    /// element is not an error; the second of two racing removals simply
    /// returns `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    /// let guard = set.guard();
    /// set.insert(1, &guard);
    /// assert_eq!(set.remove(&1, &guard), true);
    /// assert_eq!(set.remove(&1, &guard), false);
    /// ```
    #[inline]
    pub fn remove<Q>(&self, key: &Q, guard: &impl Guard) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.check_guard(guard);

        // Safety: Checked the guard above.
        unsafe { self.raw.remove(key, guard) }
    }

    /// Clears the set, removing all values.
    ///
    /// Iterators mid-traversal observe the pre-clear generation to
    /// completion; subsequent operations observe the empty set.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    ///
    /// set.pin().insert(1);
    /// set.pin().clear();
    /// assert!(set.is_empty());
    /// ```
    #[inline]
    pub fn clear(&self, guard: &impl Guard) {
        self.raw.check_guard(guard);

        // Safety: Checked the guard above.
        unsafe { self.raw.clear(guard) }
    }

    /// Copies the set's elements into `dst`, starting at `dst[offset]`,
    /// returning the number of elements copied.
    ///
    /// The elements copied are those observed by a single pass of
    /// [`iter`](HashSet::iter) racing with any concurrent mutation.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of bounds, or if the elements do not fit
    /// in the remainder of the destination.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::new();
    /// let guard = set.guard();
    /// set.insert(1, &guard);
    ///
    /// let mut dst = [0; 3];
    /// assert_eq!(set.copy_to(&mut dst, 1, &guard), 1);
    /// assert_eq!(dst, [0, 1, 0]);
    /// ```
    pub fn copy_to(&self, dst: &mut [T], offset: usize, guard: &impl Guard) -> usize
    where
        T: Clone,
    {
        assert!(offset <= dst.len(), "offset is out of bounds");

        let mut i = offset;
        for value in self.iter(guard) {
            assert!(
                i < dst.len(),
                "destination is not large enough to hold the set's elements"
            );

            dst[i] = value.clone();
            i += 1;
        }

        i - offset
    }

    /// An iterator visiting all elements in arbitrary order.
    ///
    /// The iterator runs against a capture of the current table generation
    /// and is not a snapshot: elements inserted or removed concurrently may
    /// or may not be observed, but iteration never blocks and never yields
    /// an element that was never in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::HashSet;
    ///
    /// let set = HashSet::from(["a", "b", "c"]);
    ///
    /// let guard = set.guard();
    /// for value in set.iter(&guard) {
    ///     println!("value: {value}");
    /// }
    /// ```
    #[inline]
    pub fn iter<'g, G>(&'g self, guard: &'g G) -> Iter<'g, T, G>
    where
        G: Guard,
    {
        self.raw.check_guard(guard);

        Iter {
            // Safety: Checked the guard above.
            raw: unsafe { self.raw.iter(guard) },
        }
    }
}

impl<T, S> PartialEq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        let (guard1, guard2) = (&self.guard(), &other.guard());

        let mut iter = self.iter(guard1);
        iter.all(|value| other.get(value, guard2).is_some())
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> fmt::Debug for HashSet<T, S>
where
    T: Hash + Eq + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.guard();
        f.debug_set().entries(self.iter(&guard)).finish()
    }
}

impl<T, S> Extend<T> for &HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        // Duplicates per the set's equality are silently deduplicated;
        // the stored instance is whichever insert won.
        let guard = self.guard();
        for value in iter {
            self.insert(value, &guard);
        }
    }
}

impl<'a, T, S> Extend<&'a T> for &HashSet<T, S>
where
    T: Copy + Hash + Eq + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, const N: usize> From<[T; N]> for HashSet<T, RandomState>
where
    T: Hash + Eq,
{
    fn from(arr: [T; N]) -> Self {
        HashSet::from_iter(arr)
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut iter = iter.into_iter();

        if let Some(value) = iter.next() {
            let (lower, _) = iter.size_hint();
            let set = HashSet::with_capacity_and_hasher(lower.saturating_add(1), S::default());

            {
                let set = set.pin();
                set.insert(value);
                for value in iter {
                    set.insert(value);
                }
            }

            set
        } else {
            Self::default()
        }
    }
}

impl<T, S> Clone for HashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> HashSet<T, S> {
        let other = HashSet::builder()
            .capacity(self.len())
            .concurrency(self.raw.concurrency())
            .hasher(self.raw.hasher.clone())
            .build();

        {
            let (guard1, guard2) = (&self.guard(), &other.guard());
            for value in self.iter(guard1) {
                other.insert(value.clone(), guard2);
            }
        }

        other
    }
}

/// A pinned reference to a [`HashSet`].
///
/// This type is created with [`HashSet::pin`] and can be used to easily access a [`HashSet`]
/// without explicitly managing a guard. See the [crate-level documentation](crate#usage) for details.
pub struct HashSetRef<'set, T, S, G> {
    guard: G,
    set: &'set HashSet<T, S>,
}

impl<'set, T, S, G> HashSetRef<'set, T, S, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    G: Guard,
{
    /// Returns a reference to the inner [`HashSet`].
    #[inline]
    pub fn set(&self) -> &'set HashSet<T, S> {
        self.set
    }

    /// Returns the number of elements in the set.
    ///
    /// See [`HashSet::len`] for details.
    #[inline]
    pub fn len(&self) -> usize {
        self.set.raw.len()
    }

    /// Returns `true` if the set is empty. Otherwise returns `false`.
    ///
    /// See [`HashSet::is_empty`] for details.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the set contains the specified element.
    ///
    /// See [`HashSet::contains`] for details.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns a reference to the stored element equal to the given key,
    /// if any.
    ///
    /// See [`HashSet::get`] for details.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Safety: `self.guard` was created from our set.
        unsafe { self.set.raw.get(key, &self.guard) }
    }

    /// Inserts a value into the set.
    ///
    /// See [`HashSet::insert`] for details.
    #[inline]
    pub fn insert(&self, value: T) -> bool {
        // Safety: `self.guard` was created from our set.
        unsafe { self.set.raw.insert(value, &self.guard) }
    }

    /// Removes an element from the set.
    ///
    /// See [`HashSet::remove`] for details.
    #[inline]
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Safety: `self.guard` was created from our set.
        unsafe { self.set.raw.remove(key, &self.guard) }
    }

    /// Clears the set, removing all values.
    ///
    /// See [`HashSet::clear`] for details.
    #[inline]
    pub fn clear(&self) {
        // Safety: `self.guard` was created from our set.
        unsafe { self.set.raw.clear(&self.guard) }
    }

    /// Copies the set's elements into `dst`, starting at `dst[offset]`.
    ///
    /// See [`HashSet::copy_to`] for details.
    #[inline]
    pub fn copy_to(&self, dst: &mut [T], offset: usize) -> usize
    where
        T: Clone,
    {
        self.set.copy_to(dst, offset, &self.guard)
    }

    /// An iterator visiting all elements in arbitrary order.
    ///
    /// See [`HashSet::iter`] for details.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, G> {
        Iter {
            // Safety: `self.guard` was created from our set.
            raw: unsafe { self.set.raw.iter(&self.guard) },
        }
    }
}

impl<T, S, G> fmt::Debug for HashSetRef<'_, T, S, G>
where
    T: Hash + Eq + fmt::Debug,
    S: BuildHasher,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, S, G> IntoIterator for &'a HashSetRef<'_, T, S, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    G: Guard,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over a set's elements.
///
/// This struct is created by the [`iter`](HashSet::iter) method on [`HashSet`]. See its documentation for details.
pub struct Iter<'g, T, G> {
    raw: raw::Iter<'g, T, G>,
}

impl<'g, T, G> Iter<'g, T, G>
where
    G: Guard,
{
    /// Restarts the iterator from the beginning, against the set's current
    /// table generation.
    ///
    /// Elements yielded before the restart may be yielded again.
    #[inline]
    pub fn restart(&mut self) {
        self.raw.restart();
    }
}

impl<'g, T: 'g, G> Iterator for Iter<'g, T, G>
where
    G: Guard,
{
    type Item = &'g T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next()
    }
}

impl<T, G> Clone for Iter<'_, T, G> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw.clone(),
        }
    }
}

impl<T, G> fmt::Debug for Iter<'_, T, G>
where
    T: fmt::Debug,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
