//! ChainMap: separately chained hash map over an entry arena.
//!
//! Buckets hold the arena key of their chain head; every entry holds the
//! arena key of its successor. Chains are prepended to, so the most recently
//! linked entry of a bucket is visited first. Resizing relinks the existing
//! entries into a fresh bucket array using the hash cached in each entry;
//! `K: Hash` is never invoked after insertion.

use crate::cursor::{Cursor, Iter, Keys, Values};
use crate::error::MapError;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::cell::Cell;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use rand_core::RngCore;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena index of one entry.
    pub(crate) struct EntryKey;
}

/// Bucket count allocated by the first insertion.
pub const INITIAL_BUCKETS: usize = 5;

/// Average chain length above which the bucket array grows.
pub const LOAD_FACTOR: usize = 3;

/// Bucket count that follows `buckets` in the growth sequence 5, 23, 113, 563, ...
#[inline]
pub const fn grown_bucket_count(buckets: usize) -> usize {
    (buckets - 1) * 5 + 3
}

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    hash: u64,
    pub(crate) next: Option<EntryKey>,
}

/// Bucket array and entry arena; everything that does not hash.
struct Chains<K, V> {
    buckets: Vec<Option<EntryKey>>, // empty until the first insertion
    entries: SlotMap<EntryKey, Entry<K, V>>,
    // Exact first occupied bucket, `None` when unknown.
    first_hint: Cell<Option<usize>>,
}

impl<K, V> Chains<K, V> {
    fn new() -> Self {
        Self {
            buckets: Vec::new(),
            entries: SlotMap::with_key(),
            first_hint: Cell::new(None),
        }
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn first_occupied(&self) -> usize {
        if let Some(hint) = self.first_hint.get() {
            return hint;
        }
        let first = self.scan_first();
        self.first_hint.set(Some(first));
        first
    }

    fn scan_first(&self) -> usize {
        self.buckets
            .iter()
            .position(Option::is_some)
            .unwrap_or(self.buckets.len())
    }

    fn find_hashed<Q>(&self, hash: u64, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let mut cur = self.buckets[self.bucket_of(hash)];
        while let Some(k) = cur {
            let e = self.entries.get(k)?;
            if e.hash == hash && e.key.borrow() == q {
                return Some(k);
            }
            cur = e.next;
        }
        None
    }

    /// Allocate or grow the bucket array so one more entry fits the load factor.
    fn reserve_one(&mut self) {
        let buckets = self.buckets.len();
        if buckets == 0 {
            log::trace!("allocating {} buckets", INITIAL_BUCKETS);
            self.rehash(INITIAL_BUCKETS);
        } else if self.entries.len() + 1 > buckets * LOAD_FACTOR {
            let grown = grown_bucket_count(buckets);
            log::trace!(
                "growing chain map from {} to {} buckets at {} entries",
                buckets,
                grown,
                self.entries.len() + 1
            );
            self.rehash(grown);
        }
    }

    fn rehash(&mut self, bucket_count: usize) {
        let mut buckets: Vec<Option<EntryKey>> = vec![None; bucket_count];
        for head in core::mem::take(&mut self.buckets) {
            let mut cur = head;
            while let Some(k) = cur {
                let Some(e) = self.entries.get_mut(k) else {
                    break;
                };
                cur = e.next;
                let b = (e.hash % bucket_count as u64) as usize;
                e.next = buckets[b];
                buckets[b] = Some(k);
            }
        }
        self.buckets = buckets;
        self.first_hint.set(None);
    }

    /// Link a new entry at the head of its chain, growing first if needed.
    fn link_new(&mut self, hash: u64, key: K, value: V) -> EntryKey {
        self.reserve_one();
        let bucket = self.bucket_of(hash);
        let head = self.buckets[bucket];
        let k = self.entries.insert(Entry {
            key,
            value,
            hash,
            next: head,
        });
        self.buckets[bucket] = Some(k);
        self.first_hint.set(None);
        k
    }

    fn unlink<Q>(&mut self, hash: u64, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let bucket = self.bucket_of(hash);
        let mut prev: Option<EntryKey> = None;
        let mut cur = self.buckets[bucket];
        while let Some(k) = cur {
            let e = self.entries.get(k)?;
            if e.hash == hash && e.key.borrow() == q {
                let next = e.next;
                match prev {
                    None => self.buckets[bucket] = next,
                    Some(p) => self.entries[p].next = next,
                }
                self.first_hint.set(None);
                // Unlinked before the entry leaves the arena; K/V drop in the caller.
                return self.entries.remove(k).map(|e| (e.key, e.value));
            }
            prev = cur;
            cur = e.next;
        }
        None
    }

    fn validate(&self) -> Result<(), MapError> {
        let buckets = self.buckets.len();
        let mut reachable = 0;
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut cur = *head;
            while let Some(k) = cur {
                let e = self
                    .entries
                    .get(k)
                    .ok_or(MapError::DanglingLink { bucket })?;
                let expected = self.bucket_of(e.hash);
                if expected != bucket {
                    return Err(MapError::MisplacedEntry { bucket, expected });
                }
                reachable += 1;
                cur = e.next;
            }
        }
        let recorded = self.entries.len();
        if reachable != recorded {
            return Err(MapError::CountMismatch {
                recorded,
                reachable,
            });
        }
        if recorded > buckets * LOAD_FACTOR {
            return Err(MapError::Overloaded {
                len: recorded,
                buckets,
            });
        }
        if let Some(hint) = self.first_hint.get() {
            let actual = self.scan_first();
            if hint != actual {
                return Err(MapError::StaleHint { hint, actual });
            }
        }
        Ok(())
    }
}

/// Hash map with separate chaining, a fixed 3:1 load factor and cursor
/// traversal in bucket order.
///
/// Keys must be unique. [`insert`](Self::insert) trusts the caller on this;
/// [`try_insert`](Self::try_insert), [`insert_unique`](Self::insert_unique)
/// and the slot operations check it.
pub struct ChainMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    chains: Chains<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for ChainMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.chains.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.entries.is_empty()
    }

    /// Length of the bucket array; 0 until the first insertion and after `clear`.
    pub fn bucket_count(&self) -> usize {
        self.chains.buckets.len()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drop every entry and release the bucket array.
    pub fn clear(&mut self) {
        let old = {
            let _g = self.reentrancy.enter("clear");
            if !self.chains.entries.is_empty() {
                log::debug!(
                    "clearing chain map: {} entries over {} buckets",
                    self.chains.entries.len(),
                    self.chains.buckets.len()
                );
            }
            core::mem::replace(&mut self.chains, Chains::new())
        };
        // K/V drops run on a map that is already empty and unlocked.
        drop(old);
    }

    /// Cursor positioned on the first entry in bucket order.
    pub fn cursor(&self) -> Cursor<'_, K, V, S> {
        Cursor::new(self)
    }

    /// Cursor starting at a bucket drawn from `rng` and wrapping around once.
    pub fn cursor_random<R: RngCore + ?Sized>(&self, rng: &mut R) -> Cursor<'_, K, V, S> {
        Cursor::with_rng(self, rng)
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self.cursor(), self.len())
    }

    pub fn iter_random<R: RngCore + ?Sized>(&self, rng: &mut R) -> Iter<'_, K, V, S> {
        Iter::new(self.cursor_random(rng), self.len())
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values::new(self.iter())
    }

    #[inline]
    pub(crate) fn bucket_head(&self, bucket: usize) -> Option<EntryKey> {
        self.chains.buckets.get(bucket).copied().flatten()
    }

    #[inline]
    pub(crate) fn entry(&self, k: EntryKey) -> Option<&Entry<K, V>> {
        self.chains.entries.get(k)
    }

    /// Index of the first occupied bucket, or `bucket_count()` when there is none.
    ///
    /// Cached until the next structural mutation.
    pub(crate) fn first_occupied_bucket(&self) -> usize {
        self.chains.first_occupied()
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            chains: Chains::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find<Q>(&self, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.chains.buckets.is_empty() {
            return None;
        }
        self.chains.find_hashed(self.make_hash(q), q)
    }

    /// Insert `key`, which must not already be present.
    ///
    /// A duplicate key is a precondition violation: debug builds panic, release
    /// builds link a second entry whose visiting order relative to the first is
    /// unspecified.
    pub fn insert(&mut self, key: K, value: V) {
        let _g = self.reentrancy.enter("insert");
        let hash = self.make_hash(&key);
        debug_assert!(
            self.chains.find_hashed(hash, &key).is_none(),
            "ChainMap::insert called with a key that is already present"
        );
        self.chains.link_new(hash, key, value);
    }

    /// Insert `key` only if absent. Returns whether the key was new.
    pub fn try_insert(&mut self, key: K, value: V) -> bool {
        let _g = self.reentrancy.enter("try_insert");
        let hash = self.make_hash(&key);
        if self.chains.find_hashed(hash, &key).is_some() {
            return false;
        }
        self.chains.link_new(hash, key, value);
        true
    }

    /// Checked insertion returning the new value's slot.
    pub fn insert_unique(&mut self, key: K, value: V) -> Result<&mut V, MapError> {
        let _g = self.reentrancy.enter("insert_unique");
        let hash = self.make_hash(&key);
        if self.chains.find_hashed(hash, &key).is_some() {
            return Err(MapError::DuplicateKey);
        }
        let k = self.chains.link_new(hash, key, value);
        Ok(&mut self.chains.entries[k].value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.find(q).is_some()
    }

    pub fn lookup<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("lookup");
        let k = self.find(q)?;
        self.chains.entries.get(k).map(|e| &e.value)
    }

    pub fn lookup_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("lookup_key_value");
        let k = self.find(q)?;
        self.chains.entries.get(k).map(|e| (&e.key, &e.value))
    }

    /// Stored value, or `V::default()` when absent.
    ///
    /// Cannot tell an absent key from a stored default; use [`lookup`](Self::lookup)
    /// when the default is a meaningful value.
    pub fn lookup_or_default<Q>(&self, q: &Q) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone + Default,
    {
        self.lookup(q).cloned().unwrap_or_default()
    }

    pub fn fetch<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(q).ok_or(MapError::MissingKey)
    }

    /// Stored value for a key the caller knows is present.
    ///
    /// # Panics
    ///
    /// Panics if the key is absent.
    pub fn get_or_fail<Q>(&self, q: &Q) -> &V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.fetch(q) {
            Ok(v) => v,
            Err(e) => panic!("ChainMap::get_or_fail: {e}"),
        }
    }

    /// Mutable access to a stored value without a second lookup.
    pub fn slot<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("slot");
        let k = self.find(q)?;
        self.chains.entries.get_mut(k).map(|e| &mut e.value)
    }

    /// Existing slot for `key`, or a new entry holding `default()`.
    ///
    /// Any growth happens before the returned reference is produced.
    pub fn slot_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("slot_or_insert_with");
        let hash = self.make_hash(&key);
        let k = match self.chains.find_hashed(hash, &key) {
            Some(k) => k,
            None => self.chains.link_new(hash, key, default()),
        };
        &mut self.chains.entries[k].value
    }

    pub fn slot_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.slot_or_insert_with(key, V::default)
    }

    /// Swap in `value` for a present key and return the previous value.
    ///
    /// Absent keys are left absent and `value` is dropped.
    pub fn replace<Q>(&mut self, q: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.slot(q).map(|slot| core::mem::replace(slot, value))
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Unlink the entry for `q` and return it. The bucket array never shrinks.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        if self.chains.buckets.is_empty() {
            return None;
        }
        let hash = self.make_hash(q);
        self.chains.unlink(hash, q)
    }

    /// Check the structural invariants of the table.
    pub fn validate(&self) -> Result<(), MapError> {
        let _g = self.reentrancy.enter("validate");
        self.chains.validate()
    }
}

impl<K, V, S> fmt::Debug for ChainMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
