//! UnivMap: typed view over a `ChainMap` of opaque words.
//!
//! Keys and values are stored as [`Word`]s and hashed by identity, so one
//! table engine serves every `Univ` key/value pair. This layer keeps the
//! legacy contract where absence is reported as the zero value: `remove`,
//! `replace` and `retrieve_or_zero` cannot tell a stored zero from a missing
//! key. `retrieve`, `slot` and `contains` are the unambiguous forms.

use crate::chain_map::ChainMap;
use crate::cursor::{Cursor, Iter};
use crate::error::MapError;
use crate::univ::{Univ, Word, WordBuildHasher};
use core::fmt;
use core::marker::PhantomData;
use rand_core::RngCore;

type WordMap = ChainMap<Word, Word, WordBuildHasher>;

pub struct UnivMap<K, V> {
    table: WordMap,
    _pd: PhantomData<fn(K, V) -> (K, V)>,
}

impl<K: Univ, V: Univ> UnivMap<K, V> {
    pub fn new() -> Self {
        Self {
            table: ChainMap::with_hasher(WordBuildHasher::default()),
            _pd: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Insert a key that must not already be present.
    pub fn enter(&mut self, k: K, v: V) {
        self.table.insert(k.encode(), v.encode());
    }

    /// Insert only if absent; returns whether the key was new.
    pub fn try_enter(&mut self, k: K, v: V) -> bool {
        self.table.try_insert(k.encode(), v.encode())
    }

    pub fn contains(&self, k: K) -> bool {
        self.table.contains_key(&k.encode())
    }

    pub fn retrieve(&self, k: K) -> Option<V> {
        self.table.lookup(&k.encode()).map(|&w| V::decode(w))
    }

    /// Stored value, or zero when absent (ambiguous with a stored zero).
    pub fn retrieve_or_zero(&self, k: K) -> V {
        self.retrieve(k).unwrap_or_else(V::zero)
    }

    /// # Panics
    ///
    /// Panics if `k` is absent.
    pub fn get(&self, k: K) -> V {
        V::decode(*self.table.get_or_fail(&k.encode()))
    }

    pub fn fetch(&self, k: K) -> Result<V, MapError> {
        self.table.fetch(&k.encode()).map(|&w| V::decode(w))
    }

    /// Remove `k` and return its value, or zero when absent.
    pub fn remove(&mut self, k: K) -> V {
        self.table
            .remove(&k.encode())
            .map_or_else(V::zero, V::decode)
    }

    /// Replace the value of a present key and return the old one; zero and no
    /// insertion when absent.
    pub fn replace(&mut self, k: K, v: V) -> V {
        self.table
            .replace(&k.encode(), v.encode())
            .map_or_else(V::zero, V::decode)
    }

    pub fn slot(&mut self, k: K) -> Option<Slot<'_, V>> {
        self.table.slot(&k.encode()).map(Slot::new)
    }

    /// Slot for `k`, entering it with the zero value first if absent.
    pub fn slot_or_enter(&mut self, k: K) -> Slot<'_, V> {
        Slot::new(self.table.slot_or_insert_default(k.encode()))
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn validate(&self) -> Result<(), MapError> {
        self.table.validate()
    }

    pub fn cursor(&self) -> UnivCursor<'_, K, V> {
        UnivCursor::new(self.table.cursor())
    }

    pub fn cursor_random<R: RngCore + ?Sized>(&self, rng: &mut R) -> UnivCursor<'_, K, V> {
        UnivCursor::new(self.table.cursor_random(rng))
    }

    pub fn iter(&self) -> UnivIter<'_, K, V> {
        UnivIter {
            it: self.table.iter(),
            _pd: PhantomData,
        }
    }

    pub fn iter_random<R: RngCore + ?Sized>(&self, rng: &mut R) -> UnivIter<'_, K, V> {
        UnivIter {
            it: self.table.iter_random(rng),
            _pd: PhantomData,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Univ, V: Univ> Default for UnivMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for UnivMap<K, V>
where
    K: Univ + fmt::Debug,
    V: Univ + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Typed handle to one stored value, valid until the map is next mutated.
pub struct Slot<'a, V> {
    cell: &'a mut Word,
    _pd: PhantomData<fn(V) -> V>,
}

impl<'a, V: Univ> Slot<'a, V> {
    fn new(cell: &'a mut Word) -> Self {
        Self {
            cell,
            _pd: PhantomData,
        }
    }

    pub fn get(&self) -> V {
        V::decode(*self.cell)
    }

    pub fn set(&mut self, v: V) {
        *self.cell = v.encode();
    }

    pub fn replace(&mut self, v: V) -> V {
        V::decode(core::mem::replace(self.cell, v.encode()))
    }
}

/// Typed [`Cursor`] yielding decoded keys and values.
pub struct UnivCursor<'a, K, V> {
    inner: Cursor<'a, Word, Word, WordBuildHasher>,
    _pd: PhantomData<fn() -> (K, V)>,
}

impl<'a, K: Univ, V: Univ> UnivCursor<'a, K, V> {
    fn new(inner: Cursor<'a, Word, Word, WordBuildHasher>) -> Self {
        Self {
            inner,
            _pd: PhantomData,
        }
    }

    pub fn is_positioned(&self) -> bool {
        self.inner.is_positioned()
    }

    pub fn advance(&mut self) {
        self.inner.advance();
    }

    pub fn get(&self) -> Option<(K, V)> {
        self.inner
            .get()
            .map(|(&k, &v)| (K::decode(k), V::decode(v)))
    }

    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn key(&self) -> K {
        K::decode(*self.inner.key())
    }

    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn value(&self) -> V {
        V::decode(*self.inner.value())
    }
}

pub struct UnivIter<'a, K, V> {
    it: Iter<'a, Word, Word, WordBuildHasher>,
    _pd: PhantomData<fn() -> (K, V)>,
}

impl<K: Univ, V: Univ> Iterator for UnivIter<'_, K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(&k, &v)| (K::decode(k), V::decode(v)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K: Univ, V: Univ> ExactSizeIterator for UnivIter<'_, K, V> {}
