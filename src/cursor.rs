//! Cursor traversal over a `ChainMap`, in bucket order.
//!
//! A cursor is either positioned on an entry or exhausted. Advancing walks
//! the current chain, then scans forward for the next occupied bucket. The
//! randomized form starts at a bucket drawn from a caller-supplied RNG and
//! wraps past the end of the bucket array, examining each bucket once.
//!
//! Cursors borrow the map, so the map cannot be mutated while one is open.

use crate::chain_map::{ChainMap, Entry, EntryKey};
use core::fmt;
use core::iter::FusedIterator;
use rand_core::RngCore;

pub struct Cursor<'a, K, V, S> {
    map: &'a ChainMap<K, V, S>,
    bucket: usize,
    current: Option<EntryKey>,
    // Buckets not yet examined, counting the current one.
    left: usize,
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    /// Cursor on the first entry of the first occupied bucket.
    pub fn new(map: &'a ChainMap<K, V, S>) -> Self {
        let buckets = map.bucket_count();
        let start = map.first_occupied_bucket();
        let mut cursor = Self {
            map,
            bucket: start,
            current: None,
            left: buckets - start,
        };
        cursor.seek();
        cursor
    }

    /// Cursor starting at a uniformly drawn bucket, wrapping around once.
    ///
    /// The set of entries visited is the same as for [`Cursor::new`]; only the
    /// rotation of the bucket order changes.
    pub fn with_rng<R: RngCore + ?Sized>(map: &'a ChainMap<K, V, S>, rng: &mut R) -> Self {
        let buckets = map.bucket_count();
        if buckets == 0 {
            return Self {
                map,
                bucket: 0,
                current: None,
                left: 0,
            };
        }
        let start = (rng.next_u64() % buckets as u64) as usize;
        let mut cursor = Self {
            map,
            bucket: start,
            current: None,
            left: buckets,
        };
        cursor.seek();
        cursor
    }

    /// Position on the head of the first occupied bucket at or after
    /// `self.bucket`, or become exhausted.
    fn seek(&mut self) {
        let buckets = self.map.bucket_count();
        while self.left > 0 {
            self.left -= 1;
            if let Some(head) = self.map.bucket_head(self.bucket) {
                self.current = Some(head);
                return;
            }
            self.bucket = (self.bucket + 1) % buckets;
        }
        self.current = None;
    }

    #[inline]
    fn current_entry(&self) -> Option<&'a Entry<K, V>> {
        let map: &'a ChainMap<K, V, S> = self.map;
        self.current.and_then(|k| map.entry(k))
    }

    /// Whether the cursor is positioned on an entry.
    #[inline]
    pub fn is_positioned(&self) -> bool {
        self.current.is_some()
    }

    /// Move to the next entry. Does nothing once exhausted.
    pub fn advance(&mut self) {
        let Some(entry) = self.current_entry() else {
            self.current = None;
            return;
        };
        match entry.next {
            Some(next) => self.current = Some(next),
            None => {
                self.bucket = (self.bucket + 1) % self.map.bucket_count();
                self.seek();
            }
        }
    }

    /// Current key and value, or `None` once exhausted.
    #[inline]
    pub fn get(&self) -> Option<(&'a K, &'a V)> {
        self.current_entry().map(|e| (&e.key, &e.value))
    }

    /// Current key and value.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn entry(&self) -> (&'a K, &'a V) {
        match self.get() {
            Some(kv) => kv,
            None => panic!("cursor dereferenced after it was exhausted"),
        }
    }

    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn key(&self) -> &'a K {
        self.entry().0
    }

    /// # Panics
    ///
    /// Panics if the cursor is exhausted.
    pub fn value(&self) -> &'a V {
        self.entry().1
    }

    /// Bucket the cursor is positioned in, or `None` once exhausted.
    pub fn bucket(&self) -> Option<usize> {
        self.current.map(|_| self.bucket)
    }
}

// Shallow copies are safe: a cursor owns nothing.
impl<K, V, S> Clone for Cursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            bucket: self.bucket,
            current: self.current,
            left: self.left,
        }
    }
}

impl<K, V, S> fmt::Debug for Cursor<'_, K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("bucket", &self.bucket)
            .field("entry", &self.get())
            .finish()
    }
}

/// Iterator over `(&K, &V)` driven by a [`Cursor`].
pub struct Iter<'a, K, V, S> {
    cursor: Cursor<'a, K, V, S>,
    remaining: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(cursor: Cursor<'a, K, V, S>, remaining: usize) -> Self {
        Self { cursor, remaining }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.get()?;
        self.cursor.advance();
        self.remaining = self.remaining.saturating_sub(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

pub struct Keys<'a, K, V, S> {
    it: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Keys<'a, K, V, S> {
    pub(crate) fn new(it: Iter<'a, K, V, S>) -> Self {
        Self { it }
    }
}

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Keys<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Keys<'_, K, V, S> {}

pub struct Values<'a, K, V, S> {
    it: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Values<'a, K, V, S> {
    pub(crate) fn new(it: Iter<'a, K, V, S>) -> Self {
        Self { it }
    }
}

impl<'a, K, V, S> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Values<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Values<'_, K, V, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::univ::WordBuildHasher;
    use crate::univ::Word;
    use rand_core::SeedableRng;
    use rand_pcg::Pcg64;
    use std::collections::BTreeSet;

    fn word_map(keys: impl IntoIterator<Item = usize>) -> ChainMap<Word, Word, WordBuildHasher> {
        let mut m = ChainMap::with_hasher(WordBuildHasher::default());
        for k in keys {
            m.insert(Word(k), Word(k * 10));
        }
        m
    }

    #[test]
    fn empty_map_cursor_is_exhausted() {
        let m = word_map([]);
        let mut c = m.cursor();
        assert!(!c.is_positioned());
        assert_eq!(c.get(), None);
        c.advance();
        assert!(!c.is_positioned());

        let mut rng = Pcg64::seed_from_u64(7);
        assert!(!m.cursor_random(&mut rng).is_positioned());
    }

    /// With identity hashing over 5 buckets, keys land in `k % 5`; the cursor
    /// walks buckets in index order and each chain newest-first.
    #[test]
    fn cursor_visits_buckets_in_order() {
        let m = word_map([3, 1, 6, 4]);
        assert_eq!(m.bucket_count(), 5);
        let mut c = m.cursor();
        let mut seen = Vec::new();
        while c.is_positioned() {
            seen.push((c.bucket().unwrap(), c.key().0));
            c.advance();
        }
        assert_eq!(seen, vec![(1, 6), (1, 1), (3, 3), (4, 4)]);
    }

    #[test]
    fn cursor_starts_at_first_occupied_bucket() {
        let m = word_map([4]);
        let c = m.cursor();
        assert_eq!(c.bucket(), Some(4));
        assert_eq!(c.entry(), (&Word(4), &Word(40)));
    }

    #[test]
    fn exhausted_cursor_reports_no_bucket() {
        let m = word_map([2, 4]);
        let mut c = m.cursor();
        assert_eq!(c.bucket(), Some(2));
        c.advance();
        assert_eq!(c.bucket(), Some(4));
        c.advance();
        assert!(!c.is_positioned());
        assert_eq!(c.bucket(), None);

        let empty: ChainMap<Word, Word, WordBuildHasher> =
            ChainMap::with_hasher(WordBuildHasher::default());
        assert_eq!(empty.cursor().bucket(), None);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn key_on_exhausted_cursor_panics() {
        let m = word_map([1]);
        let mut c = m.cursor();
        c.advance();
        let _ = c.key();
    }

    #[test]
    fn random_cursor_wraps_once_and_covers_everything() {
        let m = word_map(0..40);
        let expected: BTreeSet<usize> = (0..40).collect();
        for seed in 0..16 {
            let mut rng = Pcg64::seed_from_u64(seed);
            let mut c = m.cursor_random(&mut rng);
            let mut seen = Vec::new();
            while c.is_positioned() {
                seen.push(c.key().0);
                c.advance();
            }
            assert_eq!(seen.len(), 40, "seed {seed} visited an entry twice or missed one");
            assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
        }
    }

    #[test]
    fn random_cursor_rotates_bucket_order() {
        // One key per bucket: the visiting order is a rotation of 0..5.
        let m = word_map(0..5);
        let mut rng = Pcg64::seed_from_u64(3);
        let order: Vec<usize> = m.iter_random(&mut rng).map(|(k, _)| k.0).collect();
        let start = order[0];
        let rotated: Vec<usize> = (0..5).map(|i| (start + i) % 5).collect();
        assert_eq!(order, rotated);
    }

    #[test]
    fn iterators_report_exact_len() {
        let m = word_map(0..30);
        let it = m.iter();
        assert_eq!(it.len(), 30);
        assert_eq!(m.keys().count(), 30);
        let total: usize = m.values().map(|v| v.0).sum();
        assert_eq!(total, (0..30).map(|k| k * 10).sum());
    }

    #[test]
    fn cloned_cursor_advances_independently() {
        let m = word_map([0, 1]);
        let mut a = m.cursor();
        let b = a.clone();
        a.advance();
        assert_ne!(a.key(), b.key());
    }
}
