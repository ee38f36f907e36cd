//! mesh-map: a single-threaded, separately chained hash map for mesh and
//! geometry code, with cursor traversal and a randomized-start mode.
//!
//! Internal Design:
//!
//! Summary
//! - ChainMap<K, V, S>: bucket array of chain heads over a `slotmap` arena of
//!   entries. Each entry links to the next entry of its chain by arena key,
//!   so resizing relinks entries instead of moving them, and `clear` is an
//!   arena reset.
//! - Cursor<'a, K, V, S>: positioned/exhausted traversal in bucket order,
//!   plus a randomized form that starts at a random bucket and wraps once.
//!   `Iter`, `Keys` and `Values` adapt it to `Iterator`.
//! - UnivMap<K, V>: typed view over a `ChainMap<Word, Word>` of opaque
//!   pointer-sized cells, hashed by identity. Keeps the legacy API where
//!   absence reads as the zero value.
//!
//! Growth policy
//! - The first insertion allocates 5 buckets. When an insertion would push the
//!   entry count above 3x the bucket count, the bucket array is resized to
//!   `(n - 1) * 5 + 3` first: 5, 23, 113, 563, ...
//! - Removal never shrinks the bucket array.
//!
//! Keys and values
//! - Keys must be unique. `insert` takes this on trust (checked by a
//!   `debug_assert!`); `try_insert`, `insert_unique` and the slot operations
//!   look the key up first.
//! - Each entry caches its `u64` hash; `K: Hash` never runs after insertion.
//! - The "value or zero" forms (`lookup_or_default`, `UnivMap::remove`,
//!   `UnivMap::replace`, `UnivMap::retrieve_or_zero`) cannot tell a stored zero
//!   from an absent key. `lookup`, `slot` and `contains_key` can.
//!
//! Traversal
//! - Each entry is visited exactly once per traversal; there is no order
//!   guarantee across keys. A randomized cursor visits the same entries as
//!   a standard one, rotated to start at a random bucket.
//! - Cursors and slots borrow the map, so it cannot be mutated while one is
//!   alive.
//!
//! Constraints
//! - Single-threaded: `ChainMap` is `!Send` and `!Sync`.
//! - Reentrancy: calling back into a map from `K: Hash`/`K: Eq` while it is
//!   walking a chain panics in debug builds.

pub mod chain_map;
mod chain_map_proptest;
pub mod cursor;
mod error;
mod reentrancy;
pub mod univ;
pub mod univ_map;

// Public surface
pub use chain_map::{grown_bucket_count, ChainMap, INITIAL_BUCKETS, LOAD_FACTOR};
pub use cursor::{Cursor, Iter, Keys, Values};
pub use error::MapError;
pub use univ::{Univ, Word, WordBuildHasher, WordHasher};
pub use univ_map::{Slot, UnivCursor, UnivIter, UnivMap};
