//! Errors reported by the checked map operations and by `validate`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("key is already present in the map")]
    DuplicateKey,

    #[error("key is not present in the map")]
    MissingKey,

    #[error("map records {recorded} entries but {reachable} are reachable from its buckets")]
    CountMismatch { recorded: usize, reachable: usize },

    #[error("entry linked in bucket {bucket} hashes to bucket {expected}")]
    MisplacedEntry { bucket: usize, expected: usize },

    #[error("{len} entries exceed the load factor of {buckets} buckets")]
    Overloaded { len: usize, buckets: usize },

    #[error("first-bucket hint is {hint} but the first occupied bucket is {actual}")]
    StaleHint { hint: usize, actual: usize },

    #[error("chain in bucket {bucket} links to a removed entry")]
    DanglingLink { bucket: usize },
}
