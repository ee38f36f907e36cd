//! Debug-only reentrancy guard.
//!
//! `ChainMap` calls into user code only through `K: Hash` and `K: Eq` while a
//! chain is being walked or relinked. A key implementation that reaches back
//! into the same map at that point would observe half-linked chains, so each
//! public entry point marks the map busy for its duration. In debug builds a
//! nested entry panics and names both operations; in release builds the guard
//! compiles away.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // The map is single-threaded; keep the guard !Send + !Sync as well.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark the map busy with `op` until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> BusyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrancy detected: `{op}` entered the map while `{outer}` was running");
            }
            self.active.set(Some(op));
            return BusyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return BusyGuard { _z: PhantomData };
        }
    }
}

pub(crate) struct BusyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
