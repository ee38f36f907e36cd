//! Pointer-sized opaque cells and the per-type coercions into them.
//!
//! A [`Word`] holds any scalar or pointer that fits in a `usize`. Types opt in
//! through [`Univ`], whose only law is `T::decode(x.encode()) == x`. The zero
//! word decodes to each type's zero (0, `false`, `'\0'`, null), which is what
//! the legacy "value or zero" operations of [`UnivMap`](crate::UnivMap)
//! return for absent keys. Values wider than a pointer do not fit and must be
//! stored behind a pointer or kept in a generic [`ChainMap`](crate::ChainMap).

use core::hash::{BuildHasherDefault, Hasher};
use core::ptr::NonNull;

/// Opaque pointer-sized cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(pub usize);

impl Word {
    pub const ZERO: Word = Word(0);

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Coercion of a `Copy` type to and from a [`Word`].
pub trait Univ: Copy {
    fn encode(self) -> Word;
    fn decode(w: Word) -> Self;

    /// The value the zero word decodes to.
    #[inline]
    fn zero() -> Self {
        Self::decode(Word::ZERO)
    }
}

impl Univ for Word {
    #[inline]
    fn encode(self) -> Word {
        self
    }
    #[inline]
    fn decode(w: Word) -> Self {
        w
    }
}

macro_rules! univ_unsigned {
    ($($t:ty),*) => {$(
        impl Univ for $t {
            #[inline]
            fn encode(self) -> Word {
                Word(self as usize)
            }
            #[inline]
            fn decode(w: Word) -> Self {
                w.0 as $t
            }
        }
    )*};
}

// Sign-extend through isize so negative values survive the trip.
macro_rules! univ_signed {
    ($($t:ty),*) => {$(
        impl Univ for $t {
            #[inline]
            fn encode(self) -> Word {
                Word(self as isize as usize)
            }
            #[inline]
            fn decode(w: Word) -> Self {
                w.0 as isize as $t
            }
        }
    )*};
}

univ_unsigned!(u8, u16, usize);
univ_signed!(i8, i16, isize);

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
univ_unsigned!(u32);
#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
univ_signed!(i32);

#[cfg(target_pointer_width = "64")]
univ_unsigned!(u64);
#[cfg(target_pointer_width = "64")]
univ_signed!(i64);

impl Univ for bool {
    #[inline]
    fn encode(self) -> Word {
        Word(self as usize)
    }
    #[inline]
    fn decode(w: Word) -> Self {
        w.0 != 0
    }
}

impl Univ for char {
    #[inline]
    fn encode(self) -> Word {
        Word(self as usize)
    }
    /// Words that are not a scalar value decode to `'\0'`.
    #[inline]
    fn decode(w: Word) -> Self {
        u32::try_from(w.0)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\0')
    }
}

impl<T> Univ for *const T {
    #[inline]
    fn encode(self) -> Word {
        Word(self as usize)
    }
    #[inline]
    fn decode(w: Word) -> Self {
        w.0 as *const T
    }
}

impl<T> Univ for *mut T {
    #[inline]
    fn encode(self) -> Word {
        Word(self as usize)
    }
    #[inline]
    fn decode(w: Word) -> Self {
        w.0 as *mut T
    }
}

impl<T> Univ for Option<NonNull<T>> {
    #[inline]
    fn encode(self) -> Word {
        Word(self.map_or(0, |p| p.as_ptr() as usize))
    }
    #[inline]
    fn decode(w: Word) -> Self {
        NonNull::new(w.0 as *mut T)
    }
}

/// Identity hasher for [`Word`] keys: a key lands in bucket
/// `key % bucket_count`.
///
/// Identity applies only when a single `write_usize` is the whole input.
/// Anything written after it, and any other input, is folded FNV-1a style into
/// the running state, so composite keys such as `(usize, usize)` still spread.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordHasher {
    state: u64,
    started: bool,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl WordHasher {
    #[inline]
    fn fold(&mut self, bytes: &[u8]) {
        let mut h = if self.started { self.state } else { FNV_OFFSET };
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(FNV_PRIME);
        }
        self.state = h;
        self.started = true;
    }
}

impl Hasher for WordHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        self.fold(bytes);
    }

    #[inline]
    fn write_usize(&mut self, n: usize) {
        if self.started {
            self.fold(&n.to_ne_bytes());
        } else {
            self.state = n as u64;
            self.started = true;
        }
    }
}

pub type WordBuildHasher = BuildHasherDefault<WordHasher>;
