//! Payload element kinds and their tag/sentinel encoding.
//!
//! This module provides the [`Element`] trait, a sealed trait over the two
//! element datatypes the harness scatters: a real 32-bit integer and a
//! double-precision complex pair. Every element of a generated payload
//! either carries the tag of the rank that owns it or the sentinel value
//! marking a gap / never-written cell.
//!
//! # Supported Types
//!
//! | Rust Type   | Tag for rank `r`       | Sentinel     |
//! |-------------|------------------------|--------------|
//! | `i32`       | `r + 1`                | `-1`         |
//! | `Complex64` | `(r + 1) + (r + 1)i`   | `-1 - 1i`    |

use num_complex::Complex64;

/// Internal module to seal the trait — prevents external implementations.
mod sealed {
    pub trait Sealed {}
}

/// Trait for element types that can flow through the harness.
///
/// This is a **sealed trait** — it cannot be implemented outside this crate.
/// The generation and verification algorithms are generic over this trait so
/// the integer and complex paths cannot diverge.
pub trait Element:
    sealed::Sealed + Copy + PartialEq + Send + Sync + std::fmt::Debug + 'static
{
    /// Short datatype name used in report lines.
    const NAME: &'static str;

    /// The tag value encoding ownership by `rank`.
    fn tag(rank: i32) -> Self;

    /// The sentinel value, distinguishable from every valid tag.
    fn sentinel() -> Self;

    /// Exact comparison against an expected value.
    fn matches(self, expected: Self) -> bool;

    /// Size of one element in bytes.
    fn size_of() -> usize {
        std::mem::size_of::<Self>()
    }
}

impl sealed::Sealed for i32 {}
impl Element for i32 {
    const NAME: &'static str = "i32";

    fn tag(rank: i32) -> Self {
        1 + rank
    }

    fn sentinel() -> Self {
        -1
    }

    fn matches(self, expected: Self) -> bool {
        self == expected
    }
}

impl sealed::Sealed for Complex64 {}
impl Element for Complex64 {
    const NAME: &'static str = "Complex64";

    fn tag(rank: i32) -> Self {
        let t = f64::from(1 + rank);
        Complex64::new(t, t)
    }

    fn sentinel() -> Self {
        Complex64::new(-1.0, -1.0)
    }

    /// Tags are small whole numbers, so exact pairwise equality is the
    /// correct comparison here (no tolerance).
    fn matches(self, expected: Self) -> bool {
        self.re == expected.re && self.im == expected.im
    }
}
