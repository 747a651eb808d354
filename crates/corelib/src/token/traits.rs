//! Core token trait definitions.
//!
//! A token is a coordinate on the ring. The trait is deliberately minimal so
//! ownership checks can be written once against any fixed-width space.

use std::fmt::Debug;
use std::hash::Hash;

/// Minimal token trait for the identifier ring.
///
/// Tokens are immutable, comparable positions. Implementations must be
/// thread-safe and cheap to compare/hash.
pub trait Token: Copy + Ord + Hash + Send + Sync + Debug + 'static {
    /// Clockwise distance from `self` to `other` on the ring.
    fn distance_to(&self, other: &Self) -> Self;

    /// Half-open cyclic membership test: is `self` in `[start, end)`?
    ///
    /// When `start < end` the arc does not wrap. When `start >= end` it wraps
    /// past the maximum back to zero, and `start == end` covers the whole ring.
    fn in_arc(&self, start: &Self, end: &Self) -> bool {
        if start < end {
            start <= self && self < end
        } else {
            self >= start || self < end
        }
    }
}
