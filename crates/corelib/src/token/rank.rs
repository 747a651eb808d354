//! MD5-derived 128-bit rank.

use crate::token::traits::Token;
use std::fmt;

/// A position in the 128-bit identifier space.
///
/// Ranks are produced by hashing a byte string with MD5 and reading the
/// 16-byte digest as a big-endian unsigned integer, so the same input yields
/// the same rank in any implementation that follows the same rule.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Rank(pub u128);

impl Rank {
    /// Hash arbitrary bytes onto the ring.
    ///
    /// # Example
    /// ```rust
    /// use ringkv_core::token::Rank;
    ///
    /// let rank = Rank::of(b"127.0.0.1:8000");
    /// assert_eq!(rank.0, 102808487155392830909659332955855849052);
    /// ```
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        let digest = md5::compute(bytes.as_ref());
        Rank(u128::from_be_bytes(digest.0))
    }

    /// Raw integer value.
    #[inline]
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Token for Rank {
    fn distance_to(&self, other: &Self) -> Self {
        Rank(other.0.wrapping_sub(self.0))
    }
}

impl From<u128> for Rank {
    fn from(value: u128) -> Self {
        Rank(value)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
