//! Identifier space for the ring.
//!
//! Nodes and keys share one 128-bit coordinate space. Tokens must be
//! comparable, hashable, and thread-safe; comparisons across the wrap point
//! go through [`Token::in_arc`].

pub mod rank;
pub mod traits;

pub use rank::Rank;
pub use traits::Token;

/// Map arbitrary bytes to a ring position.
#[inline]
pub fn hash(bytes: impl AsRef<[u8]>) -> Rank {
    Rank::of(bytes)
}
