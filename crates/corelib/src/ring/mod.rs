//! Ring membership and leadership.
//!
//! The ring is not stored anywhere as a whole: every node only knows its two
//! neighbours and its leader, and the protocol in [`state`] keeps those
//! local views consistent with each other.

pub mod state;

pub use state::RingCore;
