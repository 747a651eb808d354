//! Bounded in-memory value storage for ring nodes.
//!
//! A node only consults its store after the ring core has confirmed the key
//! falls in its arc. The store itself knows nothing about the ring; it only
//! enforces the per-value and aggregate size limits.

pub mod error;
pub mod memory;

pub use error::{Result, StorageError};
pub use memory::{StorageConfig, Store};
