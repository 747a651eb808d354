//! Core library for the self-organizing ring key-value store.
//!
//! This crate holds everything a node needs to decide how the ring evolves,
//! with no I/O of its own:
//! - Identifier space (128-bit MD5 ranks) and cyclic ownership tests
//! - Node descriptors (address + rank)
//! - The protocol message vocabulary
//! - The ring membership and leader-election state machine
//! - An in-process topology that routes messages between cores

pub mod error;
pub mod message;
pub mod node;
pub mod ring;
pub mod token;
pub mod topology;

pub use error::{Error, Result};
pub use message::{Message, Response};
pub use node::NodeDescriptor;
pub use ring::RingCore;
pub use token::{hash, Rank, Token};
pub use topology::Topology;
