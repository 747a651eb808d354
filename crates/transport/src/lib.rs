//! HTTP transport for ring nodes.
//!
//! Binds the pure [`ringkv_core::RingCore`] to the network:
//!
//! - [`codec`]: message ⇄ HTTP request encoding
//! - [`client`]: the [`Transport`] seam and its reqwest implementation
//! - [`queue`]: ordered, best-effort outbound delivery
//! - [`server`]: the axum server each node runs, including client storage
//!   routes
//!
//! # Example
//!
//! ```no_run
//! use ringkv_storage::Store;
//! use ringkv_transport::{NodeContext, NodeServer};
//! use std::sync::Arc;
//!
//! # async fn run() -> ringkv_transport::Result<()> {
//! let server = NodeServer::bind("127.0.0.1", 8000).await?;
//! let ctx = Arc::new(NodeContext::start(server.descriptor().clone(), Store::default())?);
//! server.serve(ctx, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod queue;
pub mod server;

pub use client::{HttpTransport, Transport};
pub use codec::{HttpRequest, HttpResponse, Method};
pub use error::{Result, TransportError};
pub use queue::MessageQueue;
pub use server::{router, NodeContext, NodeServer};
