//! Inbound side of the transport: the HTTP server a node runs.
//!
//! Ring protocol requests are decoded with the [codec](crate::codec) and
//! handed to the node's [`RingCore`]; whatever the core emits goes to the
//! outbound [`MessageQueue`]. Client storage requests under `/storage/` are
//! answered from the local [`Store`] when this node owns the key and are
//! otherwise relayed to the successor.

use crate::client::{HttpTransport, HOPS_HEADER};
use crate::codec::{self, HttpRequest, Method};
use crate::error::{Result, TransportError};
use crate::queue::MessageQueue;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{self, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response as HttpReply};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use ringkv_core::{Message, NodeDescriptor, Response, RingCore};
use ringkv_storage::Store;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A storage request is dropped after visiting this many nodes.
pub const MAX_FORWARD_HOPS: u32 = 32;

/// Everything one running node owns, shared by all request handlers.
pub struct NodeContext {
    descriptor: NodeDescriptor,
    core: Mutex<RingCore>,
    store: Store,
    queue: MessageQueue,
    client: HttpTransport,
}

impl NodeContext {
    pub fn new(
        descriptor: NodeDescriptor,
        store: Store,
        queue: MessageQueue,
        client: HttpTransport,
    ) -> Self {
        Self {
            core: Mutex::new(RingCore::new(descriptor.clone())),
            descriptor,
            store,
            queue,
            client,
        }
    }

    /// Build a context whose queue delivers over its own HTTP client.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(descriptor: NodeDescriptor, store: Store) -> Result<Self> {
        let client = HttpTransport::new()?;
        let queue = MessageQueue::start(Arc::new(client.clone()));
        Ok(Self::new(descriptor, store, queue, client))
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    /// Copy of the current ring state.
    pub fn snapshot(&self) -> RingCore {
        self.core.lock().clone()
    }

    /// Apply a message to the core and queue what it emits.
    ///
    /// Follow-up messages are queued before the core is unlocked, so the
    /// queue sees them in the order the core produced them. The new state is
    /// only kept once its messages are queued; if they cannot be queued the
    /// call fails and the core is unchanged.
    pub fn handle(&self, message: Message) -> Result<Response> {
        let kind = message.kind();
        let response = {
            let mut core = self.core.lock();
            let mut next = core.clone();
            let response = next.handle(message)?;
            if !response.outgoing().is_empty() {
                self.queue.submit_all(response.outgoing().iter().cloned())?;
            }
            *core = next;
            response
        };

        metrics::counter!("ringkv_messages_handled_total", "kind" => kind).increment(1);
        Ok(response)
    }

    /// `None` when this node owns `key`, otherwise the node to forward to.
    pub fn route_for_key(&self, key: &str) -> Option<NodeDescriptor> {
        let core = self.core.lock();
        if core.responsible_for_key(key) {
            None
        } else {
            core.successor().cloned()
        }
    }

    /// Leave the ring: splice this node out, then flush the queue.
    pub async fn leave(&self) -> Result<()> {
        tracing::info!(node = %self.descriptor, "leaving ring");
        self.handle(Message::Shutdown {
            destination: self.descriptor.clone(),
        })?;
        self.queue.stop().await;
        Ok(())
    }
}

/// Router serving both the ring protocol and client storage requests.
pub fn router(ctx: Arc<NodeContext>) -> Router {
    Router::new()
        .route("/storage/*key", get(get_value).put(put_value))
        .fallback(handle_protocol)
        .with_state(ctx)
}

async fn handle_protocol(
    State(ctx): State<Arc<NodeContext>>,
    method: http::Method,
    uri: Uri,
    body: String,
) -> std::result::Result<HttpReply, TransportError> {
    tracing::debug!(%method, path = uri.path(), "receiving request");

    let method = Method::from_http(&method).ok_or_else(|| TransportError::UnrecognizedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
    })?;
    let request = HttpRequest::new(ctx.descriptor.clone(), method, uri.path(), body);
    let message = codec::parse_request(&request)?;
    let response = ctx.handle(message)?;

    let reply = codec::build_response(&response);
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, reply.body).into_response())
}

async fn get_value(
    State(ctx): State<Arc<NodeContext>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> std::result::Result<HttpReply, TransportError> {
    let Some(next) = ctx.route_for_key(&key) else {
        return Ok(match ctx.store.get(&key) {
            Some(value) => (StatusCode::OK, value).into_response(),
            None => (StatusCode::NOT_FOUND, "Key not found").into_response(),
        });
    };

    let hops = next_hop_count(&headers)?;
    tracing::debug!(%key, %next, hops, "forwarding get");
    let (status, body) = ctx.client.get_value(&next, &key, hops).await?;
    Ok(relay(status, body))
}

async fn put_value(
    State(ctx): State<Arc<NodeContext>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    value: Bytes,
) -> std::result::Result<HttpReply, TransportError> {
    // Refuse bad values here rather than carrying them around the ring.
    ctx.store.config().check_value(&value)?;

    let Some(next) = ctx.route_for_key(&key) else {
        ctx.store.put(key, value)?;
        return Ok(StatusCode::OK.into_response());
    };

    let hops = next_hop_count(&headers)?;
    tracing::debug!(%key, %next, hops, "forwarding put");
    let (status, body) = ctx.client.put_value(&next, &key, value, hops).await?;
    Ok(relay(status, body))
}

/// Hop count to send along with a forwarded request.
fn next_hop_count(headers: &HeaderMap) -> Result<u32> {
    let hops = headers
        .get(HOPS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);
    if hops >= MAX_FORWARD_HOPS {
        return Err(TransportError::ForwardLimit(hops));
    }
    Ok(hops + 1)
}

fn relay(status: u16, body: Bytes) -> HttpReply {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, body).into_response()
}

/// A bound listener waiting to serve a node.
pub struct NodeServer {
    listener: TcpListener,
    descriptor: NodeDescriptor,
}

impl NodeServer {
    /// Bind `host:port`. Port 0 picks a free port, which the descriptor
    /// then reports.
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port)).await?;
        let port = listener.local_addr()?.port();
        let descriptor = NodeDescriptor::new(host, port);
        tracing::info!(node = %descriptor, "listening");
        Ok(Self {
            listener,
            descriptor,
        })
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` completes.
    pub async fn serve<F>(self, ctx: Arc<NodeContext>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, router(ctx))
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!(node = %self.descriptor, "server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_hop_count_starts_at_one() {
        assert_eq!(next_hop_count(&HeaderMap::new()).unwrap(), 1);
    }

    #[test]
    fn test_hop_count_increments() {
        let mut headers = HeaderMap::new();
        headers.insert(HOPS_HEADER, HeaderValue::from(5u32));
        assert_eq!(next_hop_count(&headers).unwrap(), 6);
    }

    #[test]
    fn test_hop_count_limit() {
        let mut headers = HeaderMap::new();
        headers.insert(HOPS_HEADER, HeaderValue::from(MAX_FORWARD_HOPS));
        assert!(matches!(
            next_hop_count(&headers),
            Err(TransportError::ForwardLimit(MAX_FORWARD_HOPS))
        ));
    }

    fn local_context(port: u16) -> NodeContext {
        NodeContext::start(NodeDescriptor::new("127.0.0.1", port), Store::default()).unwrap()
    }

    #[tokio::test]
    async fn test_sole_node_owns_every_key() {
        let ctx = local_context(8000);
        assert_eq!(ctx.route_for_key("books"), None);
        assert!(ctx.snapshot().is_sole_member());
        ctx.queue().stop().await;
    }

    #[tokio::test]
    async fn test_handle_rejects_misdirected_message() {
        let ctx = local_context(8000);
        let err = ctx
            .handle(Message::GetLeader {
                destination: NodeDescriptor::new("127.0.0.1", 8001),
            })
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        ctx.queue().stop().await;
    }

    #[tokio::test]
    async fn test_handle_after_queue_stopped_leaves_state_unchanged() {
        let ctx = local_context(8000);
        ctx.queue().stop().await;

        // A join would emit JoinAccepted, which can no longer be queued
        let result = ctx.handle(Message::Join {
            destination: ctx.descriptor().clone(),
            new_node: NodeDescriptor::new("127.0.0.1", 8001),
        });
        assert!(matches!(result, Err(TransportError::QueueClosed)));

        let core = ctx.snapshot();
        assert!(core.is_sole_member());
        assert_eq!(core.predecessor(), None);
        assert_eq!(core.leader(), ctx.descriptor());
    }

    #[tokio::test]
    async fn test_queries_still_answer_after_queue_stopped() {
        let ctx = local_context(8000);
        ctx.queue().stop().await;

        let response = ctx
            .handle(Message::GetLeader {
                destination: ctx.descriptor().clone(),
            })
            .unwrap();
        assert_eq!(response.node_list(), Some(&[ctx.descriptor().clone()][..]));
    }
}
