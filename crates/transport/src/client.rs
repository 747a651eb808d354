//! Outbound side of the transport: turning messages into HTTP calls.

use crate::codec::{build_request, parse_node_list, HttpRequest};
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use ringkv_core::{Message, NodeDescriptor};
use std::time::Duration;

/// Default per-request timeout for peer calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header counting how many nodes a storage request has already visited.
pub const HOPS_HEADER: &str = "x-ringkv-hops";

/// Delivers messages to their destination node.
///
/// The ring core never calls this directly; emitted messages go through the
/// [`MessageQueue`](crate::queue::MessageQueue), which owns a transport.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Deliver a message and wait for the peer to accept it.
    async fn send(&self, message: &Message) -> Result<()>;

    /// Deliver a query message and decode the node list it returns.
    async fn query(&self, message: &Message) -> Result<Vec<NodeDescriptor>>;
}

/// [`Transport`] over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Perform a protocol request and return the response body.
    ///
    /// The body is always read, even when the caller discards it.
    pub async fn execute(&self, request: HttpRequest) -> Result<String> {
        tracing::trace!(
            method = %request.method,
            url = %request.url(),
            "sending request"
        );
        let response = self
            .client
            .request(request.method.into(), request.url())
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                destination: request.destination,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Fetch a stored value from `node`, relaying its status and body.
    pub async fn get_value(
        &self,
        node: &NodeDescriptor,
        key: &str,
        hops: u32,
    ) -> Result<(u16, Bytes)> {
        let response = self
            .client
            .get(storage_url(node, key)?)
            .header(HOPS_HEADER, hops)
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.bytes().await?))
    }

    /// Store a value on `node`, relaying its status and body.
    pub async fn put_value(
        &self,
        node: &NodeDescriptor,
        key: &str,
        value: Bytes,
        hops: u32,
    ) -> Result<(u16, Bytes)> {
        let response = self
            .client
            .put(storage_url(node, key)?)
            .header(HOPS_HEADER, hops)
            .body(value)
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.bytes().await?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, message: &Message) -> Result<()> {
        self.execute(build_request(message)).await.map(|_| ())
    }

    async fn query(&self, message: &Message) -> Result<Vec<NodeDescriptor>> {
        let body = self.execute(build_request(message)).await?;
        parse_node_list(&body)
    }
}

/// `http://node/storage/<key>` with the key percent-encoded as one segment.
pub fn storage_url(node: &NodeDescriptor, key: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("http://{}/storage", node))
        .map_err(|e| TransportError::Malformed(format!("bad node address {}: {}", node, e)))?;
    url.path_segments_mut()
        .map_err(|_| TransportError::Malformed(format!("bad node address {}", node)))?
        .push(key);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url_encodes_key_as_one_segment() {
        let node = NodeDescriptor::new("localhost", 8000);
        assert_eq!(
            storage_url(&node, "books").unwrap().as_str(),
            "http://localhost:8000/storage/books"
        );
        assert_eq!(
            storage_url(&node, "a/b c").unwrap().as_str(),
            "http://localhost:8000/storage/a%2Fb%20c"
        );
    }
}
