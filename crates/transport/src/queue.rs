//! Outbound message queue.
//!
//! Messages emitted by the ring core are handed to a single background
//! worker so that handling an inbound request never waits on a peer. One
//! worker consuming one channel keeps messages in submission order, which in
//! particular preserves the order per destination.
//!
//! Delivery is best effort: a failed send is logged and counted, never
//! retried. The protocol heals what it can through later traffic.

use crate::client::Transport;
use crate::error::{Result, TransportError};
use parking_lot::Mutex;
use ringkv_core::Message;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to the outbound worker.
pub struct MessageQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MessageQueue {
    /// Spawn the worker on the current tokio runtime.
    pub fn start(transport: Arc<dyn Transport>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(transport, receiver));
        tracing::debug!("started outbound message queue");

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue a message. Never blocks.
    pub fn submit(&self, message: Message) -> Result<()> {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(TransportError::QueueClosed)?;
        sender
            .send(message)
            .map_err(|_| TransportError::QueueClosed)
    }

    /// Enqueue a batch: either every message is queued or, once the queue
    /// is stopped, none is.
    pub fn submit_all(&self, messages: impl IntoIterator<Item = Message>) -> Result<()> {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(TransportError::QueueClosed)?;
        // The worker holds the receiver until every sender is gone, and this
        // sender cannot be dropped while its lock is held.
        messages
            .into_iter()
            .try_for_each(|m| sender.send(m).map_err(|_| TransportError::QueueClosed))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Stop accepting messages, wait for everything already queued to be
    /// sent, then end the worker.
    pub async fn stop(&self) {
        tracing::debug!("stopping message queue after empty...");
        self.sender.lock().take();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "outbound worker panicked");
            }
        }
        tracing::debug!("message queue empty, shut down");
    }
}

async fn run(transport: Arc<dyn Transport>, mut receiver: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = receiver.recv().await {
        let kind = message.kind();
        match transport.send(&message).await {
            Ok(()) => {
                tracing::debug!(destination = %message.destination(), kind, "delivered message");
                metrics::counter!("ringkv_outbound_sent_total", "kind" => kind).increment(1);
            }
            Err(e) => {
                tracing::warn!(
                    destination = %message.destination(),
                    kind,
                    error = %e,
                    "failed to deliver message"
                );
                metrics::counter!("ringkv_outbound_failed_total", "kind" => kind).increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ringkv_core::NodeDescriptor;
    use std::time::Duration;

    /// Records every message; fails for one unreachable port.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Message>>,
    }

    const UNREACHABLE: u16 = 9999;

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, message: &Message) -> Result<()> {
            // Slow peer: the queue must not hold up submitters.
            tokio::time::sleep(Duration::from_millis(5)).await;
            if message.destination().port() == UNREACHABLE {
                return Err(TransportError::Malformed("unreachable".into()));
            }
            self.sent.lock().push(message.clone());
            Ok(())
        }

        async fn query(&self, _message: &Message) -> Result<Vec<NodeDescriptor>> {
            Ok(vec![])
        }
    }

    fn leader_query(port: u16) -> Message {
        Message::GetLeader {
            destination: NodeDescriptor::new("localhost", port),
        }
    }

    #[tokio::test]
    async fn test_delivers_in_submission_order() {
        let transport = Arc::new(RecordingTransport::default());
        let queue = MessageQueue::start(transport.clone());

        let messages: Vec<_> = (8000..8010).map(leader_query).collect();
        queue.submit_all(messages.clone()).unwrap();
        queue.stop().await;

        assert_eq!(*transport.sent.lock(), messages);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_worker() {
        let transport = Arc::new(RecordingTransport::default());
        let queue = MessageQueue::start(transport.clone());

        queue.submit(leader_query(8000)).unwrap();
        queue.submit(leader_query(UNREACHABLE)).unwrap();
        queue.submit(leader_query(8001)).unwrap();
        queue.stop().await;

        assert_eq!(*transport.sent.lock(), vec![leader_query(8000), leader_query(8001)]);
    }

    #[tokio::test]
    async fn test_submit_after_stop_fails() {
        let queue = MessageQueue::start(Arc::new(RecordingTransport::default()));
        queue.stop().await;

        assert!(queue.is_closed());
        assert!(matches!(
            queue.submit(leader_query(8000)),
            Err(TransportError::QueueClosed)
        ));
        assert!(matches!(
            queue.submit_all(vec![leader_query(8000), leader_query(8001)]),
            Err(TransportError::QueueClosed)
        ));
        // Stopping twice is harmless.
        queue.stop().await;
    }
}
