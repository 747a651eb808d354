//! In-process ring topology.
//!
//! [`Topology`] owns a set of [`RingCore`]s and routes messages between them
//! synchronously, delivering every emitted message depth-first before
//! returning. It is deterministic and single-threaded, which makes it the
//! natural way to drive whole-ring scenarios in tests and simulations
//! without a network.

use crate::error::{Error, Result};
use crate::message::{Message, Response};
use crate::node::NodeDescriptor;
use crate::ring::RingCore;
use crate::token::Rank;

/// A simulated network of ring nodes keyed by descriptor.
#[derive(Debug, Default)]
pub struct Topology {
    // Insertion order keeps delivery and iteration deterministic.
    cores: Vec<RingCore>,
    log: Vec<Message>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a core without joining it to anything.
    pub fn add(&mut self, core: RingCore) {
        self.cores.push(core);
    }

    /// Register a core and deliver `Join` for it through `via`.
    pub fn join(&mut self, core: RingCore, via: &NodeDescriptor) -> Result<Response> {
        let new_node = core.descriptor().clone();
        self.add(core);
        self.deliver(Message::Join {
            destination: via.clone(),
            new_node,
        })
    }

    /// Register a core and join it through the first registered node.
    ///
    /// The first core added this way simply becomes a one-node ring.
    pub fn join_any(&mut self, core: RingCore) -> Result<()> {
        match self.cores.first().map(|c| c.descriptor().clone()) {
            Some(via) => self.join(core, &via).map(|_| ()),
            None => {
                self.add(core);
                Ok(())
            }
        }
    }

    /// Deliver a message and, recursively, everything it causes.
    ///
    /// Returns the direct response of the first recipient.
    pub fn deliver(&mut self, message: Message) -> Result<Response> {
        let core = self.core_mut(message.destination())?;
        let response = core.handle(message.clone())?;
        self.log.push(message);

        for next in response.outgoing().to_vec() {
            self.deliver(next)?;
        }
        Ok(response)
    }

    /// Gracefully remove a node: deliver its `Shutdown` and drop it.
    pub fn shutdown(&mut self, node: &NodeDescriptor) -> Result<RingCore> {
        self.deliver(Message::Shutdown {
            destination: node.clone(),
        })?;
        let index = self.index_of(node)?;
        Ok(self.cores.remove(index))
    }

    pub fn core(&self, node: &NodeDescriptor) -> Option<&RingCore> {
        self.cores.iter().find(|c| c.descriptor() == node)
    }

    pub fn cores(&self) -> impl Iterator<Item = &RingCore> {
        self.cores.iter()
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    /// Every message delivered so far, in delivery order.
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Follow successor pointers from `start` until the walk returns to
    /// `start`, hits a node with no successor, or exceeds the ring size.
    pub fn walk_successors(&self, start: &NodeDescriptor) -> Vec<NodeDescriptor> {
        let mut walk = vec![start.clone()];
        let mut current = start.clone();

        while walk.len() <= self.cores.len() {
            let Some(next) = self.core(&current).and_then(|c| c.successor()) else {
                break;
            };
            if next == start {
                break;
            }
            walk.push(next.clone());
            current = next.clone();
        }
        walk
    }

    /// Every node that claims responsibility for `rank`.
    ///
    /// On a settled ring this is exactly one node.
    pub fn owners_of(&self, rank: Rank) -> Vec<&NodeDescriptor> {
        self.cores
            .iter()
            .filter(|c| c.responsible_for_hash(rank))
            .map(|c| c.descriptor())
            .collect()
    }

    fn index_of(&self, node: &NodeDescriptor) -> Result<usize> {
        self.cores
            .iter()
            .position(|c| c.descriptor() == node)
            .ok_or_else(|| Error::UnknownNode(node.clone()))
    }

    fn core_mut(&mut self, node: &NodeDescriptor) -> Result<&mut RingCore> {
        let index = self.index_of(node)?;
        Ok(&mut self.cores[index])
    }
}
