//! Ring membership and leader-election state machine.
//!
//! # Model
//!
//! Each node keeps three pointers: its successor, its predecessor and the
//! leader it currently believes in. A node owns the half-open arc from its
//! own rank up to its successor's rank, wrapping past the maximum when the
//! successor sits "behind" it.
//!
//! ```text
//!            self.rank                successor.rank
//!   ... ---------[=========== owned ===========)--------- ...
//! ```
//!
//! The core never performs I/O. [`RingCore::handle`] mutates local state and
//! returns the messages that other nodes must receive; the caller delivers
//! them, in whatever order and with whatever latency its transport has.
//!
//! # Election
//!
//! The node that first receives an empty election token always wins: the
//! token walks the ring collecting visitors and, once it reaches a node that
//! is already listed, that node announces itself. Ranks play no part.
//!
//! # Concurrency
//!
//! `handle` takes `&mut self`, so calls for one node are serialized by
//! construction. Wrap the core in a lock to share it between tasks.

use crate::error::{Error, Result};
use crate::message::{Message, Response};
use crate::node::NodeDescriptor;
use crate::token::{hash, Rank, Token};

/// Per-node view of the ring.
#[derive(Debug, Clone)]
pub struct RingCore {
    descriptor: NodeDescriptor,
    successor: Option<NodeDescriptor>,
    predecessor: Option<NodeDescriptor>,
    leader: NodeDescriptor,
}

impl RingCore {
    /// A fresh node: sole member of its own ring and its own leader.
    pub fn new(descriptor: NodeDescriptor) -> Self {
        let leader = descriptor.clone();
        Self {
            descriptor,
            successor: None,
            predecessor: None,
            leader,
        }
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn successor(&self) -> Option<&NodeDescriptor> {
        self.successor.as_ref()
    }

    pub fn predecessor(&self) -> Option<&NodeDescriptor> {
        self.predecessor.as_ref()
    }

    pub fn leader(&self) -> &NodeDescriptor {
        &self.leader
    }

    pub fn is_leader(&self) -> bool {
        self.leader == self.descriptor
    }

    pub fn is_sole_member(&self) -> bool {
        self.successor.is_none()
    }

    /// The `[start, end)` arc this node owns, or `None` for the whole ring.
    pub fn owned_arc(&self) -> Option<(Rank, Rank)> {
        self.successor
            .as_ref()
            .map(|s| (self.descriptor.rank(), s.rank()))
    }

    /// Hash `key` and decide whether it falls in this node's arc.
    pub fn responsible_for_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.responsible_for_hash(hash(key))
    }

    /// Decide whether `rank` falls in this node's arc.
    pub fn responsible_for_hash(&self, rank: Rank) -> bool {
        match self.owned_arc() {
            None => true,
            Some((start, end)) => rank.in_arc(&start, &end),
        }
    }

    /// Handle one message addressed to this node.
    ///
    /// Either the message is fully applied and the follow-up messages are
    /// returned, or an error is returned and no state has changed.
    pub fn handle(&mut self, message: Message) -> Result<Response> {
        if message.destination() != &self.descriptor {
            return Err(Error::Misdirected {
                kind: message.kind(),
                destination: message.destination().clone(),
                node: self.descriptor.clone(),
            });
        }

        tracing::debug!(node = %self.descriptor, kind = message.kind(), "handling message");

        let response = match message {
            Message::Join { new_node, .. } => self.on_join(new_node),
            Message::JoinAccepted {
                successor,
                predecessor,
                leader,
                ..
            } => self.on_join_accepted(successor, predecessor, leader),
            Message::NewPredecessor { predecessor, .. } => self.on_new_predecessor(predecessor),
            Message::NewSuccessor { successor, .. } => self.on_new_successor(successor),
            Message::Election { participants, .. } => self.on_election(participants),
            Message::ElectionResult { new_leader, .. } => self.on_election_result(new_leader),
            Message::GetNeighbors { .. } => Response::nodes(self.neighbors()),
            Message::GetLeader { .. } => Response::nodes(vec![self.leader.clone()]),
            Message::Shutdown { .. } => self.on_shutdown(),
        };

        Ok(response)
    }

    /// Predecessor then successor, skipping whichever is unset.
    pub fn neighbors(&self) -> Vec<NodeDescriptor> {
        self.predecessor
            .iter()
            .chain(self.successor.iter())
            .cloned()
            .collect()
    }

    fn on_join(&mut self, new_node: NodeDescriptor) -> Response {
        if new_node == self.descriptor {
            tracing::warn!(node = %self.descriptor, "ignoring request to join self");
            return Response::ok();
        }

        // Walk clockwise until the owner of the new node's rank is found.
        // A sole member owns every rank, so forwarding always has a target.
        if let Some(successor) = self
            .successor
            .clone()
            .filter(|_| !self.responsible_for_hash(new_node.rank()))
        {
            tracing::debug!(
                node = %self.descriptor,
                %new_node,
                next = %successor,
                "forwarding join"
            );
            return Response::send(vec![Message::Join {
                destination: successor,
                new_node,
            }]);
        }

        let old_successor = self.successor.replace(new_node.clone());
        let mut outgoing = Vec::with_capacity(2);

        match old_successor.as_ref().filter(|_| self.predecessor.is_some()) {
            Some(old) => outgoing.push(Message::NewPredecessor {
                destination: old.clone(),
                predecessor: new_node.clone(),
            }),
            // Previously alone: the newcomer is both neighbours.
            None => self.predecessor = Some(new_node.clone()),
        }

        outgoing.push(Message::JoinAccepted {
            destination: new_node.clone(),
            successor: old_successor.unwrap_or_else(|| self.descriptor.clone()),
            predecessor: self.descriptor.clone(),
            leader: self.leader.clone(),
        });

        tracing::info!(node = %self.descriptor, %new_node, "accepted join");
        Response::send(outgoing)
    }

    fn on_join_accepted(
        &mut self,
        successor: NodeDescriptor,
        predecessor: NodeDescriptor,
        leader: NodeDescriptor,
    ) -> Response {
        tracing::info!(
            node = %self.descriptor,
            %successor,
            %predecessor,
            %leader,
            "joined ring"
        );
        self.successor = Some(successor);
        self.predecessor = Some(predecessor);
        self.leader = leader;
        Response::ok()
    }

    fn on_new_predecessor(&mut self, predecessor: NodeDescriptor) -> Response {
        if predecessor == self.descriptor {
            self.collapse();
        } else {
            self.predecessor = Some(predecessor);
        }
        Response::ok()
    }

    fn on_new_successor(&mut self, successor: NodeDescriptor) -> Response {
        if successor == self.descriptor {
            self.collapse();
            return Response::ok();
        }

        let previous = self.successor.replace(successor.clone());
        if previous.as_ref() == Some(&self.leader) {
            tracing::info!(
                node = %self.descriptor,
                leader = %self.leader,
                "leader left the ring, starting election"
            );
            return Response::send(vec![Message::Election {
                destination: successor,
                participants: Vec::new(),
            }]);
        }
        Response::ok()
    }

    fn on_election(&mut self, mut participants: Vec<NodeDescriptor>) -> Response {
        let Some(successor) = self.successor.clone() else {
            return Response::ok();
        };

        if participants.contains(&self.descriptor) {
            tracing::info!(node = %self.descriptor, "won election");
            return Response::send(vec![Message::ElectionResult {
                destination: successor,
                new_leader: self.descriptor.clone(),
            }]);
        }

        participants.push(self.descriptor.clone());
        Response::send(vec![Message::Election {
            destination: successor,
            participants,
        }])
    }

    fn on_election_result(&mut self, new_leader: NodeDescriptor) -> Response {
        if self.leader != new_leader {
            tracing::info!(node = %self.descriptor, leader = %new_leader, "leader changed");
        }
        self.leader = new_leader.clone();

        if new_leader == self.descriptor {
            return Response::ok();
        }
        match self.successor.clone() {
            Some(successor) => Response::send(vec![Message::ElectionResult {
                destination: successor,
                new_leader,
            }]),
            None => Response::ok(),
        }
    }

    fn on_shutdown(&mut self) -> Response {
        let outgoing = match (self.predecessor.take(), self.successor.take()) {
            (Some(predecessor), Some(successor)) => vec![
                Message::NewPredecessor {
                    destination: successor.clone(),
                    predecessor: predecessor.clone(),
                },
                Message::NewSuccessor {
                    destination: predecessor,
                    successor,
                },
            ],
            _ => Vec::new(),
        };

        tracing::info!(node = %self.descriptor, "leaving ring");
        self.leader = self.descriptor.clone();
        Response::send(outgoing)
    }

    /// Fall back to the sole-member state.
    fn collapse(&mut self) {
        tracing::info!(node = %self.descriptor, "ring collapsed to a single node");
        self.successor = None;
        self.predecessor = None;
        self.leader = self.descriptor.clone();
    }
}
