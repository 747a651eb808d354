//! Messages exchanged between ring nodes and the direct responses to them.
//!
//! The vocabulary is closed: [`RingCore::handle`](crate::ring::RingCore::handle)
//! matches every variant exhaustively, so adding a message kind is a compile
//! error until the core decides what to do with it.

use crate::node::NodeDescriptor;

/// A protocol message. Every variant names the node it is addressed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Ask any ring member to splice `new_node` into the ring.
    Join {
        destination: NodeDescriptor,
        new_node: NodeDescriptor,
    },
    /// Tell a freshly joined node its neighbours and the current leader.
    JoinAccepted {
        destination: NodeDescriptor,
        successor: NodeDescriptor,
        predecessor: NodeDescriptor,
        leader: NodeDescriptor,
    },
    /// Replace the destination's predecessor pointer.
    NewPredecessor {
        destination: NodeDescriptor,
        predecessor: NodeDescriptor,
    },
    /// Replace the destination's successor pointer.
    NewSuccessor {
        destination: NodeDescriptor,
        successor: NodeDescriptor,
    },
    /// Election token, carrying every node it has visited this round.
    Election {
        destination: NodeDescriptor,
        participants: Vec<NodeDescriptor>,
    },
    /// Announcement of the elected leader, passed once around the ring.
    ElectionResult {
        destination: NodeDescriptor,
        new_leader: NodeDescriptor,
    },
    GetNeighbors {
        destination: NodeDescriptor,
    },
    GetLeader {
        destination: NodeDescriptor,
    },
    /// Ask the destination to leave the ring gracefully.
    Shutdown {
        destination: NodeDescriptor,
    },
}

impl Message {
    /// The node this message must be delivered to.
    pub fn destination(&self) -> &NodeDescriptor {
        match self {
            Message::Join { destination, .. }
            | Message::JoinAccepted { destination, .. }
            | Message::NewPredecessor { destination, .. }
            | Message::NewSuccessor { destination, .. }
            | Message::Election { destination, .. }
            | Message::ElectionResult { destination, .. }
            | Message::GetNeighbors { destination }
            | Message::GetLeader { destination }
            | Message::Shutdown { destination } => destination,
        }
    }

    /// Stable variant name, used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Join { .. } => "join",
            Message::JoinAccepted { .. } => "join_accepted",
            Message::NewPredecessor { .. } => "new_predecessor",
            Message::NewSuccessor { .. } => "new_successor",
            Message::Election { .. } => "election",
            Message::ElectionResult { .. } => "election_result",
            Message::GetNeighbors { .. } => "get_neighbors",
            Message::GetLeader { .. } => "get_leader",
            Message::Shutdown { .. } => "shutdown",
        }
    }

    /// True for messages that only read state.
    pub fn is_query(&self) -> bool {
        matches!(self, Message::GetNeighbors { .. } | Message::GetLeader { .. })
    }
}

/// Direct response to a handled message.
///
/// `outgoing` holds the follow-up messages the caller is responsible for
/// delivering; the core never sends anything itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Ok {
        outgoing: Vec<Message>,
    },
    NodeList {
        outgoing: Vec<Message>,
        nodes: Vec<NodeDescriptor>,
    },
}

impl Response {
    /// An `Ok` with nothing to send.
    pub fn ok() -> Self {
        Response::Ok {
            outgoing: Vec::new(),
        }
    }

    pub fn send(outgoing: Vec<Message>) -> Self {
        Response::Ok { outgoing }
    }

    pub fn nodes(nodes: Vec<NodeDescriptor>) -> Self {
        Response::NodeList {
            outgoing: Vec::new(),
            nodes,
        }
    }

    pub fn outgoing(&self) -> &[Message] {
        match self {
            Response::Ok { outgoing } | Response::NodeList { outgoing, .. } => outgoing,
        }
    }

    pub fn into_outgoing(self) -> Vec<Message> {
        match self {
            Response::Ok { outgoing } | Response::NodeList { outgoing, .. } => outgoing,
        }
    }

    /// Query payload, if this is a `NodeList`.
    pub fn node_list(&self) -> Option<&[NodeDescriptor]> {
        match self {
            Response::Ok { .. } => None,
            Response::NodeList { nodes, .. } => Some(nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(port: u16) -> NodeDescriptor {
        NodeDescriptor::new("localhost", port)
    }

    #[test]
    fn test_destination_and_kind() {
        let msg = Message::Election {
            destination: node(8001),
            participants: vec![node(8000)],
        };
        assert_eq!(msg.destination(), &node(8001));
        assert_eq!(msg.kind(), "election");
        assert!(!msg.is_query());

        let msg = Message::GetLeader {
            destination: node(8002),
        };
        assert_eq!(msg.destination(), &node(8002));
        assert!(msg.is_query());
    }

    #[test]
    fn test_response_accessors() {
        let join = Message::Join {
            destination: node(8000),
            new_node: node(8001),
        };
        let response = Response::send(vec![join.clone()]);
        assert_eq!(response.outgoing(), &[join.clone()]);
        assert_eq!(response.node_list(), None);
        assert_eq!(response.into_outgoing(), vec![join]);

        let response = Response::nodes(vec![node(8000)]);
        assert!(response.outgoing().is_empty());
        assert_eq!(response.node_list(), Some(&[node(8000)][..]));
    }
}
