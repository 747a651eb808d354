//! HTTP encoding of ring messages.
//!
//! Each message kind maps to one method and path; descriptors travel as
//! plain `host:port` text so that any HTTP client can talk to a node.
//!
//! | Message          | Route                   | Body                              |
//! |------------------|-------------------------|-----------------------------------|
//! | `Join`           | `POST /join`            | new node                          |
//! | `JoinAccepted`   | `POST /join/accepted`   | `role = host:port` lines          |
//! | `NewPredecessor` | `PUT /predecessor`      | predecessor                       |
//! | `NewSuccessor`   | `PUT /successor`        | successor                         |
//! | `Election`       | `POST /election`        | one participant per line          |
//! | `ElectionResult` | `POST /election/result` | new leader                        |
//! | `GetNeighbors`   | `GET /getNodes`         | empty                             |
//! | `GetLeader`      | `GET /getCurrentLeader` | empty                             |
//! | `Shutdown`       | `POST /shutdown`        | empty                             |

use crate::error::{Result, TransportError};
use ringkv_core::{Message, NodeDescriptor, Response};
use std::collections::HashMap;
use std::fmt;

pub const PATH_JOIN: &str = "/join";
pub const PATH_JOIN_ACCEPTED: &str = "/join/accepted";
pub const PATH_PREDECESSOR: &str = "/predecessor";
pub const PATH_SUCCESSOR: &str = "/successor";
pub const PATH_ELECTION: &str = "/election";
pub const PATH_ELECTION_RESULT: &str = "/election/result";
pub const PATH_NEIGHBORS: &str = "/getNodes";
pub const PATH_LEADER: &str = "/getCurrentLeader";
pub const PATH_SHUTDOWN: &str = "/shutdown";

/// The HTTP methods the protocol uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Map a wire method, or `None` for methods the protocol never uses.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        if method == axum::http::Method::GET {
            Some(Method::Get)
        } else if method == axum::http::Method::POST {
            Some(Method::Post)
        } else if method == axum::http::Method::PUT {
            Some(Method::Put)
        } else {
            None
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request addressed to a node, before it hits the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub destination: NodeDescriptor,
    pub method: Method,
    pub path: String,
    pub body: String,
}

impl HttpRequest {
    pub fn new(
        destination: NodeDescriptor,
        method: Method,
        path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self {
            destination,
            method,
            path,
            body: body.into(),
        }
    }

    /// Full URL of this request.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.destination, self.path)
    }
}

/// A direct response, before it hits the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Encode a message as the request that delivers it.
pub fn build_request(message: &Message) -> HttpRequest {
    let destination = message.destination().clone();
    match message {
        Message::Join { new_node, .. } => {
            HttpRequest::new(destination, Method::Post, PATH_JOIN, new_node.to_string())
        }
        Message::JoinAccepted {
            successor,
            predecessor,
            leader,
            ..
        } => HttpRequest::new(
            destination,
            Method::Post,
            PATH_JOIN_ACCEPTED,
            format!(
                "successor = {}\npredecessor = {}\nleader = {}\n",
                successor, predecessor, leader
            ),
        ),
        Message::NewPredecessor { predecessor, .. } => HttpRequest::new(
            destination,
            Method::Put,
            PATH_PREDECESSOR,
            predecessor.to_string(),
        ),
        Message::NewSuccessor { successor, .. } => {
            HttpRequest::new(destination, Method::Put, PATH_SUCCESSOR, successor.to_string())
        }
        Message::Election { participants, .. } => HttpRequest::new(
            destination,
            Method::Post,
            PATH_ELECTION,
            build_node_list(participants),
        ),
        Message::ElectionResult { new_leader, .. } => HttpRequest::new(
            destination,
            Method::Post,
            PATH_ELECTION_RESULT,
            new_leader.to_string(),
        ),
        Message::GetNeighbors { .. } => {
            HttpRequest::new(destination, Method::Get, PATH_NEIGHBORS, "")
        }
        Message::GetLeader { .. } => HttpRequest::new(destination, Method::Get, PATH_LEADER, ""),
        Message::Shutdown { .. } => HttpRequest::new(destination, Method::Post, PATH_SHUTDOWN, ""),
    }
}

/// Decode a received request into the message it carries.
pub fn parse_request(request: &HttpRequest) -> Result<Message> {
    let destination = request.destination.clone();
    let body = request.body.as_str();

    let message = match (request.method, request.path.as_str()) {
        (Method::Post, PATH_JOIN) => Message::Join {
            destination,
            new_node: parse_single(body)?,
        },
        (Method::Post, PATH_JOIN_ACCEPTED) => {
            let mut roles = parse_role_map(body)?;
            Message::JoinAccepted {
                destination,
                successor: take_role(&mut roles, "successor")?,
                predecessor: take_role(&mut roles, "predecessor")?,
                leader: take_role(&mut roles, "leader")?,
            }
        }
        (Method::Put, PATH_PREDECESSOR) => Message::NewPredecessor {
            destination,
            predecessor: parse_single(body)?,
        },
        (Method::Put, PATH_SUCCESSOR) => Message::NewSuccessor {
            destination,
            successor: parse_single(body)?,
        },
        (Method::Post, PATH_ELECTION) => Message::Election {
            destination,
            participants: parse_node_list(body)?,
        },
        (Method::Post, PATH_ELECTION_RESULT) => Message::ElectionResult {
            destination,
            new_leader: parse_single(body)?,
        },
        (Method::Get, PATH_NEIGHBORS) => Message::GetNeighbors { destination },
        (Method::Get, PATH_LEADER) => Message::GetLeader { destination },
        (Method::Post, PATH_SHUTDOWN) => Message::Shutdown { destination },
        (method, path) => {
            return Err(TransportError::UnrecognizedRequest {
                method: method.to_string(),
                path: path.to_string(),
            })
        }
    };
    Ok(message)
}

/// Encode the direct response to a handled message.
pub fn build_response(response: &Response) -> HttpResponse {
    match response {
        Response::Ok { .. } => HttpResponse {
            status: 200,
            body: String::new(),
        },
        Response::NodeList { nodes, .. } => HttpResponse {
            status: 200,
            body: build_node_list(nodes),
        },
    }
}

/// One `host:port` per line.
pub fn build_node_list(nodes: &[NodeDescriptor]) -> String {
    nodes
        .iter()
        .map(NodeDescriptor::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inverse of [`build_node_list`]; blank input is an empty list.
pub fn parse_node_list(body: &str) -> Result<Vec<NodeDescriptor>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_single)
        .collect()
}

fn parse_single(body: &str) -> Result<NodeDescriptor> {
    Ok(body.parse::<NodeDescriptor>()?)
}

/// Parse `role = host:port` lines.
fn parse_role_map(body: &str) -> Result<HashMap<String, NodeDescriptor>> {
    let mut roles = HashMap::new();
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        let (role, node) = line
            .split_once('=')
            .ok_or_else(|| {
                TransportError::Malformed(format!("expected role = host:port, got '{}'", line))
            })?;
        roles.insert(role.trim().to_string(), parse_single(node)?);
    }
    Ok(roles)
}

fn take_role(roles: &mut HashMap<String, NodeDescriptor>, role: &str) -> Result<NodeDescriptor> {
    roles
        .remove(role)
        .ok_or_else(|| TransportError::Malformed(format!("missing {}", role)))
}
