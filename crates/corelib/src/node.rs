//! Node identity on the ring.
//!
//! A [`NodeDescriptor`] is both a network address and a ring coordinate: its
//! rank is the hash of its canonical `host:port` string.

use crate::error::{Error, Result};
use crate::token::Rank;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Essential node metadata for addressing and ranking a node.
///
/// Immutable once built. Equality and hashing only look at `host` and `port`;
/// the rank is derived from them and never compared on its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeDescriptor {
    host: String,
    port: u16,
    rank: Rank,
}

impl NodeDescriptor {
    /// Construct a descriptor and derive its rank from `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let rank = Rank::of(format!("{}:{}", host, port));
        Self { host, port, rank }
    }

    /// Construct a descriptor pinned to an explicit rank.
    ///
    /// Only meant for simulations that need nodes at known coordinates; a
    /// descriptor built this way will not agree with peers that derive the
    /// rank from the address.
    pub fn with_rank(host: impl Into<String>, port: u16, rank: impl Into<Rank>) -> Self {
        Self {
            host: host.into(),
            port,
            rank: rank.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Position of this node on the ring.
    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Canonical `host:port` form.
    pub fn host_port(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for NodeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for NodeDescriptor {}

impl Hash for NodeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeDescriptor {
    type Err = Error;

    /// Parse `host:port`, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (host, port) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_descriptor(s, "expected host:port"))?;

        let host = host.trim();
        if host.is_empty() {
            return Err(Error::invalid_descriptor(s, "empty host"));
        }

        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| Error::invalid_descriptor(s, format!("bad port: {}", e)))?;

        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for NodeDescriptor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<NodeDescriptor> for String {
    fn from(node: NodeDescriptor) -> Self {
        node.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct() {
        let nd = NodeDescriptor::new("127.0.0.1", 8000);
        assert_eq!(nd.host(), "127.0.0.1");
        assert_eq!(nd.port(), 8000);
        assert_eq!(nd.host_port(), "127.0.0.1:8000");
    }

    #[test]
    fn test_parse() {
        let nd: NodeDescriptor = "127.0.0.1:8000".parse().unwrap();
        assert_eq!(nd.host(), "127.0.0.1");
        assert_eq!(nd.port(), 8000);
    }

    #[test]
    fn test_parse_trim() {
        let nd: NodeDescriptor = "\t\t  127.0.0.1:8000  \n".parse().unwrap();
        assert_eq!(nd.host_port(), "127.0.0.1:8000");

        let nd: NodeDescriptor = " localhost : 8001 ".parse().unwrap();
        assert_eq!(nd.host_port(), "localhost:8001");
    }

    #[test]
    fn test_bad_parse() {
        for input in ["", "localhost", ":8000", "localhost:", "localhost:http", "h:70000"] {
            let result = input.parse::<NodeDescriptor>();
            assert!(
                matches!(result, Err(Error::InvalidDescriptor { .. })),
                "'{}' should not parse",
                input
            );
        }
    }

    #[test]
    fn test_rank() {
        let nd = NodeDescriptor::new("127.0.0.1", 8000);
        assert_eq!(nd.rank(), Rank::of("127.0.0.1:8000"));
        assert_eq!(nd.rank(), Rank(102808487155392830909659332955855849052));
    }

    #[test]
    fn test_equality_ignores_pinned_rank() {
        let d0 = NodeDescriptor::new("127.0.0.1", 8000);
        let d1 = NodeDescriptor::with_rank("127.0.0.1", 8000, 42);
        assert_eq!(d0, d1);
    }

    #[test]
    fn test_equality_differs_on_host_or_port() {
        let d0 = NodeDescriptor::new("127.0.0.1", 8000);
        assert_ne!(d0, NodeDescriptor::new("127.0.0.2", 8000));
        assert_ne!(d0, NodeDescriptor::new("127.0.0.1", 8001));
    }

    #[test]
    fn test_serde_as_host_port_string() {
        let nd = NodeDescriptor::new("localhost", 8002);
        let json = serde_json::to_string(&nd).unwrap();
        assert_eq!(json, "\"localhost:8002\"");

        let back: NodeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, nd);
        assert_eq!(back.rank(), nd.rank());

        assert!(serde_json::from_str::<NodeDescriptor>("\"nope\"").is_err());
    }
}
