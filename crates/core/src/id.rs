//! Node identifiers.
//!
//! A [`NodeId`] is an opaque string: nodes mint one from a random UUID at
//! startup, but consumers accept whatever the producer sent.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keys::ServiceName;

/// Number of characters shown when a node id is abbreviated for display.
pub const SHORT_ID_LEN: usize = 8;

/// Globally unique, opaque identifier of one simulated node.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The full identifier.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first [`SHORT_ID_LEN`] characters (or the whole id if shorter).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of one simulated service instance.
///
/// Immutable after construction; the generator's background tasks share it
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    node_id: NodeId,
    service_name: ServiceName,
}

impl NodeIdentity {
    /// Identity with a freshly generated node id.
    #[must_use]
    pub fn generate(service_name: ServiceName) -> Self {
        Self::new(NodeId::generate(), service_name)
    }

    /// Identity with an explicit node id.
    #[must_use]
    pub fn new(node_id: NodeId, service_name: ServiceName) -> Self {
        Self {
            node_id,
            service_name,
        }
    }

    /// The node's unique id.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The service label (shared by every replica of a service).
    pub fn service_name(&self) -> &ServiceName {
        &self.service_name
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.service_name, self.node_id.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generated_ids_are_unique() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn short_takes_prefix() {
        let id = NodeId::new("abcd1234ef56");
        assert_eq!(id.short(), "abcd1234");
    }

    #[test]
    fn short_keeps_ids_shorter_than_prefix() {
        let id = NodeId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn short_respects_char_boundaries() {
        let id = NodeId::new("ñññññññññññ");
        assert_eq!(id.short(), "ññññññññ");
    }

    #[test]
    fn identity_display_uses_short_id() {
        let identity = NodeIdentity::new(
            NodeId::new("abcd1234ef56"),
            ServiceName::new("OrderService").unwrap(),
        );
        assert_eq!(identity.to_string(), "OrderService (abcd1234)");
    }

    #[test]
    fn node_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeId::new("n-1")).unwrap();
        assert_eq!(json, "\"n-1\"");
    }
}
