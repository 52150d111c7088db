//! Session edge type.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// A directed connection between two node ports in a session graph.
///
/// Port indices refer to the declared port lists of the endpoint nodes,
/// in native port order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Debug)]
#[derive(Serialize, Deserialize, Builder)]
#[builder(
    name = "EdgeSnapshotBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct EdgeSnapshot {
    /// Source node of the connection.
    pub from: NodeId,
    /// Output port index on the source node.
    pub from_port: u32,
    /// Destination node of the connection.
    pub to: NodeId,
    /// Input port index on the destination node.
    pub to_port: u32,
}

impl EdgeSnapshot {
    /// Creates a connection between two node ports.
    pub fn new(from: NodeId, from_port: u32, to: NodeId, to_port: u32) -> Self {
        Self {
            from,
            from_port,
            to,
            to_port,
        }
    }

    /// Returns a builder for creating a connection.
    pub fn builder() -> EdgeSnapshotBuilder {
        EdgeSnapshotBuilder::default()
    }
}

impl EdgeSnapshotBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(from), Some(to)) = (&self.from, &self.to)
            && from == to
        {
            return Err(format!("connection from node {from} to itself"));
        }

        Ok(())
    }
}
