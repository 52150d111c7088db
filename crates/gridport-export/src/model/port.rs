//! Port model shared by job inputs and outputs.

use derive_more::{Deref, DerefMut, Display};
use gridport_core::DataRef;

use crate::session::{NodeId, Position};

/// Resolution state of a port.
///
/// `NotAssigned` is transient: every input must leave the conversion phase
/// as `Channel` (fed by another job) or `UserProvided` (resolved to staged
/// data). `Collector` and `Generator` are set by loop collapsing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Debug)]
pub enum ConnectionType {
    /// Not yet resolved; must not survive past conversion.
    #[default]
    NotAssigned,
    /// Fed by another job's output.
    Channel,
    /// Bound to user-supplied data shipped with the export.
    UserProvided,
    /// Channel input that waits for a whole fan-in set.
    Collector,
    /// Channel output that fans a list out into per-item runs.
    Generator,
}

/// One endpoint of a resolved connection: a job and a compacted port number.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Debug, Display)]
#[display("{job}:{port_nr}")]
pub struct PortRef {
    /// The referenced job.
    pub job: NodeId,
    /// The referenced port's own `port_nr`.
    pub port_nr: u32,
}

impl PortRef {
    /// Creates an endpoint reference.
    pub const fn new(job: NodeId, port_nr: u32) -> Self {
        Self { job, port_nr }
    }
}

/// Common state of a job port.
///
/// `original_port_nr` is the port's index on the source graph node, fixed at
/// creation. `port_nr` is the index within the owning job's own port list,
/// assigned when the port is pushed onto a job.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug)]
pub struct Port {
    /// Port name, used as the in-job file name.
    pub name: String,
    /// File extension without the dot.
    pub extension: String,
    /// Resolved data reference; `None` until bound.
    pub data: Option<DataRef>,
    /// Whether the port exchanges a file list.
    pub multi_file: bool,
    /// Resolution state.
    pub connection: ConnectionType,
    /// Canvas coordinates, carried for display only.
    pub position: Position,
    /// Index of the port on the source graph node.
    pub original_port_nr: u32,
    /// Index within the owning job's port list; assigned on insertion.
    pub port_nr: u32,
}

impl Port {
    /// Creates an unresolved port.
    pub fn new(name: impl Into<String>, extension: impl Into<String>, original_port_nr: u32) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            data: None,
            multi_file: false,
            connection: ConnectionType::NotAssigned,
            position: Position::default(),
            original_port_nr,
            port_nr: 0,
        }
    }

    /// Sets the multi-file flag.
    #[must_use]
    pub fn with_multi_file(mut self, multi_file: bool) -> Self {
        self.multi_file = multi_file;
        self
    }

    /// Sets the canvas position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets the resolution state.
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionType) -> Self {
        self.connection = connection;
        self
    }
}

/// An input port; receives data from at most one source.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug, Deref, DerefMut)]
pub struct Input {
    /// Common port state.
    #[deref]
    #[deref_mut]
    pub port: Port,
    /// Producing endpoint, set during connection resolution.
    pub source: Option<PortRef>,
}

impl Input {
    /// Creates an input with no source.
    pub fn new(port: Port) -> Self {
        Self { port, source: None }
    }
}

impl From<Port> for Input {
    fn from(port: Port) -> Self {
        Self::new(port)
    }
}

/// An output port; fans out to zero or more destinations.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug, Deref, DerefMut)]
pub struct Output {
    /// Common port state.
    #[deref]
    #[deref_mut]
    pub port: Port,
    /// Consuming endpoints, appended during connection resolution.
    pub destinations: Vec<PortRef>,
}

impl Output {
    /// Creates an output with no destinations.
    pub fn new(port: Port) -> Self {
        Self {
            port,
            destinations: Vec::new(),
        }
    }
}

impl From<Port> for Output {
    fn from(port: Port) -> Self {
        Self::new(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults_unresolved() {
        let port = Port::new("words", "txt", 2);
        assert_eq!(port.connection, ConnectionType::NotAssigned);
        assert_eq!(port.original_port_nr, 2);
        assert_eq!(port.port_nr, 0);
        assert!(port.data.is_none());
    }

    #[test]
    fn test_input_derefs_to_port() {
        let mut input = Input::new(Port::new("words", "txt", 0));
        input.connection = ConnectionType::Channel;
        assert_eq!(input.port.connection, ConnectionType::Channel);
        assert_eq!(input.name, "words");
    }

    #[test]
    fn test_port_ref_display() {
        let endpoint = PortRef::new(NodeId::new(4), 1);
        assert_eq!(endpoint.to_string(), "4:1");
    }
}
