//! Session graph built on petgraph.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use super::edge::EdgeSnapshot;
use super::metadata::SessionMetadata;
use super::node::{NodeId, NodeSnapshot};

/// A captured editor session as a directed graph.
///
/// Nodes and connections keep their insertion order, which downstream
/// passes rely on for deterministic output. Nodes are never removed, so
/// petgraph's index order matches insertion order throughout.
#[derive(Clone, Default)]
#[derive(Debug)]
pub struct GraphSnapshot {
    /// The underlying directed graph.
    graph: DiGraph<NodeSnapshot, EdgeSnapshot>,
    /// Maps host node IDs to petgraph indices.
    node_indices: HashMap<NodeId, NodeIndex>,
    /// Session metadata.
    metadata: SessionMetadata,
}

impl GraphSnapshot {
    /// Creates an empty session graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: SessionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the session metadata.
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Adds a node to the graph.
    ///
    /// Returns an error if a node with the same ID is already present.
    pub fn add_node(&mut self, node: NodeSnapshot) -> ExportResult<NodeId> {
        let id = node.id;
        if self.node_indices.contains_key(&id) {
            return Err(ExportError::GraphIntegrity(format!(
                "duplicate node id {id}"
            )));
        }

        let index = self.graph.add_node(node);
        self.node_indices.insert(id, index);
        Ok(id)
    }

    /// Adds a connection between two existing nodes.
    ///
    /// Returns an error if either endpoint is unknown.
    pub fn add_edge(&mut self, edge: EdgeSnapshot) -> ExportResult<()> {
        let from = self.index_of(edge.from)?;
        let to = self.index_of(edge.to)?;
        self.graph.add_edge(from, to, edge);
        Ok(())
    }

    /// Returns the node with the given ID, if present.
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.node_indices
            .get(&id)
            .and_then(|index| self.graph.node_weight(*index))
    }

    /// Returns whether a node with the given ID exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// Iterates over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeSnapshot> {
        self.graph.node_weights()
    }

    /// Iterates over connections in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeSnapshot> {
        self.graph.edge_weights()
    }

    /// Returns the connections arriving at a node.
    pub fn incoming(&self, id: NodeId) -> Vec<EdgeSnapshot> {
        self.directed_edges(id, Direction::Incoming)
    }

    /// Returns the connections leaving a node.
    pub fn outgoing(&self, id: NodeId) -> Vec<EdgeSnapshot> {
        self.directed_edges(id, Direction::Outgoing)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of connections.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Validates the graph for export.
    ///
    /// Checks that the graph is non-empty, that every connection stays
    /// within the declared port ranges of its endpoints, and that the
    /// graph is acyclic.
    pub fn validate(&self) -> ExportResult<()> {
        if self.graph.node_count() == 0 {
            return Err(ExportError::GraphIntegrity(
                "session graph has no nodes".to_owned(),
            ));
        }

        for edge in self.edges() {
            self.check_port_range(edge)?;
        }

        if is_cyclic_directed(&self.graph) {
            return Err(ExportError::GraphIntegrity(
                "session graph contains a cycle".to_owned(),
            ));
        }

        Ok(())
    }

    /// Converts the graph into a serializable definition.
    pub fn to_definition(&self) -> GraphDefinition {
        GraphDefinition {
            metadata: self.metadata.clone(),
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().copied().collect(),
        }
    }

    /// Rebuilds a graph from a serialized definition.
    pub fn from_definition(definition: GraphDefinition) -> ExportResult<Self> {
        let mut graph = Self::new().with_metadata(definition.metadata);
        for node in definition.nodes {
            graph.add_node(node)?;
        }
        for edge in definition.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    fn index_of(&self, id: NodeId) -> ExportResult<NodeIndex> {
        self.node_indices.get(&id).copied().ok_or_else(|| {
            ExportError::GraphIntegrity(format!("connection references unknown node {id}"))
        })
    }

    fn directed_edges(&self, id: NodeId, direction: Direction) -> Vec<EdgeSnapshot> {
        let Some(index) = self.node_indices.get(&id) else {
            return Vec::new();
        };

        let mut edges: Vec<EdgeSnapshot> = self
            .graph
            .edges_directed(*index, direction)
            .map(|edge| *edge.weight())
            .collect();
        // Adjacency lists are walked newest-first; restore a stable order.
        edges.sort_by_key(|edge| (edge.from, edge.from_port, edge.to, edge.to_port));
        edges
    }

    fn check_port_range(&self, edge: &EdgeSnapshot) -> ExportResult<()> {
        let from = self.node(edge.from).ok_or_else(|| {
            ExportError::GraphIntegrity(format!("connection references unknown node {}", edge.from))
        })?;
        let to = self.node(edge.to).ok_or_else(|| {
            ExportError::GraphIntegrity(format!("connection references unknown node {}", edge.to))
        })?;

        if edge.from_port as usize >= from.outputs.len() {
            return Err(ExportError::GraphIntegrity(format!(
                "node {} has no output port {}",
                from.name, edge.from_port
            )));
        }
        if edge.to_port as usize >= to.inputs.len() {
            return Err(ExportError::GraphIntegrity(format!(
                "node {} has no input port {}",
                to.name, edge.to_port
            )));
        }

        Ok(())
    }
}

/// Serializable form of a session graph.
#[derive(Clone, PartialEq, Default)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Session metadata.
    #[serde(default)]
    pub metadata: SessionMetadata,
    /// Nodes in insertion order.
    pub nodes: Vec<NodeSnapshot>,
    /// Connections in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeSnapshot>,
}
