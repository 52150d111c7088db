//! Node and source conversion.
//!
//! Turns session nodes into [`Job`]s through an ordered, first-match
//! converter chain, wires the resulting ports together from the session
//! edges, resolves remaining inputs against pure data sources, and collapses
//! the generator/collector loop idiom the target format cannot express.

use gridport_core::{DataRef, StagingArea};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::model::{Input, Job, Output, Port};
use crate::profile::ExportProfile;
use crate::session::{GraphSnapshot, NodeSnapshot, PortDecl, SourceSpec};
use crate::TRACING_TARGET;

mod collapse;
mod markers;
mod native;
mod resolve;
mod source;
mod tool;

pub use collapse::collapse_loops;
pub use markers::MarkerConverter;
pub use native::NativeConverter;
pub use resolve::{resolve_connections, SourceBinding};
pub use source::{
    resolve_sources, DirectorySourceConverter, FileSourceConverter, InlineSourceConverter,
};
pub use tool::ToolConverter;

/// Shared read-only state for one conversion run.
pub struct ConvertContext<'a> {
    /// The session being exported.
    pub session: &'a GraphSnapshot,
    /// Staging root for generated files.
    pub staging: &'a StagingArea,
    /// Behavioral configuration.
    pub profile: &'a ExportProfile,
}

impl ConvertContext<'_> {
    /// Returns the original indices of a node's connected input ports,
    /// ascending.
    pub fn connected_inputs(&self, node: &NodeSnapshot) -> Vec<u32> {
        let mut ports: Vec<u32> = self
            .session
            .incoming(node.id)
            .iter()
            .map(|edge| edge.to_port)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Returns the original indices of a node's connected output ports,
    /// ascending.
    pub fn connected_outputs(&self, node: &NodeSnapshot) -> Vec<u32> {
        let mut ports: Vec<u32> = self
            .session
            .outgoing(node.id)
            .iter()
            .map(|edge| edge.from_port)
            .collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Builds an unresolved port from a declared descriptor.
    ///
    /// Fails if the descriptor needs multi-file support and the profile does
    /// not provide it.
    pub fn build_port(
        &self,
        node: &NodeSnapshot,
        decl: &PortDecl,
        original_port_nr: u32,
    ) -> ExportResult<Port> {
        if decl.multi_file && !self.profile.multi_file_ports {
            return Err(ExportError::Configuration {
                node_id: node.id,
                message: format!(
                    "port {} is multi-file, which this profile does not support",
                    decl.name
                ),
            });
        }

        Ok(Port::new(&decl.name, &decl.extension, original_port_nr)
            .with_multi_file(decl.multi_file)
            .with_position(node.position))
    }
}

/// Converts one session node into one job.
pub trait NodeConverter {
    /// Converter name used in logs.
    fn name(&self) -> &'static str;

    /// Returns whether this converter claims the node.
    fn can_handle(&self, node: &NodeSnapshot) -> bool;

    /// Converts a claimed node into a job.
    fn convert(&self, node: &NodeSnapshot, ctx: &ConvertContext<'_>) -> ExportResult<Job>;
}

/// Resolves one pure data source into concrete staged data.
pub trait SourceConverter {
    /// Converter name used in logs.
    fn name(&self) -> &'static str;

    /// Returns whether this converter claims the source.
    fn can_handle(&self, spec: &SourceSpec) -> bool;

    /// Resolves a claimed source into a data reference.
    fn convert(
        &self,
        node: &NodeSnapshot,
        spec: &SourceSpec,
        ctx: &ConvertContext<'_>,
    ) -> ExportResult<DataRef>;
}

/// Ordered first-match dispatch over node converters.
///
/// Order is a correctness requirement: specific converters must precede the
/// catch-all, which must come last and claim every remaining node.
pub struct ConverterChain {
    converters: Vec<Box<dyn NodeConverter>>,
}

impl ConverterChain {
    /// Creates a chain from an ordered converter list.
    pub fn new(converters: Vec<Box<dyn NodeConverter>>) -> Self {
        Self { converters }
    }

    /// The standard chain: loop markers, declarative tools, then the
    /// native-node fallback.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(MarkerConverter),
            Box::new(ToolConverter),
            Box::new(NativeConverter),
        ])
    }

    /// Converts a node with the first claiming converter.
    ///
    /// Unclaimed nodes are an error; with the standard chain this is only
    /// reachable for source-model nodes, which produce no job.
    pub fn convert(&self, node: &NodeSnapshot, ctx: &ConvertContext<'_>) -> ExportResult<Job> {
        for converter in &self.converters {
            if converter.can_handle(node) {
                debug!(
                    target: TRACING_TARGET,
                    converter = converter.name(),
                    node_id = %node.id,
                    node_name = %node.name,
                    "converting node"
                );
                return converter.convert(node, ctx);
            }
        }

        Err(ExportError::UnsupportedNode {
            node_id: node.id,
            name: node.name.clone(),
        })
    }
}

/// Ordered first-match dispatch over source converters.
///
/// Unlike the node chain there is deliberately no catch-all: an unclaimed
/// source is an unsupported node.
pub struct SourceChain {
    converters: Vec<Box<dyn SourceConverter>>,
}

impl SourceChain {
    /// Creates a chain from an ordered converter list.
    pub fn new(converters: Vec<Box<dyn SourceConverter>>) -> Self {
        Self { converters }
    }

    /// The standard chain: local files, directory listings, inline data.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(FileSourceConverter),
            Box::new(DirectorySourceConverter),
            Box::new(InlineSourceConverter),
        ])
    }

    /// Resolves a source node with the first claiming converter.
    pub fn resolve(
        &self,
        node: &NodeSnapshot,
        spec: &SourceSpec,
        ctx: &ConvertContext<'_>,
    ) -> ExportResult<DataRef> {
        for converter in &self.converters {
            if converter.can_handle(spec) {
                debug!(
                    target: TRACING_TARGET,
                    converter = converter.name(),
                    node_id = %node.id,
                    "resolving source node"
                );
                return converter.convert(node, spec, ctx);
            }
        }

        Err(ExportError::UnsupportedNode {
            node_id: node.id,
            name: node.name.clone(),
        })
    }
}

/// Builds an input port from a declared descriptor.
fn declared_input(
    ctx: &ConvertContext<'_>,
    node: &NodeSnapshot,
    original_port_nr: u32,
) -> ExportResult<Input> {
    let decl = node.inputs.get(original_port_nr as usize).ok_or_else(|| {
        ExportError::GraphIntegrity(format!(
            "node {} has no declared input {original_port_nr}",
            node.id
        ))
    })?;
    Ok(ctx.build_port(node, decl, original_port_nr)?.into())
}

/// Builds an output port from a declared descriptor.
fn declared_output(
    ctx: &ConvertContext<'_>,
    node: &NodeSnapshot,
    original_port_nr: u32,
) -> ExportResult<Output> {
    let decl = node.outputs.get(original_port_nr as usize).ok_or_else(|| {
        ExportError::GraphIntegrity(format!(
            "node {} has no declared output {original_port_nr}",
            node.id
        ))
    })?;
    Ok(ctx.build_port(node, decl, original_port_nr)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DataCategory, EdgeSnapshot, NodeId, NodeModel, ToolSpec};

    fn tool(id: u32, name: &str, inputs: usize, outputs: usize) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(
            NodeId::new(id),
            name,
            NodeModel::Tool(ToolSpec::new(name.to_lowercase(), Vec::new())),
        );
        node.inputs = (0..inputs)
            .map(|i| PortDecl::new(format!("in{i}"), "txt", DataCategory::Uri))
            .collect();
        node.outputs = (0..outputs)
            .map(|i| PortDecl::new(format!("out{i}"), "txt", DataCategory::Uri))
            .collect();
        node
    }

    #[test]
    fn test_connected_ports_sorted_and_deduped() {
        let mut session = GraphSnapshot::new();
        session.add_node(tool(1, "A", 0, 3)).unwrap();
        session.add_node(tool(2, "B", 4, 0)).unwrap();
        // Fan-out from one output plus a second output, added out of order.
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(1), 2, NodeId::new(2), 3))
            .unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(1), 0, NodeId::new(2), 1))
            .unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(1), 0, NodeId::new(2), 0))
            .unwrap();

        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let from = session.node(NodeId::new(1)).unwrap();
        let to = session.node(NodeId::new(2)).unwrap();
        assert_eq!(ctx.connected_outputs(from), vec![0, 2]);
        assert_eq!(ctx.connected_inputs(to), vec![0, 1, 3]);
    }

    #[test]
    fn test_build_port_rejects_multi_file_without_support() {
        let session = GraphSnapshot::new();
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::legacy();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let node = tool(1, "A", 0, 0);
        let decl = PortDecl::new("items", "txt", DataCategory::Uri).with_multi_file(true);
        assert!(matches!(
            ctx.build_port(&node, &decl, 0),
            Err(ExportError::Configuration { .. })
        ));
    }

    #[test]
    fn test_chain_rejects_unclaimed_node() {
        let chain = ConverterChain::new(Vec::new());
        let session = GraphSnapshot::new();
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let node = tool(7, "Orphan", 0, 0);
        assert!(matches!(
            chain.convert(&node, &ctx),
            Err(ExportError::UnsupportedNode { .. })
        ));
    }
}
