//! Channel resolution across the converted job graph.

use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::model::{ConnectionType, PortRef, Workflow};
use crate::session::{GraphSnapshot, NodeId};
use crate::TRACING_TARGET;

/// A deferred edge from a pure data source to a job input.
///
/// Source nodes never become jobs, so their edges cannot be wired as
/// channels. They are collected here and handed to source resolution.
#[derive(Clone, Copy, PartialEq, Eq)]
#[derive(Debug)]
pub struct SourceBinding {
    pub source_node: NodeId,
    pub to_job: NodeId,
    pub to_original: u32,
}

/// Wires every session edge into the job graph.
///
/// For each edge between two converted jobs, the consuming input records
/// the producing port and both ends flip to [`ConnectionType::Channel`].
/// Edges that originate at a data source are returned as bindings instead.
pub fn resolve_connections(
    workflow: &mut Workflow,
    session: &GraphSnapshot,
) -> ExportResult<Vec<SourceBinding>> {
    let mut bindings = Vec::new();

    for edge in session.edges() {
        let producer_node = session.node(edge.from).ok_or_else(|| {
            ExportError::GraphIntegrity(format!("edge references unknown node {}", edge.from))
        })?;

        if producer_node.is_source() {
            if !workflow.contains(edge.to) {
                return Err(ExportError::GraphIntegrity(format!(
                    "source {} feeds job {} which was not converted",
                    edge.from, edge.to
                )));
            }
            bindings.push(SourceBinding {
                source_node: edge.from,
                to_job: edge.to,
                to_original: edge.to_port,
            });
            continue;
        }

        let Some((producer, consumer)) = workflow.pair_mut(edge.from, edge.to) else {
            return Err(ExportError::GraphIntegrity(format!(
                "edge {}:{} -> {}:{} references jobs that were not converted",
                edge.from, edge.from_port, edge.to, edge.to_port
            )));
        };
        let producer_id = producer.id;
        let consumer_id = consumer.id;

        let Some(output) = producer.output_by_original_mut(edge.from_port) else {
            return Err(ExportError::GraphIntegrity(format!(
                "job {} has no output with original port {}",
                producer_id, edge.from_port
            )));
        };
        let Some(input) = consumer.input_by_original_mut(edge.to_port) else {
            return Err(ExportError::GraphIntegrity(format!(
                "job {} has no input with original port {}",
                consumer_id, edge.to_port
            )));
        };

        if input.source.is_some() {
            return Err(ExportError::GraphIntegrity(format!(
                "input {consumer_id}:{} is fed by more than one channel",
                input.port_nr
            )));
        }

        input.connection = ConnectionType::Channel;
        input.source = Some(PortRef::new(producer_id, output.port_nr));
        output.connection = ConnectionType::Channel;
        output.destinations.push(PortRef::new(consumer_id, input.port_nr));

        debug!(
            target: TRACING_TARGET,
            from = %PortRef::new(producer_id, output.port_nr),
            to = %PortRef::new(consumer_id, input.port_nr),
            "resolved channel"
        );
    }

    Ok(bindings)
}
