//! Loop marker collapsing.
//!
//! Loop markers survive conversion as placeholder jobs so that channel
//! resolution can wire them like any other job. This pass splices each
//! marker out again: the producer behind the marker is connected directly
//! to the consumer in front of it, and the surviving endpoints carry the
//! loop semantics as their connection type.

use tracing::{debug, warn};

use crate::error::{ExportError, ExportResult};
use crate::model::{ConnectionType, JobKind, PortRef, Workflow};
use crate::session::NodeId;
use crate::TRACING_TARGET;

/// Splices every loop marker out of the job graph.
///
/// Generator markers flag the producing output as [`ConnectionType::Generator`],
/// collector markers flag the consuming input as [`ConnectionType::Collector`].
/// Collapsed markers stay in the graph but are ignored from here on.
pub fn collapse_loops(workflow: &mut Workflow) -> ExportResult<()> {
    let markers: Vec<(NodeId, JobKind)> = workflow
        .jobs()
        .filter(|job| !job.ignored && job.kind.is_loop_marker())
        .map(|job| (job.id, job.kind))
        .collect();

    for (marker_id, kind) in markers {
        collapse_marker(workflow, marker_id, kind)?;
        debug!(target: TRACING_TARGET, marker = %marker_id, kind = kind.as_ref(), "collapsed loop marker");
    }

    Ok(())
}

fn collapse_marker(workflow: &mut Workflow, marker_id: NodeId, kind: JobKind) -> ExportResult<()> {
    let marker = workflow.job(marker_id).ok_or_else(|| {
        ExportError::GraphIntegrity(format!("loop marker {marker_id} disappeared"))
    })?;

    let upstream = marker
        .input(0)
        .and_then(|input| input.source)
        .ok_or_else(|| {
            ExportError::GraphIntegrity(format!(
                "loop marker {marker_id} must be fed by a channel"
            ))
        })?;
    let output = marker.output(0).ok_or_else(|| {
        ExportError::GraphIntegrity(format!("loop marker {marker_id} has no output"))
    })?;
    let downstream = match output.destinations.as_slice() {
        [] => {
            return Err(ExportError::GraphIntegrity(format!(
                "loop marker {marker_id} has no consumer"
            )));
        }
        [single] => *single,
        [first, rest @ ..] => {
            warn!(
                target: TRACING_TARGET,
                marker = %marker_id,
                dropped = rest.len(),
                "loop marker fans out, keeping the first destination"
            );
            *first
        }
    };

    let Some((producer, consumer)) = workflow.pair_mut(upstream.job, downstream.job) else {
        return Err(ExportError::GraphIntegrity(format!(
            "loop marker {marker_id} connects {} to {}",
            upstream.job, downstream.job
        )));
    };
    let producer_id = producer.id;

    let Some(output) = producer.output_mut(upstream.port_nr) else {
        return Err(ExportError::GraphIntegrity(format!(
            "job {producer_id} has no output {}",
            upstream.port_nr
        )));
    };
    let Some(slot) = output
        .destinations
        .iter_mut()
        .find(|destination| destination.job == marker_id)
    else {
        return Err(ExportError::GraphIntegrity(format!(
            "output {} does not feed loop marker {marker_id}",
            PortRef::new(producer_id, upstream.port_nr)
        )));
    };
    *slot = downstream;

    let Some(input) = consumer.input_mut(downstream.port_nr) else {
        return Err(ExportError::GraphIntegrity(format!(
            "job {} has no input {}",
            downstream.job, downstream.port_nr
        )));
    };
    input.source = Some(PortRef::new(producer_id, upstream.port_nr));

    match kind {
        JobKind::Generator => {
            output.connection = ConnectionType::Generator;
            // A collector collapsed earlier may already have flagged this input.
            if input.connection != ConnectionType::Collector {
                input.connection = ConnectionType::Channel;
            }
        }
        _ => {
            input.connection = ConnectionType::Collector;
        }
    }

    let marker = workflow.job_mut(marker_id).ok_or_else(|| {
        ExportError::GraphIntegrity(format!("loop marker {marker_id} disappeared"))
    })?;
    marker.ignored = true;

    Ok(())
}
