//! Loop-marker conversion.

use crate::error::{ExportError, ExportResult};
use crate::model::{Job, JobKind, Port};
use crate::session::NodeSnapshot;
use super::{ConvertContext, NodeConverter};

/// Converts generator/collector marker nodes.
///
/// Markers become placeholder jobs with exactly one input and one output;
/// the loop collapser relies on that shape when it splices them out again.
pub struct MarkerConverter;

impl NodeConverter for MarkerConverter {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn can_handle(&self, node: &NodeSnapshot) -> bool {
        node.model.is_loop_marker()
    }

    fn convert(&self, node: &NodeSnapshot, ctx: &ConvertContext<'_>) -> ExportResult<Job> {
        if !ctx.profile.collapse_loops {
            return Err(ExportError::Configuration {
                node_id: node.id,
                message: "loop markers are not supported by this profile".to_owned(),
            });
        }

        let kind = if node.model.is_generator() {
            JobKind::Generator
        } else {
            JobKind::Collector
        };

        let mut job = Job::new(node.id, &node.name, kind)
            .with_description(&node.description)
            .with_position(node.position);

        // Declared descriptors take precedence; a bare marker still gets
        // its one-in-one-out shape.
        let input = match node.inputs.first() {
            Some(decl) => ctx.build_port(node, decl, 0)?,
            None => Port::new("in", "", 0).with_position(node.position),
        };
        let output = match node.outputs.first() {
            Some(decl) => ctx.build_port(node, decl, 0)?,
            None => Port::new("out", "", 0).with_position(node.position),
        };
        job.push_input(input.into());
        job.push_output(output.into());

        Ok(job)
    }
}
