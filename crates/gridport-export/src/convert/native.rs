//! Host-native node conversion.

use std::path::PathBuf;

use gridport_core::{ArchiveWriter, DataRef, ScratchDir};
use tracing::debug;

use crate::error::ExportResult;
use crate::model::{ConnectionType, Input, Job, JobKind, Port};
use crate::session::{
    DataCategory, EdgeSnapshot, GraphDefinition, NativeSpec, NodeId, NodeModel, NodeSnapshot,
    SessionMetadata, SettingValue,
};
use crate::TRACING_TARGET;
use super::{ConvertContext, NodeConverter};

/// Synthetic port carrying the sandbox workflow archive.
const SANDBOX_PORT: &str = "sandbox";

/// Setting key synthetic reader/writer nodes use for their file path.
const PATH_SETTING: &str = "path";

/// Fallback converter wrapping any remaining node in a sandbox workflow.
///
/// A node without its own remote command line cannot run standalone, so the
/// node is copied into a minimal single-node workflow with one synthetic
/// reader per connected input and one synthetic writer per declared output,
/// each bound to a job-relative flow-variable name (`in<k>` / `out<k>`).
/// The sandbox is serialized, zipped, and shipped as an extra input; the
/// job invokes the host runtime in batch mode against that archive.
pub struct NativeConverter;

impl NodeConverter for NativeConverter {
    fn name(&self) -> &'static str {
        "native"
    }

    fn can_handle(&self, node: &NodeSnapshot) -> bool {
        !node.model.is_source()
    }

    fn convert(&self, node: &NodeSnapshot, ctx: &ConvertContext<'_>) -> ExportResult<Job> {
        let connected_inputs = ctx.connected_inputs(node);
        let declared_outputs: Vec<u32> = (0..node.outputs.len() as u32).collect();

        let definition = sandbox_definition(node, &connected_inputs, &declared_outputs);
        let archive_path = package_sandbox(node, ctx, &definition)?;

        let mut job = Job::new(node.id, &node.name, JobKind::Embedded)
            .with_description(&node.description)
            .with_position(node.position);

        for &original in &connected_inputs {
            let decl = &node.inputs[original as usize];
            let mut port = ctx.build_port(node, decl, original)?;
            port.name = flow_variable("in", original);
            job.push_input(port.into());
        }
        for &original in &declared_outputs {
            let decl = &node.outputs[original as usize];
            let mut port = ctx.build_port(node, decl, original)?;
            port.name = flow_variable("out", original);
            job.push_output(port.into());
        }

        let sandbox_port = Port::new(SANDBOX_PORT, "zip", node.inputs.len() as u32)
            .with_position(node.position)
            .with_connection(ConnectionType::UserProvided);
        let mut sandbox_input = Input::new(sandbox_port);
        sandbox_input.data = Some(DataRef::file(archive_path));
        job.push_input(sandbox_input);

        job.executable = Some(PathBuf::from(&ctx.profile.host_runtime.executable));
        job.command_line = vec![
            "-batch".to_owned(),
            "-workflow".to_owned(),
            format!("{SANDBOX_PORT}/{SANDBOX_PORT}.zip"),
        ];

        Ok(job)
    }
}

/// Builds the single-node sandbox workflow definition.
fn sandbox_definition(
    node: &NodeSnapshot,
    connected_inputs: &[u32],
    declared_outputs: &[u32],
) -> GraphDefinition {
    let mut nodes = vec![node.clone()];
    let mut edges = Vec::new();
    let mut next_id = node.id.as_u32() + 1;

    for &original in connected_inputs {
        let decl = &node.inputs[original as usize];
        let variable = flow_variable("in", original);
        let mut reader = NodeSnapshot::new(
            NodeId::new(next_id),
            &variable,
            NodeModel::Native(NativeSpec::new(reader_factory(decl.category))),
        );
        reader.outputs = vec![decl.clone()];
        reader
            .settings
            .insert(PATH_SETTING, SettingValue::Text(variable));

        edges.push(EdgeSnapshot::new(reader.id, 0, node.id, original));
        nodes.push(reader);
        next_id += 1;
    }

    for &original in declared_outputs {
        let decl = &node.outputs[original as usize];
        let variable = flow_variable("out", original);
        let mut writer = NodeSnapshot::new(
            NodeId::new(next_id),
            &variable,
            NodeModel::Native(NativeSpec::new(writer_factory(decl.category))),
        );
        writer.inputs = vec![decl.clone()];
        writer
            .settings
            .insert(PATH_SETTING, SettingValue::Text(variable));

        edges.push(EdgeSnapshot::new(node.id, original, writer.id, 0));
        nodes.push(writer);
        next_id += 1;
    }

    GraphDefinition {
        metadata: SessionMetadata::named(&node.name),
        nodes,
        edges,
    }
}

/// Writes the sandbox to a scratch directory, zips it into the staging
/// area, and removes the scratch directory again.
fn package_sandbox(
    node: &NodeSnapshot,
    ctx: &ConvertContext<'_>,
    definition: &GraphDefinition,
) -> ExportResult<PathBuf> {
    let scratch = ScratchDir::create_in(ctx.staging.path(), "sandbox-")?;
    std::fs::write(
        scratch.path().join("workflow.json"),
        serde_json::to_vec_pretty(definition)?,
    )?;

    let archive_path = ctx
        .staging
        .dir("sandboxes")?
        .join(format!("{}.zip", node.id));
    let mut archive = ArchiveWriter::create(&archive_path)?;
    archive.add_dir_contents("", scratch.path())?;
    archive.finish()?;
    scratch.close()?;

    debug!(
        target: TRACING_TARGET,
        node_id = %node.id,
        archive = %archive_path.display(),
        "packaged sandbox workflow"
    );
    Ok(archive_path)
}

/// Flow-variable name for a port; doubles as the in-job file name.
fn flow_variable(direction: &str, original: u32) -> String {
    format!("{direction}{original}")
}

const fn reader_factory(category: DataCategory) -> &'static str {
    match category {
        DataCategory::Table => "table-reader",
        DataCategory::Uri => "uri-reader",
        DataCategory::Object => "object-reader",
    }
}

const fn writer_factory(category: DataCategory) -> &'static str {
    match category {
        DataCategory::Table => "table-writer",
        DataCategory::Uri => "uri-writer",
        DataCategory::Object => "object-writer",
    }
}
