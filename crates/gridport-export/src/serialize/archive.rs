//! Workflow archive assembly.

use std::path::Path;

use tracing::debug;

use gridport_core::ArchiveWriter;

use crate::error::{ExportError, ExportResult};
use crate::model::Workflow;
use crate::profile::ExecutionTarget;
use crate::serialize::{render_document, NameTable};
use crate::TRACING_TARGET;

/// A destination format for a fully resolved workflow.
pub trait WorkflowExporter {
    /// Stable identifier for the format, used in logs and errors.
    fn format(&self) -> &'static str;

    /// Writes the workflow to `destination`.
    fn export(
        &self,
        workflow: &Workflow,
        names: &NameTable,
        target: &ExecutionTarget,
        title: &str,
        destination: &Path,
    ) -> ExportResult<()>;
}

/// Exports the workflow as a zip archive around `workflow.xml`.
///
/// Inputs that carry staged data additionally get one payload entry per
/// file under `<job>/inputs/<port>/<index>`, which is where the remote
/// host expects user-provided content.
pub struct GuseArchiveExporter;

impl WorkflowExporter for GuseArchiveExporter {
    fn format(&self) -> &'static str {
        "guse-archive"
    }

    fn export(
        &self,
        workflow: &Workflow,
        names: &NameTable,
        target: &ExecutionTarget,
        title: &str,
        destination: &Path,
    ) -> ExportResult<()> {
        let document = render_document(workflow, names, target, title)?;

        let mut archive = ArchiveWriter::create(destination)?;
        archive.add_bytes("workflow.xml", &document)?;

        for job in workflow.jobs().filter(|job| !job.ignored) {
            let job_name = names.get(job.id).ok_or_else(|| {
                ExportError::GraphIntegrity(format!("job {} has no export name", job.id))
            })?;
            for input in job.inputs() {
                let Some(data) = &input.data else {
                    continue;
                };
                for (index, path) in data.paths().iter().enumerate() {
                    let entry = format!("{job_name}/inputs/{}/{index}", input.port_nr);
                    archive.add_file(&entry, path)?;
                }
            }
        }

        let entries = archive.entry_count();
        archive.finish()?;
        debug!(
            target: TRACING_TARGET,
            destination = %destination.display(),
            entries,
            "wrote workflow archive"
        );
        Ok(())
    }
}

/// Shell-script export, declared but not implemented.
pub struct ShellScriptExporter;

impl WorkflowExporter for ShellScriptExporter {
    fn format(&self) -> &'static str {
        "shell-script"
    }

    fn export(
        &self,
        _workflow: &Workflow,
        _names: &NameTable,
        _target: &ExecutionTarget,
        _title: &str,
        _destination: &Path,
    ) -> ExportResult<()> {
        Err(ExportError::UnsupportedFormat(self.format()))
    }
}
