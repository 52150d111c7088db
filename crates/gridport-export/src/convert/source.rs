//! Pure data source resolution.

use std::ffi::OsStr;

use gridport_core::DataRef;
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::model::{ConnectionType, Workflow};
use crate::session::{NodeModel, NodeSnapshot, SourceSpec};
use crate::TRACING_TARGET;
use super::{ConvertContext, SourceBinding, SourceChain, SourceConverter};

/// Resolves file-backed source nodes by staging the referenced file.
pub struct FileSourceConverter;

impl SourceConverter for FileSourceConverter {
    fn name(&self) -> &'static str {
        "file"
    }

    fn can_handle(&self, spec: &SourceSpec) -> bool {
        matches!(spec, SourceSpec::File { .. })
    }

    fn convert(
        &self,
        node: &NodeSnapshot,
        spec: &SourceSpec,
        ctx: &ConvertContext<'_>,
    ) -> ExportResult<DataRef> {
        let SourceSpec::File { path } = spec else {
            return Err(spec_mismatch(node));
        };

        let staged = ctx.staging.stage_file(source_dir(node), path)?;
        Ok(DataRef::file(staged))
    }
}

/// Resolves directory source nodes by staging every matching file.
///
/// Files are staged in name order so the resulting list is deterministic.
pub struct DirectorySourceConverter;

impl SourceConverter for DirectorySourceConverter {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn can_handle(&self, spec: &SourceSpec) -> bool {
        matches!(spec, SourceSpec::Directory { .. })
    }

    fn convert(
        &self,
        node: &NodeSnapshot,
        spec: &SourceSpec,
        ctx: &ConvertContext<'_>,
    ) -> ExportResult<DataRef> {
        let SourceSpec::Directory { path, extension } = spec else {
            return Err(spec_mismatch(node));
        };

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let candidate = entry?.path();
            if !candidate.is_file() {
                continue;
            }
            if let Some(wanted) = extension {
                let found = candidate.extension().and_then(OsStr::to_str);
                if found != Some(wanted.as_str()) {
                    continue;
                }
            }
            matches.push(candidate);
        }
        matches.sort();

        if matches.is_empty() {
            return Err(ExportError::Configuration {
                node_id: node.id,
                message: format!("directory {} contains no matching files", path.display()),
            });
        }

        let mut staged = Vec::with_capacity(matches.len());
        for candidate in &matches {
            staged.push(ctx.staging.stage_file(source_dir(node), candidate)?);
        }
        Ok(DataRef::files(staged))
    }
}

/// Resolves inline source nodes by writing the embedded content out.
pub struct InlineSourceConverter;

impl SourceConverter for InlineSourceConverter {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn can_handle(&self, spec: &SourceSpec) -> bool {
        matches!(spec, SourceSpec::Inline { .. })
    }

    fn convert(
        &self,
        node: &NodeSnapshot,
        spec: &SourceSpec,
        ctx: &ConvertContext<'_>,
    ) -> ExportResult<DataRef> {
        let SourceSpec::Inline {
            file_name,
            contents,
        } = spec
        else {
            return Err(spec_mismatch(node));
        };

        let staged = ctx.staging.write_file(
            format!("{}/{file_name}", source_dir(node)),
            contents.as_bytes(),
        )?;
        Ok(DataRef::file(staged))
    }
}

/// Resolves every recorded source binding against the job graph.
///
/// Runs strictly after channel resolution: only inputs still unresolved at
/// that point are fed by pure data sources. Each resolved input flips from
/// `NotAssigned` to `UserProvided` and receives its staged data.
pub fn resolve_sources(
    workflow: &mut Workflow,
    bindings: &[SourceBinding],
    chain: &SourceChain,
    ctx: &ConvertContext<'_>,
) -> ExportResult<()> {
    for binding in bindings {
        let node = ctx.session.node(binding.source_node).ok_or_else(|| {
            ExportError::GraphIntegrity(format!(
                "source node {} is not in the session",
                binding.source_node
            ))
        })?;
        let NodeModel::Source(spec) = &node.model else {
            return Err(ExportError::GraphIntegrity(format!(
                "node {} was recorded as a data source but is not one",
                node.id
            )));
        };

        let data = chain.resolve(node, spec, ctx)?;

        let job = workflow.job_mut(binding.to_job).ok_or_else(|| {
            ExportError::GraphIntegrity(format!(
                "source destination job {} is missing",
                binding.to_job
            ))
        })?;
        let input = job
            .input_by_original_mut(binding.to_original)
            .ok_or_else(|| {
                ExportError::GraphIntegrity(format!(
                    "job {} has no input with original port {}",
                    binding.to_job, binding.to_original
                ))
            })?;

        if input.source.is_some() || input.connection != ConnectionType::NotAssigned {
            return Err(ExportError::GraphIntegrity(format!(
                "input {}:{} resolved twice",
                binding.to_job, binding.to_original
            )));
        }
        if data.len() > 1 && !input.multi_file {
            return Err(ExportError::Configuration {
                node_id: binding.to_job,
                message: format!(
                    "input {} is single-file but the source resolved {} files",
                    input.name,
                    data.len()
                ),
            });
        }

        input.connection = ConnectionType::UserProvided;
        input.data = Some(data);
        debug!(
            target: TRACING_TARGET,
            source = %binding.source_node,
            job = %binding.to_job,
            port = binding.to_original,
            "resolved source input"
        );
    }

    Ok(())
}

/// Staging subdirectory for one source node's data.
fn source_dir(node: &NodeSnapshot) -> String {
    format!("sources/{}", node.id)
}

fn spec_mismatch(node: &NodeSnapshot) -> ExportError {
    ExportError::Configuration {
        node_id: node.id,
        message: "source spec does not match the claiming converter".to_owned(),
    }
}
