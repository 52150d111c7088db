//! Export pipeline orchestration.
//!
//! The exporter takes one read-only [`GraphSnapshot`] and turns it into a
//! workflow archive for the remote grid platform.
//!
//! # Export Process
//!
//! 1. **Validation**: Check the session graph and the execution target
//! 2. **Conversion**: Turn every processing node into a job
//! 3. **Channel Resolution**: Wire session edges between jobs
//! 4. **Source Resolution**: Stage pure data sources as user-provided inputs
//! 5. **Loop Collapsing**: Splice generator and collector markers out
//! 6. **Naming**: Assign unique, schema-safe job names

use std::path::Path;

use tracing::{debug, info};

use gridport_core::{sanitize_name, StagingArea};

use crate::catalog::ResourceCatalog;
use crate::convert::{
    collapse_loops, resolve_connections, resolve_sources, ConvertContext, ConverterChain,
    SourceChain,
};
use crate::error::ExportResult;
use crate::model::Workflow;
use crate::profile::ExportProfile;
use crate::serialize::{GuseArchiveExporter, NameTable, WorkflowExporter};
use crate::session::GraphSnapshot;
use crate::TRACING_TARGET;

/// Summary of one export run.
#[derive(Clone, Copy, PartialEq, Eq)]
#[derive(Debug)]
pub struct ExportSummary {
    /// Jobs created from the session, collapsed markers included.
    pub jobs: usize,
    /// Jobs that end up in the document.
    pub emitted_jobs: usize,
    /// Channel connections wired between jobs.
    pub connections: usize,
    /// Payload files staged for upload.
    pub payloads: usize,
}

/// Turns graph sessions into workflow archives.
pub struct Exporter {
    /// Behavioral profile for the conversion passes.
    profile: ExportProfile,
    /// Optional catalog for validating the execution target.
    catalog: Option<ResourceCatalog>,
    converters: ConverterChain,
    sources: SourceChain,
}

/// Everything the pipeline produced, held together so staged payload
/// files outlive document rendering.
struct Pipeline {
    workflow: Workflow,
    names: NameTable,
    title: String,
    staging: StagingArea,
    summary: ExportSummary,
}

impl Exporter {
    /// Creates an exporter with the standard converter chains.
    pub fn new(profile: ExportProfile) -> Self {
        Self {
            profile,
            catalog: None,
            converters: ConverterChain::standard(),
            sources: SourceChain::standard(),
        }
    }

    /// Validates execution targets against the given catalog.
    pub fn with_catalog(mut self, catalog: ResourceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Exports the session as a workflow archive at `destination`.
    pub fn export_to(&self, session: &GraphSnapshot, destination: &Path) -> ExportResult<ExportSummary> {
        self.export_with(session, &GuseArchiveExporter, destination)
    }

    /// Exports the session through an explicit destination format.
    pub fn export_with(
        &self,
        session: &GraphSnapshot,
        exporter: &dyn WorkflowExporter,
        destination: &Path,
    ) -> ExportResult<ExportSummary> {
        let pipeline = self.run_pipeline(session)?;
        exporter.export(
            &pipeline.workflow,
            &pipeline.names,
            &self.profile.target,
            &pipeline.title,
            destination,
        )?;

        debug!(
            target: TRACING_TARGET,
            staged = %pipeline.staging.path().display(),
            "releasing staged payload files"
        );
        info!(
            target: TRACING_TARGET,
            format = exporter.format(),
            destination = %destination.display(),
            jobs = pipeline.summary.emitted_jobs,
            payloads = pipeline.summary.payloads,
            "workflow exported"
        );
        Ok(pipeline.summary)
    }

    /// Runs the pipeline without writing anything out.
    ///
    /// Useful for checking a session before offering the export, since
    /// every conversion error surfaces here as well.
    pub fn validate(&self, session: &GraphSnapshot) -> ExportResult<ExportSummary> {
        let pipeline = self.run_pipeline(session)?;
        Ok(pipeline.summary)
    }

    fn run_pipeline(&self, session: &GraphSnapshot) -> ExportResult<Pipeline> {
        // Phase 1: Validate the session and the execution target
        session.validate()?;
        if let Some(catalog) = &self.catalog {
            catalog.verify_target(&self.profile.target)?;
        }

        let staging = StagingArea::new()?;
        let mut workflow = Workflow::new();
        {
            let ctx = ConvertContext {
                session,
                staging: &staging,
                profile: &self.profile,
            };

            // Phase 2: Convert processing nodes into jobs
            for node in session.nodes() {
                // Pure data sources resolve against consumer inputs in phase 4.
                if node.is_source() {
                    continue;
                }
                workflow.insert(self.converters.convert(node, &ctx)?)?;
            }

            // Phase 3: Wire session edges into channels
            let bindings = resolve_connections(&mut workflow, session)?;

            // Phase 4: Stage pure data sources
            resolve_sources(&mut workflow, &bindings, &self.sources, &ctx)?;
        }

        // Phase 5: Splice loop markers out
        collapse_loops(&mut workflow)?;

        // Phase 6: Assign unique export names
        let names = NameTable::assign(&workflow);

        let title = sanitize_name(&session.metadata().name);
        let summary = summarize(&workflow);
        debug!(
            target: TRACING_TARGET,
            title = title.as_str(),
            jobs = summary.jobs,
            connections = summary.connections,
            "export pipeline finished"
        );

        Ok(Pipeline {
            workflow,
            names,
            title,
            staging,
            summary,
        })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportProfile::default())
    }
}

fn summarize(workflow: &Workflow) -> ExportSummary {
    let (mut connections, mut payloads) = (0, 0);
    for job in workflow.jobs().filter(|job| !job.ignored) {
        for input in job.inputs() {
            if input.source.is_some() {
                connections += 1;
            }
            if let Some(data) = &input.data {
                payloads += data.len();
            }
        }
    }

    ExportSummary {
        jobs: workflow.len(),
        emitted_jobs: workflow.emitted_len(),
        connections,
        payloads,
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;

    use super::*;
    use crate::error::ExportError;
    use crate::session::{
        DataCategory, EdgeSnapshot, NodeId, NodeModel, NodeSnapshot, PortDecl, SessionMetadata,
        SourceSpec, ToolSpec,
    };

    fn inline_source(id: u32, name: &str, file_name: &str, contents: &str) -> NodeSnapshot {
        NodeSnapshot::new(
            NodeId::new(id),
            name,
            NodeModel::Source(SourceSpec::Inline {
                file_name: file_name.into(),
                contents: contents.into(),
            }),
        )
    }

    fn sample_session() -> GraphSnapshot {
        let mut mixer = NodeSnapshot::new(
            NodeId::new(1),
            "Mixer",
            NodeModel::Tool(ToolSpec::new("mixer", Vec::new())),
        );
        mixer.inputs = vec![
            PortDecl::new("words", "txt", DataCategory::Uri),
            PortDecl::new("numbers", "txt", DataCategory::Uri),
        ];
        mixer.outputs = vec![PortDecl::new("combined", "txt", DataCategory::Uri)];

        let mut modifier = NodeSnapshot::new(
            NodeId::new(2),
            "Modifier",
            NodeModel::Tool(ToolSpec::new("modifier", Vec::new())),
        );
        modifier.inputs = vec![PortDecl::new("wordsnumbers", "txt", DataCategory::Uri)];
        modifier.outputs = vec![PortDecl::new("finalresult", "txt", DataCategory::Uri)];

        let mut session = GraphSnapshot::new().with_metadata(SessionMetadata::named("sample"));
        session
            .add_node(inline_source(10, "Words", "words.txt", "alpha"))
            .unwrap();
        session
            .add_node(inline_source(11, "Numbers", "numbers.txt", "42"))
            .unwrap();
        session.add_node(mixer).unwrap();
        session.add_node(modifier).unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(10), 0, NodeId::new(1), 0))
            .unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(11), 0, NodeId::new(1), 1))
            .unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(1), 0, NodeId::new(2), 0))
            .unwrap();
        session
    }

    #[test]
    fn test_export_produces_documented_archive() {
        let session = sample_session();
        let scratch = StagingArea::new().unwrap();
        let destination = scratch.path().join("sample.zip");

        let summary = Exporter::default().export_to(&session, &destination).unwrap();
        assert_eq!(summary.jobs, 2);
        assert_eq!(summary.emitted_jobs, 2);
        assert_eq!(summary.connections, 1);
        assert_eq!(summary.payloads, 2);

        let mut archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        let mut xml = String::new();
        archive
            .by_name("workflow.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        assert!(xml.contains(r#"name="sample""#));
        assert!(xml.contains(r#"<input name="words" prejob="" preoutput="" seq="0""#));
        assert!(xml.contains(r#"<input name="numbers" prejob="" preoutput="" seq="1""#));
        assert!(xml.contains(r#"<output name="combined" seq="2""#));
        assert!(xml.contains(r#"<input name="wordsnumbers" prejob="Mixer" preoutput="1" seq="0""#));
        assert!(xml.contains(r#"<output name="finalresult" seq="1""#));

        let mut payload = String::new();
        archive
            .by_name("Mixer/inputs/0/0")
            .unwrap()
            .read_to_string(&mut payload)
            .unwrap();
        assert_eq!(payload, "alpha");
    }

    #[test]
    fn test_loop_markers_collapse_end_to_end() {
        let mut splitter = NodeSnapshot::new(
            NodeId::new(1),
            "Splitter",
            NodeModel::Tool(ToolSpec::new("split", Vec::new())),
        );
        splitter.outputs = vec![PortDecl::new("parts", "txt", DataCategory::Uri)];
        let mut spread = NodeSnapshot::new(NodeId::new(2), "Spread", NodeModel::Generator);
        spread.inputs = vec![PortDecl::new("in", "", DataCategory::Uri)];
        spread.outputs = vec![PortDecl::new("out", "", DataCategory::Uri)];
        let mut worker = NodeSnapshot::new(
            NodeId::new(3),
            "Worker",
            NodeModel::Tool(ToolSpec::new("work", Vec::new())),
        );
        worker.inputs = vec![PortDecl::new("part", "txt", DataCategory::Uri)];
        worker.outputs = vec![PortDecl::new("done", "txt", DataCategory::Uri)];
        let mut gather = NodeSnapshot::new(NodeId::new(4), "Gather", NodeModel::Collector);
        gather.inputs = vec![PortDecl::new("in", "", DataCategory::Uri)];
        gather.outputs = vec![PortDecl::new("out", "", DataCategory::Uri)];
        let mut merger = NodeSnapshot::new(
            NodeId::new(5),
            "Merger",
            NodeModel::Tool(ToolSpec::new("merge", Vec::new())),
        );
        merger.inputs = vec![PortDecl::new("all", "txt", DataCategory::Uri)];

        let mut session = GraphSnapshot::new().with_metadata(SessionMetadata::named("loops"));
        for node in [splitter, spread, worker, gather, merger] {
            session.add_node(node).unwrap();
        }
        for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 5)] {
            session
                .add_edge(EdgeSnapshot::new(NodeId::new(from), 0, NodeId::new(to), 0))
                .unwrap();
        }

        let scratch = StagingArea::new().unwrap();
        let destination = scratch.path().join("loops.zip");
        let summary = Exporter::default().export_to(&session, &destination).unwrap();
        assert_eq!(summary.jobs, 5);
        assert_eq!(summary.emitted_jobs, 3);

        let mut archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        let mut xml = String::new();
        archive
            .by_name("workflow.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        assert!(!xml.contains("Spread"));
        assert!(!xml.contains("Gather"));
        assert!(xml.contains(r#"<port_prop key="maincount" value="*""#));
        assert!(xml.contains(r#"<port_prop key="waiting" value="all""#));
        assert!(xml.contains(r#"<port_prop key="eparam" value="1""#));
    }

    #[test]
    fn test_validate_reports_without_writing() {
        let session = sample_session();
        let summary = Exporter::default().validate(&session).unwrap();
        assert_eq!(summary.emitted_jobs, 2);
        assert_eq!(summary.payloads, 2);
    }

    #[test]
    fn test_unknown_target_resource_is_rejected() {
        let mut catalog = ResourceCatalog::new();
        catalog
            .register_application(crate::catalog::ApplicationEntry {
                resource: "cluster".into(),
                name: "mixer".into(),
                version: "1.0".into(),
            })
            .unwrap();

        let profile = ExportProfile::standard().with_target(crate::profile::ExecutionTarget {
            resource: "elsewhere".into(),
            ..Default::default()
        });
        let exporter = Exporter::new(profile).with_catalog(catalog);

        assert!(matches!(
            exporter.validate(&sample_session()),
            Err(ExportError::UnknownResource(_))
        ));
    }
}
