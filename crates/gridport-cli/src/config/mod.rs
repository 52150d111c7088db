//! CLI configuration management.
//!
//! ```text
//! Cli
//! └── command
//!     ├── export: ExportArgs      # session, output, profile, target
//!     └── validate: ValidateArgs  # session, profile, target
//! ```
//!
//! Every option can be provided as a CLI argument or a `GRIDPORT_*`
//! environment variable. Use `--help` for the full list.

mod export;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gridport_export::catalog::ResourceCatalog;
use gridport_export::session::{GraphDefinition, GraphSnapshot};
use serde::{Deserialize, Serialize};

pub use crate::config::export::{ExportArgs, TargetConfig, ValidateArgs, log_export_config};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "gridport")]
#[command(about = "Exports workflow sessions for grid execution")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[clap(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand, Serialize, Deserialize)]
pub enum Command {
    /// Export a session snapshot as a workflow archive.
    Export(ExportArgs),
    /// Run the pipeline without writing an archive.
    Validate(ValidateArgs),
}

/// Loads a session snapshot from its JSON definition.
pub fn load_session(path: &Path) -> anyhow::Result<GraphSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let definition: GraphDefinition =
        serde_json::from_str(&raw).context("session file is not a valid snapshot")?;
    GraphSnapshot::from_definition(definition).context("session graph is inconsistent")
}

/// Loads a resource catalog from its JSON listing.
pub fn load_catalog(path: &Path) -> anyhow::Result<ResourceCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    serde_json::from_str(&raw).context("catalog file is not a valid resource listing")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use gridport_export::session::{NodeId, NodeModel, NodeSnapshot, SessionMetadata, ToolSpec};

    use super::*;

    #[test]
    fn session_round_trips_through_json() {
        let mut session =
            GraphSnapshot::new().with_metadata(SessionMetadata::named("round-trip"));
        session
            .add_node(NodeSnapshot::new(
                NodeId::new(1),
                "Mixer",
                NodeModel::Tool(ToolSpec::new("mixer", Vec::new())),
            ))
            .unwrap();

        let raw = serde_json::to_string(&session.to_definition()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let loaded = load_session(file.path()).unwrap();
        assert_eq!(loaded.metadata().name, "round-trip");
        assert_eq!(loaded.node_count(), 1);
    }

    #[test]
    fn malformed_session_reports_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"nodes\": 42}").unwrap();

        let error = load_session(file.path()).unwrap_err();
        assert!(format!("{error:#}").contains("not a valid snapshot"));
    }

    #[test]
    fn catalog_loads_from_listing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "applications": [
                    {"resource": "grid01", "name": "mixer", "version": "1.0"}
                ],
                "queues": [
                    {"resource": "grid01", "name": "short"}
                ]
            }"#,
        )
        .unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.applications().len(), 1);
        assert!(catalog.queue_exists("grid01", "short"));
    }
}
