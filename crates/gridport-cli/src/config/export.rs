//! Export and validation command configuration.

use std::path::PathBuf;

use clap::Args;
use gridport_export::profile::{ExecutionTarget, ExportProfile, HostRuntime};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Execution target configuration.
///
/// These values pass straight through to the execute properties of every
/// job in the exported document; the remote platform interprets them.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Grid to submit the workflow to.
    #[arg(long, env = "GRIDPORT_GRID", default_value = "")]
    pub grid: String,

    /// Middleware type of the grid.
    #[arg(long, env = "GRIDPORT_GRID_TYPE", default_value = "")]
    pub grid_type: String,

    /// Remote resource (host) jobs run on.
    #[arg(long, env = "GRIDPORT_RESOURCE", default_value = "")]
    pub resource: String,

    /// Batch queue on the resource.
    #[arg(long = "queue", env = "GRIDPORT_QUEUE", default_value = "")]
    pub job_manager: String,

    /// Extra parameters appended to every job command line.
    #[arg(long, env = "GRIDPORT_PARAMS", default_value = "")]
    pub params: String,
}

impl TargetConfig {
    /// Converts the arguments into an execution target.
    pub fn to_target(&self) -> ExecutionTarget {
        ExecutionTarget {
            grid: self.grid.clone(),
            grid_type: self.grid_type.clone(),
            resource: self.resource.clone(),
            job_manager: self.job_manager.clone(),
            params: self.params.clone(),
        }
    }
}

/// Arguments for the `export` subcommand.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ExportArgs {
    /// Path to the session snapshot JSON.
    #[arg(long, env = "GRIDPORT_SESSION")]
    pub session: PathBuf,

    /// Destination path for the workflow archive.
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Path to a resource catalog JSON for target validation.
    #[arg(long, env = "GRIDPORT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Export with the older profile: no multi-file ports, no loop
    /// collapsing.
    #[arg(long, default_value_t = false)]
    pub legacy: bool,

    /// Host runtime executable used by sandboxed native nodes.
    #[arg(long, env = "GRIDPORT_HOST_RUNTIME", default_value = "workbench")]
    pub host_runtime: String,

    /// Execution target announced to the platform.
    #[clap(flatten)]
    pub target: TargetConfig,
}

impl ExportArgs {
    /// Builds the export profile these arguments describe.
    pub fn profile(&self) -> ExportProfile {
        build_profile(self.legacy, &self.host_runtime, &self.target)
    }
}

/// Arguments for the `validate` subcommand.
///
/// Mirrors the export arguments minus the destination, so validation
/// exercises exactly what an export with the same flags would run.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ValidateArgs {
    /// Path to the session snapshot JSON.
    #[arg(long, env = "GRIDPORT_SESSION")]
    pub session: PathBuf,

    /// Path to a resource catalog JSON for target validation.
    #[arg(long, env = "GRIDPORT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Validate with the older profile.
    #[arg(long, default_value_t = false)]
    pub legacy: bool,

    /// Host runtime executable used by sandboxed native nodes.
    #[arg(long, env = "GRIDPORT_HOST_RUNTIME", default_value = "workbench")]
    pub host_runtime: String,

    /// Execution target announced to the platform.
    #[clap(flatten)]
    pub target: TargetConfig,
}

impl ValidateArgs {
    /// Builds the export profile these arguments describe.
    pub fn profile(&self) -> ExportProfile {
        build_profile(self.legacy, &self.host_runtime, &self.target)
    }
}

fn build_profile(legacy: bool, host_runtime: &str, target: &TargetConfig) -> ExportProfile {
    let base = if legacy {
        ExportProfile::legacy()
    } else {
        ExportProfile::standard()
    };
    ExportProfile {
        target: target.to_target(),
        host_runtime: HostRuntime::new(host_runtime),
        ..base
    }
}

/// Logs the export configuration.
pub fn log_export_config(args: &ExportArgs) {
    tracing::info!(
        target: TRACING_TARGET_CONFIG,
        session = %args.session.display(),
        output = %args.output.display(),
        resource = args.target.resource.as_str(),
        queue = args.target.job_manager.as_str(),
        legacy = args.legacy,
        "export configuration"
    );
}
