//! Export behavior profiles.
//!
//! The pipeline logic exists once; the behavioral deltas between the
//! supported platform generations live here as plain data.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Where and how exported jobs execute on the grid.
///
/// These values flow verbatim into the real-section execution properties of
/// every emitted job.
#[derive(Clone, PartialEq, Eq, Default)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct ExecutionTarget {
    /// Grid (virtual organization) name.
    #[serde(default)]
    pub grid: String,
    /// Middleware type identifier.
    #[serde(default)]
    pub grid_type: String,
    /// Resource (host) jobs are submitted to.
    #[serde(default)]
    pub resource: String,
    /// Batch queue on the resource.
    #[serde(default)]
    pub job_manager: String,
    /// Extra submission parameters appended to every job's parameter string.
    #[serde(default)]
    pub params: String,
}

/// The host runtime invoked by embedded jobs.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct HostRuntime {
    /// Executable expected on the remote side.
    pub executable: String,
}

impl HostRuntime {
    /// Creates a host runtime with the given executable name.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new("workbench")
    }
}

/// Behavioral configuration of one export run.
#[derive(Clone, PartialEq, Builder)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[builder(
    name = "ExportProfileBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with")
)]
pub struct ExportProfile {
    /// Whether multi-file ports are supported.
    ///
    /// A multi-file port under a profile without support is a node
    /// configuration error.
    #[builder(default = "true")]
    pub multi_file_ports: bool,
    /// Whether generator/collector loop idioms are collapsed.
    ///
    /// Loop markers present under a profile without collapsing are a node
    /// configuration error.
    #[builder(default = "true")]
    pub collapse_loops: bool,
    /// Execution target for every emitted job.
    #[builder(default)]
    pub target: ExecutionTarget,
    /// Host runtime invoked by embedded jobs.
    #[builder(default)]
    pub host_runtime: HostRuntime,
}

impl ExportProfile {
    /// The current platform generation: multi-file ports and loop
    /// collapsing both on.
    pub fn standard() -> Self {
        Self {
            multi_file_ports: true,
            collapse_loops: true,
            target: ExecutionTarget::default(),
            host_runtime: HostRuntime::default(),
        }
    }

    /// The older platform generation: single-file ports only, loop idioms
    /// rejected.
    pub fn legacy() -> Self {
        Self {
            multi_file_ports: false,
            collapse_loops: false,
            ..Self::standard()
        }
    }

    /// Sets the execution target.
    #[must_use]
    pub fn with_target(mut self, target: ExecutionTarget) -> Self {
        self.target = target;
        self
    }

    /// Returns a builder for assembling a profile.
    pub fn builder() -> ExportProfileBuilder {
        ExportProfileBuilder::default()
    }
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self::standard()
    }
}
