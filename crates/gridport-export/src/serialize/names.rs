//! Export-unique job naming.

use std::collections::{HashMap, HashSet};

use gridport_core::sanitize_name;

use crate::model::Workflow;
use crate::session::NodeId;

/// Schema-safe, export-unique names for every emitted job.
///
/// The target schema keys back-references by job name, so names must be
/// unique across the document. Collisions get an incrementing integer
/// suffix, assigned in workflow iteration order so the same workflow
/// always yields the same names.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug, Default)]
pub struct NameTable {
    names: HashMap<NodeId, String>,
}

impl NameTable {
    /// Assigns a unique sanitized name to every non-ignored job.
    pub fn assign(workflow: &Workflow) -> Self {
        let mut names = HashMap::new();
        let mut taken = HashSet::new();

        for job in workflow.jobs().filter(|job| !job.ignored) {
            let base = sanitize_name(&job.name);
            let mut candidate = base.clone();
            let mut suffix = 1u32;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}{suffix}");
                suffix += 1;
            }
            names.insert(job.id, candidate);
        }

        Self { names }
    }

    /// Returns the export name assigned to a job, if it was emitted.
    pub fn get(&self, id: NodeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns the number of named jobs.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether no jobs were named.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
