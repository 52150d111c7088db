//! Remote resource catalog.
//!
//! An in-memory registry of the applications and queues known on the grid,
//! normally filled from the platform's resource listing by the embedding
//! application. The pipeline only consults it to verify an execution target
//! before committing to an export.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::profile::ExecutionTarget;

/// A remote application registered on a grid resource.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct ApplicationEntry {
    /// Resource (host) the application is installed on.
    pub resource: String,
    /// Application name.
    pub name: String,
    /// Installed version string.
    pub version: String,
}

/// A batch queue available on a grid resource.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct QueueEntry {
    /// Resource (host) the queue belongs to.
    pub resource: String,
    /// Queue name.
    pub name: String,
}

/// Registry of known grid applications and queues.
///
/// Entries keep registration order; natural keys must be unique.
#[derive(Clone, PartialEq, Eq, Default)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct ResourceCatalog {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    applications: Vec<ApplicationEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    queues: Vec<QueueEntry>,
}

impl ResourceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an application.
    ///
    /// The natural key is (resource, name, version); collisions are an
    /// error.
    pub fn register_application(&mut self, entry: ApplicationEntry) -> ExportResult<()> {
        let collision = self.applications.iter().any(|existing| {
            existing.resource == entry.resource
                && existing.name == entry.name
                && existing.version == entry.version
        });
        if collision {
            return Err(ExportError::DuplicateResource(format!(
                "application {}/{} {}",
                entry.resource, entry.name, entry.version
            )));
        }

        self.applications.push(entry);
        Ok(())
    }

    /// Registers a queue.
    ///
    /// The natural key is (resource, name); collisions are an error.
    pub fn register_queue(&mut self, entry: QueueEntry) -> ExportResult<()> {
        let collision = self
            .queues
            .iter()
            .any(|existing| existing.resource == entry.resource && existing.name == entry.name);
        if collision {
            return Err(ExportError::DuplicateResource(format!(
                "queue {}/{}",
                entry.resource, entry.name
            )));
        }

        self.queues.push(entry);
        Ok(())
    }

    /// Returns the registered applications, in registration order.
    pub fn applications(&self) -> &[ApplicationEntry] {
        &self.applications
    }

    /// Returns the registered queues, in registration order.
    pub fn queues(&self) -> &[QueueEntry] {
        &self.queues
    }

    /// Returns whether any entry mentions the given resource.
    pub fn contains_resource(&self, resource: &str) -> bool {
        self.applications
            .iter()
            .any(|entry| entry.resource == resource)
            || self.queues.iter().any(|entry| entry.resource == resource)
    }

    /// Returns whether the given queue exists on the given resource.
    pub fn queue_exists(&self, resource: &str, name: &str) -> bool {
        self.queues
            .iter()
            .any(|entry| entry.resource == resource && entry.name == name)
    }

    /// Verifies that an execution target names known catalog entries.
    ///
    /// A target without a resource is left unchecked. Otherwise the resource
    /// must be registered; if the target names a job manager and the resource
    /// has queues, the queue must exist there.
    pub fn verify_target(&self, target: &ExecutionTarget) -> ExportResult<()> {
        if target.resource.is_empty() {
            return Ok(());
        }
        if !self.contains_resource(&target.resource) {
            return Err(ExportError::UnknownResource(target.resource.clone()));
        }

        let has_queues = self
            .queues
            .iter()
            .any(|entry| entry.resource == target.resource);
        if !target.job_manager.is_empty()
            && has_queues
            && !self.queue_exists(&target.resource, &target.job_manager)
        {
            return Err(ExportError::UnknownResource(format!(
                "queue {} on {}",
                target.job_manager, target.resource
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(resource: &str, name: &str, version: &str) -> ApplicationEntry {
        ApplicationEntry {
            resource: resource.to_owned(),
            name: name.to_owned(),
            version: version.to_owned(),
        }
    }

    #[test]
    fn test_register_application_rejects_duplicate_key() {
        let mut catalog = ResourceCatalog::new();
        catalog
            .register_application(entry("grid01", "mixer", "1.0"))
            .unwrap();
        // Different version is a different key.
        catalog
            .register_application(entry("grid01", "mixer", "1.1"))
            .unwrap();

        assert!(matches!(
            catalog.register_application(entry("grid01", "mixer", "1.0")),
            Err(ExportError::DuplicateResource(_))
        ));
        assert_eq!(catalog.applications().len(), 2);
    }

    #[test]
    fn test_register_queue_rejects_duplicate_key() {
        let mut catalog = ResourceCatalog::new();
        catalog
            .register_queue(QueueEntry {
                resource: "grid01".into(),
                name: "short".into(),
            })
            .unwrap();

        assert!(matches!(
            catalog.register_queue(QueueEntry {
                resource: "grid01".into(),
                name: "short".into(),
            }),
            Err(ExportError::DuplicateResource(_))
        ));
    }

    #[test]
    fn test_verify_target() {
        let mut catalog = ResourceCatalog::new();
        catalog
            .register_application(entry("grid01", "mixer", "1.0"))
            .unwrap();
        catalog
            .register_queue(QueueEntry {
                resource: "grid01".into(),
                name: "short".into(),
            })
            .unwrap();

        let mut target = ExecutionTarget {
            resource: "grid01".into(),
            job_manager: "short".into(),
            ..ExecutionTarget::default()
        };
        assert!(catalog.verify_target(&target).is_ok());

        target.job_manager = "long".into();
        assert!(matches!(
            catalog.verify_target(&target),
            Err(ExportError::UnknownResource(_))
        ));

        target.resource = "grid02".into();
        assert!(matches!(
            catalog.verify_target(&target),
            Err(ExportError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_verify_target_skips_unspecified_resource() {
        let mut catalog = ResourceCatalog::new();
        catalog
            .register_application(entry("grid01", "mixer", "1.0"))
            .unwrap();

        assert!(catalog.verify_target(&ExecutionTarget::default()).is_ok());
    }

    #[test]
    fn test_verify_target_without_queues_listed() {
        let mut catalog = ResourceCatalog::new();
        catalog
            .register_application(entry("grid01", "mixer", "1.0"))
            .unwrap();

        // No queues registered for the resource; any job manager passes.
        let target = ExecutionTarget {
            resource: "grid01".into(),
            job_manager: "short".into(),
            ..ExecutionTarget::default()
        };
        assert!(catalog.verify_target(&target).is_ok());
    }
}
