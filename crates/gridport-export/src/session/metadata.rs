//! Session metadata.

use jiff::Timestamp;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to a captured session.
///
/// Only the name participates in the export itself; the remaining fields
/// travel with serialized session definitions for bookkeeping.
#[derive(Clone, PartialEq, Default)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Workflow name as shown in the editor.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version of the workflow, if tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Tags for categorization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// When the session was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl SessionMetadata {
    /// Creates metadata with the given workflow name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
