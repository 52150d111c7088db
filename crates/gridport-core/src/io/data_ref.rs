//! Staged data references.
//!
//! This module provides the `DataRef` enum for referencing content that has
//! been resolved into the staging area, either as a single file or as an
//! ordered file list for multi-file ports.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reference to resolved, staged data backing a port.
///
/// A `DataRef` is created once a source has been copied into a stable
/// location and remains valid for the lifetime of the export invocation.
/// Multi-file ports carry an ordered list; the order is the order in which
/// payload entries are written into the export archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataRef {
    /// A single staged file.
    File {
        /// Absolute path of the staged file.
        path: PathBuf,
    },
    /// An ordered collection of staged files for a multi-file port.
    Files {
        /// Absolute paths of the staged files, in payload order.
        paths: Vec<PathBuf>,
    },
}

impl DataRef {
    /// Creates a reference to a single staged file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Creates a reference to an ordered list of staged files.
    pub fn files(paths: Vec<PathBuf>) -> Self {
        Self::Files { paths }
    }

    /// Returns every staged path, in payload order.
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::File { path } => std::slice::from_ref(path),
            Self::Files { paths } => paths.as_slice(),
        }
    }

    /// Returns the first staged path, if any.
    pub fn primary_path(&self) -> Option<&Path> {
        self.paths().first().map(PathBuf::as_path)
    }

    /// Returns the number of staged files.
    pub fn len(&self) -> usize {
        self.paths().len()
    }

    /// Returns `true` if no files are staged.
    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }

    /// Returns `true` if this reference carries more than one file.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Files { .. })
    }
}
