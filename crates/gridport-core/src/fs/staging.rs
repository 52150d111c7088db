//! Per-export staging area.
//!
//! Everything an export generates on the way to the final archive lives
//! under one temporary root: serialized configuration descriptions, sandbox
//! workflow archives, and payload copies of user-provided source files. The
//! root is removed when the staging area is dropped at the end of the export.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::TRACING_TARGET_FS;

/// Scoped temporary root for one export invocation.
///
/// Created at pipeline start, dropped at the end; all intermediate content
/// (staged payloads, generated descriptions, sandbox archives) is placed in
/// subdirectories of this root so that cleanup is a single recursive delete.
#[derive(Debug)]
pub struct StagingArea {
    root: TempDir,
}

impl StagingArea {
    /// Creates a new staging area under the system temp directory.
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("gridport-")
            .tempdir()
            .map_err(|err| {
                Error::from_source(ErrorKind::Io, err)
                    .with_message("Failed to create staging area")
            })?;

        debug!(
            target: TRACING_TARGET_FS,
            path = %root.path().display(),
            "created staging area"
        );

        Ok(Self { root })
    }

    /// Returns the staging root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates (if needed) and returns a subdirectory of the staging root.
    pub fn dir(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = self.root.path().join(name.as_ref());
        std::fs::create_dir_all(&dir).map_err(|err| {
            Error::from_source(ErrorKind::Io, err).with_message(format!(
                "Failed to create staging directory {}",
                dir.display()
            ))
        })?;
        Ok(dir)
    }

    /// Writes bytes to a file below the staging root, creating parent
    /// directories as needed, and returns the absolute path.
    pub fn write_file(&self, relative: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.path().join(relative.as_ref());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::from_source(ErrorKind::Io, err).with_message(format!(
                    "Failed to create staging directory {}",
                    parent.display()
                ))
            })?;
        }
        std::fs::write(&path, bytes).map_err(|err| {
            Error::from_source(ErrorKind::Io, err)
                .with_message(format!("Failed to write staged file {}", path.display()))
        })?;
        Ok(path)
    }

    /// Copies an existing file into a staging subdirectory, keeping its file
    /// name, and returns the staged path.
    pub fn stage_file(&self, dir: impl AsRef<Path>, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(Error::not_found()
                .with_message(format!("Source file {} does not exist", source.display())));
        }
        let file_name = source.file_name().ok_or_else(|| {
            Error::invalid_input()
                .with_message(format!("Source path {} has no file name", source.display()))
        })?;

        let target_dir = self.dir(dir)?;
        let target = target_dir.join(file_name);
        std::fs::copy(source, &target).map_err(|err| {
            Error::from_source(ErrorKind::Io, err).with_message(format!(
                "Failed to stage {} as {}",
                source.display(),
                target.display()
            ))
        })?;
        Ok(target)
    }
}
