//! Disposable sandbox directories.
//!
//! Sandbox workflows are written into a scratch directory, archived, and
//! then removed. The embedding host runtime can hold advisory locks on files
//! it has opened inside the sandbox, so removal runs a bounded retry loop
//! before giving up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::TRACING_TARGET_FS;

/// Maximum number of removal attempts before the cleanup fails.
const UNLOCK_ATTEMPTS: u32 = 5;

/// Pause between removal attempts.
const UNLOCK_BACKOFF: Duration = Duration::from_millis(200);

/// A disposable directory for assembling one sandbox workflow.
///
/// The directory is expected to live inside a [`StagingArea`] so that it is
/// still removed with the staging root if [`close`](ScratchDir::close) is
/// never reached on an error path.
///
/// [`StagingArea`]: crate::fs::StagingArea
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a uniquely named scratch directory under `base`.
    pub fn create_in(base: &Path, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(base)
            .map_err(|err| {
                Error::from_source(ErrorKind::Io, err).with_message(format!(
                    "Failed to create scratch directory under {}",
                    base.display()
                ))
            })?;

        Ok(Self { path: dir.keep() })
    }

    /// Returns the scratch directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the scratch directory, retrying while the host runtime still
    /// holds locks on files inside it.
    pub fn close(self) -> Result<()> {
        let mut attempt = 1;
        loop {
            match std::fs::remove_dir_all(&self.path) {
                Ok(()) => {
                    debug!(
                        target: TRACING_TARGET_FS,
                        path = %self.path.display(),
                        attempt,
                        "removed scratch directory"
                    );
                    return Ok(());
                }
                Err(_) if attempt < UNLOCK_ATTEMPTS => {
                    debug!(
                        target: TRACING_TARGET_FS,
                        path = %self.path.display(),
                        attempt,
                        "scratch directory still locked, retrying"
                    );
                    std::thread::sleep(UNLOCK_BACKOFF);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(Error::from_source(ErrorKind::Io, err).with_message(format!(
                        "Failed to remove scratch directory {} after {} attempts",
                        self.path.display(),
                        UNLOCK_ATTEMPTS
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StagingArea;

    #[test]
    fn test_create_in_uses_prefix() {
        let staging = StagingArea::new().unwrap();
        let scratch = ScratchDir::create_in(staging.path(), "sandbox-").unwrap();

        let name = scratch.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("sandbox-"));
        assert!(scratch.path().is_dir());
    }

    #[test]
    fn test_close_removes_directory_and_contents() {
        let staging = StagingArea::new().unwrap();
        let scratch = ScratchDir::create_in(staging.path(), "sandbox-").unwrap();
        let file = scratch.path().join("workflow.json");
        std::fs::write(&file, b"{}").unwrap();
        let path = scratch.path().to_path_buf();

        scratch.close().unwrap();

        assert!(!path.exists());
        assert!(!file.exists());
    }
}
