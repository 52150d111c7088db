//! Zip archive assembly.
//!
//! The export artifact and the sandbox workflow archives are both plain zip
//! files written entry by entry through a single stream.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{Error, ErrorKind, Result};
use crate::TRACING_TARGET_ARCHIVE;

/// Entry-by-entry zip writer.
///
/// Entries are written in call order; there is no parallel write path. The
/// archive is only valid once [`finish`](ArchiveWriter::finish) has run.
pub struct ArchiveWriter {
    zip: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveWriter {
    /// Creates a new archive at the given path, truncating any existing file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|err| {
            Error::from_source(ErrorKind::Io, err)
                .with_message(format!("Failed to create archive {}", path.display()))
        })?;

        debug!(
            target: TRACING_TARGET_ARCHIVE,
            path = %path.display(),
            "created archive"
        );

        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(file)),
            options: SimpleFileOptions::default(),
            entries: 0,
        })
    }

    /// Adds an entry with the given bytes.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.options).map_err(|err| {
            Error::from_source(ErrorKind::Archive, err)
                .with_message(format!("Failed to start archive entry {name}"))
        })?;
        self.zip.write_all(bytes).map_err(|err| {
            Error::from_source(ErrorKind::Io, err)
                .with_message(format!("Failed to write archive entry {name}"))
        })?;
        self.entries += 1;
        Ok(())
    }

    /// Adds an entry with the contents of an existing file.
    pub fn add_file(&mut self, name: &str, source: &Path) -> Result<()> {
        let bytes = std::fs::read(source).map_err(|err| {
            Error::from_source(ErrorKind::Io, err)
                .with_message(format!("Failed to read {}", source.display()))
        })?;
        self.add_bytes(name, &bytes)
    }

    /// Adds every file below `dir`, recursively, under the entry prefix.
    ///
    /// Directory entries are visited in name order so the resulting archive
    /// layout is deterministic.
    pub fn add_dir_contents(&mut self, prefix: &str, dir: &Path) -> Result<()> {
        let read_dir = std::fs::read_dir(dir).map_err(|err| {
            Error::from_source(ErrorKind::Io, err)
                .with_message(format!("Failed to read directory {}", dir.display()))
        })?;
        let mut entries = read_dir
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| {
                Error::from_source(ErrorKind::Io, err)
                    .with_message(format!("Failed to read directory {}", dir.display()))
            })?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_name = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if path.is_dir() {
                self.add_dir_contents(&entry_name, &path)?;
            } else {
                self.add_file(&entry_name, &path)?;
            }
        }
        Ok(())
    }

    /// Returns the number of entries written so far.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Writes the central directory and flushes the underlying file.
    pub fn finish(self) -> Result<()> {
        let entries = self.entries;
        let mut inner = self.zip.finish().map_err(|err| {
            Error::from_source(ErrorKind::Archive, err).with_message("Failed to finish archive")
        })?;
        inner.flush().map_err(|err| {
            Error::from_source(ErrorKind::Io, err).with_message("Failed to flush archive")
        })?;

        debug!(target: TRACING_TARGET_ARCHIVE, entries, "finished archive");
        Ok(())
    }
}
