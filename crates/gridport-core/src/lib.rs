#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Gridport Core
//!
//! This crate provides the foundational types shared by the gridport export
//! pipeline: a structured error type, file-based data references, staging and
//! scratch directory management, and the archive writer used to assemble
//! export artifacts.

/// Tracing target for filesystem operations.
pub const TRACING_TARGET_FS: &str = "gridport_core::fs";

/// Tracing target for archive operations.
pub const TRACING_TARGET_ARCHIVE: &str = "gridport_core::archive";

mod error;
mod text;

pub mod fs;
pub mod io;

// Re-export key types for convenience
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use fs::{ArchiveWriter, ScratchDir, StagingArea};
pub use io::DataRef;
pub use text::sanitize_name;
