//! Filesystem module for export staging and archive assembly.
//!
//! This module provides the scoped filesystem resources used by one export
//! invocation: a staging area for generated and copied content, scratch
//! directories for sandbox workflows, and the archive writer that assembles
//! the final zip artifact.
//!
//! # Core Types
//!
//! - [`StagingArea`]: per-export temporary root holding staged content
//! - [`ScratchDir`]: disposable sandbox directory with lock-tolerant cleanup
//! - [`ArchiveWriter`]: entry-by-entry zip assembly

mod archive;
mod scratch;
mod staging;

// Re-export main types
pub use archive::ArchiveWriter;
pub use scratch::ScratchDir;
pub use staging::StagingArea;
