//! Data reference definitions for staged export payloads.
//!
//! This module provides the [`DataRef`] type used by the export pipeline to
//! point at content that has already been copied into the staging area.

mod data_ref;

// Re-export core types
pub use data_ref::DataRef;
