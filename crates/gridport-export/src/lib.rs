#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod convert;
mod error;
pub mod export;
pub mod model;
pub mod profile;
pub mod serialize;
pub mod session;

#[doc(hidden)]
pub mod prelude;

pub use error::{ExportError, ExportResult};

/// Tracing target for export pipeline operations.
pub const TRACING_TARGET: &str = "gridport_export";
