//! Workflow document rendering and archive output.

mod archive;
mod document;
mod names;

pub use archive::{GuseArchiveExporter, ShellScriptExporter, WorkflowExporter};
pub use document::render_document;
pub use names::NameTable;
