//! Commonly used items from gridport-export.
//!
//! This prelude module exports the most commonly used types and traits
//! to simplify imports in consuming code.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gridport_export::prelude::*;
//! ```

// Catalog types
pub use crate::catalog::{ApplicationEntry, QueueEntry, ResourceCatalog};
// Converter traits for custom chains
pub use crate::convert::{ConvertContext, NodeConverter, SourceConverter};
// Error types
pub use crate::error::{ExportError, ExportResult};
// Pipeline entry points
pub use crate::export::{Exporter, ExportSummary};
// Job graph model
pub use crate::model::{
    CanvasExtent, ConnectionType, Input, Job, JobKind, Output, Port, PortRef, Workflow,
};
// Behavioral profiles
pub use crate::profile::{ExecutionTarget, ExportProfile, HostRuntime};
// Destination formats
pub use crate::serialize::{GuseArchiveExporter, ShellScriptExporter, WorkflowExporter};
// Session snapshot types
pub use crate::session::{
    CommandToken, DataCategory, EdgeSnapshot, GraphSnapshot, NativeSpec, NodeId, NodeModel,
    NodeSnapshot, PortDecl, Position, SessionMetadata, SettingValue, Settings, SourceSpec,
    ToolSpec,
};
