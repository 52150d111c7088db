//! Editor session snapshot types.
//!
//! This module provides:
//! - [`GraphSnapshot`]: runtime graph representation using petgraph
//! - [`GraphDefinition`]: serializable JSON-friendly definition
//! - [`SessionMetadata`]: session metadata (name, description, version, etc.)
//! - [`NodeSnapshot`], [`NodeId`], [`NodeModel`]: node types and identifiers
//! - [`EdgeSnapshot`]: data connections with port indices
//! - [`Settings`], [`SettingValue`]: persisted parameter trees

mod edge;
mod graph;
mod metadata;
mod node;
mod settings;

pub use edge::EdgeSnapshot;
pub use graph::{GraphDefinition, GraphSnapshot};
pub use metadata::SessionMetadata;
pub use node::{
    CommandToken, DataCategory, NativeSpec, NodeId, NodeModel, NodeSnapshot, NodeSnapshotBuilder,
    PortDecl, Position, SourceSpec, ToolSpec,
};
pub use settings::{SettingValue, Settings};
