//! The job graph produced by conversion and consumed by serialization.
//!
//! Provides the following types:
//!
//! - [`Workflow`]: insertion-ordered job arena addressed by node ID.
//! - [`Job`] and [`JobKind`]: one execution unit per graph node.
//! - [`Port`], [`Input`], [`Output`]: compacted port model with
//!   [`ConnectionType`] resolution states and [`PortRef`] endpoints.

mod job;
mod port;
mod workflow;

pub use job::{Job, JobKind};
pub use port::{ConnectionType, Input, Output, Port, PortRef};
pub use workflow::{CanvasExtent, Workflow};
