//! Session node types.

use std::path::PathBuf;

use derive_builder::Builder;
use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use super::settings::Settings;

/// Unique identifier for a node in an editor session.
///
/// Identifiers are assigned by the host editor and stay stable for the
/// lifetime of one export invocation; they are never generated here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node ID from a host-assigned integer.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying integer.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Position of a node on the editor canvas.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Debug)]
pub struct Position {
    /// X coordinate in canvas pixels.
    pub x: i32,
    /// Y coordinate in canvas pixels.
    pub y: i32,
}

impl Position {
    /// Creates a new position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Payload category of a declared port.
///
/// The category selects which synthetic reader/writer kind a sandbox
/// workflow attaches to the port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[derive(Debug)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataCategory {
    /// Tabular data exchanged as delimited text.
    Table,
    /// File- or URI-backed data exchanged by location.
    Uri,
    /// Opaque serialized objects.
    Object,
}

/// Declared port descriptor on a session node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Debug)]
pub struct PortDecl {
    /// Port name as shown in the editor.
    pub name: String,
    /// File extension of the exchanged payload, without the dot.
    pub extension: String,
    /// Payload category.
    pub category: DataCategory,
    /// Whether the port exchanges a list of files rather than one.
    #[serde(default)]
    pub multi_file: bool,
}

impl PortDecl {
    /// Creates a single-file port descriptor.
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        category: DataCategory,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            category,
            multi_file: false,
        }
    }

    /// Sets the multi-file flag.
    #[must_use]
    pub fn with_multi_file(mut self, multi_file: bool) -> Self {
        self.multi_file = multi_file;
        self
    }
}

/// One element of a declarative command line.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandToken {
    /// Verbatim text emitted as-is.
    Literal {
        /// The text to emit.
        value: String,
    },
    /// A switch such as `-threads`.
    Flag {
        /// The switch text, including any dashes.
        value: String,
    },
    /// Job-relative path of the file arriving on an input port.
    InputPort {
        /// Declared input port index.
        port: u32,
    },
    /// Job-relative path of the file produced on an output port.
    OutputPort {
        /// Declared output port index.
        port: u32,
    },
    /// Placeholder replaced by the generated configuration description file.
    ConfigDescription,
}

/// Declarative command-line tool configuration.
///
/// Tools carry their remote invocation in the session itself: an executable
/// name and an ordered token list referencing the declared ports.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Debug)]
pub struct ToolSpec {
    /// Executable invoked on the remote host.
    pub executable: String,
    /// Ordered command-line tokens.
    pub tokens: Vec<CommandToken>,
}

impl ToolSpec {
    /// Creates a tool spec with the given executable and tokens.
    pub fn new(executable: impl Into<String>, tokens: Vec<CommandToken>) -> Self {
        Self {
            executable: executable.into(),
            tokens,
        }
    }
}

/// Data origin of a pure source node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    /// A file in the editor workspace.
    File {
        /// Absolute path of the file.
        path: PathBuf,
    },
    /// Every file in a directory, optionally filtered by extension.
    Directory {
        /// Absolute path of the directory.
        path: PathBuf,
        /// Extension filter without the dot, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extension: Option<String>,
    },
    /// Literal content embedded in the node configuration.
    Inline {
        /// File name the payload is staged under.
        file_name: String,
        /// The payload text.
        contents: String,
    },
}

/// Identity of a host-native node implementation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Debug)]
pub struct NativeSpec {
    /// Factory identifier registered with the host runtime.
    pub factory: String,
    /// Bundle that provides the factory, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
}

impl NativeSpec {
    /// Creates a native spec for the given factory.
    pub fn new(factory: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
            bundle: None,
        }
    }
}

/// Node model enum for session graphs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[derive(Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeModel {
    /// Upstream loop marker fanning a list out into per-item runs.
    Generator,
    /// Downstream loop marker collecting per-item runs back into a list.
    Collector,
    /// Declarative command-line tool.
    Tool(ToolSpec),
    /// Pure data source resolved into a user-provided payload.
    Source(SourceSpec),
    /// Host-native node wrapped in a sandbox workflow.
    Native(NativeSpec),
}

impl NodeModel {
    /// Returns whether this is the generator loop marker.
    pub const fn is_generator(&self) -> bool {
        matches!(self, NodeModel::Generator)
    }

    /// Returns whether this is the collector loop marker.
    pub const fn is_collector(&self) -> bool {
        matches!(self, NodeModel::Collector)
    }

    /// Returns whether this is either loop marker.
    pub const fn is_loop_marker(&self) -> bool {
        self.is_generator() || self.is_collector()
    }

    /// Returns whether this is a declarative tool node.
    pub const fn is_tool(&self) -> bool {
        matches!(self, NodeModel::Tool(_))
    }

    /// Returns whether this is a pure data source node.
    pub const fn is_source(&self) -> bool {
        matches!(self, NodeModel::Source(_))
    }

    /// Returns whether this is a host-native node.
    pub const fn is_native(&self) -> bool {
        matches!(self, NodeModel::Native(_))
    }
}

impl From<ToolSpec> for NodeModel {
    fn from(spec: ToolSpec) -> Self {
        NodeModel::Tool(spec)
    }
}

impl From<SourceSpec> for NodeModel {
    fn from(spec: SourceSpec) -> Self {
        NodeModel::Source(spec)
    }
}

impl From<NativeSpec> for NodeModel {
    fn from(spec: NativeSpec) -> Self {
        NodeModel::Native(spec)
    }
}

/// A node captured from the editor session.
///
/// Everything the pipeline needs from the host editor is materialized here:
/// identity, display metadata, the node model, declared port descriptors,
/// and the persisted parameter tree with resolved absolute paths.
#[derive(Clone, PartialEq, Serialize, Deserialize, Builder)]
#[derive(Debug)]
#[builder(
    name = "NodeSnapshotBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with")
)]
pub struct NodeSnapshot {
    /// Stable identifier assigned by the host editor.
    pub id: NodeId,
    /// Display name of the node.
    pub name: String,
    /// Description shown in the editor.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(default)]
    pub description: String,
    /// Position on the editor canvas.
    #[serde(default)]
    #[builder(default)]
    pub position: Position,
    /// The node model.
    #[serde(flatten)]
    pub model: NodeModel,
    /// Declared input port descriptors, in native port order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub inputs: Vec<PortDecl>,
    /// Declared output port descriptors, in native port order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub outputs: Vec<PortDecl>,
    /// Persisted parameter values.
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    #[builder(default)]
    pub settings: Settings,
}

impl NodeSnapshot {
    /// Creates a new snapshot with the given identity and model.
    pub fn new(id: NodeId, name: impl Into<String>, model: impl Into<NodeModel>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            position: Position::default(),
            model: model.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            settings: Settings::new(),
        }
    }

    /// Returns a builder for creating a snapshot.
    pub fn builder() -> NodeSnapshotBuilder {
        NodeSnapshotBuilder::default()
    }

    /// Returns whether this node is a pure data source.
    pub const fn is_source(&self) -> bool {
        self.model.is_source()
    }

    /// Returns whether this node is a loop marker.
    pub const fn is_loop_marker(&self) -> bool {
        self.model.is_loop_marker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        let id = NodeId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(id.as_u32(), 7);
    }

    #[test]
    fn test_node_model_predicates() {
        assert!(NodeModel::Generator.is_loop_marker());
        assert!(NodeModel::Collector.is_loop_marker());
        assert!(!NodeModel::Generator.is_collector());

        let tool = NodeModel::from(ToolSpec::new("mixer", Vec::new()));
        assert!(tool.is_tool());
        assert!(!tool.is_loop_marker());
    }

    #[test]
    fn test_snapshot_serde_tagged_model() {
        let node = NodeSnapshot::builder()
            .with_id(NodeId::new(3))
            .with_name("Mixer")
            .with_model(NodeModel::Tool(ToolSpec::new(
                "mixer",
                vec![CommandToken::Flag {
                    value: "-v".into(),
                }],
            )))
            .with_inputs(vec![PortDecl::new("words", "txt", DataCategory::Uri)])
            .build()
            .unwrap();

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "tool");
        assert_eq!(json["executable"], "mixer");
        assert_eq!(json["inputs"][0]["name"], "words");

        let back: NodeSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_snapshot_serde_unit_model() {
        let node = NodeSnapshot::new(NodeId::new(9), "Each", NodeModel::Generator);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "generator");

        let back: NodeSnapshot = serde_json::from_value(json).unwrap();
        assert!(back.is_loop_marker());
    }
}
