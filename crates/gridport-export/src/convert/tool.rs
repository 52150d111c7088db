//! Declarative command-line tool conversion.

use std::path::PathBuf;

use gridport_core::DataRef;

use crate::error::{ExportError, ExportResult};
use crate::model::{ConnectionType, Input, Job, JobKind, Port};
use crate::session::{CommandToken, NodeModel, NodeSnapshot, PortDecl, ToolSpec};
use super::{declared_input, declared_output, ConvertContext, NodeConverter};

/// Synthetic port carrying the configuration description file.
const CONFIG_PORT: &str = "jobconfig";

/// Extension of the serialized configuration description.
const CONFIG_EXTENSION: &str = "json";

/// Converts nodes that declare their own remote command line.
///
/// The node's token list is rendered into command-line elements, with port
/// references replaced by the job-relative paths the files will have on the
/// execution host. A configuration-description marker additionally clones
/// the node's parameter tree with every absolute path rewritten to the same
/// job-relative form, stages the clone, and ships it as one extra input.
pub struct ToolConverter;

impl NodeConverter for ToolConverter {
    fn name(&self) -> &'static str {
        "tool"
    }

    fn can_handle(&self, node: &NodeSnapshot) -> bool {
        node.model.is_tool()
    }

    fn convert(&self, node: &NodeSnapshot, ctx: &ConvertContext<'_>) -> ExportResult<Job> {
        let NodeModel::Tool(tool) = &node.model else {
            return Err(ExportError::Configuration {
                node_id: node.id,
                message: "node model is not a command-line tool".to_owned(),
            });
        };

        let markers = tool
            .tokens
            .iter()
            .filter(|token| matches!(token, CommandToken::ConfigDescription))
            .count();
        if markers > 1 {
            return Err(ExportError::Configuration {
                node_id: node.id,
                message: "more than one configuration description marker".to_owned(),
            });
        }

        let mut job = Job::new(node.id, &node.name, JobKind::CommandLine)
            .with_description(&node.description)
            .with_position(node.position);
        job.executable = Some(PathBuf::from(&tool.executable));

        for original in ctx.connected_inputs(node) {
            job.push_input(declared_input(ctx, node, original)?);
        }
        for original in 0..node.outputs.len() as u32 {
            job.push_output(declared_output(ctx, node, original)?);
        }

        job.command_line = render_tokens(node, tool)?;

        if markers == 1 {
            job.push_input(build_config_input(node, ctx)?);
        }

        Ok(job)
    }
}

/// Renders the token list into command-line elements.
fn render_tokens(node: &NodeSnapshot, tool: &ToolSpec) -> ExportResult<Vec<String>> {
    let mut rendered = Vec::with_capacity(tool.tokens.len());
    for token in &tool.tokens {
        let element = match token {
            CommandToken::Literal { value } | CommandToken::Flag { value } => value.clone(),
            CommandToken::InputPort { port } => {
                let decl = node.inputs.get(*port as usize).ok_or_else(|| {
                    ExportError::Configuration {
                        node_id: node.id,
                        message: format!("command line references unknown input port {port}"),
                    }
                })?;
                port_path(decl, None)
            }
            CommandToken::OutputPort { port } => {
                let decl = node.outputs.get(*port as usize).ok_or_else(|| {
                    ExportError::Configuration {
                        node_id: node.id,
                        message: format!("command line references unknown output port {port}"),
                    }
                })?;
                port_path(decl, None)
            }
            CommandToken::ConfigDescription => config_path(),
        };
        rendered.push(element);
    }
    Ok(rendered)
}

/// Clones the parameter tree with paths rewritten, stages it, and wraps it
/// into the synthetic configuration input.
fn build_config_input(node: &NodeSnapshot, ctx: &ConvertContext<'_>) -> ExportResult<Input> {
    let mut settings = node.settings.clone();
    settings.rewrite_paths(&mut |key, index, path| {
        let decl = node
            .inputs
            .iter()
            .chain(node.outputs.iter())
            .find(|decl| decl.name == key);
        match decl {
            Some(decl) => PathBuf::from(port_path(decl, Some(index))),
            // Paths with no matching port keep their file name under the
            // setting's own directory.
            None => match path.file_name() {
                Some(file_name) => PathBuf::from(key).join(file_name),
                None => path.to_path_buf(),
            },
        }
    });

    let bytes = serde_json::to_vec_pretty(&settings)?;
    let staged = ctx
        .staging
        .write_file(format!("configs/{}.{CONFIG_EXTENSION}", node.id), &bytes)?;

    let port = Port::new(CONFIG_PORT, CONFIG_EXTENSION, node.inputs.len() as u32)
        .with_position(node.position)
        .with_connection(ConnectionType::UserProvided);
    let mut input = Input::new(port);
    input.data = Some(DataRef::file(staged));
    Ok(input)
}

/// Job-relative path of a port's file.
///
/// Single-file ports map to `name/name.ext`; multi-file ports map to the
/// bare port directory, or to `name/name_<i>.ext` when an element index is
/// given.
fn port_path(decl: &PortDecl, index: Option<usize>) -> String {
    let name = &decl.name;
    let extension = &decl.extension;
    if decl.multi_file {
        return match index {
            Some(index) if extension.is_empty() => format!("{name}/{name}_{index}"),
            Some(index) => format!("{name}/{name}_{index}.{extension}"),
            None => name.clone(),
        };
    }

    if extension.is_empty() {
        format!("{name}/{name}")
    } else {
        format!("{name}/{name}.{extension}")
    }
}

/// Job-relative path of the configuration description file.
fn config_path() -> String {
    format!("{CONFIG_PORT}/{CONFIG_PORT}.{CONFIG_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ExportProfile;
    use crate::session::{
        DataCategory, EdgeSnapshot, GraphSnapshot, NodeId, NodeModel, SettingValue, Settings,
    };
    use gridport_core::StagingArea;

    fn mixer(tokens: Vec<CommandToken>) -> NodeSnapshot {
        let mut node = NodeSnapshot::new(
            NodeId::new(2),
            "Mixer",
            NodeModel::Tool(ToolSpec::new("mixer", tokens)),
        );
        node.inputs = vec![
            PortDecl::new("words", "txt", DataCategory::Uri),
            PortDecl::new("numbers", "txt", DataCategory::Uri),
        ];
        node.outputs = vec![PortDecl::new("combined", "txt", DataCategory::Uri)];
        node
    }

    fn session_feeding_mixer(node: &NodeSnapshot) -> GraphSnapshot {
        let mut producer = NodeSnapshot::new(
            NodeId::new(1),
            "Producer",
            NodeModel::Tool(ToolSpec::new("producer", Vec::new())),
        );
        producer.outputs = vec![
            PortDecl::new("a", "txt", DataCategory::Uri),
            PortDecl::new("b", "txt", DataCategory::Uri),
        ];

        let mut session = GraphSnapshot::new();
        session.add_node(producer).unwrap();
        session.add_node(node.clone()).unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(1), 0, NodeId::new(2), 0))
            .unwrap();
        session
            .add_edge(EdgeSnapshot::new(NodeId::new(1), 1, NodeId::new(2), 1))
            .unwrap();
        session
    }

    #[test]
    fn test_converts_connected_inputs_and_declared_outputs() {
        let node = mixer(vec![CommandToken::Flag { value: "-v".into() }]);
        let session = session_feeding_mixer(&node);
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let job = ToolConverter.convert(&node, &ctx).unwrap();

        assert_eq!(job.kind, JobKind::CommandLine);
        assert_eq!(job.executable.as_deref(), Some(std::path::Path::new("mixer")));
        let input_names: Vec<&str> = job.inputs().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(input_names, vec!["words", "numbers"]);
        let output_names: Vec<&str> = job.outputs().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(output_names, vec!["combined"]);
        assert_eq!(job.command_line, vec!["-v"]);
    }

    #[test]
    fn test_renders_port_references() {
        let node = mixer(vec![
            CommandToken::Flag { value: "-i".into() },
            CommandToken::InputPort { port: 0 },
            CommandToken::OutputPort { port: 0 },
            CommandToken::Literal {
                value: "fast".into(),
            },
        ]);
        let session = session_feeding_mixer(&node);
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let job = ToolConverter.convert(&node, &ctx).unwrap();
        assert_eq!(
            job.command_line,
            vec!["-i", "words/words.txt", "combined/combined.txt", "fast"]
        );
    }

    #[test]
    fn test_rejects_duplicate_config_markers() {
        let node = mixer(vec![
            CommandToken::ConfigDescription,
            CommandToken::ConfigDescription,
        ]);
        let session = session_feeding_mixer(&node);
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        assert!(matches!(
            ToolConverter.convert(&node, &ctx),
            Err(ExportError::Configuration { .. })
        ));
    }

    #[test]
    fn test_config_description_staged_and_rewritten() {
        let mut node = mixer(vec![
            CommandToken::ConfigDescription,
            CommandToken::InputPort { port: 1 },
        ]);
        node.settings = Settings::new()
            .with(
                "words",
                SettingValue::Path(PathBuf::from("/home/user/data/words.txt")),
            )
            .with("label", SettingValue::Text("mix".into()));

        let session = session_feeding_mixer(&node);
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let job = ToolConverter.convert(&node, &ctx).unwrap();

        assert_eq!(
            job.command_line,
            vec!["jobconfig/jobconfig.json", "numbers/numbers.txt"]
        );

        let config = job.inputs().last().unwrap();
        assert_eq!(config.name, "jobconfig");
        assert_eq!(config.connection, ConnectionType::UserProvided);
        assert_eq!(config.port_nr, 2);
        assert_eq!(config.original_port_nr, 2);

        let Some(DataRef::File { path }) = &config.data else {
            panic!("config input has no staged file");
        };
        let staged: Settings =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(
            staged.get("words"),
            Some(&SettingValue::Path(PathBuf::from("words/words.txt")))
        );
        assert_eq!(
            staged.get("label"),
            Some(&SettingValue::Text("mix".into()))
        );
    }

    #[test]
    fn test_multi_file_rewrite_uses_element_index() {
        let mut node = mixer(vec![CommandToken::ConfigDescription]);
        node.inputs[0] = PortDecl::new("words", "txt", DataCategory::Uri).with_multi_file(true);
        node.settings = Settings::new().with(
            "words",
            SettingValue::PathList(vec![
                PathBuf::from("/data/a.txt"),
                PathBuf::from("/data/b.txt"),
            ]),
        );

        let session = session_feeding_mixer(&node);
        let staging = StagingArea::new().unwrap();
        let profile = ExportProfile::standard();
        let ctx = ConvertContext {
            session: &session,
            staging: &staging,
            profile: &profile,
        };

        let job = ToolConverter.convert(&node, &ctx).unwrap();
        let config = job.inputs().last().unwrap();
        let Some(DataRef::File { path }) = &config.data else {
            panic!("config input has no staged file");
        };
        let staged: Settings =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(
            staged.get("words"),
            Some(&SettingValue::PathList(vec![
                PathBuf::from("words/words_0.txt"),
                PathBuf::from("words/words_1.txt"),
            ]))
        );
    }
}
