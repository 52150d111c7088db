//! Job model.

use std::collections::BTreeMap;
use std::path::PathBuf;

use strum::AsRefStr;

use super::port::{Input, Output};
use crate::session::{NodeId, Position};

/// Execution class of a job.
#[derive(Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[derive(Debug)]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    /// Ordinary remote job running a staged binary.
    Normal,
    /// Upstream loop marker; collapsed away before serialization.
    Generator,
    /// Downstream loop marker; collapsed away before serialization.
    Collector,
    /// Host-native node wrapped in a sandbox workflow archive.
    Embedded,
    /// Declarative command-line tool.
    CommandLine,
}

impl JobKind {
    /// Returns whether this is the generator loop marker kind.
    pub const fn is_generator(&self) -> bool {
        matches!(self, JobKind::Generator)
    }

    /// Returns whether this is the collector loop marker kind.
    pub const fn is_collector(&self) -> bool {
        matches!(self, JobKind::Collector)
    }

    /// Returns whether this is either loop marker kind.
    pub const fn is_loop_marker(&self) -> bool {
        self.is_generator() || self.is_collector()
    }
}

/// One execution unit derived from a single graph node.
///
/// Ports live in push-only lists so that `port_nr` values always form a
/// contiguous `0..k` range per direction; a port's `port_nr` doubles as its
/// index in the list.
#[derive(Clone, PartialEq, Eq)]
#[derive(Debug)]
pub struct Job {
    /// ID of the originating graph node.
    pub id: NodeId,
    /// Display name; sanitized and de-duplicated at serialization time.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Execution class.
    pub kind: JobKind,
    /// Canvas coordinates of the originating node.
    pub position: Position,
    /// Excluded from emitted output but still addressable for rewiring.
    pub ignored: bool,
    /// String-keyed execution parameters.
    pub parameters: BTreeMap<String, String>,
    /// Executable staged for or invoked by the job, if any.
    pub executable: Option<PathBuf>,
    /// Rendered command-line elements, in order.
    pub command_line: Vec<String>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Job {
    /// Creates a job with no ports.
    pub fn new(id: NodeId, name: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            kind,
            position: Position::default(),
            ignored: false,
            parameters: BTreeMap::new(),
            executable: None,
            command_line: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the canvas position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Appends an input, assigning the next free `port_nr`.
    ///
    /// Returns the assigned number.
    pub fn push_input(&mut self, mut input: Input) -> u32 {
        let port_nr = self.inputs.len() as u32;
        input.port_nr = port_nr;
        self.inputs.push(input);
        port_nr
    }

    /// Appends an output, assigning the next free `port_nr`.
    ///
    /// Returns the assigned number.
    pub fn push_output(&mut self, mut output: Output) -> u32 {
        let port_nr = self.outputs.len() as u32;
        output.port_nr = port_nr;
        self.outputs.push(output);
        port_nr
    }

    /// Returns the inputs in `port_nr` order.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Returns the inputs mutably, without allowing insertion or removal.
    pub fn inputs_mut(&mut self) -> &mut [Input] {
        &mut self.inputs
    }

    /// Returns the outputs in `port_nr` order.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Returns the outputs mutably, without allowing insertion or removal.
    pub fn outputs_mut(&mut self) -> &mut [Output] {
        &mut self.outputs
    }

    /// Returns the input with the given `port_nr`.
    pub fn input(&self, port_nr: u32) -> Option<&Input> {
        self.inputs.get(port_nr as usize)
    }

    /// Returns the input with the given `port_nr`, mutably.
    pub fn input_mut(&mut self, port_nr: u32) -> Option<&mut Input> {
        self.inputs.get_mut(port_nr as usize)
    }

    /// Returns the output with the given `port_nr`.
    pub fn output(&self, port_nr: u32) -> Option<&Output> {
        self.outputs.get(port_nr as usize)
    }

    /// Returns the output with the given `port_nr`, mutably.
    pub fn output_mut(&mut self, port_nr: u32) -> Option<&mut Output> {
        self.outputs.get_mut(port_nr as usize)
    }

    /// Returns the input created from the given source-graph port index.
    pub fn input_by_original(&self, original_port_nr: u32) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|input| input.original_port_nr == original_port_nr)
    }

    /// Returns the input created from the given source-graph port index, mutably.
    pub fn input_by_original_mut(&mut self, original_port_nr: u32) -> Option<&mut Input> {
        self.inputs
            .iter_mut()
            .find(|input| input.original_port_nr == original_port_nr)
    }

    /// Returns the output created from the given source-graph port index.
    pub fn output_by_original(&self, original_port_nr: u32) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|output| output.original_port_nr == original_port_nr)
    }

    /// Returns the output created from the given source-graph port index, mutably.
    pub fn output_by_original_mut(&mut self, original_port_nr: u32) -> Option<&mut Output> {
        self.outputs
            .iter_mut()
            .find(|output| output.original_port_nr == original_port_nr)
    }
}
