//! Graph description serialization.
//!
//! A description is the on-disk form of a sound graph: graph endpoints,
//! node instances with their input defaults, and connections. It holds
//! names rather than identifiers so files stay readable. [`GraphDescription::build`]
//! turns it into a prepared [`SoundGraph`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::dsp::{Identifier, NodeRegistry, Value};
use crate::engine::{ConnectionKind, GraphError, SoundGraph};

/// Current description format version.
/// Increment this when making breaking changes to the format.
pub const DESCRIPTION_VERSION: u32 = 1;

/// A complete sound graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Human-readable name.
    pub name: String,
    /// Format version, checked on load.
    pub version: u32,
    /// Graph input parameters with their initial values.
    #[serde(default)]
    pub inputs: Vec<GraphInput>,
    /// Graph input events. `Play` is always present and need not be listed.
    #[serde(default)]
    pub input_events: Vec<String>,
    /// Graph outputs, mapped to audio channels in order.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Graph output events. `OnFinished` is always present.
    #[serde(default)]
    pub output_events: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
}

/// A graph input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    pub name: String,
    pub default: ParameterValue,
}

/// A node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub id: Uuid,
    /// Registered type name, aliases included (e.g. "Multiply (Audio)").
    pub node_type: String,
    /// Local values of unconnected inputs, by endpoint name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, ParameterValue>,
}

/// A connection between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub kind: ConnectionKind,
    pub from: EndpointAddress,
    pub to: EndpointAddress,
}

/// One end of a connection: a node endpoint or a graph endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum EndpointAddress {
    Node { node: Uuid, endpoint: String },
    Graph { endpoint: String },
}

/// A typed value in a description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
}

impl From<ParameterValue> for Value {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Float(v) => Value::Float(v),
            ParameterValue::Int(v) => Value::Int(v),
            ParameterValue::Bool(v) => Value::Bool(v),
            ParameterValue::FloatArray(v) => Value::from(v),
            ParameterValue::IntArray(v) => Value::from(v),
        }
    }
}

impl From<&Value> for ParameterValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Float(v) => ParameterValue::Float(*v),
            Value::Int(v) => ParameterValue::Int(*v),
            Value::Bool(v) => ParameterValue::Bool(*v),
            Value::FloatArray(v) => ParameterValue::FloatArray(v.to_vec()),
            Value::IntArray(v) => ParameterValue::IntArray(v.to_vec()),
        }
    }
}

/// Error type for description operations.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("incompatible description version: found {found}, expected {expected}")]
    Version { found: u32, expected: u32 },

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl GraphDescription {
    /// Create a new empty description with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DESCRIPTION_VERSION,
            inputs: Vec::new(),
            input_events: Vec::new(),
            outputs: Vec::new(),
            output_events: Vec::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Parses a description, rejecting other format versions.
    pub fn from_json(json: &str) -> Result<Self, DescriptionError> {
        let description: Self = serde_json::from_str(json)?;
        if description.version != DESCRIPTION_VERSION {
            return Err(DescriptionError::Version {
                found: description.version,
                expected: DESCRIPTION_VERSION,
            });
        }
        Ok(description)
    }

    pub fn to_json(&self) -> Result<String, DescriptionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Save the description to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DescriptionError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Instantiates every node through the registry, wires the graph and
    /// prepares it.
    pub fn build(&self, registry: &NodeRegistry, config: GraphConfig) -> Result<SoundGraph, DescriptionError> {
        let mut graph = SoundGraph::new(config);

        for input in &self.inputs {
            graph.add_graph_input(Identifier::intern(&input.name), Value::from(input.default.clone()))?;
        }
        for name in &self.input_events {
            let id = Identifier::intern(name);
            if id != SoundGraph::PLAY {
                graph.add_graph_input_event(id)?;
            }
        }
        for name in &self.outputs {
            graph.add_graph_output(Identifier::intern(name))?;
        }
        for name in &self.output_events {
            let id = Identifier::intern(name);
            if id != SoundGraph::ON_FINISHED {
                graph.add_graph_output_event(id)?;
            }
        }

        for node in &self.nodes {
            let instance = registry
                .create_by_name(&node.node_type, node.id)
                .ok_or_else(|| DescriptionError::UnknownNodeType(node.node_type.clone()))?;
            graph.add_node(instance)?;
            for (endpoint, value) in &node.defaults {
                graph.set_node_input(node.id, Identifier::intern(endpoint), Value::from(value.clone()))?;
            }
        }

        for connection in &self.connections {
            connect(&mut graph, connection)?;
        }

        graph.prepare()?;
        tracing::info!(
            "built sound graph '{}' with {} nodes and {} connections",
            self.name,
            self.nodes.len(),
            self.connections.len()
        );
        Ok(graph)
    }
}

impl Default for GraphDescription {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn connect(graph: &mut SoundGraph, connection: &ConnectionDescription) -> Result<(), DescriptionError> {
    use ConnectionKind::{Event, Value};
    use EndpointAddress::{Graph, Node};

    match (&connection.from, &connection.to) {
        (Node { node: from, endpoint: output }, Node { node: to, endpoint: input }) => {
            let (output, input) = (Identifier::intern(output), Identifier::intern(input));
            match connection.kind {
                Value => graph.add_value_connection(*from, output, *to, input)?,
                Event => graph.add_event_connection(*from, output, *to, input)?,
            }
        }
        (Graph { endpoint: graph_input }, Node { node: to, endpoint: input }) => {
            let (graph_input, input) = (Identifier::intern(graph_input), Identifier::intern(input));
            match connection.kind {
                Value => graph.add_input_value_route(graph_input, *to, input)?,
                Event => graph.add_input_event_route(graph_input, *to, input)?,
            }
        }
        (Node { node: from, endpoint: output }, Graph { endpoint: graph_output }) => {
            let (output, graph_output) = (Identifier::intern(output), Identifier::intern(graph_output));
            match connection.kind {
                Value => graph.add_to_graph_output_connection(*from, output, graph_output)?,
                Event => graph.add_to_graph_out_event_connection(*from, output, graph_output)?,
            }
        }
        (Graph { endpoint: from }, Graph { endpoint: to }) => {
            return Err(DescriptionError::InvalidConnection(format!(
                "graph endpoint '{}' cannot connect directly to graph endpoint '{}'",
                from, to
            )));
        }
    }
    Ok(())
}
