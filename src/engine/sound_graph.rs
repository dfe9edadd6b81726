//! Sound graph evaluator.
//!
//! The SoundGraph owns node instances and the connections between their
//! endpoints. `prepare()` sorts nodes by value dependency and initializes
//! them; after that `process()` evaluates one frame per call without
//! allocating or locking, so a prepared graph can be moved to the audio
//! thread.
//!
//! Graph inputs and outputs live on two boundary nodes. Graph inputs are
//! the outputs of the input boundary, graph outputs the inputs of the
//! output boundary, so routing to and from the graph uses the same
//! connection tables as node-to-node wiring.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use uuid::Uuid;

use crate::config::GraphConfig;
use crate::dsp::{
    EndpointDefinition, EndpointDirection, EndpointKind, EndpointLocation, Identifier,
    NodeInstance, ProcessContext, SmoothedValue, Value, ValueType,
};
use crate::nodes::GraphBoundary;

use super::validation::{validate_connection, ConnectionKind, GraphError};

/// Instance id of the input boundary node.
pub const INPUT_NODE_ID: Uuid = Uuid::nil();
/// Instance id of the output boundary node.
pub const OUTPUT_NODE_ID: Uuid = Uuid::from_u128(u128::MAX);

const INPUT_NODE: usize = 0;
const OUTPUT_NODE: usize = 1;

/// A value edge, addressed by node slot and endpoint index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ValueConnection {
    source: usize,
    output: usize,
    destination: usize,
    input: usize,
    /// Type of the destination input, values are converted on pull.
    ty: ValueType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EventConnection {
    source: usize,
    output: usize,
    destination: usize,
    input: usize,
}

/// Upstream value pulled into a node before it is evaluated.
#[derive(Clone, Copy, Debug)]
struct ValueLink {
    source: usize,
    output: usize,
    input: usize,
    ty: ValueType,
}

#[derive(Clone, Copy, Debug)]
struct EventTarget {
    node: usize,
    input: usize,
}

/// A graph output event, stamped with the frame it reached the boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutgoingEvent {
    pub frame: u64,
    pub endpoint: Identifier,
    pub value: f32,
}

/// A playable graph of nodes.
///
/// # Example
///
/// ```ignore
/// let registry = NodeRegistry::global();
/// let mut graph = SoundGraph::new(GraphConfig::default());
///
/// let sine = graph.add_node(registry.create_by_name("Sine", Uuid::new_v4()).unwrap())?;
/// graph.add_graph_output(Identifier::new("Out"))?;
/// graph.add_to_graph_output_connection(sine, Identifier::new("Sine"), Identifier::new("Out"))?;
/// graph.prepare()?;
///
/// let mut block = [0.0; 512];
/// graph.process_block(&mut block, 2);
/// ```
pub struct SoundGraph {
    /// Slot 0 and 1 hold the boundary nodes.
    nodes: Vec<NodeInstance>,
    node_index: HashMap<Uuid, usize>,
    value_connections: Vec<ValueConnection>,
    event_connections: Vec<EventConnection>,

    // Built by prepare()
    order: Vec<usize>,
    value_links: Vec<Vec<ValueLink>>,
    event_links: Vec<Vec<Vec<EventTarget>>>,

    /// Ramps for float graph inputs, indexed like the input boundary outputs.
    interpolated: Vec<Option<SmoothedValue>>,
    outgoing: Vec<OutgoingEvent>,
    dropped_events: u64,

    config: GraphConfig,
    context: ProcessContext,
    frame: u64,
    prepared: bool,
    warned_unprepared: bool,
}

impl SoundGraph {
    /// Input event every graph declares, used to start playback.
    pub const PLAY: Identifier = Identifier::new("Play");
    /// Output event every graph declares, signalling that playback ended.
    pub const ON_FINISHED: Identifier = Identifier::new("OnFinished");

    /// Creates an empty graph holding only its boundary nodes.
    pub fn new(config: GraphConfig) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            value_connections: Vec::new(),
            event_connections: Vec::new(),
            order: Vec::new(),
            value_links: Vec::new(),
            event_links: Vec::new(),
            interpolated: Vec::new(),
            outgoing: Vec::new(),
            dropped_events: 0,
            context: ProcessContext::new(config.sample_rate),
            config,
            frame: 0,
            prepared: false,
            warned_unprepared: false,
        };

        for (id, name) in [(INPUT_NODE_ID, "Graph Inputs"), (OUTPUT_NODE_ID, "Graph Outputs")] {
            graph.node_index.insert(id, graph.nodes.len());
            graph
                .nodes
                .push(NodeInstance::new(id, name, Box::new(GraphBoundary)));
        }
        graph.nodes[INPUT_NODE]
            .add_endpoint(EndpointDefinition::event(Self::PLAY, EndpointDirection::Output));
        graph.nodes[OUTPUT_NODE]
            .add_endpoint(EndpointDefinition::event(Self::ON_FINISHED, EndpointDirection::Input));
        graph
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    /// Number of nodes, not counting the boundary nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 2
    }

    // ========================================================================
    // Graph Construction
    // ========================================================================

    /// Adds a node. Returns its instance id.
    pub fn add_node(&mut self, node: NodeInstance) -> Result<Uuid, GraphError> {
        let id = node.id();
        if self.node_index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(node);
        self.invalidate();
        Ok(id)
    }

    /// Declares a graph input with its initial value.
    ///
    /// The value's type becomes the input's type. Float inputs can be
    /// changed with a ramp through [`SoundGraph::set_input_interpolated`].
    pub fn add_graph_input(&mut self, id: Identifier, default: impl Into<Value>) -> Result<(), GraphError> {
        self.check_graph_endpoint_free(INPUT_NODE, id, EndpointDirection::Output)?;
        let default = default.into();
        self.interpolated.push(match default {
            Value::Float(value) => Some(SmoothedValue::new(value)),
            _ => None,
        });
        self.nodes[INPUT_NODE].add_endpoint(EndpointDefinition::value(
            id,
            EndpointDirection::Output,
            default,
        ));
        self.invalidate();
        Ok(())
    }

    /// Declares a graph input event.
    pub fn add_graph_input_event(&mut self, id: Identifier) -> Result<(), GraphError> {
        self.check_graph_endpoint_free(INPUT_NODE, id, EndpointDirection::Output)?;
        self.nodes[INPUT_NODE].add_endpoint(EndpointDefinition::event(id, EndpointDirection::Output));
        self.invalidate();
        Ok(())
    }

    /// Declares a float graph output. Outputs map to audio channels in
    /// declaration order.
    pub fn add_graph_output(&mut self, id: Identifier) -> Result<(), GraphError> {
        self.check_graph_endpoint_free(OUTPUT_NODE, id, EndpointDirection::Input)?;
        self.nodes[OUTPUT_NODE].add_endpoint(EndpointDefinition::value(
            id,
            EndpointDirection::Input,
            Value::Float(0.0),
        ));
        self.invalidate();
        Ok(())
    }

    /// Declares a graph output event.
    pub fn add_graph_output_event(&mut self, id: Identifier) -> Result<(), GraphError> {
        self.check_graph_endpoint_free(OUTPUT_NODE, id, EndpointDirection::Input)?;
        self.nodes[OUTPUT_NODE].add_endpoint(EndpointDefinition::event(id, EndpointDirection::Input));
        self.invalidate();
        Ok(())
    }

    /// Connects a node's value output to another node's value input.
    pub fn add_value_connection(
        &mut self,
        source: Uuid,
        source_endpoint: Identifier,
        destination: Uuid,
        destination_endpoint: Identifier,
    ) -> Result<(), GraphError> {
        let source = self.index_of(source)?;
        let destination = self.index_of(destination)?;
        self.connect(ConnectionKind::Value, source, source_endpoint, destination, destination_endpoint)
    }

    /// Connects a node's output event to another node's input event.
    pub fn add_event_connection(
        &mut self,
        source: Uuid,
        source_endpoint: Identifier,
        destination: Uuid,
        destination_endpoint: Identifier,
    ) -> Result<(), GraphError> {
        let source = self.index_of(source)?;
        let destination = self.index_of(destination)?;
        self.connect(ConnectionKind::Event, source, source_endpoint, destination, destination_endpoint)
    }

    /// Feeds a graph input into a node's value input.
    pub fn add_input_value_route(
        &mut self,
        graph_input: Identifier,
        destination: Uuid,
        destination_endpoint: Identifier,
    ) -> Result<(), GraphError> {
        let destination = self.index_of(destination)?;
        self.connect(ConnectionKind::Value, INPUT_NODE, graph_input, destination, destination_endpoint)
    }

    /// Forwards a graph input event to a node's input event.
    pub fn add_input_event_route(
        &mut self,
        graph_input_event: Identifier,
        destination: Uuid,
        destination_endpoint: Identifier,
    ) -> Result<(), GraphError> {
        let destination = self.index_of(destination)?;
        self.connect(ConnectionKind::Event, INPUT_NODE, graph_input_event, destination, destination_endpoint)
    }

    /// Feeds a node's value output into a graph output.
    pub fn add_to_graph_output_connection(
        &mut self,
        source: Uuid,
        source_endpoint: Identifier,
        graph_output: Identifier,
    ) -> Result<(), GraphError> {
        let source = self.index_of(source)?;
        self.connect(ConnectionKind::Value, source, source_endpoint, OUTPUT_NODE, graph_output)
    }

    /// Forwards a node's output event to a graph output event.
    pub fn add_to_graph_out_event_connection(
        &mut self,
        source: Uuid,
        source_endpoint: Identifier,
        graph_output_event: Identifier,
    ) -> Result<(), GraphError> {
        let source = self.index_of(source)?;
        self.connect(ConnectionKind::Event, source, source_endpoint, OUTPUT_NODE, graph_output_event)
    }

    /// Sets the local value of a node input.
    ///
    /// A connected input is overwritten by its upstream value every tick,
    /// so this only matters for unconnected inputs.
    pub fn set_node_input(
        &mut self,
        node: Uuid,
        endpoint: Identifier,
        value: impl Into<Value>,
    ) -> Result<(), GraphError> {
        let index = self.index_of(node)?;
        let location = self.endpoint(index, endpoint, EndpointDirection::Input)?;
        let Some(ty) = location.kind.value_type() else {
            return Err(GraphError::KindMismatch {
                kind: ConnectionKind::Value,
                from: endpoint,
                to: endpoint,
            });
        };

        let value = value.into();
        let converted = value.coerce_to(ty).ok_or(GraphError::IncompatibleTypes {
            from: value.value_type(),
            to: ty,
        })?;
        self.nodes[index].io_mut().set_input(location.index, converted);
        self.invalidate();
        Ok(())
    }

    fn index_of(&self, id: Uuid) -> Result<usize, GraphError> {
        match self.node_index.get(&id) {
            Some(&index) if index > OUTPUT_NODE => Ok(index),
            _ => Err(GraphError::UnknownNode(id)),
        }
    }

    fn endpoint(
        &self,
        node: usize,
        id: Identifier,
        direction: EndpointDirection,
    ) -> Result<EndpointLocation, GraphError> {
        self.nodes[node].locate(id, direction).ok_or_else(|| {
            if node <= OUTPUT_NODE {
                GraphError::UnknownGraphEndpoint(id)
            } else {
                GraphError::UnknownEndpoint {
                    node: self.nodes[node].name().to_string(),
                    endpoint: id,
                    direction,
                }
            }
        })
    }

    fn check_graph_endpoint_free(
        &self,
        node: usize,
        id: Identifier,
        direction: EndpointDirection,
    ) -> Result<(), GraphError> {
        match self.nodes[node].locate(id, direction) {
            Some(_) => Err(GraphError::DuplicateGraphEndpoint(id)),
            None => Ok(()),
        }
    }

    fn connect(
        &mut self,
        kind: ConnectionKind,
        source: usize,
        source_endpoint: Identifier,
        destination: usize,
        destination_endpoint: Identifier,
    ) -> Result<(), GraphError> {
        let from = self.endpoint(source, source_endpoint, EndpointDirection::Output)?;
        let to = self.endpoint(destination, destination_endpoint, EndpointDirection::Input)?;
        validate_connection(kind, (source_endpoint, from.kind), (destination_endpoint, to.kind))?;

        match to.kind {
            EndpointKind::Value(ty) => {
                let taken = self
                    .value_connections
                    .iter()
                    .any(|c| c.destination == destination && c.input == to.index);
                if taken {
                    return Err(GraphError::InputAlreadyConnected {
                        node: self.nodes[destination].name().to_string(),
                        endpoint: destination_endpoint,
                    });
                }
                self.value_connections.push(ValueConnection {
                    source,
                    output: from.index,
                    destination,
                    input: to.index,
                    ty,
                });
            }
            EndpointKind::Event => {
                let connection = EventConnection {
                    source,
                    output: from.index,
                    destination,
                    input: to.index,
                };
                if self.event_connections.contains(&connection) {
                    return Err(GraphError::DuplicateConnection);
                }
                self.event_connections.push(connection);
            }
        }

        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        if self.prepared {
            tracing::debug!("sound graph modified after prepare, it must be prepared again");
        }
        self.prepared = false;
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    /// Orders the nodes, wires the connection tables and initializes every
    /// node in dependency order.
    ///
    /// Fails with [`GraphError::CycleDetected`] when value connections form
    /// a cycle. A failed graph stays unplayable and renders silence.
    pub fn prepare(&mut self) -> Result<(), GraphError> {
        self.prepared = false;
        self.order = self.compute_topological_order()?;
        self.build_links();
        self.outgoing = Vec::with_capacity(self.config.max_outgoing_events);
        self.context = ProcessContext::new(self.config.sample_rate);
        self.initialize();

        self.prepared = true;
        self.warned_unprepared = false;
        tracing::debug!(
            "sound graph prepared, evaluation order: {:?}",
            self.order.iter().map(|&i| self.nodes[i].name()).collect::<Vec<_>>()
        );
        Ok(())
    }

    /// Kahn's algorithm over value connections.
    ///
    /// Among ready nodes the one added first goes first, so the order is
    /// deterministic and independent nodes keep insertion order.
    fn compute_topological_order(&self) -> Result<Vec<usize>, GraphError> {
        let count = self.nodes.len();
        let mut in_degree = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for connection in &self.value_connections {
            in_degree[connection.destination] += 1;
            dependents[connection.source].push(connection.destination);
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
            .filter(|&index| in_degree[index] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() < count {
            // Cycle members and everything downstream of them.
            let nodes: Vec<String> = (0..count)
                .filter(|&index| in_degree[index] > 0)
                .map(|index| self.nodes[index].name().to_string())
                .collect();
            tracing::error!("sound graph rejected, value connections form a cycle through {:?}", nodes);
            return Err(GraphError::CycleDetected { nodes });
        }
        Ok(order)
    }

    fn build_links(&mut self) {
        self.value_links = vec![Vec::new(); self.nodes.len()];
        for c in &self.value_connections {
            self.value_links[c.destination].push(ValueLink {
                source: c.source,
                output: c.output,
                input: c.input,
                ty: c.ty,
            });
        }

        self.event_links = self
            .nodes
            .iter()
            .map(|node| vec![Vec::new(); node.io().output_event_count()])
            .collect();
        for c in &self.event_connections {
            self.event_links[c.source][c.output].push(EventTarget {
                node: c.destination,
                input: c.input,
            });
        }
    }

    fn initialize(&mut self) {
        self.frame = 0;
        self.outgoing.clear();
        self.dropped_events = 0;
        for node in &mut self.nodes {
            node.io_mut().clear_events();
        }
        for position in 0..self.order.len() {
            let index = self.order[position];
            self.pull_inputs(index);
            self.nodes[index].init(&self.context);
        }
    }

    /// Re-runs `init` on every node, drops pending and outgoing events and
    /// restarts the frame counter. Input values are kept.
    pub fn reinit(&mut self) -> Result<(), GraphError> {
        if !self.prepared {
            return Err(GraphError::NotPrepared);
        }
        self.initialize();
        Ok(())
    }

    /// True once `prepare()` succeeded and nothing changed since.
    pub fn is_playable(&self) -> bool {
        self.prepared
    }

    /// Instance ids in evaluation order, without the boundary nodes.
    pub fn evaluation_order(&self) -> Vec<Uuid> {
        self.order
            .iter()
            .filter(|&&index| index > OUTPUT_NODE)
            .map(|&index| self.nodes[index].id())
            .collect()
    }

    // ========================================================================
    // Audio Processing
    // ========================================================================

    /// Evaluates one frame.
    ///
    /// Each node pulls its connected inputs, runs handlers for events that
    /// were delivered before this tick and is processed. Events it raises
    /// reach their targets on the next tick.
    pub fn process(&mut self) {
        if !self.prepared {
            if !self.warned_unprepared {
                tracing::warn!("sound graph processed before prepare(), rendering silence");
                self.warned_unprepared = true;
            }
            return;
        }

        let context = self.context.at_frame(self.frame);
        self.advance_interpolated_inputs();
        for node in &mut self.nodes {
            node.io_mut().latch_events();
        }

        for position in 0..self.order.len() {
            let index = self.order[position];
            self.pull_inputs(index);
            if index == OUTPUT_NODE {
                self.collect_outgoing_events();
            } else {
                self.nodes[index].process(&context);
            }
            self.propagate_events(index);
        }

        self.frame += 1;
    }

    /// Renders interleaved frames, one tick per frame.
    ///
    /// Graph outputs map to channels in declaration order. A single output
    /// is copied to every channel, channels without an output are silent.
    pub fn process_block(&mut self, output: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let outputs = self.nodes[OUTPUT_NODE].io().input_count();

        for frame in output.chunks_mut(channels) {
            self.process();
            let io = self.nodes[OUTPUT_NODE].io();
            for (channel, sample) in frame.iter_mut().enumerate() {
                let source = if outputs == 1 { 0 } else { channel };
                *sample = if source < outputs {
                    io.input_f32(source)
                } else {
                    0.0
                };
            }
        }
    }

    #[inline]
    fn pull_inputs(&mut self, index: usize) {
        for link_index in 0..self.value_links[index].len() {
            let link = self.value_links[index][link_index];
            let (source, destination) = pair_mut(&mut self.nodes, link.source, index);
            destination
                .io_mut()
                .assign_input(link.input, source.io().output(link.output), link.ty);
        }
    }

    #[inline]
    fn propagate_events(&mut self, index: usize) {
        for output in 0..self.event_links[index].len() {
            let Some(value) = self.nodes[index].io_mut().take_raised(output) else {
                continue;
            };
            for target_index in 0..self.event_links[index][output].len() {
                let target = self.event_links[index][output][target_index];
                self.nodes[target.node].io_mut().deliver(target.input, value);
            }
        }
    }

    fn advance_interpolated_inputs(&mut self) {
        let inputs = self.nodes[INPUT_NODE].io_mut();
        for (index, slot) in self.interpolated.iter_mut().enumerate() {
            if let Some(smoothed) = slot {
                if smoothed.is_smoothing() {
                    inputs.set_output(index, smoothed.next());
                }
            }
        }
    }

    fn collect_outgoing_events(&mut self) {
        let boundary = &mut self.nodes[OUTPUT_NODE];
        for event in 0..boundary.io().input_event_count() {
            let Some(value) = boundary.io_mut().take_input_event(event) else {
                continue;
            };
            if self.outgoing.len() < self.config.max_outgoing_events {
                self.outgoing.push(OutgoingEvent {
                    frame: self.frame,
                    endpoint: boundary.io().input_events[event].id(),
                    value,
                });
            } else {
                self.dropped_events += 1;
            }
        }
    }

    // ========================================================================
    // Runtime Control
    // ========================================================================

    /// Sets a graph input, converting the value to the input's type.
    ///
    /// Cancels a running ramp. Returns false for an unknown input or a
    /// value that cannot be converted.
    pub fn set_input(&mut self, id: Identifier, value: impl Into<Value>) -> bool {
        let Some(location) = self.nodes[INPUT_NODE].locate(id, EndpointDirection::Output) else {
            return false;
        };
        let Some(ty) = location.kind.value_type() else {
            return false;
        };
        let Some(value) = value.into().coerce_to(ty) else {
            return false;
        };

        if let (Some(Some(smoothed)), Value::Float(v)) = (self.interpolated.get_mut(location.index), &value) {
            smoothed.set_immediate(*v);
        }
        self.nodes[INPUT_NODE].io_mut().set_output(location.index, value);
        true
    }

    /// Ramps a float graph input to `target` over the configured number of
    /// frames. Other input types change immediately.
    pub fn set_input_interpolated(&mut self, id: Identifier, target: f32) -> bool {
        let Some(location) = self.nodes[INPUT_NODE].locate(id, EndpointDirection::Output) else {
            return false;
        };
        match self.interpolated.get_mut(location.index) {
            Some(Some(smoothed)) => {
                smoothed.set_target(target, self.config.interpolation_frames);
                true
            }
            _ => self.set_input(id, target),
        }
    }

    /// Sends a graph input event. Its handlers run on the next tick.
    ///
    /// Returns false if the graph has no such input event.
    pub fn send_input_event(&mut self, id: Identifier, value: f32) -> bool {
        let Some(output) = self.nodes[INPUT_NODE].io().output_event_index(id) else {
            return false;
        };
        for c in &self.event_connections {
            if c.source == INPUT_NODE && c.output == output {
                self.nodes[c.destination].io_mut().deliver(c.input, value);
            }
        }
        true
    }

    /// Current value of a graph output as a float, 0 if unknown.
    pub fn output(&self, id: Identifier) -> f32 {
        self.output_value(id).map(Value::as_f32).unwrap_or(0.0)
    }

    pub fn output_value(&self, id: Identifier) -> Option<&Value> {
        self.nodes[OUTPUT_NODE].input_value(id)
    }

    /// Takes the graph output events collected since the last drain.
    pub fn drain_outgoing_events(&mut self) -> std::vec::Drain<'_, OutgoingEvent> {
        self.outgoing.drain(..)
    }

    /// Number of outgoing events dropped because the buffer was full.
    pub fn dropped_event_count(&self) -> u64 {
        self.dropped_events
    }

    /// Index of the next frame to be rendered.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn node(&self, id: Uuid) -> Option<&NodeInstance> {
        self.node_index.get(&id).map(|&index| &self.nodes[index])
    }

    /// Current value of a node's output.
    pub fn node_output(&self, node: Uuid, endpoint: Identifier) -> Option<&Value> {
        self.node(node)?.output_value(endpoint)
    }

    /// Graph input parameters in declaration order.
    pub fn graph_inputs(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.boundary_endpoints(INPUT_NODE, false)
    }

    /// Graph input events in declaration order, starting with `Play`.
    pub fn graph_input_events(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.boundary_endpoints(INPUT_NODE, true)
    }

    pub fn graph_outputs(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.boundary_endpoints(OUTPUT_NODE, false)
    }

    pub fn graph_output_events(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.boundary_endpoints(OUTPUT_NODE, true)
    }

    fn boundary_endpoints(&self, node: usize, events: bool) -> impl Iterator<Item = Identifier> + '_ {
        self.nodes[node]
            .definitions()
            .iter()
            .filter(move |d| d.kind.is_event() == events)
            .map(|d| d.id)
    }
}

/// Borrows two distinct nodes, the first shared and the second mutably.
fn pair_mut(nodes: &mut [NodeInstance], first: usize, second: usize) -> (&NodeInstance, &mut NodeInstance) {
    debug_assert_ne!(first, second);
    if first < second {
        let (head, tail) = nodes.split_at_mut(second);
        (&head[first], &mut tail[0])
    } else {
        let (head, tail) = nodes.split_at_mut(first);
        (&tail[0], &mut head[second])
    }
}

impl Default for SoundGraph {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl std::fmt::Debug for SoundGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundGraph")
            .field("nodes", &self.node_count())
            .field("value_connections", &self.value_connections.len())
            .field("event_connections", &self.event_connections.len())
            .field("prepared", &self.prepared)
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::NodeRegistry;
    use proptest::prelude::*;

    fn id(name: &'static str) -> Identifier {
        Identifier::new(name)
    }

    fn add(graph: &mut SoundGraph, type_name: &str) -> Uuid {
        let node = NodeRegistry::global()
            .create_by_name(type_name, Uuid::new_v4())
            .unwrap_or_else(|| panic!("unknown node type {}", type_name));
        graph.add_node(node).unwrap()
    }

    /// Graph counting `Hit` events, with the count exposed as output `Count`.
    fn counter_graph() -> (SoundGraph, Uuid) {
        let mut graph = SoundGraph::default();
        let counter = add(&mut graph, "Trigger Counter");
        graph.add_graph_input_event(id("Hit")).unwrap();
        graph.add_graph_output(id("Count")).unwrap();
        graph.add_input_event_route(id("Hit"), counter, id("Trigger")).unwrap();
        graph.add_to_graph_output_connection(counter, id("Count"), id("Count")).unwrap();
        (graph, counter)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_constant_into_add() {
        let mut graph = SoundGraph::default();
        let constant = add(&mut graph, "Constant (Float)");
        let adder = add(&mut graph, "Add (Float)");
        graph.set_node_input(constant, id("Value"), 5.0).unwrap();
        graph.set_node_input(adder, id("Value2"), 3.0).unwrap();
        graph.add_value_connection(constant, id("Out"), adder, id("Value1")).unwrap();

        graph.prepare().unwrap();
        graph.process();
        assert_eq!(graph.node_output(adder, id("Out")), Some(&Value::Float(8.0)));

        // pure function of the inputs
        graph.process();
        assert_eq!(graph.node_output(adder, id("Out")), Some(&Value::Float(8.0)));
    }

    #[test]
    fn test_boundary_endpoints_always_present() {
        let graph = SoundGraph::default();
        assert_eq!(graph.graph_input_events().collect::<Vec<_>>(), vec![SoundGraph::PLAY]);
        assert_eq!(graph.graph_output_events().collect::<Vec<_>>(), vec![SoundGraph::ON_FINISHED]);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_duplicate_declarations_rejected() {
        let mut graph = SoundGraph::default();
        let node = add(&mut graph, "Sine");
        let copy = NodeRegistry::global().create_by_name("Sine", node).unwrap();
        assert_eq!(graph.add_node(copy), Err(GraphError::DuplicateNode(node)));

        graph.add_graph_input(id("Volume"), 1.0).unwrap();
        assert_eq!(
            graph.add_graph_input_event(id("Volume")),
            Err(GraphError::DuplicateGraphEndpoint(id("Volume")))
        );
        assert_eq!(
            graph.add_graph_output_event(SoundGraph::ON_FINISHED),
            Err(GraphError::DuplicateGraphEndpoint(SoundGraph::ON_FINISHED))
        );
    }

    #[test]
    fn test_connection_errors() {
        let mut graph = SoundGraph::default();
        let constant = add(&mut graph, "Constant (Float)");
        let adder = add(&mut graph, "Add (Float)");
        let get = add(&mut graph, "Get (Float)");
        let counter = add(&mut graph, "Trigger Counter");

        let missing = Uuid::new_v4();
        assert_eq!(
            graph.add_value_connection(missing, id("Out"), adder, id("Value1")),
            Err(GraphError::UnknownNode(missing))
        );
        assert!(matches!(
            graph.add_value_connection(constant, id("Out"), adder, id("Value3")),
            Err(GraphError::UnknownEndpoint { .. })
        ));
        assert!(matches!(
            graph.add_value_connection(constant, id("Out"), counter, id("Trigger")),
            Err(GraphError::KindMismatch { .. })
        ));
        assert_eq!(
            graph.add_value_connection(constant, id("Out"), get, id("Array")),
            Err(GraphError::IncompatibleTypes {
                from: ValueType::Float,
                to: ValueType::FloatArray,
            })
        );

        graph.add_value_connection(constant, id("Out"), adder, id("Value1")).unwrap();
        assert!(matches!(
            graph.add_value_connection(adder, id("Out"), adder, id("Value1")),
            Err(GraphError::InputAlreadyConnected { .. })
        ));

        graph.add_event_connection(get, id("OnTrigger"), counter, id("Trigger")).unwrap();
        assert_eq!(
            graph.add_event_connection(get, id("OnTrigger"), counter, id("Trigger")),
            Err(GraphError::DuplicateConnection)
        );

        assert_eq!(
            graph.add_input_value_route(id("Nope"), adder, id("Value2")),
            Err(GraphError::UnknownGraphEndpoint(id("Nope")))
        );
    }

    #[test]
    fn test_boundary_nodes_not_addressable() {
        let mut graph = SoundGraph::default();
        let adder = add(&mut graph, "Add (Float)");
        assert_eq!(
            graph.add_event_connection(INPUT_NODE_ID, SoundGraph::PLAY, adder, id("Value1")),
            Err(GraphError::UnknownNode(INPUT_NODE_ID))
        );
    }

    #[test]
    fn test_set_node_input_type_errors() {
        let mut graph = SoundGraph::default();
        let get = add(&mut graph, "Get (Int)");
        graph.set_node_input(get, id("Index"), 2.0).unwrap();
        graph.set_node_input(get, id("Array"), vec![1, 2, 3]).unwrap();
        assert!(matches!(
            graph.set_node_input(get, id("Index"), vec![1.0_f32]),
            Err(GraphError::IncompatibleTypes { .. })
        ));
        assert!(matches!(
            graph.set_node_input(get, id("Trigger"), 1.0),
            Err(GraphError::KindMismatch { .. })
        ));

        graph.prepare().unwrap();
        assert_eq!(graph.node_output(get, id("Element")), Some(&Value::Int(3)));
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    #[test]
    fn test_cycle_rejected() {
        let mut graph = SoundGraph::default();
        let a = add(&mut graph, "Add (Float)");
        let b = add(&mut graph, "Multiply (Float)");
        graph.add_graph_output(id("Out")).unwrap();
        graph.add_value_connection(a, id("Out"), b, id("Value")).unwrap();
        graph.add_value_connection(b, id("Out"), a, id("Value1")).unwrap();
        graph.add_to_graph_output_connection(b, id("Out"), id("Out")).unwrap();

        match graph.prepare() {
            Err(GraphError::CycleDetected { nodes }) => {
                assert!(nodes.contains(&"Add (Float)".to_string()));
                assert!(nodes.contains(&"Multiply (Float)".to_string()));
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
        assert!(!graph.is_playable());

        let mut block = [1.0; 8];
        graph.process_block(&mut block, 2);
        assert_eq!(block, [0.0; 8]);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = SoundGraph::default();
        let a = add(&mut graph, "Add (Int)");
        graph.add_value_connection(a, id("Out"), a, id("Value1")).unwrap();
        assert!(matches!(graph.prepare(), Err(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn test_event_cycle_allowed() {
        let mut graph = SoundGraph::default();
        let a = add(&mut graph, "Delayed Trigger");
        graph.add_event_connection(a, id("DelayedTrigger"), a, id("Trigger")).unwrap();
        assert!(graph.prepare().is_ok());
    }

    #[test]
    fn test_independent_nodes_keep_insertion_order() {
        let mut graph = SoundGraph::default();
        let ids: Vec<Uuid> = (0..4).map(|_| add(&mut graph, "Sine")).collect();
        graph.prepare().unwrap();
        assert_eq!(graph.evaluation_order(), ids);
    }

    #[test]
    fn test_mutation_invalidates_prepare() {
        let mut graph = SoundGraph::default();
        add(&mut graph, "Sine");
        graph.prepare().unwrap();
        assert!(graph.is_playable());

        graph.add_graph_output(id("Out")).unwrap();
        assert!(!graph.is_playable());
        assert_eq!(graph.reinit(), Err(GraphError::NotPrepared));
    }

    // ========================================================================
    // Events
    // ========================================================================

    #[test]
    fn test_event_propagation_takes_one_tick() {
        // Both evaluation orders: the receiver before and after the sender.
        for counter_first in [false, true] {
            let mut graph = SoundGraph::default();
            let (repeat, counter) = if counter_first {
                let counter = add(&mut graph, "Trigger Counter");
                (add(&mut graph, "Repeat Trigger"), counter)
            } else {
                let repeat = add(&mut graph, "Repeat Trigger");
                (repeat, add(&mut graph, "Trigger Counter"))
            };
            graph.set_node_input(repeat, id("Period"), 10.0).unwrap();
            graph.add_graph_input_event(id("Start")).unwrap();
            graph.add_graph_output(id("Count")).unwrap();
            graph.add_input_event_route(id("Start"), repeat, id("Start")).unwrap();
            graph.add_event_connection(repeat, id("Trigger"), counter, id("Trigger")).unwrap();
            graph.add_to_graph_output_connection(counter, id("Count"), id("Count")).unwrap();
            graph.prepare().unwrap();

            assert!(graph.send_input_event(id("Start"), 1.0));
            // tick 0: Repeat Trigger handles Start and fires
            graph.process();
            assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(0)));
            // tick 1: the counter sees it
            graph.process();
            assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(1)));
            assert_eq!(graph.output(id("Count")), 1.0);
        }
    }

    #[test]
    fn test_same_tick_events_coalesce() {
        let (mut graph, counter) = counter_graph();
        graph.prepare().unwrap();

        for _ in 0..5 {
            assert!(graph.send_input_event(id("Hit"), 1.0));
        }
        graph.process();
        assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(1)));

        graph.process();
        assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unknown_input_event() {
        let (mut graph, _) = counter_graph();
        graph.prepare().unwrap();
        assert!(!graph.send_input_event(id("Miss"), 1.0));
        assert!(graph.send_input_event(SoundGraph::PLAY, 1.0));
    }

    #[test]
    fn test_outgoing_events_carry_frame() {
        let (mut graph, counter) = counter_graph();
        graph.add_graph_output_event(id("Counted")).unwrap();
        graph.add_to_graph_out_event_connection(counter, id("OnTrigger"), id("Counted")).unwrap();
        graph.prepare().unwrap();

        graph.send_input_event(id("Hit"), 1.0);
        graph.process();
        assert_eq!(graph.drain_outgoing_events().count(), 0);
        graph.process();

        let events: Vec<_> = graph.drain_outgoing_events().collect();
        assert_eq!(
            events,
            vec![OutgoingEvent {
                frame: 1,
                endpoint: id("Counted"),
                value: 1.0,
            }]
        );
        assert_eq!(graph.drain_outgoing_events().count(), 0);
    }

    #[test]
    fn test_outgoing_overflow_is_counted() {
        let config = GraphConfig {
            max_outgoing_events: 2,
            ..GraphConfig::default()
        };
        let mut graph = SoundGraph::new(config);
        let repeat = add(&mut graph, "Repeat Trigger");
        graph.set_node_input(repeat, id("Period"), 0.0).unwrap();
        graph.add_graph_input_event(id("Start")).unwrap();
        graph.add_input_event_route(id("Start"), repeat, id("Start")).unwrap();
        graph.add_to_graph_out_event_connection(repeat, id("Trigger"), SoundGraph::ON_FINISHED).unwrap();
        graph.prepare().unwrap();

        graph.send_input_event(id("Start"), 1.0);
        for _ in 0..10 {
            graph.process();
        }
        assert_eq!(graph.drain_outgoing_events().count(), 2);
        assert!(graph.dropped_event_count() > 0);
    }

    // ========================================================================
    // Inputs and outputs
    // ========================================================================

    fn gain_graph(interpolation_frames: u32) -> SoundGraph {
        let config = GraphConfig {
            interpolation_frames,
            ..GraphConfig::default()
        };
        let mut graph = SoundGraph::new(config);
        let multiply = add(&mut graph, "Multiply (Float)");
        graph.set_node_input(multiply, id("Value"), 2.0).unwrap();
        graph.add_graph_input(id("Volume"), 0.0).unwrap();
        graph.add_graph_output(id("Out")).unwrap();
        graph.add_input_value_route(id("Volume"), multiply, id("Multiplier")).unwrap();
        graph.add_to_graph_output_connection(multiply, id("Out"), id("Out")).unwrap();
        graph.prepare().unwrap();
        graph
    }

    #[test]
    fn test_graph_input_drives_output() {
        let mut graph = gain_graph(4);
        graph.process();
        assert_eq!(graph.output(id("Out")), 0.0);

        assert!(graph.set_input(id("Volume"), 1.0));
        graph.process();
        assert_eq!(graph.output(id("Out")), 2.0);

        // ints convert to the declared float type
        assert!(graph.set_input(id("Volume"), Value::Int(3)));
        graph.process();
        assert_eq!(graph.output(id("Out")), 6.0);

        assert!(!graph.set_input(id("Pitch"), 1.0));
        assert!(!graph.set_input(id("Volume"), vec![1.0_f32]));
    }

    #[test]
    fn test_interpolated_input_ramps() {
        let mut graph = gain_graph(4);
        graph.set_input(id("Volume"), 1.0);
        graph.process();

        assert!(graph.set_input_interpolated(id("Volume"), 0.0));
        let mut outputs = Vec::new();
        for _ in 0..6 {
            graph.process();
            outputs.push(graph.output(id("Out")));
        }
        assert_eq!(outputs, vec![1.5, 1.0, 0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_process_block_channel_mapping() {
        let mut graph = SoundGraph::default();
        let left = add(&mut graph, "Constant (Float)");
        let right = add(&mut graph, "Constant (Float)");
        graph.set_node_input(left, id("Value"), 1.0).unwrap();
        graph.set_node_input(right, id("Value"), -1.0).unwrap();
        graph.add_graph_output(id("Left")).unwrap();
        graph.add_graph_output(id("Right")).unwrap();
        graph.add_to_graph_output_connection(left, id("Out"), id("Left")).unwrap();
        graph.add_to_graph_output_connection(right, id("Out"), id("Right")).unwrap();
        graph.prepare().unwrap();

        let mut block = [0.0; 6];
        graph.process_block(&mut block, 3);
        assert_eq!(block, [1.0, -1.0, 0.0, 1.0, -1.0, 0.0]);
        assert_eq!(graph.current_frame(), 2);
    }

    #[test]
    fn test_single_output_is_duplicated() {
        let mut graph = gain_graph(4);
        graph.set_input(id("Volume"), 0.25);
        let mut block = [0.0; 4];
        graph.process_block(&mut block, 2);
        assert_eq!(block, [0.5; 4]);
    }

    #[test]
    fn test_reinit_restores_initial_state() {
        let (mut graph, counter) = counter_graph();
        graph.prepare().unwrap();
        graph.send_input_event(id("Hit"), 1.0);
        graph.process();
        graph.send_input_event(id("Hit"), 1.0);
        assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(1)));

        graph.reinit().unwrap();
        assert_eq!(graph.current_frame(), 0);
        assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(0)));

        // the pending hit was dropped
        graph.process();
        assert_eq!(graph.node_output(counter, id("Count")), Some(&Value::Int(0)));
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Node count plus candidate edges between node indices.
    fn graph_shape() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (2usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..n * 2)))
    }

    proptest! {
        #[test]
        fn prop_acyclic_graphs_prepare_in_dependency_order((n, pairs) in graph_shape()) {
            let mut graph = SoundGraph::default();
            let ids: Vec<Uuid> = (0..n).map(|_| add(&mut graph, "Add (Float)")).collect();

            // Edges point from later nodes to earlier ones, so insertion
            // order is never already a valid order.
            let mut free_inputs = vec![vec![id("Value1"), id("Value2")]; n];
            let mut edges = Vec::new();
            for (a, b) in pairs {
                if a == b {
                    continue;
                }
                let (from, to) = (a.max(b), a.min(b));
                if let Some(input) = free_inputs[to].pop() {
                    graph.add_value_connection(ids[from], id("Out"), ids[to], input).unwrap();
                    edges.push((from, to));
                }
            }

            prop_assert!(graph.prepare().is_ok());
            let order = graph.evaluation_order();
            prop_assert_eq!(order.len(), n);
            let position = |node: usize| order.iter().position(|&x| x == ids[node]).unwrap();
            for (from, to) in edges {
                prop_assert!(position(from) < position(to));
            }
        }

        #[test]
        fn prop_cycles_always_rejected(n in 1usize..8, extra in 0usize..4) {
            let mut graph = SoundGraph::default();
            let ids: Vec<Uuid> = (0..n + extra).map(|_| add(&mut graph, "Add (Float)")).collect();
            for i in 0..n {
                let next = (i + 1) % n;
                graph.add_value_connection(ids[i], id("Out"), ids[next], id("Value1")).unwrap();
            }

            prop_assert!(
                matches!(graph.prepare(), Err(GraphError::CycleDetected { .. })),
                "cycle was not detected"
            );
            prop_assert!(!graph.is_playable());
            graph.process();
            prop_assert_eq!(graph.current_frame(), 0);
        }
    }
}
