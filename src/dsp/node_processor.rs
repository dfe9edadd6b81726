//! The core NodeProcessor trait and supporting types.
//!
//! This module defines the interface that all sound graph nodes implement,
//! together with the endpoint storage a node owns at runtime.

use uuid::Uuid;

use super::context::ProcessContext;
use super::endpoint::{
    EndpointDefinition, EndpointDirection, EndpointKind, InputEvent, OutputEvent, ValueEndpoint,
};
use super::identifier::Identifier;
use super::value::{Value, ValueType};

/// Category of a node type, used to organize the registry listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Arithmetic, ranges and conversions.
    Math,
    /// Array element access.
    Array,
    /// Signal and random value sources (sine, noise, random).
    Generator,
    /// Envelopes.
    Envelope,
    /// Trigger timing and counting.
    Trigger,
    /// Musical conversions (notes, tempo).
    Music,
    /// Constants and graph plumbing.
    Utility,
}

impl NodeCategory {
    /// Returns a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            NodeCategory::Math => "Math",
            NodeCategory::Array => "Array",
            NodeCategory::Generator => "Generator",
            NodeCategory::Envelope => "Envelope",
            NodeCategory::Trigger => "Trigger",
            NodeCategory::Music => "Music",
            NodeCategory::Utility => "Utility",
        }
    }
}

/// The core trait that all sound graph nodes implement.
///
/// A node declares its endpoints once through [`NodeProcessor::endpoints`].
/// Storage for them is allocated when the node is wrapped in a
/// [`NodeInstance`], and every later call receives that storage as a
/// [`NodeIo`]. Endpoints are addressed by their position among endpoints
/// of the same direction and kind, in declaration order.
///
/// # Thread Safety
///
/// `NodeProcessor` requires `Send + 'static` because nodes are built on a
/// control thread and then moved to the audio thread with their graph.
///
/// # Real-time rules
///
/// `on_event` and `process` run on the audio thread. They must not block,
/// allocate, or panic.
///
/// # Example
///
/// ```ignore
/// struct Gain { endpoints: Vec<EndpointDefinition> }
///
/// impl NodeProcessor for Gain {
///     fn endpoints(&self) -> &[EndpointDefinition] { &self.endpoints }
///
///     fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
///         let out = io.input_f32(0) * io.input_f32(1);
///         io.set_output(0, out);
///     }
/// }
/// ```
pub trait NodeProcessor: Send + 'static {
    /// Returns the endpoint definitions for this node.
    fn endpoints(&self) -> &[EndpointDefinition];

    /// Seeds internal state from the current input values.
    ///
    /// Called once after all connections are wired and upstream nodes
    /// have been initialized, and again whenever the graph is reinitialized.
    fn init(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {}

    /// Handles an input event that fired this tick.
    ///
    /// `event` is the index of the input event endpoint. Handlers run in
    /// declaration order, before [`NodeProcessor::process`].
    fn on_event(&mut self, _event: usize, _value: f32, _io: &mut NodeIo, _context: &ProcessContext) {}

    /// Computes outputs from the current inputs. Called once per tick.
    fn process(&mut self, io: &mut NodeIo, context: &ProcessContext);
}

/// Pre-allocated endpoint storage of one node.
///
/// All accessors are total: an index outside the declared range reads as
/// a zero value and writes are ignored.
#[derive(Clone, Debug, Default)]
pub struct NodeIo {
    pub(crate) inputs: Vec<ValueEndpoint>,
    pub(crate) outputs: Vec<ValueEndpoint>,
    pub(crate) input_events: Vec<InputEvent>,
    pub(crate) output_events: Vec<OutputEvent>,
}

static ZERO: Value = Value::Float(0.0);

impl NodeIo {
    /// Allocates storage for the given endpoint definitions.
    pub fn from_definitions(definitions: &[EndpointDefinition]) -> Self {
        let mut io = Self::default();
        for definition in definitions {
            io.push(definition);
        }
        io
    }

    pub(crate) fn push(&mut self, definition: &EndpointDefinition) {
        match (definition.direction, definition.kind) {
            (EndpointDirection::Input, EndpointKind::Value(_)) => self
                .inputs
                .push(ValueEndpoint::new(definition.id, definition.default_value.clone())),
            (EndpointDirection::Output, EndpointKind::Value(_)) => self
                .outputs
                .push(ValueEndpoint::new(definition.id, definition.default_value.clone())),
            (EndpointDirection::Input, EndpointKind::Event) => {
                self.input_events.push(InputEvent::new(definition.id))
            }
            (EndpointDirection::Output, EndpointKind::Event) => {
                self.output_events.push(OutputEvent::new(definition.id))
            }
        }
    }

    // =========================================================================
    // Value inputs
    // =========================================================================

    #[inline]
    pub fn input(&self, index: usize) -> &Value {
        self.inputs.get(index).map(ValueEndpoint::get).unwrap_or(&ZERO)
    }

    #[inline]
    pub fn input_f32(&self, index: usize) -> f32 {
        self.input(index).as_f32()
    }

    #[inline]
    pub fn input_i32(&self, index: usize) -> i32 {
        self.input(index).as_i32()
    }

    #[inline]
    pub fn input_bool(&self, index: usize) -> bool {
        self.input(index).as_bool()
    }

    /// Overwrites an input value. Upstream connections overwrite it again
    /// when the node is next evaluated.
    #[inline]
    pub fn set_input(&mut self, index: usize, value: Value) {
        if let Some(endpoint) = self.inputs.get_mut(index) {
            endpoint.set(value);
        }
    }

    /// Copies an upstream value into an input, converting it to `ty`.
    #[inline]
    pub(crate) fn assign_input(&mut self, index: usize, value: &Value, ty: ValueType) {
        if let Some(endpoint) = self.inputs.get_mut(index) {
            endpoint.assign(value, ty);
        }
    }

    // =========================================================================
    // Value outputs
    // =========================================================================

    #[inline]
    pub fn output(&self, index: usize) -> &Value {
        self.outputs.get(index).map(ValueEndpoint::get).unwrap_or(&ZERO)
    }

    #[inline]
    pub fn set_output(&mut self, index: usize, value: impl Into<Value>) {
        if let Some(endpoint) = self.outputs.get_mut(index) {
            endpoint.set(value.into());
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Raises an output event. Connected inputs fire on the next tick.
    #[inline]
    pub fn raise(&mut self, index: usize, value: f32) {
        if let Some(event) = self.output_events.get_mut(index) {
            event.raise(value);
        }
    }

    /// Withdraws an output event raised earlier in this tick.
    #[inline]
    pub fn cancel(&mut self, index: usize) {
        if let Some(event) = self.output_events.get_mut(index) {
            event.cancel();
        }
    }

    /// Returns true if the output event has been raised and not yet propagated.
    pub fn is_raised(&self, index: usize) -> bool {
        self.output_events.get(index).is_some_and(OutputEvent::is_raised)
    }

    /// Schedules an input event for the next tick.
    #[inline]
    pub fn deliver(&mut self, index: usize, value: f32) {
        if let Some(event) = self.input_events.get_mut(index) {
            event.deliver(value);
        }
    }

    /// Consumes a raised output event for propagation.
    #[inline]
    pub(crate) fn take_raised(&mut self, index: usize) -> Option<f32> {
        self.output_events.get_mut(index)?.consume_if_dirty()
    }

    /// Consumes a latched input event without running a handler.
    #[inline]
    pub(crate) fn take_input_event(&mut self, index: usize) -> Option<f32> {
        self.input_events.get_mut(index)?.consume_if_dirty()
    }

    pub(crate) fn latch_events(&mut self) {
        for event in &mut self.input_events {
            event.latch();
        }
    }

    pub(crate) fn clear_events(&mut self) {
        for event in &mut self.input_events {
            event.clear();
        }
        for event in &mut self.output_events {
            event.cancel();
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_event_count(&self) -> usize {
        self.input_events.len()
    }

    pub fn output_event_count(&self) -> usize {
        self.output_events.len()
    }

    pub fn input_index(&self, id: Identifier) -> Option<usize> {
        self.inputs.iter().position(|e| e.id() == id)
    }

    pub fn output_index(&self, id: Identifier) -> Option<usize> {
        self.outputs.iter().position(|e| e.id() == id)
    }

    pub fn input_event_index(&self, id: Identifier) -> Option<usize> {
        self.input_events.iter().position(|e| e.id() == id)
    }

    pub fn output_event_index(&self, id: Identifier) -> Option<usize> {
        self.output_events.iter().position(|e| e.id() == id)
    }
}

/// Where an endpoint lives inside a node's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointLocation {
    pub kind: EndpointKind,
    pub index: usize,
}

/// A node placed in a graph: identity, debug name, behaviour and endpoints.
///
/// Constructed once per graph instantiation and never shared between graphs.
pub struct NodeInstance {
    id: Uuid,
    name: String,
    definitions: Vec<EndpointDefinition>,
    processor: Box<dyn NodeProcessor>,
    io: NodeIo,
}

impl NodeInstance {
    /// Wraps a processor, allocating storage for all its endpoints.
    pub fn new(id: Uuid, name: impl Into<String>, processor: Box<dyn NodeProcessor>) -> Self {
        let definitions = processor.endpoints().to_vec();
        let io = NodeIo::from_definitions(&definitions);
        Self {
            id,
            name: name.into(),
            definitions,
            processor,
            io,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the debug name, normally the registered type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definitions(&self) -> &[EndpointDefinition] {
        &self.definitions
    }

    pub fn io(&self) -> &NodeIo {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut NodeIo {
        &mut self.io
    }

    /// Adds an endpoint after construction. Used for graph boundary nodes.
    pub(crate) fn add_endpoint(&mut self, definition: EndpointDefinition) {
        self.io.push(&definition);
        self.definitions.push(definition);
    }

    /// Finds an endpoint by identifier and direction.
    pub fn locate(&self, id: Identifier, direction: EndpointDirection) -> Option<EndpointLocation> {
        let definition = self
            .definitions
            .iter()
            .find(|d| d.id == id && d.direction == direction)?;
        let index = match (direction, definition.kind.is_event()) {
            (EndpointDirection::Input, false) => self.io.input_index(id),
            (EndpointDirection::Output, false) => self.io.output_index(id),
            (EndpointDirection::Input, true) => self.io.input_event_index(id),
            (EndpointDirection::Output, true) => self.io.output_event_index(id),
        }?;
        Some(EndpointLocation {
            kind: definition.kind,
            index,
        })
    }

    /// Sets the local value of an input, used as the parameter default.
    ///
    /// Returns false if the node has no such value input or the value
    /// cannot be converted to its type.
    pub fn set_input_value(&mut self, id: Identifier, value: Value) -> bool {
        let Some(location) = self.locate(id, EndpointDirection::Input) else {
            return false;
        };
        let Some(value) = location
            .kind
            .value_type()
            .and_then(|ty| value.coerce_to(ty))
        else {
            return false;
        };
        self.io.set_input(location.index, value);
        true
    }

    pub fn input_value(&self, id: Identifier) -> Option<&Value> {
        self.io.input_index(id).map(|i| self.io.input(i))
    }

    pub fn output_value(&self, id: Identifier) -> Option<&Value> {
        self.io.output_index(id).map(|i| self.io.output(i))
    }

    /// Schedules an input event for the next tick.
    pub fn raise_input_event(&mut self, id: Identifier, value: f32) -> bool {
        match self.io.input_event_index(id) {
            Some(index) => {
                self.io.deliver(index, value);
                true
            }
            None => false,
        }
    }

    /// Consumes a raised output event, returning its argument.
    pub fn take_output_event(&mut self, id: Identifier) -> Option<f32> {
        let index = self.io.output_event_index(id)?;
        self.io.output_events[index].consume_if_dirty()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn init(&mut self, context: &ProcessContext) {
        self.processor.init(&mut self.io, context);
    }

    /// Runs the handlers of every dirty input event, then `process`.
    pub fn process(&mut self, context: &ProcessContext) {
        for index in 0..self.io.input_events.len() {
            if let Some(value) = self.io.input_events[index].consume_if_dirty() {
                self.processor.on_event(index, value, &mut self.io, context);
            }
        }
        self.processor.process(&mut self.io, context);
    }

    /// Latches scheduled events and processes one tick.
    ///
    /// Standalone form of what the graph evaluator does for each node.
    pub fn tick(&mut self, context: &ProcessContext) {
        self.io.latch_events();
        self.process(context);
    }
}

impl std::fmt::Debug for NodeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("endpoints", &self.definitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test node that counts how often its trigger handler runs.
    struct CountingNode {
        endpoints: Vec<EndpointDefinition>,
        handled: u32,
    }

    impl CountingNode {
        fn new() -> Self {
            Self {
                endpoints: vec![
                    EndpointDefinition::input_event("Trigger"),
                    EndpointDefinition::input_with_default("Gain", 2.0),
                    EndpointDefinition::output("Count", ValueType::Int),
                    EndpointDefinition::output_event("OnTrigger"),
                ],
                handled: 0,
            }
        }
    }

    impl NodeProcessor for CountingNode {
        fn endpoints(&self) -> &[EndpointDefinition] {
            &self.endpoints
        }

        fn on_event(&mut self, _event: usize, value: f32, io: &mut NodeIo, _context: &ProcessContext) {
            self.handled += 1;
            io.raise(0, value * io.input_f32(0));
        }

        fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
            io.set_output(0, self.handled as i32);
        }
    }

    fn counting_instance() -> NodeInstance {
        NodeInstance::new(Uuid::new_v4(), "Counting", Box::new(CountingNode::new()))
    }

    #[test]
    fn test_category_names() {
        assert_eq!(NodeCategory::Math.name(), "Math");
        assert_eq!(NodeCategory::Trigger.name(), "Trigger");
    }

    #[test]
    fn test_storage_is_split_by_kind() {
        let node = counting_instance();
        assert_eq!(node.io().input_count(), 1);
        assert_eq!(node.io().output_count(), 1);
        assert_eq!(node.io().input_event_count(), 1);
        assert_eq!(node.io().output_event_count(), 1);
        assert_eq!(node.input_value(Identifier::new("Gain")), Some(&Value::Float(2.0)));
    }

    #[test]
    fn test_locate() {
        let node = counting_instance();
        let trigger = node
            .locate(Identifier::new("Trigger"), EndpointDirection::Input)
            .unwrap();
        assert_eq!(trigger.kind, EndpointKind::Event);
        assert_eq!(trigger.index, 0);
        assert!(node
            .locate(Identifier::new("Trigger"), EndpointDirection::Output)
            .is_none());
    }

    #[test]
    fn test_out_of_range_access_is_total() {
        let mut io = NodeIo::default();
        assert_eq!(io.input_f32(3), 0.0);
        io.set_output(5, 1.0);
        io.raise(2, 1.0);
        assert!(!io.is_raised(2));
    }

    #[test]
    fn test_repeated_raises_run_handler_once() {
        let mut node = counting_instance();
        let ctx = ProcessContext::default();
        for _ in 0..5 {
            node.raise_input_event(Identifier::new("Trigger"), 1.0);
        }
        node.tick(&ctx);
        assert_eq!(node.output_value(Identifier::new("Count")), Some(&Value::Int(1)));
        assert_eq!(node.take_output_event(Identifier::new("OnTrigger")), Some(2.0));

        node.tick(&ctx);
        assert_eq!(node.output_value(Identifier::new("Count")), Some(&Value::Int(1)));
        assert_eq!(node.take_output_event(Identifier::new("OnTrigger")), None);
    }

    #[test]
    fn test_set_input_value_coerces() {
        let mut node = counting_instance();
        assert!(node.set_input_value(Identifier::new("Gain"), Value::Int(3)));
        assert_eq!(node.input_value(Identifier::new("Gain")), Some(&Value::Float(3.0)));
        assert!(!node.set_input_value(Identifier::new("Gain"), Value::from(vec![1.0_f32])));
        assert!(!node.set_input_value(Identifier::new("Missing"), Value::Int(3)));
    }
}
