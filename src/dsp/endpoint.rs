//! Endpoint definitions and runtime endpoint storage.
//!
//! Endpoints are the connection points on nodes. A value endpoint holds a
//! [`Value`] that is read and written every tick. An event endpoint is a
//! discrete trigger backed by a dirty flag.

use super::identifier::Identifier;
use super::value::{Value, ValueType};

/// Direction of an endpoint on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointDirection {
    /// An input endpoint that receives values or events.
    Input,
    /// An output endpoint that produces values or events.
    Output,
}

impl EndpointDirection {
    /// Returns a human-readable name for the endpoint direction.
    pub fn name(&self) -> &'static str {
        match self {
            EndpointDirection::Input => "Input",
            EndpointDirection::Output => "Output",
        }
    }
}

/// Whether an endpoint carries a continuous value or discrete events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Value(ValueType),
    Event,
}

impl EndpointKind {
    /// Returns true if this is an event endpoint.
    pub fn is_event(&self) -> bool {
        matches!(self, EndpointKind::Event)
    }

    /// Returns the value type, or `None` for events.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            EndpointKind::Value(ty) => Some(*ty),
            EndpointKind::Event => None,
        }
    }
}

/// Definition of an endpoint on a node.
///
/// Each node type declares a fixed, ordered list of these. Runtime storage
/// is allocated from the list when the node is constructed, and nodes
/// address their endpoints by position within the same direction and kind.
#[derive(Clone, Debug)]
pub struct EndpointDefinition {
    /// Identifier of this endpoint, unique within the node and direction.
    pub id: Identifier,
    /// Whether this is an input or output endpoint.
    pub direction: EndpointDirection,
    /// Value type or event.
    pub kind: EndpointKind,
    /// Initial value of a value endpoint. Ignored for events.
    pub default_value: Value,
}

impl EndpointDefinition {
    /// Creates a new input value endpoint with the type's zero default.
    pub fn input(name: &'static str, value_type: ValueType) -> Self {
        Self {
            id: Identifier::new(name),
            direction: EndpointDirection::Input,
            kind: EndpointKind::Value(value_type),
            default_value: value_type.default_value(),
        }
    }

    /// Creates a new input value endpoint with a custom default value.
    ///
    /// The endpoint type is taken from the default.
    pub fn input_with_default(name: &'static str, default_value: impl Into<Value>) -> Self {
        let default_value = default_value.into();
        Self {
            id: Identifier::new(name),
            direction: EndpointDirection::Input,
            kind: EndpointKind::Value(default_value.value_type()),
            default_value,
        }
    }

    /// Creates a new output value endpoint.
    pub fn output(name: &'static str, value_type: ValueType) -> Self {
        Self {
            id: Identifier::new(name),
            direction: EndpointDirection::Output,
            kind: EndpointKind::Value(value_type),
            default_value: value_type.default_value(),
        }
    }

    /// Creates a new input event endpoint.
    pub fn input_event(name: &'static str) -> Self {
        Self::event(Identifier::new(name), EndpointDirection::Input)
    }

    /// Creates a new output event endpoint.
    pub fn output_event(name: &'static str) -> Self {
        Self::event(Identifier::new(name), EndpointDirection::Output)
    }

    /// Creates an event endpoint from an existing identifier.
    pub fn event(id: Identifier, direction: EndpointDirection) -> Self {
        Self {
            id,
            direction,
            kind: EndpointKind::Event,
            default_value: Value::Float(0.0),
        }
    }

    /// Creates a value endpoint from an existing identifier.
    pub fn value(id: Identifier, direction: EndpointDirection, default_value: Value) -> Self {
        Self {
            id,
            direction,
            kind: EndpointKind::Value(default_value.value_type()),
            default_value,
        }
    }

    /// Returns the endpoint name used for diagnostics.
    pub fn name(&self) -> &'static str {
        self.id.debug_name()
    }

    /// Returns true if this is an input endpoint.
    pub fn is_input(&self) -> bool {
        self.direction == EndpointDirection::Input
    }

    /// Returns true if this is an output endpoint.
    pub fn is_output(&self) -> bool {
        self.direction == EndpointDirection::Output
    }

    /// Returns true if this is an event endpoint.
    pub fn is_event(&self) -> bool {
        self.kind.is_event()
    }
}

/// Runtime storage of a value endpoint.
#[derive(Clone, Debug)]
pub struct ValueEndpoint {
    id: Identifier,
    value: Value,
}

impl ValueEndpoint {
    pub fn new(id: Identifier, value: Value) -> Self {
        Self { id, value }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    #[inline]
    pub fn get(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn set(&mut self, value: Value) {
        self.value = value;
    }

    /// Copies `value` converted to `ty`. Arrays are shared, not copied.
    #[inline]
    pub fn assign(&mut self, value: &Value, ty: ValueType) {
        if let Some(converted) = value.coerce_to(ty) {
            self.value = converted;
        }
    }
}

/// A coalescing trigger flag.
///
/// Raising an already dirty flag keeps it dirty and overwrites the
/// argument, so any number of raises within a tick is observed once.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventFlag {
    dirty: bool,
    value: f32,
}

impl EventFlag {
    /// Marks the flag dirty with the given argument.
    #[inline]
    pub fn raise(&mut self, value: f32) {
        self.dirty = true;
        self.value = value;
    }

    /// Returns the argument and clears the flag if it was dirty.
    #[inline]
    pub fn consume_if_dirty(&mut self) -> Option<f32> {
        if self.dirty {
            self.dirty = false;
            Some(self.value)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn clear(&mut self) {
        self.dirty = false;
    }
}

/// Runtime storage of an input event endpoint.
///
/// Deliveries land in `incoming` and only become visible to the node once
/// [`InputEvent::latch`] runs at the start of the next tick.
#[derive(Clone, Debug)]
pub struct InputEvent {
    id: Identifier,
    current: EventFlag,
    incoming: EventFlag,
}

impl InputEvent {
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            current: EventFlag::default(),
            incoming: EventFlag::default(),
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Schedules the event for the next tick.
    #[inline]
    pub fn deliver(&mut self, value: f32) {
        self.incoming.raise(value);
    }

    /// Moves a scheduled delivery into the current tick.
    #[inline]
    pub fn latch(&mut self) {
        if let Some(value) = self.incoming.consume_if_dirty() {
            self.current.raise(value);
        }
    }

    #[inline]
    pub fn consume_if_dirty(&mut self) -> Option<f32> {
        self.current.consume_if_dirty()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.current.is_dirty() || self.incoming.is_dirty()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.incoming.clear();
    }
}

/// Runtime storage of an output event endpoint.
#[derive(Clone, Debug)]
pub struct OutputEvent {
    id: Identifier,
    flag: EventFlag,
}

impl OutputEvent {
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            flag: EventFlag::default(),
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    #[inline]
    pub fn raise(&mut self, value: f32) {
        self.flag.raise(value);
    }

    /// Withdraws a raise made earlier in the same tick.
    #[inline]
    pub fn cancel(&mut self) {
        self.flag.clear();
    }

    #[inline]
    pub fn consume_if_dirty(&mut self) -> Option<f32> {
        self.flag.consume_if_dirty()
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.flag.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_names() {
        assert_eq!(EndpointDirection::Input.name(), "Input");
        assert_eq!(EndpointDirection::Output.name(), "Output");
    }

    #[test]
    fn test_input_definition() {
        let def = EndpointDefinition::input("Value1", ValueType::Float);
        assert_eq!(def.id, Identifier::new("Value1"));
        assert_eq!(def.name(), "Value1");
        assert!(def.is_input());
        assert!(!def.is_event());
        assert_eq!(def.default_value, Value::Float(0.0));
    }

    #[test]
    fn test_input_with_default_takes_type_from_value() {
        let def = EndpointDefinition::input_with_default("Seed", -1);
        assert_eq!(def.kind, EndpointKind::Value(ValueType::Int));
        assert_eq!(def.default_value, Value::Int(-1));
    }

    #[test]
    fn test_event_definitions() {
        let def = EndpointDefinition::output_event("OnComplete");
        assert!(def.is_output());
        assert!(def.is_event());
        assert_eq!(def.kind.value_type(), None);
    }

    #[test]
    fn test_event_flag_coalesces() {
        let mut flag = EventFlag::default();
        flag.raise(1.0);
        flag.raise(2.0);
        flag.raise(3.0);
        assert_eq!(flag.consume_if_dirty(), Some(3.0));
        assert_eq!(flag.consume_if_dirty(), None);
    }

    #[test]
    fn test_input_event_waits_for_latch() {
        let mut event = InputEvent::new(Identifier::new("Trigger"));
        event.deliver(0.5);
        assert!(event.is_pending());
        assert_eq!(event.consume_if_dirty(), None);

        event.latch();
        assert_eq!(event.consume_if_dirty(), Some(0.5));
        assert!(!event.is_pending());
    }

    #[test]
    fn test_output_event_cancel() {
        let mut event = OutputEvent::new(Identifier::new("Trigger"));
        event.raise(1.0);
        assert!(event.is_raised());
        event.cancel();
        assert_eq!(event.consume_if_dirty(), None);
    }

    #[test]
    fn test_value_endpoint() {
        let mut ep = ValueEndpoint::new(Identifier::new("Out"), Value::Int(1));
        ep.set(Value::Int(7));
        assert_eq!(ep.get(), &Value::Int(7));
    }
}
