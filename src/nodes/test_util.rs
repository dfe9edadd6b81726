//! Helpers for driving single nodes in unit tests.

use uuid::Uuid;

use crate::dsp::{Identifier, NodeInstance, NodeProcessor, ProcessContext, Value};

pub const SAMPLE_RATE: f32 = 48000.0;

pub fn context() -> ProcessContext {
    ProcessContext::new(SAMPLE_RATE)
}

pub fn instance<N: NodeProcessor + Default>() -> NodeInstance {
    NodeInstance::new(Uuid::new_v4(), "test", Box::new(N::default()))
}

/// Sets the named inputs, runs one tick and returns the first output.
pub fn run(node: &mut NodeInstance, inputs: &[(&'static str, Value)]) -> Value {
    set(node, inputs);
    node.tick(&context());
    node.io().output(0).clone()
}

pub fn set(node: &mut NodeInstance, inputs: &[(&'static str, Value)]) {
    for (name, value) in inputs {
        assert!(
            node.set_input_value(Identifier::new(*name), value.clone()),
            "no input named {}",
            name
        );
    }
}

pub fn output(node: &NodeInstance, name: &'static str) -> Value {
    node.output_value(Identifier::new(name))
        .cloned()
        .unwrap_or_else(|| panic!("no output named {}", name))
}

pub fn trigger(node: &mut NodeInstance, name: &'static str) {
    assert!(
        node.raise_input_event(Identifier::new(name), 1.0),
        "no input event named {}",
        name
    );
}

pub fn fired(node: &mut NodeInstance, name: &'static str) -> bool {
    node.take_output_event(Identifier::new(name)).is_some()
}
