//! Constant source nodes.

use std::marker::PhantomData;

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext};

use super::numeric::NodeValue;

/// Outputs its `Value` input unchanged. The value is normally set as a
/// parameter default in the graph description.
pub struct Constant<T: NodeValue> {
    endpoints: Vec<EndpointDefinition>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NodeValue> Constant<T> {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input("Value", T::VALUE_TYPE),
                EndpointDefinition::output("Out", T::VALUE_TYPE),
            ],
            _marker: PhantomData,
        }
    }
}

impl<T: NodeValue> Default for Constant<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue> NodeProcessor for Constant<T> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        self.process(io, context);
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let value = T::read(io.input(0));
        io.set_output(0, value.into_value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::Value;
    use crate::nodes::test_util::{instance, run};

    #[test]
    fn test_constant_passes_value() {
        let mut constant = instance::<Constant<f32>>();
        assert_eq!(run(&mut constant, &[("Value", Value::Float(5.0))]), Value::Float(5.0));

        let mut constant = instance::<Constant<i32>>();
        assert_eq!(run(&mut constant, &[("Value", Value::Int(-3))]), Value::Int(-3));
    }
}
