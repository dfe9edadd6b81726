//! Arithmetic nodes.
//!
//! The binary operators share one implementation, [`BinaryMath`], that is
//! parameterized over the element type and the operator. All of them are
//! pure functions of their current inputs.

use std::marker::PhantomData;

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext, ValueType};

use super::numeric::{finite_or_zero, NodeValue};

/// A binary operation on two node values.
pub trait BinaryOperator: Send + 'static {
    /// Names of the two inputs.
    const INPUTS: [&'static str; 2];
    /// Name of the output.
    const OUTPUT: &'static str;

    fn apply<T: NodeValue>(a: T, b: T) -> T;
}

pub struct AddOp;
pub struct SubtractOp;
pub struct MultiplyOp;
pub struct DivideOp;
pub struct MinOp;
pub struct MaxOp;

impl BinaryOperator for AddOp {
    const INPUTS: [&'static str; 2] = ["Value1", "Value2"];
    const OUTPUT: &'static str = "Out";

    fn apply<T: NodeValue>(a: T, b: T) -> T {
        a.add(b)
    }
}

impl BinaryOperator for SubtractOp {
    const INPUTS: [&'static str; 2] = ["Value1", "Value2"];
    const OUTPUT: &'static str = "Out";

    fn apply<T: NodeValue>(a: T, b: T) -> T {
        a.sub(b)
    }
}

impl BinaryOperator for MultiplyOp {
    const INPUTS: [&'static str; 2] = ["Value", "Multiplier"];
    const OUTPUT: &'static str = "Out";

    fn apply<T: NodeValue>(a: T, b: T) -> T {
        a.mul(b)
    }
}

impl BinaryOperator for DivideOp {
    const INPUTS: [&'static str; 2] = ["Value", "Denominator"];
    const OUTPUT: &'static str = "Out";

    fn apply<T: NodeValue>(a: T, b: T) -> T {
        a.div(b)
    }
}

impl BinaryOperator for MinOp {
    const INPUTS: [&'static str; 2] = ["A", "B"];
    const OUTPUT: &'static str = "Value";

    fn apply<T: NodeValue>(a: T, b: T) -> T {
        a.min_of(b)
    }
}

impl BinaryOperator for MaxOp {
    const INPUTS: [&'static str; 2] = ["A", "B"];
    const OUTPUT: &'static str = "Value";

    fn apply<T: NodeValue>(a: T, b: T) -> T {
        a.max_of(b)
    }
}

/// Applies a [`BinaryOperator`] to two inputs of type `T` every tick.
pub struct BinaryMath<T: NodeValue, O: BinaryOperator> {
    endpoints: Vec<EndpointDefinition>,
    _marker: PhantomData<fn() -> (T, O)>,
}

pub type Add<T> = BinaryMath<T, AddOp>;
pub type Subtract<T> = BinaryMath<T, SubtractOp>;
pub type Multiply<T> = BinaryMath<T, MultiplyOp>;
/// Division by zero outputs zero.
pub type Divide<T> = BinaryMath<T, DivideOp>;
pub type Min<T> = BinaryMath<T, MinOp>;
pub type Max<T> = BinaryMath<T, MaxOp>;

impl<T: NodeValue, O: BinaryOperator> BinaryMath<T, O> {
    const IN_A: usize = 0;
    const IN_B: usize = 1;
    const OUT: usize = 0;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input(O::INPUTS[0], T::VALUE_TYPE),
                EndpointDefinition::input(O::INPUTS[1], T::VALUE_TYPE),
                EndpointDefinition::output(O::OUTPUT, T::VALUE_TYPE),
            ],
            _marker: PhantomData,
        }
    }
}

impl<T: NodeValue, O: BinaryOperator> Default for BinaryMath<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue, O: BinaryOperator> NodeProcessor for BinaryMath<T, O> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        self.process(io, context);
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let a = T::read(io.input(Self::IN_A));
        let b = T::read(io.input(Self::IN_B));
        io.set_output(Self::OUT, O::apply(a, b).into_value());
    }
}

/// Integer remainder. A zero modulus passes the value through.
pub struct Modulo {
    endpoints: Vec<EndpointDefinition>,
}

impl Modulo {
    const IN_VALUE: usize = 0;
    const IN_MODULO: usize = 1;
    const OUT: usize = 0;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input("Value", ValueType::Int),
                EndpointDefinition::input("Modulo", ValueType::Int),
                EndpointDefinition::output("Out", ValueType::Int),
            ],
        }
    }
}

impl Default for Modulo {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for Modulo {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let value = io.input_i32(Self::IN_VALUE);
        let modulo = io.input_i32(Self::IN_MODULO);
        let out = if modulo == 0 {
            value
        } else {
            value.wrapping_rem(modulo)
        };
        io.set_output(Self::OUT, out);
    }
}

/// `Base` raised to `Exponent`.
pub struct Power {
    endpoints: Vec<EndpointDefinition>,
}

impl Power {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input("Base", ValueType::Float),
                EndpointDefinition::input("Exponent", ValueType::Float),
                EndpointDefinition::output("Out", ValueType::Float),
            ],
        }
    }
}

impl Default for Power {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for Power {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let out = finite_or_zero(io.input_f32(0).powf(io.input_f32(1)));
        io.set_output(0, out);
    }
}

/// Logarithm of `Value` in `Base`.
///
/// Outside the domain (value or base not positive, base of one) the
/// output is zero.
pub struct Log {
    endpoints: Vec<EndpointDefinition>,
}

impl Log {
    const IN_BASE: usize = 0;
    const IN_VALUE: usize = 1;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("Base", std::f32::consts::E),
                EndpointDefinition::input("Value", ValueType::Float),
                EndpointDefinition::output("Out", ValueType::Float),
            ],
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for Log {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let base = io.input_f32(Self::IN_BASE);
        let value = io.input_f32(Self::IN_VALUE);
        let out = if value <= 0.0 || base <= 0.0 || base == 1.0 {
            0.0
        } else {
            finite_or_zero(value.ln() / base.ln())
        };
        io.set_output(0, out);
    }
}
