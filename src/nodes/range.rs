//! Range nodes: clamping, linear range mapping and frequency scaling.

use std::marker::PhantomData;

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext, ValueType};

use super::numeric::{finite_or_zero, NodeValue};

/// Limits `In` to `[Min, Max]`. Reversed bounds are swapped.
pub struct Clamp<T: NodeValue> {
    endpoints: Vec<EndpointDefinition>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NodeValue> Clamp<T> {
    const IN_VALUE: usize = 0;
    const IN_MIN: usize = 1;
    const IN_MAX: usize = 2;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input("In", T::VALUE_TYPE),
                EndpointDefinition::input("Min", T::VALUE_TYPE),
                EndpointDefinition::input_with_default("Max", T::RANGE_MAX.into_value()),
                EndpointDefinition::output("Value", T::VALUE_TYPE),
            ],
            _marker: PhantomData,
        }
    }
}

impl<T: NodeValue> Default for Clamp<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue> NodeProcessor for Clamp<T> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let value = T::read(io.input(Self::IN_VALUE)).sanitize();
        let a = T::read(io.input(Self::IN_MIN)).sanitize();
        let b = T::read(io.input(Self::IN_MAX)).sanitize();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        io.set_output(0, value.max_of(lo).min_of(hi).into_value());
    }
}

/// Maps `In` linearly from `[InRangeA, InRangeB]` to `[OutRangeA, OutRangeB]`.
///
/// With `Clamped` set the result stays inside the output range. A zero
/// width input range maps everything to `OutRangeA`.
pub struct MapRange<T: NodeValue> {
    endpoints: Vec<EndpointDefinition>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NodeValue> MapRange<T> {
    const IN_VALUE: usize = 0;
    const IN_RANGE_A: usize = 1;
    const IN_RANGE_B: usize = 2;
    const OUT_RANGE_A: usize = 3;
    const OUT_RANGE_B: usize = 4;
    const CLAMPED: usize = 5;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input("In", T::VALUE_TYPE),
                EndpointDefinition::input("InRangeA", T::VALUE_TYPE),
                EndpointDefinition::input_with_default("InRangeB", T::RANGE_MAX.into_value()),
                EndpointDefinition::input("OutRangeA", T::VALUE_TYPE),
                EndpointDefinition::input_with_default("OutRangeB", T::RANGE_MAX.into_value()),
                EndpointDefinition::input("Clamped", ValueType::Bool),
                EndpointDefinition::output("Out", T::VALUE_TYPE),
            ],
            _marker: PhantomData,
        }
    }
}

impl<T: NodeValue> Default for MapRange<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue> NodeProcessor for MapRange<T> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        // f64 keeps every i32 exact.
        let value = T::read(io.input(Self::IN_VALUE)).to_f64();
        let in_a = T::read(io.input(Self::IN_RANGE_A)).to_f64();
        let in_b = T::read(io.input(Self::IN_RANGE_B)).to_f64();
        let out_a = T::read(io.input(Self::OUT_RANGE_A)).to_f64();
        let out_b = T::read(io.input(Self::OUT_RANGE_B)).to_f64();

        let width = in_b - in_a;
        let mut t = if width == 0.0 { 0.0 } else { (value - in_a) / width };
        if !t.is_finite() {
            t = 0.0;
        }
        if io.input_bool(Self::CLAMPED) {
            t = t.clamp(0.0, 1.0);
        }

        let out = out_a + (out_b - out_a) * t;
        let out = if out.is_finite() { T::from_f64(out) } else { T::default() };
        io.set_output(0, out.into_value());
    }
}

/// Maps a linear control value onto a logarithmic frequency scale.
pub struct LinearToLogFrequency {
    endpoints: Vec<EndpointDefinition>,
}

impl LinearToLogFrequency {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("Value", 0.5),
                EndpointDefinition::input_with_default("Min", 0.0),
                EndpointDefinition::input_with_default("Max", 1.0),
                EndpointDefinition::input_with_default("MinFrequency", 20.0),
                EndpointDefinition::input_with_default("MaxFrequency", 20000.0),
                EndpointDefinition::output("Frequency", ValueType::Float),
            ],
        }
    }
}

impl Default for LinearToLogFrequency {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for LinearToLogFrequency {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let value = io.input_f32(0);
        let min = io.input_f32(1);
        let max = io.input_f32(2);
        let min_frequency = io.input_f32(3);
        let max_frequency = io.input_f32(4);

        let normalized = if max == min {
            0.0
        } else {
            (value - min) / (max - min)
        };
        let octaves = (max_frequency / min_frequency).log2();
        let out = finite_or_zero(2.0_f32.powf(normalized * octaves) * min_frequency);
        io.set_output(0, out);
    }
}

/// Inverse of [`LinearToLogFrequency`].
pub struct FrequencyLogToLinear {
    endpoints: Vec<EndpointDefinition>,
}

impl FrequencyLogToLinear {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("Frequency", 1000.0),
                EndpointDefinition::input_with_default("MinFrequency", 20.0),
                EndpointDefinition::input_with_default("MaxFrequency", 20000.0),
                EndpointDefinition::input_with_default("Min", 0.0),
                EndpointDefinition::input_with_default("Max", 1.0),
                EndpointDefinition::output("Value", ValueType::Float),
            ],
        }
    }
}

impl Default for FrequencyLogToLinear {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for FrequencyLogToLinear {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let frequency = io.input_f32(0);
        let min_frequency = io.input_f32(1);
        let max_frequency = io.input_f32(2);
        let min = io.input_f32(3);
        let max = io.input_f32(4);

        let octaves = (max_frequency / min_frequency).log2();
        let normalized = finite_or_zero((frequency / min_frequency).log2() / octaves);
        io.set_output(0, finite_or_zero(min + normalized * (max - min)));
    }
}
