//! Array access nodes.
//!
//! Indices wrap around the array length, so every integer index selects an
//! element. An empty array yields the zero value.

use std::marker::PhantomData;

use crate::dsp::{
    fast_random::FastRandom, EndpointDefinition, NodeIo, NodeProcessor, ProcessContext, ValueType,
    TIME_SEED,
};

use super::numeric::NodeValue;

/// Returns `array[index mod len]`, or the zero value for an empty array.
///
/// Negative indices wrap from the end (Euclidean remainder).
pub fn wrapped_element<T: NodeValue>(array: &[T], index: i64) -> T {
    if array.is_empty() {
        return T::default();
    }
    let len = array.len() as i64;
    array[index.rem_euclid(len) as usize]
}

/// Reads the element at `Index` when triggered.
pub struct Get<T: NodeValue> {
    endpoints: Vec<EndpointDefinition>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NodeValue> Get<T> {
    const EVENT_TRIGGER: usize = 0;
    const IN_ARRAY: usize = 0;
    const IN_INDEX: usize = 1;
    const OUT_ELEMENT: usize = 0;
    const EVENT_ON_TRIGGER: usize = 0;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("Trigger"),
                EndpointDefinition::input("Array", T::ARRAY_TYPE),
                EndpointDefinition::input("Index", ValueType::Int),
                EndpointDefinition::output_event("OnTrigger"),
                EndpointDefinition::output("Element", T::VALUE_TYPE),
            ],
            _marker: PhantomData,
        }
    }

    fn lookup(io: &NodeIo) -> T {
        let index = io.input_i32(Self::IN_INDEX) as i64;
        wrapped_element(T::read_array(io.input(Self::IN_ARRAY)), index)
    }
}

impl<T: NodeValue> Default for Get<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue> NodeProcessor for Get<T> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let element = Self::lookup(io);
        io.set_output(Self::OUT_ELEMENT, element.into_value());
    }

    fn on_event(&mut self, event: usize, _value: f32, io: &mut NodeIo, _context: &ProcessContext) {
        if event == Self::EVENT_TRIGGER {
            let element = Self::lookup(io);
            io.set_output(Self::OUT_ELEMENT, element.into_value());
            io.raise(Self::EVENT_ON_TRIGGER, element.to_f32());
        }
    }

    fn process(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {}
}

/// Picks a random element on `Next`.
///
/// `Reset` restarts the random sequence from the seed and picks the same
/// initial element as `init` did.
pub struct GetRandom<T: NodeValue> {
    endpoints: Vec<EndpointDefinition>,
    rng: FastRandom,
    seed: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NodeValue> GetRandom<T> {
    const EVENT_NEXT: usize = 0;
    const EVENT_RESET: usize = 1;
    const IN_ARRAY: usize = 0;
    const IN_SEED: usize = 1;
    const OUT_ELEMENT: usize = 0;
    const EVENT_ON_NEXT: usize = 0;
    const EVENT_ON_RESET: usize = 1;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("Next"),
                EndpointDefinition::input_event("Reset"),
                EndpointDefinition::input("Array", T::ARRAY_TYPE),
                EndpointDefinition::input_with_default("Seed", TIME_SEED),
                EndpointDefinition::output_event("OnNext"),
                EndpointDefinition::output_event("OnReset"),
                EndpointDefinition::output("Element", T::VALUE_TYPE),
            ],
            rng: FastRandom::default(),
            seed: 0,
            _marker: PhantomData,
        }
    }

    fn reseed(&mut self) {
        self.rng.set_seed(self.seed);
        self.rng.next_u32();
    }

    fn pick(&mut self, io: &mut NodeIo) -> T {
        let array = T::read_array(io.input(Self::IN_ARRAY));
        let element = if array.is_empty() {
            T::default()
        } else {
            array[self.rng.index(array.len())]
        };
        io.set_output(Self::OUT_ELEMENT, element.into_value());
        element
    }
}

impl<T: NodeValue> Default for GetRandom<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue> NodeProcessor for GetRandom<T> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        self.seed = crate::dsp::fast_random::resolve_seed(io.input_i32(Self::IN_SEED));
        self.reseed();
        self.pick(io);
    }

    fn on_event(&mut self, event: usize, _value: f32, io: &mut NodeIo, _context: &ProcessContext) {
        if event == Self::EVENT_NEXT {
            let element = self.pick(io);
            io.raise(Self::EVENT_ON_NEXT, element.to_f32());
        } else if event == Self::EVENT_RESET {
            self.reseed();
            self.pick(io);
            io.raise(Self::EVENT_ON_RESET, 1.0);
        }
    }

    fn process(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {}
}
