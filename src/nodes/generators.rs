//! Signal generator nodes: noise and sine.

use crate::dsp::{
    EndpointDefinition, FastRandom, NodeIo, NodeProcessor, ProcessContext, ValueType, TIME_SEED,
};

use super::numeric::finite_or_zero;

/// Noise colour selected by the `Type` input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseType {
    White = 0,
    Pink = 1,
    Brownian = 2,
}

impl NoiseType {
    /// Unknown selector values fall back to white noise.
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => NoiseType::Pink,
            2 => NoiseType::Brownian,
            _ => NoiseType::White,
        }
    }
}

const PINK_BINS: usize = 16;

/// Noise state for one node.
///
/// Pink noise uses the Voss-McCartney scheme: each frame refreshes one of
/// 16 octave bins, picked by the trailing zeros of a running counter.
#[derive(Clone, Debug)]
struct NoiseGenerator {
    noise_type: NoiseType,
    rng: FastRandom,
    pink_bins: [f64; PINK_BINS],
    pink_counter: u32,
    accumulation: f64,
}

impl NoiseGenerator {
    fn new() -> Self {
        Self {
            noise_type: NoiseType::White,
            rng: FastRandom::default(),
            pink_bins: [0.0; PINK_BINS],
            pink_counter: 1,
            accumulation: 0.0,
        }
    }

    fn init(&mut self, seed: i32, noise_type: NoiseType) {
        self.noise_type = noise_type;
        self.rng = FastRandom::seeded(seed);
        self.pink_bins = [0.0; PINK_BINS];
        self.pink_counter = 1;
        self.accumulation = 0.0;
    }

    #[inline]
    fn random(&mut self) -> f64 {
        self.rng.next_bipolar() as f64
    }

    fn next(&mut self) -> f32 {
        match self.noise_type {
            NoiseType::White => self.random() as f32,
            NoiseType::Pink => self.next_pink(),
            NoiseType::Brownian => self.next_brownian(),
        }
    }

    fn next_pink(&mut self) -> f32 {
        let bin = (self.pink_counter.trailing_zeros() as usize) & (PINK_BINS - 1);
        let previous = self.pink_bins[bin];
        let next = self.random();
        self.pink_bins[bin] = next;

        self.accumulation += next - previous;
        self.pink_counter = self.pink_counter.wrapping_add(1);

        ((self.random() + self.accumulation) / 10.0) as f32
    }

    fn next_brownian(&mut self) -> f32 {
        // Leak keeps the walk inside -1..1 on average.
        let walk = (self.random() + self.accumulation) / 1.005;
        self.accumulation = walk;
        (walk / 20.0) as f32
    }
}

/// White, pink or brownian noise.
pub struct Noise {
    endpoints: Vec<EndpointDefinition>,
    generator: NoiseGenerator,
}

impl Noise {
    const IN_SEED: usize = 0;
    const IN_TYPE: usize = 1;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("Seed", TIME_SEED),
                EndpointDefinition::input("Type", ValueType::Int),
                EndpointDefinition::output("Value", ValueType::Float),
            ],
            generator: NoiseGenerator::new(),
        }
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for Noise {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let noise_type = NoiseType::from_index(io.input_i32(Self::IN_TYPE));
        self.generator.init(io.input_i32(Self::IN_SEED), noise_type);
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let value = self.generator.next();
        io.set_output(0, value);
    }
}

/// Sine oscillator.
///
/// `Frequency` is clamped to 0..22000 Hz. `PhaseOffset` is added in radians
/// and `ResetPhase` restarts the cycle.
pub struct Sine {
    endpoints: Vec<EndpointDefinition>,
    phase: f32,
}

impl Sine {
    pub const MAX_FREQUENCY: f32 = 22000.0;

    const EVENT_RESET_PHASE: usize = 0;
    const IN_FREQUENCY: usize = 0;
    const IN_PHASE_OFFSET: usize = 1;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("ResetPhase"),
                EndpointDefinition::input_with_default("Frequency", 440.0),
                EndpointDefinition::input("PhaseOffset", ValueType::Float),
                EndpointDefinition::output("Sine", ValueType::Float),
            ],
            phase: 0.0,
        }
    }
}

impl Default for Sine {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for Sine {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {
        self.phase = 0.0;
    }

    fn on_event(&mut self, event: usize, _value: f32, _io: &mut NodeIo, _context: &ProcessContext) {
        if event == Self::EVENT_RESET_PHASE {
            self.phase = 0.0;
        }
    }

    fn process(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        let frequency = finite_or_zero(io.input_f32(Self::IN_FREQUENCY)).clamp(0.0, Self::MAX_FREQUENCY);
        let offset = finite_or_zero(io.input_f32(Self::IN_PHASE_OFFSET));

        io.set_output(0, (self.phase + offset).sin());

        self.phase += context.frequency_to_radians(frequency);
        if self.phase >= std::f32::consts::TAU {
            self.phase %= std::f32::consts::TAU;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{NodeInstance, Value};
    use crate::nodes::test_util::{context, instance, output, set, trigger};

    fn noise(seed: i32, noise_type: NoiseType) -> NodeInstance {
        let mut node = instance::<Noise>();
        set(&mut node, &[("Seed", Value::Int(seed)), ("Type", Value::Int(noise_type as i32))]);
        node.init(&context());
        node
    }

    fn render(node: &mut NodeInstance, frames: usize, name: &'static str) -> Vec<f32> {
        (0..frames)
            .map(|_| {
                node.tick(&context());
                output(node, name).as_f32()
            })
            .collect()
    }

    #[test]
    fn test_noise_types_stay_bounded_and_finite() {
        for noise_type in [NoiseType::White, NoiseType::Pink, NoiseType::Brownian] {
            let mut node = noise(123, noise_type);
            for sample in render(&mut node, 10_000, "Value") {
                assert!(sample.is_finite());
                assert!(sample.abs() <= 4.0, "{:?} produced {}", noise_type, sample);
            }
        }
    }

    #[test]
    fn test_noise_is_deterministic_for_seed() {
        let mut a = noise(42, NoiseType::Pink);
        let mut b = noise(42, NoiseType::Pink);
        assert_eq!(render(&mut a, 256, "Value"), render(&mut b, 256, "Value"));
    }

    #[test]
    fn test_unknown_noise_type_is_white() {
        assert_eq!(NoiseType::from_index(7), NoiseType::White);
    }

    #[test]
    fn test_sine_period() {
        let mut sine = instance::<Sine>();
        // 48000 / 480 = 100 frames per cycle
        set(&mut sine, &[("Frequency", Value::Float(480.0))]);
        sine.init(&context());

        let samples = render(&mut sine, 101, "Sine");
        assert!(samples[0].abs() < 1e-6);
        assert!((samples[25] - 1.0).abs() < 1e-3);
        assert!((samples[75] + 1.0).abs() < 1e-3);
        assert!(samples[100].abs() < 1e-3);
    }

    #[test]
    fn test_sine_reset_phase() {
        let mut sine = instance::<Sine>();
        sine.init(&context());
        render(&mut sine, 10, "Sine");

        trigger(&mut sine, "ResetPhase");
        sine.tick(&context());
        assert!(output(&sine, "Sine").as_f32().abs() < 1e-6);
    }

    #[test]
    fn test_sine_frequency_is_clamped() {
        let mut sine = instance::<Sine>();
        set(&mut sine, &[("Frequency", Value::Float(-100.0))]);
        sine.init(&context());
        let samples = render(&mut sine, 4, "Sine");
        assert!(samples.iter().all(|s| s.abs() < 1e-6));
    }
}
