//! Attack-decay envelope node.
//!
//! Generates a one-shot (or looping) control envelope in response to
//! trigger events. Useful for shaping amplitude and other parameters.

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext, ValueType};

/// Envelope stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Before the first trigger or after decay has finished (output holds).
    Idle,
    /// Rising from the current level to 1.
    Attack,
    /// Falling from 1 to 0.
    Decay,
}

/// Attack-decay envelope.
///
/// # Endpoints
///
/// - **Trigger** (event): starts the attack from the current level, so a
///   retrigger does not click.
/// - **Reset** (event): returns to idle at zero and withdraws an `OnTrigger`
///   raised in the same tick.
/// - **AttackTime**, **DecayTime** (seconds): a non-positive time completes
///   the stage in one frame.
/// - **AttackCurve**, **DecayCurve**: exponent applied to the attack
///   (`v^curve`) and decay (`1 - (1 - v)^curve`) shapes. Negative curves
///   are treated as 0.
/// - **Looping** (bool): restart the attack after each decay.
/// - **OnTrigger**, **OnComplete** (events) and **OutEnvelope** (0..1).
///
/// Times and curves are read at init and on every trigger.
pub struct AdEnvelope {
    endpoints: Vec<EndpointDefinition>,
    stage: EnvelopeStage,
    /// Linear position inside the current stage.
    level: f32,
    attack_rate: f32,
    decay_rate: f32,
    attack_curve: f32,
    decay_curve: f32,
}

impl AdEnvelope {
    const EVENT_TRIGGER: usize = 0;
    const EVENT_RESET: usize = 1;

    const IN_ATTACK_TIME: usize = 0;
    const IN_DECAY_TIME: usize = 1;
    const IN_ATTACK_CURVE: usize = 2;
    const IN_DECAY_CURVE: usize = 3;
    const IN_LOOPING: usize = 4;

    const EVENT_ON_TRIGGER: usize = 0;
    const EVENT_ON_COMPLETE: usize = 1;
    const OUT_ENVELOPE: usize = 0;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("Trigger"),
                EndpointDefinition::input_event("Reset"),
                EndpointDefinition::input_with_default("AttackTime", 1.0),
                EndpointDefinition::input_with_default("DecayTime", 1.0),
                EndpointDefinition::input_with_default("AttackCurve", 1.0),
                EndpointDefinition::input_with_default("DecayCurve", 1.0),
                EndpointDefinition::input("Looping", ValueType::Bool),
                EndpointDefinition::output_event("OnTrigger"),
                EndpointDefinition::output_event("OnComplete"),
                EndpointDefinition::output("OutEnvelope", ValueType::Float),
            ],
            stage: EnvelopeStage::Idle,
            level: 0.0,
            attack_rate: 1.0,
            decay_rate: 1.0,
            attack_curve: 1.0,
            decay_curve: 1.0,
        }
    }

    /// Returns the current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Per-frame increment for a stage lasting `seconds`.
    fn rate(seconds: f32, sample_rate: f32) -> f32 {
        let frames = seconds * sample_rate;
        if frames <= 0.0 || !frames.is_finite() {
            1.0
        } else {
            (1.0 / frames).min(1.0)
        }
    }

    fn read_shape(&mut self, io: &NodeIo, context: &ProcessContext) {
        self.attack_rate = Self::rate(io.input_f32(Self::IN_ATTACK_TIME), context.sample_rate);
        self.decay_rate = Self::rate(io.input_f32(Self::IN_DECAY_TIME), context.sample_rate);
        self.attack_curve = io.input_f32(Self::IN_ATTACK_CURVE).max(0.0);
        self.decay_curve = io.input_f32(Self::IN_DECAY_CURVE).max(0.0);
    }
}

impl Default for AdEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for AdEnvelope {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        self.read_shape(io, context);
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        io.set_output(Self::OUT_ENVELOPE, 0.0);
    }

    fn on_event(&mut self, event: usize, _value: f32, io: &mut NodeIo, context: &ProcessContext) {
        if event == Self::EVENT_TRIGGER {
            self.read_shape(io, context);
            self.stage = EnvelopeStage::Attack;
            io.raise(Self::EVENT_ON_TRIGGER, 1.0);
        } else if event == Self::EVENT_RESET {
            self.stage = EnvelopeStage::Idle;
            self.level = 0.0;
            io.set_output(Self::OUT_ENVELOPE, 0.0);
            io.cancel(Self::EVENT_ON_TRIGGER);
        }
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        match self.stage {
            EnvelopeStage::Idle => {}
            EnvelopeStage::Attack => {
                self.level += self.attack_rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
                io.set_output(Self::OUT_ENVELOPE, self.level.powf(self.attack_curve));
            }
            EnvelopeStage::Decay => {
                self.level -= self.decay_rate;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = if io.input_bool(Self::IN_LOOPING) {
                        EnvelopeStage::Attack
                    } else {
                        EnvelopeStage::Idle
                    };
                    io.raise(Self::EVENT_ON_COMPLETE, 1.0);
                }
                let out = 1.0 - (1.0 - self.level).powf(self.decay_curve);
                io.set_output(Self::OUT_ENVELOPE, out);
            }
        }
    }
}
