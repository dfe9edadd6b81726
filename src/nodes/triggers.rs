//! Trigger timing and counting nodes.
//!
//! Timers advance by one frame duration per tick, taken from the context
//! sample rate.

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext, ValueType};

/// Raises `Trigger` every `Period` seconds while running.
///
/// `Start` fires immediately and restarts the period; `Stop` halts the
/// timer and withdraws a trigger raised in the same tick.
pub struct RepeatTrigger {
    endpoints: Vec<EndpointDefinition>,
    playing: bool,
    elapsed: f32,
}

impl RepeatTrigger {
    const EVENT_START: usize = 0;
    const EVENT_STOP: usize = 1;
    const IN_PERIOD: usize = 0;
    const EVENT_TRIGGER: usize = 0;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("Start"),
                EndpointDefinition::input_event("Stop"),
                EndpointDefinition::input_with_default("Period", 0.2),
                EndpointDefinition::output_event("Trigger"),
            ],
            playing: false,
            elapsed: 0.0,
        }
    }
}

impl Default for RepeatTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for RepeatTrigger {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {
        self.playing = false;
        self.elapsed = 0.0;
    }

    fn on_event(&mut self, event: usize, _value: f32, io: &mut NodeIo, _context: &ProcessContext) {
        if event == Self::EVENT_START {
            self.playing = true;
            self.elapsed = 0.0;
            io.raise(Self::EVENT_TRIGGER, 1.0);
        } else if event == Self::EVENT_STOP {
            self.playing = false;
            self.elapsed = 0.0;
            io.cancel(Self::EVENT_TRIGGER);
        }
    }

    fn process(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        if !self.playing {
            return;
        }
        self.elapsed += context.frame_duration();
        if self.elapsed >= io.input_f32(Self::IN_PERIOD) {
            self.elapsed = 0.0;
            io.raise(Self::EVENT_TRIGGER, 1.0);
        }
    }
}

/// Counts incoming triggers.
///
/// `Value` is `StepSize * Count + StartValue`. When `ResetCount` is
/// positive the counter resets itself once `Count` reaches it. Several
/// triggers arriving in the same tick count once. `Reset` withdraws an
/// `OnTrigger` raised in the same tick.
pub struct TriggerCounter {
    endpoints: Vec<EndpointDefinition>,
    count: i32,
}

impl TriggerCounter {
    const EVENT_TRIGGER: usize = 0;
    const EVENT_RESET: usize = 1;

    const IN_START_VALUE: usize = 0;
    const IN_STEP_SIZE: usize = 1;
    const IN_RESET_COUNT: usize = 2;

    const EVENT_ON_TRIGGER: usize = 0;
    const EVENT_ON_RESET: usize = 1;
    const OUT_COUNT: usize = 0;
    const OUT_VALUE: usize = 1;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("Trigger"),
                EndpointDefinition::input_event("Reset"),
                EndpointDefinition::input_with_default("StartValue", 0.0),
                EndpointDefinition::input_with_default("StepSize", 1.0),
                EndpointDefinition::input("ResetCount", ValueType::Int),
                EndpointDefinition::output_event("OnTrigger"),
                EndpointDefinition::output_event("OnReset"),
                EndpointDefinition::output("Count", ValueType::Int),
                EndpointDefinition::output("Value", ValueType::Float),
            ],
            count: 0,
        }
    }

    fn publish(&self, io: &mut NodeIo) {
        let value = io.input_f32(Self::IN_STEP_SIZE) * self.count as f32
            + io.input_f32(Self::IN_START_VALUE);
        io.set_output(Self::OUT_COUNT, self.count);
        io.set_output(Self::OUT_VALUE, value);
    }

    fn reset(&mut self, io: &mut NodeIo) {
        self.count = 0;
        self.publish(io);
        io.raise(Self::EVENT_ON_RESET, 1.0);
    }
}

impl Default for TriggerCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for TriggerCounter {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        self.count = 0;
        self.publish(io);
    }

    fn on_event(&mut self, event: usize, _value: f32, io: &mut NodeIo, _context: &ProcessContext) {
        if event == Self::EVENT_TRIGGER {
            self.count = self.count.wrapping_add(1);
            self.publish(io);
            io.raise(Self::EVENT_ON_TRIGGER, self.count as f32);

            let reset_count = io.input_i32(Self::IN_RESET_COUNT);
            if reset_count > 0 && self.count >= reset_count {
                self.reset(io);
            }
        } else if event == Self::EVENT_RESET {
            io.cancel(Self::EVENT_ON_TRIGGER);
            self.reset(io);
        }
    }

    fn process(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {}
}

/// Raises `DelayedTrigger` once, `DelayTime` seconds after `Trigger`.
///
/// A new trigger restarts the delay. `Reset` abandons a pending trigger.
pub struct DelayedTrigger {
    endpoints: Vec<EndpointDefinition>,
    pending: bool,
    elapsed: f32,
}

impl DelayedTrigger {
    const EVENT_TRIGGER: usize = 0;
    const EVENT_RESET: usize = 1;
    const IN_DELAY_TIME: usize = 0;
    const EVENT_DELAYED: usize = 0;
    const EVENT_ON_RESET: usize = 1;

    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_event("Trigger"),
                EndpointDefinition::input_event("Reset"),
                EndpointDefinition::input_with_default("DelayTime", 1.0),
                EndpointDefinition::output_event("DelayedTrigger"),
                EndpointDefinition::output_event("OnReset"),
            ],
            pending: false,
            elapsed: 0.0,
        }
    }
}

impl Default for DelayedTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for DelayedTrigger {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {
        self.pending = false;
        self.elapsed = 0.0;
    }

    fn on_event(&mut self, event: usize, _value: f32, io: &mut NodeIo, _context: &ProcessContext) {
        if event == Self::EVENT_TRIGGER {
            self.pending = true;
            self.elapsed = 0.0;
        } else if event == Self::EVENT_RESET {
            self.pending = false;
            self.elapsed = 0.0;
            io.raise(Self::EVENT_ON_RESET, 1.0);
        }
    }

    fn process(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        if !self.pending {
            return;
        }
        self.elapsed += context.frame_duration();
        if self.elapsed >= io.input_f32(Self::IN_DELAY_TIME) {
            self.pending = false;
            self.elapsed = 0.0;
            io.raise(Self::EVENT_DELAYED, 1.0);
        }
    }
}
