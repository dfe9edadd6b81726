//! Tempo and pitch conversions.

use std::marker::PhantomData;

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext, ValueType};

use super::numeric::{finite_or_zero, NodeValue};

/// Frequency of MIDI note 69 (A4).
pub const A4_FREQUENCY: f32 = 440.0;
pub const A4_NOTE: f32 = 69.0;

/// Equal-tempered frequency of a (possibly fractional) MIDI note.
pub fn note_to_frequency(note: f32) -> f32 {
    finite_or_zero(A4_FREQUENCY * ((note - A4_NOTE) / 12.0).exp2())
}

/// Inverse of [`note_to_frequency`]. Non-positive frequencies map to 0.
pub fn frequency_to_note(frequency: f32) -> f32 {
    if frequency <= 0.0 {
        return 0.0;
    }
    finite_or_zero(A4_NOTE + 12.0 * (frequency / A4_FREQUENCY).log2())
}

/// Length of one beat in seconds.
pub struct BpmToSeconds {
    endpoints: Vec<EndpointDefinition>,
}

impl BpmToSeconds {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("BPM", 90.0),
                EndpointDefinition::output("Seconds", ValueType::Float),
            ],
        }
    }
}

impl Default for BpmToSeconds {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for BpmToSeconds {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        self.process(io, context);
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let bpm = io.input_f32(0);
        let seconds = if bpm > 0.0 { finite_or_zero(60.0 / bpm) } else { 0.0 };
        io.set_output(0, seconds);
    }
}

/// MIDI note number to frequency in Hz.
pub struct NoteToFrequency<T: NodeValue> {
    endpoints: Vec<EndpointDefinition>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NodeValue> NoteToFrequency<T> {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("MIDINote", T::from_f32(60.0).into_value()),
                EndpointDefinition::output("Frequency", ValueType::Float),
            ],
            _marker: PhantomData,
        }
    }
}

impl<T: NodeValue> Default for NoteToFrequency<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeValue> NodeProcessor for NoteToFrequency<T> {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        self.process(io, context);
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        let note = T::read(io.input(0)).to_f32();
        io.set_output(0, note_to_frequency(note));
    }
}

/// Frequency in Hz to a fractional MIDI note number.
pub struct FrequencyToNote {
    endpoints: Vec<EndpointDefinition>,
}

impl FrequencyToNote {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                EndpointDefinition::input_with_default("Frequency", A4_FREQUENCY),
                EndpointDefinition::output("MIDINote", ValueType::Float),
            ],
        }
    }
}

impl Default for FrequencyToNote {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProcessor for FrequencyToNote {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    fn init(&mut self, io: &mut NodeIo, context: &ProcessContext) {
        self.process(io, context);
    }

    fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
        io.set_output(0, frequency_to_note(io.input_f32(0)));
    }
}
