//! Processing context for nodes.
//!
//! Provides runtime information that nodes need during evaluation.

/// Context provided to nodes on every tick.
///
/// One tick renders one sample frame, so time-based nodes measure their
/// durations in frames derived from `sample_rate`.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// The audio sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: f32,
    /// Index of the frame being rendered, counted from the last (re)init.
    pub frame: u64,
}

impl ProcessContext {
    /// Creates a new process context at frame 0.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frame: 0,
        }
    }

    /// Returns a copy of this context positioned at `frame`.
    pub fn at_frame(&self, frame: u64) -> Self {
        Self { frame, ..*self }
    }

    /// Returns the duration of one frame in seconds.
    pub fn frame_duration(&self) -> f32 {
        if self.sample_rate > 0.0 {
            1.0 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Converts a duration in seconds to frames.
    pub fn seconds_to_frames(&self, seconds: f32) -> u64 {
        (seconds.max(0.0) * self.sample_rate).round() as u64
    }

    /// Converts a frame count to seconds.
    pub fn frames_to_seconds(&self, frames: u64) -> f32 {
        frames as f32 * self.frame_duration()
    }

    /// Converts a frequency in Hz to radians per frame.
    ///
    /// Useful for oscillator phase increments.
    pub fn frequency_to_radians(&self, frequency: f32) -> f32 {
        std::f32::consts::TAU * frequency * self.frame_duration()
    }

    /// Returns the Nyquist frequency (half the sample rate).
    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
