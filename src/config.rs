//! Engine configuration.
//!
//! Every field has a default, so a config file only needs to name the
//! values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Runtime settings shared by the graph, the voice and the audio engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Sample rate the graph is evaluated at, in Hz.
    pub sample_rate: f32,
    /// Capacity of the outgoing graph event buffer. Events beyond this
    /// between two drains are dropped and counted.
    pub max_outgoing_events: usize,
    /// Length of the ramp used by interpolated input changes, in frames.
    pub interpolation_frames: u32,
    /// Capacity of the control -> audio command queue.
    pub command_queue_capacity: usize,
    /// Capacity of the audio -> control event queue.
    pub event_queue_capacity: usize,
}

impl GraphConfig {
    pub const DEFAULT_SAMPLE_RATE: f32 = 48000.0;
    pub const DEFAULT_MAX_OUTGOING_EVENTS: usize = 1024;
    /// 10 ms at 48 kHz.
    pub const DEFAULT_INTERPOLATION_FRAMES: u32 = 480;
    pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 1024;
    pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 256;

    /// Returns the default config at another sample rate.
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Parses a JSON config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json(&json)?)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            max_outgoing_events: Self::DEFAULT_MAX_OUTGOING_EVENTS,
            interpolation_frames: Self::DEFAULT_INTERPOLATION_FRAMES,
            command_queue_capacity: Self::DEFAULT_COMMAND_QUEUE_CAPACITY,
            event_queue_capacity: Self::DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

/// Failure to load a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
