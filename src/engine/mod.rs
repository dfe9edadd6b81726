//! Engine module
//!
//! The sound graph evaluator and everything needed to play it: the voice
//! that runs a graph on the audio thread, its command channels and the
//! cpal output stream.

pub mod audio_engine;
pub mod channels;
pub mod commands;
pub mod sound_graph;
pub mod validation;
pub mod voice;

pub use audio_engine::{AudioEngine, AudioError, DeviceInfo};
pub use channels::{ControlHandle, VoiceChannels, VoiceHandle};
pub use commands::{VoiceCommand, VoiceEvent};
pub use sound_graph::{OutgoingEvent, SoundGraph, INPUT_NODE_ID, OUTPUT_NODE_ID};
pub use validation::{validate_connection, ConnectionKind, GraphError};
pub use voice::{SoundGraphVoice, VoiceError};
