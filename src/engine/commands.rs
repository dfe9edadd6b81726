//! Voice Commands and Events
//!
//! Defines the messages that flow between the control thread and a voice
//! rendering on the audio thread. Both enums are `Copy` so sending and
//! dropping them never touches the allocator.

use crate::dsp::Identifier;

/// Commands sent from the control thread to a voice.
/// These are drained at the start of every audio block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
    /// Reinitialize the graph and send it the `Play` event.
    Play,

    /// Stop rendering. The voice outputs silence until the next `Play`.
    Stop,

    /// Set a graph input immediately.
    SetInput {
        /// Graph input endpoint.
        id: Identifier,
        /// New value, converted to the input's type.
        value: f32,
    },

    /// Ramp a float graph input to a new value.
    SetInputInterpolated {
        /// Graph input endpoint.
        id: Identifier,
        /// Value reached at the end of the ramp.
        target: f32,
    },

    /// Send a graph input event.
    SendEvent {
        /// Graph input event endpoint.
        id: Identifier,
        /// Event argument.
        value: f32,
    },

    /// Reinitialize the graph without starting it.
    Reset,
}

/// Events sent from a voice back to the control thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceEvent {
    /// Rendering started after a `Play` command.
    Started,

    /// Rendering stopped after a `Stop` command.
    Stopped,

    /// The graph raised `OnFinished` and the voice stopped itself.
    Finished,

    /// A graph output event other than `OnFinished`.
    GraphEvent {
        /// Frame at which the event reached the graph output.
        frame: u64,
        /// Graph output event endpoint.
        endpoint: Identifier,
        /// Event argument.
        value: f32,
    },

    /// A command named an endpoint the graph does not have.
    UnknownEndpoint(Identifier),
}
