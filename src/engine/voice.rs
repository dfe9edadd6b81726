//! Sound Graph Voice
//!
//! Runs a prepared SoundGraph on the audio thread. The voice is moved into
//! the audio callback together with its graph, receives commands through a
//! [`VoiceHandle`] and reports back through the same handle. Bound
//! [`AtomicParam`]s are polled once per block.

use std::sync::Arc;

use crate::dsp::{AtomicParam, Identifier};

use super::channels::VoiceHandle;
use super::commands::{VoiceCommand, VoiceEvent};
use super::sound_graph::SoundGraph;

/// Errors raised while setting up a voice.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceError {
    #[error("sound graph is not prepared")]
    NotPlayable,
    #[error("sound graph has no input '{0}'")]
    UnknownInput(Identifier),
}

/// A playing instance of a sound graph.
pub struct SoundGraphVoice {
    graph: SoundGraph,
    handle: VoiceHandle,
    parameters: Vec<(Identifier, Arc<AtomicParam>)>,
    playing: bool,
    dropped_events: u64,
}

impl SoundGraphVoice {
    /// Wraps a prepared graph. The voice starts stopped.
    pub fn new(graph: SoundGraph, handle: VoiceHandle) -> Result<Self, VoiceError> {
        if !graph.is_playable() {
            return Err(VoiceError::NotPlayable);
        }
        Ok(Self {
            graph,
            handle,
            parameters: Vec::new(),
            playing: false,
            dropped_events: 0,
        })
    }

    /// Binds a shared parameter to a graph input.
    ///
    /// Changes are picked up at the start of the next block and ramped over
    /// the configured interpolation length. Must be called before the
    /// voice moves to the audio thread.
    pub fn bind_parameter(&mut self, id: Identifier, parameter: Arc<AtomicParam>) -> Result<(), VoiceError> {
        if !self.graph.graph_inputs().any(|input| input == id) {
            return Err(VoiceError::UnknownInput(id));
        }
        self.graph.set_input(id, parameter.load());
        self.parameters.push((id, parameter));
        Ok(())
    }

    pub fn graph(&self) -> &SoundGraph {
        &self.graph
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Voice events dropped because the event queue was full.
    pub fn dropped_event_count(&self) -> u64 {
        self.dropped_events
    }

    /// Renders one interleaved block.
    ///
    /// REAL-TIME SAFE: no allocations, no locks.
    pub fn process(&mut self, output: &mut [f32], channels: usize) {
        self.apply_commands();
        self.apply_parameters();

        if !self.playing || channels == 0 {
            output.fill(0.0);
            return;
        }

        let block_start = self.graph.current_frame();
        self.graph.process_block(output, channels);

        if let Some(finished_at) = self.forward_events() {
            // Silence everything after the frame that finished.
            let rendered = (finished_at + 1).saturating_sub(block_start) as usize;
            let tail = rendered.saturating_mul(channels).min(output.len());
            output[tail..].fill(0.0);
            self.playing = false;
            self.send(VoiceEvent::Finished);
        }
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.handle.recv_command() {
            match command {
                VoiceCommand::Play => {
                    self.reinit();
                    self.graph.send_input_event(SoundGraph::PLAY, 1.0);
                    self.playing = true;
                    self.send(VoiceEvent::Started);
                }
                VoiceCommand::Stop => {
                    if self.playing {
                        self.playing = false;
                        self.send(VoiceEvent::Stopped);
                    }
                }
                VoiceCommand::SetInput { id, value } => {
                    if !self.graph.set_input(id, value) {
                        self.send(VoiceEvent::UnknownEndpoint(id));
                    }
                }
                VoiceCommand::SetInputInterpolated { id, target } => {
                    if !self.graph.set_input_interpolated(id, target) {
                        self.send(VoiceEvent::UnknownEndpoint(id));
                    }
                }
                VoiceCommand::SendEvent { id, value } => {
                    if !self.graph.send_input_event(id, value) {
                        self.send(VoiceEvent::UnknownEndpoint(id));
                    }
                }
                VoiceCommand::Reset => self.reinit(),
            }
        }
    }

    fn reinit(&mut self) {
        // A voice only holds prepared graphs, reinit cannot fail.
        let _ = self.graph.reinit();
    }

    fn apply_parameters(&mut self) {
        for (id, parameter) in &self.parameters {
            if let Some(value) = parameter.take_if_changed() {
                self.graph.set_input_interpolated(*id, value);
            }
        }
    }

    /// Forwards graph output events. Returns the frame of `OnFinished`,
    /// if the graph raised it in this block.
    fn forward_events(&mut self) -> Option<u64> {
        let mut finished = None;
        for event in self.graph.drain_outgoing_events() {
            if event.endpoint == SoundGraph::ON_FINISHED {
                finished.get_or_insert(event.frame);
                continue;
            }
            let event = VoiceEvent::GraphEvent {
                frame: event.frame,
                endpoint: event.endpoint,
                value: event.value,
            };
            if self.handle.send_event(event).is_err() {
                self.dropped_events += 1;
            }
        }
        finished
    }

    fn send(&mut self, event: VoiceEvent) {
        if self.handle.send_event(event).is_err() {
            self.dropped_events += 1;
        }
    }
}
