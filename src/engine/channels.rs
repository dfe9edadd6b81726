//! Voice Channels
//!
//! Lock-free communication between the control thread and a voice on the
//! audio thread. Uses rtrb ring buffers for SPSC (single-producer,
//! single-consumer) queues.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::GraphConfig;

use super::commands::{VoiceCommand, VoiceEvent};

/// Holds both directions of communication channels.
/// Split into producer/consumer pairs for the two threads.
pub struct VoiceChannels {
    /// Send commands from control to voice.
    pub command_tx: Producer<VoiceCommand>,
    /// Receive commands in the voice.
    pub command_rx: Consumer<VoiceCommand>,
    /// Send events from voice to control.
    pub event_tx: Producer<VoiceEvent>,
    /// Receive events on the control thread.
    pub event_rx: Consumer<VoiceEvent>,
}

impl VoiceChannels {
    /// Create new voice channels with the specified buffer sizes.
    ///
    /// # Arguments
    /// * `command_capacity` - Number of commands the buffer can hold
    /// * `event_capacity` - Number of events the buffer can hold
    pub fn new(command_capacity: usize, event_capacity: usize) -> Self {
        let (command_tx, command_rx) = RingBuffer::new(command_capacity);
        let (event_tx, event_rx) = RingBuffer::new(event_capacity);

        Self {
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Create new channels sized from the config.
    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.command_queue_capacity, config.event_queue_capacity)
    }

    /// Split the channels into control-side and voice-side handles.
    pub fn split(self) -> (ControlHandle, VoiceHandle) {
        let control = ControlHandle {
            command_tx: self.command_tx,
            event_rx: self.event_rx,
        };
        let voice = VoiceHandle {
            command_rx: self.command_rx,
            event_tx: self.event_tx,
        };
        (control, voice)
    }
}

/// Control-side handle for talking to a voice.
pub struct ControlHandle {
    command_tx: Producer<VoiceCommand>,
    event_rx: Consumer<VoiceEvent>,
}

impl ControlHandle {
    /// Send a command to the voice.
    /// Returns Err(cmd) if the buffer is full. Never blocks.
    pub fn send_command(&mut self, cmd: VoiceCommand) -> Result<(), VoiceCommand> {
        self.command_tx
            .push(cmd)
            .map_err(|rtrb::PushError::Full(cmd)| cmd)
    }

    /// Receive an event from the voice, if one is pending.
    pub fn recv_event(&mut self) -> Option<VoiceEvent> {
        self.event_rx.pop().ok()
    }

    /// Drain all pending events from the voice.
    pub fn drain_events(&mut self) -> impl Iterator<Item = VoiceEvent> + '_ {
        std::iter::from_fn(|| self.recv_event())
    }

    /// Check how many commands can still be queued.
    pub fn command_slots_available(&self) -> usize {
        self.command_tx.slots()
    }
}

/// Voice-side handle. All methods are real-time safe.
pub struct VoiceHandle {
    command_rx: Consumer<VoiceCommand>,
    event_tx: Producer<VoiceEvent>,
}

impl VoiceHandle {
    /// Receive a command, if one is pending.
    pub fn recv_command(&mut self) -> Option<VoiceCommand> {
        self.command_rx.pop().ok()
    }

    /// Send an event to the control thread.
    /// Returns Err(event) if the buffer is full.
    pub fn send_event(&mut self, event: VoiceEvent) -> Result<(), VoiceEvent> {
        self.event_tx
            .push(event)
            .map_err(|rtrb::PushError::Full(event)| event)
    }

    /// Check how many commands are pending.
    pub fn commands_pending(&self) -> usize {
        self.command_rx.slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::Identifier;

    #[test]
    fn test_channels_sized_from_config() {
        let config = GraphConfig {
            command_queue_capacity: 16,
            event_queue_capacity: 8,
            ..GraphConfig::default()
        };
        let channels = VoiceChannels::from_config(&config);
        assert_eq!(channels.command_tx.slots(), 16);
        assert_eq!(channels.event_tx.slots(), 8);
    }

    #[test]
    fn test_command_send_receive() {
        let (mut control, mut voice) = VoiceChannels::new(8, 8).split();

        let command = VoiceCommand::SetInput {
            id: Identifier::new("Volume"),
            value: 0.5,
        };
        assert!(control.send_command(command).is_ok());
        assert_eq!(voice.commands_pending(), 1);
        assert_eq!(voice.recv_command(), Some(command));
        assert_eq!(voice.recv_command(), None);
    }

    #[test]
    fn test_event_send_receive() {
        let (mut control, mut voice) = VoiceChannels::new(8, 8).split();

        voice.send_event(VoiceEvent::Started).unwrap();
        voice.send_event(VoiceEvent::Finished).unwrap();

        let events: Vec<_> = control.drain_events().collect();
        assert_eq!(events, vec![VoiceEvent::Started, VoiceEvent::Finished]);
        assert!(control.recv_event().is_none());
    }

    #[test]
    fn test_buffer_full_returns_command() {
        let (mut control, _voice) = VoiceChannels::new(2, 2).split();

        assert!(control.send_command(VoiceCommand::Play).is_ok());
        assert!(control.send_command(VoiceCommand::Stop).is_ok());
        assert_eq!(control.command_slots_available(), 0);
        assert_eq!(control.send_command(VoiceCommand::Reset), Err(VoiceCommand::Reset));
    }

    #[test]
    fn test_handles_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ControlHandle>();
        assert_send::<VoiceHandle>();
    }
}
