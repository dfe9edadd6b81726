//! Audio Engine
//!
//! Manages the cpal audio stream and interfaces with system audio hardware.
//! The audio callback runs in a separate thread and must be real-time safe.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleRate, Stream, StreamConfig};

use super::voice::SoundGraphVoice;

/// Errors that can occur during audio engine operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AudioError {
    /// No audio output device was found.
    #[error("No audio output device found")]
    NoOutputDevice,
    /// Failed to get device configuration.
    #[error("Failed to get device configuration: {0}")]
    ConfigurationFailed(String),
    /// Failed to create the audio stream.
    #[error("Failed to create audio stream: {0}")]
    StreamCreationFailed(String),
    /// Failed to start/stop playback.
    #[error("Failed to control audio playback: {0}")]
    StreamPlaybackFailed(String),
    /// The output device cannot change while a voice is playing on it.
    #[error("Cannot change the output device while a stream is running")]
    DeviceInUse,
}

/// Information about an audio output device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the default output device.
    pub is_default: bool,
    /// Index in the device list (for selection).
    pub index: usize,
}

/// Plays a sound graph voice on a cpal output device.
pub struct AudioEngine {
    host: Host,
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl AudioEngine {
    /// Create a new AudioEngine using the default output device.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let config = Self::stream_config(&device)?;

        tracing::info!(
            "audio output: {} ({} Hz, {} channels)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels
        );

        Ok(Self {
            host,
            device,
            config,
            stream: None,
        })
    }

    fn stream_config(device: &Device) -> Result<StreamConfig, AudioError> {
        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::ConfigurationFailed(e.to_string()))?;

        Ok(StreamConfig {
            channels: supported_config.channels(),
            sample_rate: SampleRate(supported_config.sample_rate().0),
            buffer_size: cpal::BufferSize::Default,
        })
    }

    /// Get information about all available output devices.
    pub fn enumerate_devices(&self) -> Vec<DeviceInfo> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok());

        self.host
            .output_devices()
            .map(|devices| {
                devices
                    .enumerate()
                    .filter_map(|(index, device)| {
                        device.name().ok().map(|name| DeviceInfo {
                            is_default: Some(&name) == default_name.as_ref(),
                            name,
                            index,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the name of the currently selected device.
    pub fn current_device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Select a different output device by index, as listed by
    /// [`enumerate_devices`](Self::enumerate_devices).
    ///
    /// Only allowed before [`start`](Self::start). The voice is built at the
    /// sample rate of the device it will play on, so pick the device first.
    pub fn select_device(&mut self, index: usize) -> Result<(), AudioError> {
        if self.is_running() {
            return Err(AudioError::DeviceInUse);
        }

        let device = self
            .host
            .output_devices()
            .map_err(|e| AudioError::ConfigurationFailed(e.to_string()))?
            .nth(index)
            .ok_or(AudioError::NoOutputDevice)?;

        self.config = Self::stream_config(&device)?;
        self.device = device;
        tracing::info!(
            "audio output: {} ({} Hz, {} channels)",
            self.current_device_name(),
            self.config.sample_rate.0,
            self.config.channels
        );
        Ok(())
    }

    /// Get the sample rate in Hz. Graphs played here should be prepared
    /// at this rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start the audio stream, moving the voice into the audio callback.
    ///
    /// Control the voice through the [`ControlHandle`](super::ControlHandle)
    /// split off with its channels.
    pub fn start(&mut self, mut voice: SoundGraphVoice) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let graph_rate = voice.graph().sample_rate();
        if graph_rate != self.config.sample_rate.0 as f32 {
            tracing::warn!(
                "graph prepared at {} Hz, device runs at {} Hz",
                graph_rate,
                self.config.sample_rate.0
            );
        }

        let channels = self.config.channels as usize;
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // REAL-TIME SAFE: No allocations, no locks, no blocking
                    voice.process(data, channels);
                },
                move |err| {
                    tracing::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamCreationFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlaybackFailed(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Stop the audio stream and drop the voice.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.take() {
            stream
                .pause()
                .map_err(|e| AudioError::StreamPlaybackFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Check if the audio stream is currently running.
    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::NoOutputDevice;
        assert_eq!(err.to_string(), "No audio output device found");

        let err = AudioError::StreamCreationFailed("test error".to_string());
        assert!(err.to_string().contains("test error"));

        assert!(AudioError::DeviceInUse.to_string().contains("stream is running"));
    }

    // Stream tests need audio hardware and are left to the player binary.
}
