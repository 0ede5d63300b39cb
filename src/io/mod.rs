//! Audio device boundary.
//!
//! The dispatcher itself never touches a device; this is the one adapter that
//! does. The dispatcher moves onto the audio thread inside the cpal callback,
//! so a control thread talks to it through a voice lane (see
//! [`crate::synth::message`]) built before opening the stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::error::{EngineError, Result};
use crate::synth::dispatcher::Dispatcher;

pub struct OutputStream {
    stream: cpal::Stream,
    sample_rate: f32,
}

impl OutputStream {
    /// Open the default output device as an f32 interleaved stereo stream.
    ///
    /// `build` receives the device sample rate and returns the dispatcher
    /// that will render every callback; it is consumed by the audio thread.
    pub fn open(build: impl FnOnce(f32) -> Dispatcher) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::Device("no output device available".into()))?;
        let default = device
            .default_output_config()
            .map_err(|e| EngineError::Device(format!("no default output config: {e}")))?;

        let sample_rate = default.sample_rate().0;
        let config = StreamConfig {
            channels: 2,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut dispatcher = build(sample_rate as f32);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    dispatcher.render_block(data);
                },
                |err| {
                    tracing::error!(error = %err, "output stream error");
                },
                None,
            )
            .map_err(|e| EngineError::Device(format!("failed to build stream: {e}")))?;
        stream
            .play()
            .map_err(|e| EngineError::Device(format!("failed to start stream: {e}")))?;

        tracing::info!(sample_rate, "output stream started");
        Ok(Self {
            stream,
            sample_rate: sample_rate as f32,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn pause(&self) -> Result<()> {
        self.stream
            .pause()
            .map_err(|e| EngineError::Device(format!("failed to pause stream: {e}")))
    }

    pub fn resume(&self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| EngineError::Device(format!("failed to resume stream: {e}")))
    }
}
