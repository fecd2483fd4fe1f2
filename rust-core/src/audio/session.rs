//! Live denoising session: microphone → Kalman filter → speakers
//!
//! Owns the cpal streams for one stream instance. Stopping is abrupt: both
//! streams are paused and dropped, and the realtime state goes with them.

use super::buffer::AudioRingBuffer;
use super::input::{list_input_devices, AudioDeviceInfo, AudioInput};
use super::output::AudioOutput;
use super::processor::{denoiser_pair, FilterParameters, ObserverHandle};
use crate::channel::ParameterUpdate;
use crate::config::DenoiserConfig;
use crate::error::{ConfigError, FaultSignal, StreamFault, UpdateError};
use crate::preview::PreviewSnapshot;
use thiserror::Error;

/// Playback queue length in seconds of audio
const PLAYBACK_BUFFER_SECONDS: f64 = 0.1;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamFault),
}

/// Running live session
pub struct LiveSession {
    input: Option<AudioInput>,
    output: Option<AudioOutput>,
    observer: ObserverHandle,
    faults: FaultSignal,
}

impl LiveSession {
    /// Open default devices and start filtering
    ///
    /// WARNING: filtered audio is played back immediately. Use headphones to
    /// avoid a feedback loop.
    pub fn start(config: &DenoiserConfig) -> Result<Self, SessionError> {
        let (denoiser, observer) = denoiser_pair(config)?;
        let faults = FaultSignal::new();

        let capacity = ((config.sample_rate as f64 * PLAYBACK_BUFFER_SECONDS) as usize).max(1);
        let (producer, consumer) = AudioRingBuffer::new(capacity).split();

        let output = AudioOutput::from_default_device(config.sample_rate, consumer, faults.clone())?;
        let input = AudioInput::from_default_device(
            config.sample_rate,
            denoiser,
            producer,
            faults.clone(),
        )?;

        output.start()?;
        input.start()?;

        log::info!(
            "Live denoising started on '{}' (Q = {:e}, R = {})",
            input.device_info().name,
            config.process_noise,
            config.measurement_noise
        );

        Ok(Self {
            input: Some(input),
            output: Some(output),
            observer,
            faults,
        })
    }

    /// Tear the stream down; no further samples are processed
    pub fn stop(&mut self) {
        let was_running = self.input.is_some();

        if let Some(input) = self.input.take() {
            let _ = input.pause();
        }
        if let Some(output) = self.output.take() {
            let _ = output.pause();
        }

        if was_running {
            log::info!("Live denoising stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.input.is_some()
    }

    /// Post a tuning update to the running filter
    ///
    /// After `stop` every update fails with `UpdateError::Disconnected`.
    pub fn post_update(&mut self, update: ParameterUpdate) -> Result<(), UpdateError> {
        if !self.is_running() {
            update.validate()?;
            return Err(UpdateError::Disconnected);
        }
        self.observer.post_update(update)
    }

    /// Freshest preview snapshot, if a new one arrived; None after `stop`
    pub fn take_snapshot(&mut self) -> Option<PreviewSnapshot> {
        if !self.is_running() {
            return None;
        }
        self.observer.take_snapshot()
    }

    pub fn current_parameters(&self) -> FilterParameters {
        self.observer.current_parameters()
    }

    /// Terminal fault raised by the audio backend, if any
    pub fn fault(&self) -> Option<StreamFault> {
        self.faults.fault()
    }

    pub fn input_device(&self) -> Option<&AudioDeviceInfo> {
        self.input.as_ref().map(|input| input.device_info())
    }

    pub fn output_device(&self) -> Option<&AudioDeviceInfo> {
        self.output.as_ref().map(|output| output.device_info())
    }

    /// List input device names
    pub fn list_devices() -> Result<Vec<String>, StreamFault> {
        list_input_devices().map(|devices| devices.into_iter().map(|d| d.name).collect())
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop();
    }
}
