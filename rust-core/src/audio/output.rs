//! Playback of the filtered stream using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream};
use super::buffer::AudioConsumer;
use super::input::{pick_f32_config, AudioDeviceInfo};
use crate::error::{FaultSignal, StreamFault};

/// Audio output stream
pub struct AudioOutput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioOutput {
    /// Open the default output device at `sample_rate`
    pub fn from_default_device(
        sample_rate: u32,
        consumer: AudioConsumer,
        faults: FaultSignal,
    ) -> Result<Self, StreamFault> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(StreamFault::NoDevice)?;

        Self::from_device(device, sample_rate, consumer, faults)
    }

    /// Open a specific output device
    pub fn from_device(
        device: Device,
        sample_rate: u32,
        mut consumer: AudioConsumer,
        faults: FaultSignal,
    ) -> Result<Self, StreamFault> {
        let name = device
            .name()
            .map_err(|e| StreamFault::DeviceName(e.to_string()))?;

        let ranges = device
            .supported_output_configs()
            .map_err(|e| StreamFault::BuildStream(e.to_string()))?;
        let config = pick_f32_config(ranges, sample_rate)?;

        let channels = config.channels();
        let device_info = AudioDeviceInfo {
            name,
            sample_rate,
            channels,
        };
        log::info!(
            "Opening output device '{}' at {} Hz, {} channel(s)",
            device_info.name, sample_rate, channels
        );

        let stream_config = config.config();
        let channels = channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    consumer.fill_interleaved(data, channels);
                },
                move |err| {
                    faults.raise(StreamFault::Backend(err.to_string()));
                },
                None,
            )
            .map_err(|e| StreamFault::BuildStream(e.to_string()))?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start playing audio
    pub fn start(&self) -> Result<(), StreamFault> {
        self.stream
            .play()
            .map_err(|e| StreamFault::PlayStream(e.to_string()))
    }

    /// Pause audio playback
    pub fn pause(&self) -> Result<(), StreamFault> {
        self.stream
            .pause()
            .map_err(|e| StreamFault::PlayStream(e.to_string()))
    }

    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}
