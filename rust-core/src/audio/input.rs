//! Audio capture using cpal
//!
//! The input callback is the realtime context: it runs the denoiser on every
//! captured frame and queues the filtered samples for playback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, SupportedStreamConfig, SupportedStreamConfigRange};
use super::buffer::AudioProducer;
use super::processor::RealtimeDenoiser;
use crate::error::{FaultSignal, StreamFault};

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio input stream driving the denoiser
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioInput {
    /// Open the default input device at `sample_rate`
    pub fn from_default_device(
        sample_rate: u32,
        denoiser: RealtimeDenoiser,
        producer: AudioProducer,
        faults: FaultSignal,
    ) -> Result<Self, StreamFault> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(StreamFault::NoDevice)?;

        Self::from_device(device, sample_rate, denoiser, producer, faults)
    }

    /// Open a specific input device
    ///
    /// `denoiser` and `producer` are moved into the callback and owned by the
    /// audio thread from here on.
    pub fn from_device(
        device: Device,
        sample_rate: u32,
        mut denoiser: RealtimeDenoiser,
        mut producer: AudioProducer,
        faults: FaultSignal,
    ) -> Result<Self, StreamFault> {
        let name = device
            .name()
            .map_err(|e| StreamFault::DeviceName(e.to_string()))?;

        let ranges = device
            .supported_input_configs()
            .map_err(|e| StreamFault::BuildStream(e.to_string()))?;
        let config = pick_f32_config(ranges, sample_rate)?;

        let channels = config.channels();
        let device_info = AudioDeviceInfo {
            name,
            sample_rate,
            channels,
        };
        log::info!(
            "Opening input device '{}' at {} Hz, {} channel(s)",
            device_info.name, sample_rate, channels
        );

        let stream_config = config.config();
        let channels = channels as usize;

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    denoiser.process_interleaved_f32(data, channels, |filtered| {
                        producer.push_sample(filtered);
                    });
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

    /// Start capturing audio
    pub fn start(&self) -> Result<(), StreamFault> {
        self.stream
            .play()
            .map_err(|e| StreamFault::PlayStream(e.to_string()))
    }

    /// Pause audio capture
    pub fn pause(&self) -> Result<(), StreamFault> {
        self.stream
            .pause()
            .map_err(|e| StreamFault::PlayStream(e.to_string()))
    }

    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}

/// Pick an f32 configuration that covers `sample_rate`
pub(crate) fn pick_f32_config<I>(ranges: I, sample_rate: u32) -> Result<SupportedStreamConfig, StreamFault>
where
    I: Iterator<Item = SupportedStreamConfigRange>,
{
    ranges
        .filter(|range| range.sample_format() == SampleFormat::F32)
        .filter(|range| {
            range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
        })
        // Prefer the fewest channels; only channel 0 is filtered
        .min_by_key(|range| range.channels())
        .map(|range| range.with_sample_rate(SampleRate(sample_rate)))
        .ok_or(StreamFault::UnsupportedConfig {
            requested: sample_rate,
        })
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, StreamFault> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .input_devices()
        .map_err(|e| StreamFault::DeviceName(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_input_config() {
                devices.push(AudioDeviceInfo {
                    name,
                    sample_rate: config.sample_rate().0,
                    channels: config.channels(),
                });
            }
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SupportedBufferSize;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn test_pick_prefers_f32_mono() {
        let ranges = vec![
            range(2, 8000, 96000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::I16),
            range(1, 8000, 48000, SampleFormat::F32),
        ];

        let config = pick_f32_config(ranges.into_iter(), 44100).unwrap();
        assert_eq!(config.channels(), 1);
        assert_eq!(config.sample_rate().0, 44100);
        assert_eq!(config.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn test_pick_rejects_uncovered_rate() {
        let ranges = vec![range(2, 48000, 48000, SampleFormat::F32)];
        assert_eq!(
            pick_f32_config(ranges.into_iter(), 44100).unwrap_err(),
            StreamFault::UnsupportedConfig { requested: 44100 }
        );
    }

    #[test]
    fn test_list_devices() {
        // Just ensure it doesn't crash
        let _ = list_input_devices();
    }
}
