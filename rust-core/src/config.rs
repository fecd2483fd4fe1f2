//! Denoiser configuration
//!
//! Defaults reproduce the reference setup: 44.1 kHz, Q = 1e-5, R = 0.25,
//! a 512-pair preview ring downsampled by 4 and snapshotted every 128 samples.

use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_PROCESS_NOISE: f64 = 1e-5;
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.25;

pub const DEFAULT_PREVIEW_CAPACITY: usize = 512;
pub const DEFAULT_DOWNSAMPLE_FACTOR: usize = 4;
pub const DEFAULT_SNAPSHOT_CADENCE: u64 = 128;

/// Preview ring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Ring capacity C in sample pairs
    pub capacity: usize,

    /// Stride used when picking pairs for a snapshot
    pub downsample_factor: usize,

    /// A snapshot is taken every `cadence` recorded samples
    pub cadence: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_PREVIEW_CAPACITY,
            downsample_factor: DEFAULT_DOWNSAMPLE_FACTOR,
            cadence: DEFAULT_SNAPSHOT_CADENCE,
        }
    }
}

impl PreviewConfig {
    /// Snapshot length L = C / downsample factor
    pub fn snapshot_len(&self) -> usize {
        self.capacity / self.downsample_factor.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.downsample_factor == 0 {
            return Err(ConfigError::InvalidPreview("downsample factor must be non-zero".into()));
        }
        if self.capacity < self.downsample_factor {
            return Err(ConfigError::InvalidPreview(format!(
                "capacity {} is smaller than downsample factor {}",
                self.capacity, self.downsample_factor
            )));
        }
        if self.capacity % self.downsample_factor != 0 {
            return Err(ConfigError::InvalidPreview(format!(
                "capacity {} is not a multiple of downsample factor {}",
                self.capacity, self.downsample_factor
            )));
        }
        if self.cadence == 0 {
            return Err(ConfigError::InvalidPreview("snapshot cadence must be non-zero".into()));
        }
        Ok(())
    }
}

/// Top-level denoiser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiserConfig {
    /// Stream sample rate in Hz
    pub sample_rate: u32,

    /// Initial process noise variance Q
    pub process_noise: f64,

    /// Initial measurement noise variance R
    pub measurement_noise: f64,

    pub preview: PreviewConfig,
}

impl Default for DenoiserConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            preview: PreviewConfig::default(),
        }
    }
}

impl DenoiserConfig {
    /// Parse a JSON document; missing fields fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!("Loaded denoiser configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        validate_process_noise(self.process_noise)?;
        validate_measurement_noise(self.measurement_noise)?;
        self.preview.validate()
    }
}

/// Q must be finite and strictly positive
pub fn validate_process_noise(q: f64) -> Result<f64, ConfigError> {
    if q.is_finite() && q > 0.0 {
        Ok(q)
    } else {
        Err(ConfigError::NonPositiveProcessNoise(q))
    }
}

/// R must be finite and strictly positive; the gain divides by P + R
pub fn validate_measurement_noise(r: f64) -> Result<f64, ConfigError> {
    if r.is_finite() && r > 0.0 {
        Ok(r)
    } else {
        Err(ConfigError::NonPositiveMeasurementNoise(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DenoiserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preview.snapshot_len(), 128);
        assert_eq!(config.sample_rate, 44100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DenoiserConfig::from_json_str(
            r#"{ "measurement_noise": 0.5, "preview": { "cadence": 256 } }"#,
        )
        .unwrap();

        assert_eq!(config.measurement_noise, 0.5);
        assert_eq!(config.process_noise, DEFAULT_PROCESS_NOISE);
        assert_eq!(config.preview.cadence, 256);
        assert_eq!(config.preview.capacity, DEFAULT_PREVIEW_CAPACITY);
    }

    #[test]
    fn test_rejects_non_positive_noise() {
        let err = DenoiserConfig::from_json_str(r#"{ "measurement_noise": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveMeasurementNoise(_)));

        let err = DenoiserConfig::from_json_str(r#"{ "process_noise": -1e-5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveProcessNoise(_)));

        assert!(validate_measurement_noise(f64::NAN).is_err());
        assert!(validate_process_noise(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rejects_bad_preview_geometry() {
        let mut preview = PreviewConfig::default();
        preview.capacity = 2;
        assert!(preview.validate().is_err());

        preview.capacity = 510;
        assert!(preview.validate().is_err());

        preview.capacity = 512;
        preview.cadence = 0;
        assert!(preview.validate().is_err());

        preview.cadence = 128;
        preview.downsample_factor = 0;
        assert!(preview.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = DenoiserConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
