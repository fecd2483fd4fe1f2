//! Error taxonomy for the denoising pipeline
//!
//! Configuration errors are rejected at the boundary and never reach the
//! realtime path. Stream faults are terminal for the stream instance that
//! raised them.

use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Invalid parameters supplied through configuration or the tuning interface
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Process noise (Q) must be finite and positive (got {0})")]
    NonPositiveProcessNoise(f64),

    #[error("Measurement noise (R) must be finite and positive (got {0})")]
    NonPositiveMeasurementNoise(f64),

    #[error("Parameter update carries neither Q nor R")]
    EmptyUpdate,

    #[error("Invalid preview configuration: {0}")]
    InvalidPreview(String),

    #[error("Sample rate must be non-zero (got {0} Hz)")]
    InvalidSampleRate(u32),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of posting a tuning update
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Rejected(#[from] ConfigError),

    #[error("Stream has stopped; update discarded")]
    Disconnected,
}

/// Failure of the audio acquisition layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamFault {
    #[error("No audio device found")]
    NoDevice,

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Device has no f32 configuration at {requested} Hz")]
    UnsupportedConfig { requested: u32 },

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// Terminal fault signal shared between the audio backend and the observer
///
/// Only the first fault is kept; later ones are logged and dropped.
#[derive(Clone, Default)]
pub struct FaultSignal {
    fault: Arc<Mutex<Option<StreamFault>>>,
}

impl FaultSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault. Returns false if an earlier fault was already raised.
    pub fn raise(&self, fault: StreamFault) -> bool {
        log::error!("Stream fault: {}", fault);

        if let Ok(mut slot) = self.fault.lock() {
            if slot.is_none() {
                *slot = Some(fault);
                return true;
            }
        }
        false
    }

    /// Check whether the stream has faulted
    pub fn is_raised(&self) -> bool {
        self.fault.lock().map(|slot| slot.is_some()).unwrap_or(true)
    }

    /// Get the raised fault, if any
    pub fn fault(&self) -> Option<StreamFault> {
        self.fault.lock().ok().and_then(|slot| slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fault_wins() {
        let signal = FaultSignal::new();
        assert!(!signal.is_raised());

        assert!(signal.raise(StreamFault::NoDevice));
        assert!(!signal.raise(StreamFault::Backend("late".into())));

        assert_eq!(signal.fault(), Some(StreamFault::NoDevice));
    }

    #[test]
    fn test_fault_visible_through_clone() {
        let signal = FaultSignal::new();
        let backend_side = signal.clone();

        backend_side.raise(StreamFault::Backend("device unplugged".into()));

        assert!(signal.is_raised());
        assert_eq!(
            signal.fault().map(|f| f.to_string()),
            Some("Audio backend error: device unplugged".to_string())
        );
    }
}
