//! Kalman Denoise - Real-time Adaptive Audio Denoising Core
//!
//! Scalar Kalman filter running sample-by-sample in the audio callback, with a
//! downsampled raw/filtered preview and lock-free parameter tuning for a
//! non-realtime observer.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![allow(non_local_definitions)]

pub mod audio;
pub mod channel;
pub mod config;
pub mod error;
pub mod filters;
pub mod preview;
#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{denoiser_pair, ObserverHandle, RealtimeDenoiser};
pub use channel::ParameterUpdate;
pub use config::{DenoiserConfig, PreviewConfig};
pub use error::{ConfigError, StreamFault, UpdateError};
pub use filters::{FilterState, KalmanFilter};
pub use preview::{PreviewSnapshot, SamplePair};
