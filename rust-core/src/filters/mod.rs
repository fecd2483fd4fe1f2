//! Recursive denoising filters

pub mod kalman;

pub use kalman::{FilterState, KalmanFilter};
