//! Scalar Kalman filter for real-time audio denoising
//!
//! Random-walk-plus-noise model: the true signal is assumed constant between
//! samples apart from process noise Q, and each sample is a measurement
//! corrupted by noise R. One predict/update cycle runs per input sample.

use crate::config::{validate_measurement_noise, validate_process_noise};
use crate::error::ConfigError;

/// Covariance restored on (re)initialization
pub const INITIAL_COVARIANCE: f64 = 1.0;

/// Estimate restored on (re)initialization
pub const INITIAL_ESTIMATE: f64 = 0.0;

/// Complete filter state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// Process noise variance Q
    pub process_noise: f64,

    /// Measurement noise variance R
    pub measurement_noise: f64,

    /// A-posteriori error covariance P (never negative while R > 0)
    pub estimate_covariance: f64,

    /// Previous filtered output x
    pub prior_estimate: f64,
}

/// Real-time scalar Kalman filter
///
/// Q and R are validated when set, so `step` has no failure path.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    state: FilterState,
}

impl KalmanFilter {
    /// Create a filter with initial parameters
    ///
    /// # Arguments
    /// * `process_noise` - Q, must be finite and positive
    /// * `measurement_noise` - R, must be finite and positive
    pub fn new(process_noise: f64, measurement_noise: f64) -> Result<Self, ConfigError> {
        let mut filter = Self {
            state: FilterState {
                process_noise: 0.0,
                measurement_noise: 0.0,
                estimate_covariance: INITIAL_COVARIANCE,
                prior_estimate: INITIAL_ESTIMATE,
            },
        };
        filter.initialize(process_noise, measurement_noise)?;
        Ok(filter)
    }

    /// Reset to `{Q: q, R: r, P: 1.0, x: 0.0}`
    ///
    /// On error the filter is left untouched.
    pub fn initialize(&mut self, process_noise: f64, measurement_noise: f64) -> Result<(), ConfigError> {
        let q = validate_process_noise(process_noise)?;
        let r = validate_measurement_noise(measurement_noise)?;

        self.state = FilterState {
            process_noise: q,
            measurement_noise: r,
            estimate_covariance: INITIAL_COVARIANCE,
            prior_estimate: INITIAL_ESTIMATE,
        };
        Ok(())
    }

    /// Filter one measurement
    ///
    /// # Arguments
    /// * `measurement` - Raw input sample
    ///
    /// # Returns
    /// Filtered estimate x[n]
    #[inline]
    pub fn step(&mut self, measurement: f64) -> f64 {
        let s = &mut self.state;

        // Predict: identity state transition
        let x_pred = s.prior_estimate;
        let p_pred = s.estimate_covariance + s.process_noise;

        // Gain in [0, 1] for R > 0
        let gain = p_pred / (p_pred + s.measurement_noise);

        // Update
        let x_cur = x_pred + gain * (measurement - x_pred);
        s.estimate_covariance = (1.0 - gain) * p_pred;
        s.prior_estimate = x_cur;

        x_cur
    }

    /// Process a block of samples
    pub fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.step(x)).collect()
    }

    /// Process a block in-place
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.step(*sample);
        }
    }

    /// Denoise a complete signal with a freshly initialized filter
    ///
    /// Offline counterpart of the streaming path; every sample goes through
    /// the same `step` the realtime context uses.
    pub fn denoise_signal(
        signal: &[f64],
        process_noise: f64,
        measurement_noise: f64,
    ) -> Result<Vec<f64>, ConfigError> {
        let mut filter = Self::new(process_noise, measurement_noise)?;
        Ok(filter.process_block(signal))
    }

    /// Set process noise Q. P and x are left as they are so retuning
    /// does not cause a reset transient.
    pub fn set_process_noise(&mut self, q: f64) -> Result<(), ConfigError> {
        self.state.process_noise = validate_process_noise(q)?;
        Ok(())
    }

    /// Set measurement noise R without touching P or x
    pub fn set_measurement_noise(&mut self, r: f64) -> Result<(), ConfigError> {
        self.state.measurement_noise = validate_measurement_noise(r)?;
        Ok(())
    }

    /// Restore P = 1.0 and x = 0.0, keeping Q and R
    pub fn reset(&mut self) {
        self.state.estimate_covariance = INITIAL_COVARIANCE;
        self.state.prior_estimate = INITIAL_ESTIMATE;
    }

    /// Get a copy of the current state
    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn process_noise(&self) -> f64 {
        self.state.process_noise
    }

    pub fn measurement_noise(&self) -> f64 {
        self.state.measurement_noise
    }

    pub fn estimate_covariance(&self) -> f64 {
        self.state.estimate_covariance
    }

    pub fn estimate(&self) -> f64 {
        self.state.prior_estimate
    }
}
