//! Python bindings for the Kalman filter

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use numpy::{PyArray1, PyReadonlyArray1};
use crate::error::ConfigError;
use crate::filters::KalmanFilter;

pub(crate) fn config_error(e: ConfigError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn as_slice<'a>(array: &'a PyReadonlyArray1<f64>) -> PyResult<&'a [f64]> {
    array
        .as_slice()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Scalar Kalman filter exposed to Python
#[pyclass(name = "KalmanFilter")]
pub struct PyKalmanFilter {
    filter: KalmanFilter,
}

#[pymethods]
impl PyKalmanFilter {
    /// Create a new filter
    ///
    /// Args:
    ///     q: Process noise variance (default: 1e-5)
    ///     r: Measurement noise variance (default: 0.25)
    #[new]
    #[pyo3(signature = (q=1e-5, r=0.25))]
    fn new(q: f64, r: f64) -> PyResult<Self> {
        let filter = KalmanFilter::new(q, r).map_err(config_error)?;
        Ok(Self { filter })
    }

    /// Filter a single sample
    fn step(&mut self, measurement: f64) -> f64 {
        self.filter.step(measurement)
    }

    /// Filter a block of samples, carrying state across calls
    ///
    /// Args:
    ///     input_signal: Input samples as numpy array
    ///
    /// Returns:
    ///     Filtered output as numpy array
    fn process_block<'py>(
        &mut self,
        py: Python<'py>,
        input_signal: PyReadonlyArray1<f64>,
    ) -> PyResult<&'py PyArray1<f64>> {
        let input = as_slice(&input_signal)?;
        let output = self.filter.process_block(input);

        Ok(PyArray1::from_vec(py, output))
    }

    /// Denoise a whole signal with fresh filter state
    #[staticmethod]
    #[pyo3(signature = (signal, q=1e-5, r=0.25))]
    fn denoise<'py>(
        py: Python<'py>,
        signal: PyReadonlyArray1<f64>,
        q: f64,
        r: f64,
    ) -> PyResult<&'py PyArray1<f64>> {
        let input = as_slice(&signal)?;
        let output = KalmanFilter::denoise_signal(input, q, r).map_err(config_error)?;

        Ok(PyArray1::from_vec(py, output))
    }

    /// Reset covariance and estimate (Q and R are kept)
    fn reset(&mut self) {
        self.filter.reset();
    }

    fn set_q(&mut self, q: f64) -> PyResult<()> {
        self.filter.set_process_noise(q).map_err(config_error)
    }

    fn set_r(&mut self, r: f64) -> PyResult<()> {
        self.filter.set_measurement_noise(r).map_err(config_error)
    }

    /// Current state as (Q, R, P, x)
    fn state(&self) -> (f64, f64, f64, f64) {
        let s = self.filter.state();
        (
            s.process_noise,
            s.measurement_noise,
            s.estimate_covariance,
            s.prior_estimate,
        )
    }
}
