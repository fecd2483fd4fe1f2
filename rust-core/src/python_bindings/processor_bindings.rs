//! Python bindings for the live denoising session
//!
//! Python is the observer context: it tunes parameters and polls previews at
//! its own pace while filtering runs in the audio callback.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use numpy::PyArray1;
use crate::audio::LiveSession;
use crate::channel::ParameterUpdate;
use crate::config::DenoiserConfig;
use crate::error::UpdateError;
use super::filter_bindings::config_error;

fn update_error(e: UpdateError) -> PyErr {
    match e {
        UpdateError::Rejected(e) => config_error(e),
        e @ UpdateError::Disconnected => PyRuntimeError::new_err(e.to_string()),
    }
}

/// Live microphone denoiser exposed to Python
#[pyclass(name = "Denoiser", unsendable)]
pub struct PyDenoiser {
    config: DenoiserConfig,
    session: Option<LiveSession>,
}

#[pymethods]
impl PyDenoiser {
    /// Create a denoiser (not started)
    ///
    /// Args:
    ///     q: Initial process noise variance
    ///     r: Initial measurement noise variance
    ///     sample_rate: Stream sample rate in Hz
    #[new]
    #[pyo3(signature = (q=1e-5, r=0.25, sample_rate=44100))]
    fn new(q: f64, r: f64, sample_rate: u32) -> PyResult<Self> {
        let config = DenoiserConfig {
            sample_rate,
            process_noise: q,
            measurement_noise: r,
            ..DenoiserConfig::default()
        };
        config.validate().map_err(config_error)?;

        Ok(Self {
            config,
            session: None,
        })
    }

    /// Create a denoiser from a JSON configuration document
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = DenoiserConfig::from_json_str(json).map_err(config_error)?;
        Ok(Self {
            config,
            session: None,
        })
    }

    /// Start live processing (WARNING: use headphones!)
    ///
    /// Returns:
    ///     Input device name
    fn start(&mut self) -> PyResult<String> {
        self.stop();

        let session = LiveSession::start(&self.config)
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        let name = session
            .input_device()
            .map(|info| info.name.clone())
            .unwrap_or_default();

        self.session = Some(session);
        Ok(name)
    }

    /// Stop live processing
    fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    fn is_running(&self) -> bool {
        self.session.as_ref().map_or(false, |s| s.is_running())
    }

    /// Retune the filter
    ///
    /// Args:
    ///     q: New process noise variance
    ///     r: New measurement noise variance
    ///     q_control: Logarithmic Q control position (Q = 10^q_control),
    ///                ignored when `q` is given
    #[pyo3(signature = (q=None, r=None, q_control=None))]
    fn update_params(&mut self, q: Option<f64>, r: Option<f64>, q_control: Option<f64>) -> PyResult<()> {
        let mut update = ParameterUpdate::from_controls(q_control, r);
        if q.is_some() {
            update.process_noise = q;
        }

        match self.session.as_mut() {
            Some(session) if session.is_running() => {
                session.post_update(update).map_err(update_error)?
            }
            _ => update.validate().map_err(config_error)?,
        }

        // Keep the configuration in step so a restart uses the latest values
        if let Some(q) = update.process_noise {
            self.config.process_noise = q;
        }
        if let Some(r) = update.measurement_noise {
            self.config.measurement_noise = r;
        }
        Ok(())
    }

    /// Get the latest preview snapshot
    ///
    /// Returns:
    ///     Dictionary with keys 'original', 'filtered', 'sample_count',
    ///     or None if no new snapshot was published
    fn get_preview(&mut self, py: Python<'_>) -> PyResult<Option<PyObject>> {
        let snapshot = match self.session.as_mut().and_then(|s| s.take_snapshot()) {
            Some(snapshot) => snapshot,
            None => return Ok(None),
        };

        let dict = PyDict::new(py);
        dict.set_item("original", PyArray1::from_vec(py, snapshot.original))?;
        dict.set_item("filtered", PyArray1::from_vec(py, snapshot.filtered))?;
        dict.set_item("sample_count", snapshot.sample_count)?;

        Ok(Some(dict.into()))
    }

    /// Parameters currently applied by the audio thread as (Q, R)
    fn parameters(&self) -> (f64, f64) {
        match self.session.as_ref() {
            Some(session) => {
                let p = session.current_parameters();
                (p.process_noise, p.measurement_noise)
            }
            None => (self.config.process_noise, self.config.measurement_noise),
        }
    }

    /// Terminal stream fault message, if the audio backend failed
    fn fault(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.fault())
            .map(|f| f.to_string())
    }

    /// List available input devices
    #[staticmethod]
    fn list_devices() -> PyResult<Vec<String>> {
        LiveSession::list_devices().map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}
