//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod filter_bindings;
mod processor_bindings;

/// Python module definition
#[pymodule]
fn kalman_denoise(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<filter_bindings::PyKalmanFilter>()?;
    m.add_class::<processor_bindings::PyDenoiser>()?;

    Ok(())
}
