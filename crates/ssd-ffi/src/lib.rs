// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — PyO3 FFI Bindings
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the structural-pressure kernel.
//!
//! The agent, social and memory layers that drive the kernel live in
//! Python; they hand in pressure lists and read flow, energy, inertia
//! and leap lists back.
//!
//! - Every `SsdError` becomes a `ValueError`.
//! - Configuration is validated before it is stored.
//!
//! Install: `pip install -e crates/ssd-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from ssd_kernel import SsdConfig, SsdEngine
//!
//! cfg = SsdConfig.uniform(4)
//! engine = SsdEngine(cfg)
//! out = engine.tick([5.0, 0.0, -2.0, 1.0])
//! out["leap"]  # [False, False, False, False]
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use ssd_core::{
    acceleration_available, active_backend, compute_step, detect_leap, energy_update,
    inertia_update, log_alignment, ohm_flow, BackendKind, GlobalParams, LayerParams, LayerRates,
    LayerState, SsdConfig, SsdEngine, SsdError, StepOutput,
};

fn to_py_err(e: SsdError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn output_to_dict(py: Python<'_>, out: &StepOutput) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("flow", out.flow.clone())?;
    dict.set_item("energy", out.energy.clone())?;
    dict.set_item("inertia", out.inertia.clone())?;
    dict.set_item("leap", out.leap.clone())?;
    Ok(dict.into())
}

// ─── PySsdConfig ────────────────────────────────────────────────────

/// Python-visible engine configuration.
#[pyclass(name = "SsdConfig")]
#[derive(Clone)]
struct PySsdConfig {
    inner: SsdConfig,
}

#[pymethods]
impl PySsdConfig {
    #[new]
    #[pyo3(signature = (
        num_layers,
        gamma,
        beta,
        eta,
        lambda_,
        kappa_min,
        theta,
        alpha_t = 0.1,
        log_base = 2.0,
        g0 = 0.1,
        g = 0.05,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_layers: usize,
        gamma: Vec<f64>,
        beta: Vec<f64>,
        eta: Vec<f64>,
        lambda_: Vec<f64>,
        kappa_min: Vec<f64>,
        theta: Vec<f64>,
        alpha_t: f64,
        log_base: f64,
        g0: f64,
        g: f64,
    ) -> PyResult<Self> {
        let inner = SsdConfig::new(
            num_layers,
            GlobalParams {
                alpha_t,
                log_base,
                g0,
                g,
            },
            LayerParams {
                gamma,
                beta,
                eta,
                lambda: lambda_,
                kappa_min,
                theta,
            },
        )
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// `num_layers` identical layers; omitted rates take kernel defaults.
    #[staticmethod]
    #[pyo3(signature = (
        num_layers,
        gamma = 1.0,
        beta = 0.1,
        eta = 0.1,
        lambda_ = 0.05,
        kappa_min = 0.1,
        theta = 10.0,
        alpha_t = 0.1,
        log_base = 2.0,
        g0 = 0.1,
        g = 0.05,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn uniform(
        num_layers: usize,
        gamma: f64,
        beta: f64,
        eta: f64,
        lambda_: f64,
        kappa_min: f64,
        theta: f64,
        alpha_t: f64,
        log_base: f64,
        g0: f64,
        g: f64,
    ) -> PyResult<Self> {
        let inner = SsdConfig::uniform(
            num_layers,
            GlobalParams {
                alpha_t,
                log_base,
                g0,
                g,
            },
            LayerRates {
                gamma,
                beta,
                eta,
                lambda: lambda_,
                kappa_min,
                theta,
            },
        );
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let inner = SsdConfig::from_json(json).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    #[getter]
    fn num_layers(&self) -> usize {
        self.inner.num_layers
    }

    fn __repr__(&self) -> String {
        let g = &self.inner.global;
        format!(
            "SsdConfig(num_layers={}, alpha_t={}, log_base={}, g0={}, g={})",
            self.inner.num_layers, g.alpha_t, g.log_base, g.g0, g.g
        )
    }
}

// ─── PySsdEngine ────────────────────────────────────────────────────

/// Multi-layer structural-pressure engine.
#[pyclass(name = "SsdEngine")]
struct PySsdEngine {
    inner: SsdEngine,
}

#[pymethods]
impl PySsdEngine {
    /// `backend` is `"reference"`, `"accelerated"` or None for the
    /// process-wide choice. `energy`/`inertia` seed the initial state.
    #[new]
    #[pyo3(signature = (config, backend = None, energy = None, inertia = None))]
    fn new(
        config: &PySsdConfig,
        backend: Option<&str>,
        energy: Option<Vec<f64>>,
        inertia: Option<Vec<f64>>,
    ) -> PyResult<Self> {
        let cfg = config.inner.clone();
        let initial = LayerState::initial(&cfg);
        let mut inner = match backend {
            Some(name) => {
                let kind = name.parse::<BackendKind>().map_err(to_py_err)?;
                SsdEngine::with_backend(cfg, kind)
            }
            None => SsdEngine::new(cfg),
        }
        .map_err(to_py_err)?;
        if energy.is_some() || inertia.is_some() {
            let state = LayerState::new(
                energy.unwrap_or(initial.energy),
                inertia.unwrap_or(initial.inertia),
            )
            .map_err(to_py_err)?;
            inner = inner.with_state(state).map_err(to_py_err)?;
        }
        Ok(Self { inner })
    }

    /// Pure step over caller-held arrays. Returns dict with
    /// flow, energy, inertia, leap.
    fn step(
        &self,
        py: Python<'_>,
        p: Vec<f64>,
        energy: Vec<f64>,
        inertia: Vec<f64>,
    ) -> PyResult<PyObject> {
        let out = self.inner.step(&p, &energy, &inertia).map_err(to_py_err)?;
        output_to_dict(py, &out)
    }

    /// Advance the engine's own state by one tick.
    fn tick(&mut self, py: Python<'_>, p: Vec<f64>) -> PyResult<PyObject> {
        let out = self.inner.tick(&p).map_err(to_py_err)?;
        output_to_dict(py, &out)
    }

    /// Hold pressure `p` for `n_ticks`. Returns the last tick's dict,
    /// or None when `n_ticks == 0`.
    fn run(&mut self, py: Python<'_>, p: Vec<f64>, n_ticks: u64) -> PyResult<Option<PyObject>> {
        match self.inner.run(&p, n_ticks).map_err(to_py_err)? {
            Some(out) => Ok(Some(output_to_dict(py, &out)?)),
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    fn energy(&self) -> Vec<f64> {
        self.inner.state().energy.clone()
    }

    #[getter]
    fn inertia(&self) -> Vec<f64> {
        self.inner.state().inertia.clone()
    }

    #[getter]
    fn num_layers(&self) -> usize {
        self.inner.num_layers()
    }

    #[getter]
    fn backend(&self) -> String {
        self.inner.backend().to_string()
    }

    #[getter]
    fn tick_count(&self) -> u64 {
        self.inner.tick_count()
    }

    #[getter]
    fn leap_counts(&self) -> Vec<u64> {
        self.inner.leap_counts().to_vec()
    }

    /// Dict with tick, backend, energy, inertia, leap_counts.
    fn snapshot(&self, py: Python<'_>) -> PyResult<PyObject> {
        let snap = self.inner.snapshot();
        let dict = PyDict::new(py);
        dict.set_item("tick", snap.tick)?;
        dict.set_item("backend", snap.backend.to_string())?;
        dict.set_item("energy", snap.state.energy)?;
        dict.set_item("inertia", snap.state.inertia)?;
        dict.set_item("leap_counts", snap.leap_counts)?;
        Ok(dict.into())
    }

    fn __repr__(&self) -> String {
        format!(
            "SsdEngine(num_layers={}, backend={}, tick={})",
            self.inner.num_layers(),
            self.inner.backend(),
            self.inner.tick_count()
        )
    }
}

// ─── Scalar kernel functions ────────────────────────────────────────

#[pyfunction(name = "log_alignment")]
fn py_log_alignment(p: f64, alpha_t: f64, log_base: f64) -> f64 {
    log_alignment(p, alpha_t, log_base)
}

#[pyfunction(name = "ohm_flow")]
fn py_ohm_flow(p_hat: f64, g0: f64, g: f64, kappa: f64) -> f64 {
    ohm_flow(p_hat, g0, g, kappa)
}

#[pyfunction(name = "energy_update")]
fn py_energy_update(energy: f64, residual: f64, gamma: f64, beta: f64) -> f64 {
    energy_update(energy, residual, gamma, beta)
}

/// Returns `(energy_after, leap)`.
#[pyfunction(name = "detect_leap")]
fn py_detect_leap(energy: f64, theta: f64) -> (f64, bool) {
    detect_leap(energy, theta)
}

#[pyfunction(name = "inertia_update")]
fn py_inertia_update(kappa: f64, usage: f64, eta: f64, lambda_: f64, kappa_min: f64) -> f64 {
    inertia_update(kappa, usage, eta, lambda_, kappa_min)
}

/// Engine-free step over flat arrays. Returns
/// `(flow, energy, inertia, leap)` lists.
#[pyfunction(name = "compute_step")]
#[allow(clippy::too_many_arguments)]
#[allow(clippy::type_complexity)]
fn py_compute_step(
    p: Vec<f64>,
    energy: Vec<f64>,
    inertia: Vec<f64>,
    alpha_t: f64,
    log_base: f64,
    g0: f64,
    g: f64,
    gamma: Vec<f64>,
    beta: Vec<f64>,
    eta: Vec<f64>,
    lambda_: Vec<f64>,
    kappa_min: Vec<f64>,
    theta: Vec<f64>,
) -> PyResult<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<bool>)> {
    let out = compute_step(
        &p, &energy, &inertia, alpha_t, log_base, g0, g, &gamma, &beta, &eta, &lambda_,
        &kappa_min, &theta,
    )
    .map_err(to_py_err)?;
    Ok((out.flow, out.energy, out.inertia, out.leap))
}

#[pyfunction(name = "acceleration_available")]
fn py_acceleration_available() -> bool {
    acceleration_available()
}

#[pyfunction(name = "active_backend")]
fn py_active_backend() -> String {
    active_backend().to_string()
}

// ─── Module Registration ────────────────────────────────────────────

/// SSD Kernel — per-tick structural-pressure update for Python callers.
///
/// - `SsdConfig` — validated configuration
/// - `SsdEngine` — stateful multi-layer engine
/// - scalar kernel functions and `compute_step`
/// - `acceleration_available()` / `active_backend()` diagnostics
#[pymodule]
fn ssd_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySsdConfig>()?;
    m.add_class::<PySsdEngine>()?;
    m.add_function(wrap_pyfunction!(py_log_alignment, m)?)?;
    m.add_function(wrap_pyfunction!(py_ohm_flow, m)?)?;
    m.add_function(wrap_pyfunction!(py_energy_update, m)?)?;
    m.add_function(wrap_pyfunction!(py_detect_leap, m)?)?;
    m.add_function(wrap_pyfunction!(py_inertia_update, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_step, m)?)?;
    m.add_function(wrap_pyfunction!(py_acceleration_available, m)?)?;
    m.add_function(wrap_pyfunction!(py_active_backend, m)?)?;
    m.add("ACCELERATION_AVAILABLE", acceleration_available())?;
    Ok(())
}
