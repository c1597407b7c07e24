// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Layer State and Step Output
// ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::SsdConfig;
use crate::error::{check_len, SsdError, SsdResult};

/// Carried state of every layer between ticks.
///
/// Pressure is not part of it: it is supplied fresh each tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    /// Accumulated tension E (≥ 0).
    pub energy: Vec<f64>,
    /// Structural resistance κ (≥ κ_min once stepped).
    pub inertia: Vec<f64>,
}

impl LayerState {
    pub fn new(energy: Vec<f64>, inertia: Vec<f64>) -> SsdResult<Self> {
        check_len("inertia", energy.len(), inertia.len())?;
        Ok(Self { energy, inertia })
    }

    /// Relaxed starting point: no tension, inertia at its floor.
    pub fn initial(config: &SsdConfig) -> Self {
        Self {
            energy: vec![0.0; config.num_layers],
            inertia: config.layers.kappa_min.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }
}

/// Result of one tick over all layers.
///
/// `leap` is transient: it describes this tick only and is never
/// carried into the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Flow j per layer.
    pub flow: Vec<f64>,
    /// Energy after accumulation and leap reset.
    pub energy: Vec<f64>,
    /// Inertia after reinforcement and decay.
    pub inertia: Vec<f64>,
    /// Whether the layer leapt this tick.
    pub leap: Vec<bool>,
}

impl StepOutput {
    pub fn zeros(n: usize) -> Self {
        Self {
            flow: vec![0.0; n],
            energy: vec![0.0; n],
            inertia: vec![0.0; n],
            leap: vec![false; n],
        }
    }

    pub fn len(&self) -> usize {
        self.flow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flow.is_empty()
    }

    pub fn any_leap(&self) -> bool {
        self.leap.iter().any(|&l| l)
    }

    /// Indices of the layers that leapt this tick.
    pub fn leap_indices(&self) -> Vec<usize> {
        self.leap
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| l.then_some(i))
            .collect()
    }

    /// The `(E, κ)` arrays to feed into the next tick.
    pub fn next_state(&self) -> LayerState {
        LayerState {
            energy: self.energy.clone(),
            inertia: self.inertia.clone(),
        }
    }
}

/// Which step implementation an engine is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Sequential loop, always available.
    Reference,
    /// Data-parallel loop across layers.
    Accelerated,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Reference => write!(f, "reference"),
            BackendKind::Accelerated => write!(f, "accelerated"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = SsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reference" => Ok(BackendKind::Reference),
            "accelerated" => Ok(BackendKind::Accelerated),
            other => Err(SsdError::Validation(format!("unknown backend `{other}`"))),
        }
    }
}
