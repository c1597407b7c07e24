// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{check_len, SsdError, SsdResult};

/// Scalars shared by every layer of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalParams {
    /// Transform gain α_t (≥ 0).
    pub alpha_t: f64,
    /// Logarithm base of the pressure transform (> 1).
    pub log_base: f64,
    /// Baseline conductance G0 (≥ 0).
    pub g0: f64,
    /// Inertia-to-conductance coupling g (≥ 0).
    pub g: f64,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            alpha_t: 0.1,
            log_base: 2.0,
            g0: 0.1,
            g: 0.05,
        }
    }
}

/// Rate parameters of a single layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerRates {
    /// Energy gain γ.
    pub gamma: f64,
    /// Energy decay β.
    pub beta: f64,
    /// Inertia reinforcement η.
    pub eta: f64,
    /// Inertia decay λ.
    pub lambda: f64,
    /// Inertia floor κ_min.
    pub kappa_min: f64,
    /// Leap threshold Θ.
    pub theta: f64,
}

impl Default for LayerRates {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            beta: 0.1,
            eta: 0.1,
            lambda: 0.05,
            kappa_min: 0.1,
            theta: 10.0,
        }
    }
}

/// Per-layer parameters stored as parallel arrays, indexed by layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub gamma: Vec<f64>,
    pub beta: Vec<f64>,
    pub eta: Vec<f64>,
    pub lambda: Vec<f64>,
    pub kappa_min: Vec<f64>,
    pub theta: Vec<f64>,
}

impl LayerParams {
    /// `n` layers sharing the same rates.
    pub fn uniform(n: usize, rates: LayerRates) -> Self {
        Self::from_rates(&vec![rates; n])
    }

    /// One entry per layer, in layer order.
    pub fn from_rates(rates: &[LayerRates]) -> Self {
        Self {
            gamma: rates.iter().map(|r| r.gamma).collect(),
            beta: rates.iter().map(|r| r.beta).collect(),
            eta: rates.iter().map(|r| r.eta).collect(),
            lambda: rates.iter().map(|r| r.lambda).collect(),
            kappa_min: rates.iter().map(|r| r.kappa_min).collect(),
            theta: rates.iter().map(|r| r.theta).collect(),
        }
    }

    /// Rates of layer `i`. Panics if `i` is out of range.
    pub fn rates(&self, i: usize) -> LayerRates {
        LayerRates {
            gamma: self.gamma[i],
            beta: self.beta[i],
            eta: self.eta[i],
            lambda: self.lambda[i],
            kappa_min: self.kappa_min[i],
            theta: self.theta[i],
        }
    }

    /// Every column has exactly `n` entries.
    pub fn check_len(&self, n: usize) -> SsdResult<()> {
        for (field, column) in self.columns() {
            check_len(field, n, column.len())?;
        }
        Ok(())
    }

    fn columns(&self) -> [(&'static str, &[f64]); 6] {
        [
            ("gamma", self.gamma.as_slice()),
            ("beta", self.beta.as_slice()),
            ("eta", self.eta.as_slice()),
            ("lambda", self.lambda.as_slice()),
            ("kappa_min", self.kappa_min.as_slice()),
            ("theta", self.theta.as_slice()),
        ]
    }
}

/// Full engine configuration: layer count, global scalars and
/// per-layer rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsdConfig {
    pub num_layers: usize,
    pub global: GlobalParams,
    pub layers: LayerParams,
}

impl Default for SsdConfig {
    fn default() -> Self {
        Self::uniform(4, GlobalParams::default(), LayerRates::default())
    }
}

impl SsdConfig {
    /// Build and validate a configuration.
    pub fn new(num_layers: usize, global: GlobalParams, layers: LayerParams) -> SsdResult<Self> {
        let config = Self {
            num_layers,
            global,
            layers,
        };
        config.validate()?;
        Ok(config)
    }

    /// `num_layers` identical layers. Not validated.
    pub fn uniform(num_layers: usize, global: GlobalParams, rates: LayerRates) -> Self {
        Self {
            num_layers,
            global,
            layers: LayerParams::uniform(num_layers, rates),
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> SsdResult<()> {
        if self.num_layers == 0 {
            return Err(SsdError::Config("num_layers must be >= 1".to_string()));
        }
        self.layers.check_len(self.num_layers)?;

        let g = &self.global;
        if !g.log_base.is_finite() || g.log_base <= 1.0 {
            return Err(SsdError::Config(format!(
                "log_base must be finite and > 1, got {}",
                g.log_base
            )));
        }
        for (name, value) in [("alpha_t", g.alpha_t), ("g0", g.g0), ("g", g.g)] {
            non_negative(name, value)?;
        }

        for (field, column) in self.layers.columns() {
            for (i, &value) in column.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(SsdError::Config(format!(
                        "{field}[{i}] must be finite and >= 0, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Load from JSON string. The result is validated.
    pub fn from_json(json: &str) -> SsdResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SsdError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SsdResult<String> {
        serde_json::to_string(self)
            .map_err(|e| SsdError::Config(format!("JSON encode error: {e}")))
    }
}

fn non_negative(name: &str, value: f64) -> SsdResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SsdError::Config(format!(
            "{name} must be finite and >= 0, got {value}"
        )))
    }
}
