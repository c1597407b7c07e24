// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Step Orchestrator
// ─────────────────────────────────────────────────────────────────────
//! Multi-layer engine: owns a validated configuration, the carried
//! `(E, κ)` state and the backend it was bound to at construction.
//!
//! [`SsdEngine::step`] is the pure contract (state in, state out).
//! [`SsdEngine::tick`] is the stateful convenience that adopts the
//! returned state for the next tick.

use serde::{Deserialize, Serialize};

use ssd_types::error::check_len;
use ssd_types::{
    BackendKind, GlobalParams, LayerParams, LayerState, SsdConfig, SsdError, SsdResult,
    StepOutput,
};

use crate::backend::StepBackend;
use crate::dispatch::{active_step_backend, backend_for};

/// Serializable view of an engine for collaborators that read
/// energy and inertia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub tick: u64,
    pub backend: BackendKind,
    pub state: LayerState,
    pub leap_counts: Vec<u64>,
}

/// Structural-pressure engine over a fixed number of layers.
pub struct SsdEngine {
    config: SsdConfig,
    backend: &'static dyn StepBackend,
    state: LayerState,
    tick_count: u64,
    leap_counts: Vec<u64>,
    // Reused by `tick`.
    scratch: StepOutput,
}

impl SsdEngine {
    /// Create an engine bound to the process-wide backend.
    pub fn new(config: SsdConfig) -> SsdResult<Self> {
        Self::bind(config, active_step_backend())
    }

    /// Create an engine bound to a specific backend.
    pub fn with_backend(config: SsdConfig, kind: BackendKind) -> SsdResult<Self> {
        Self::bind(config, backend_for(kind))
    }

    fn bind(config: SsdConfig, backend: &'static dyn StepBackend) -> SsdResult<Self> {
        config.validate()?;
        let n = config.num_layers;
        log::debug!(
            "SsdEngine: {n} layers, backend={}, alpha_t={}, log_base={}",
            backend.kind(),
            config.global.alpha_t,
            config.global.log_base
        );
        Ok(Self {
            state: LayerState::initial(&config),
            backend,
            tick_count: 0,
            leap_counts: vec![0; n],
            scratch: StepOutput::zeros(n),
            config,
        })
    }

    /// Replace the initial state.
    ///
    /// Energy must be finite and `>= 0`; inertia must be finite and at
    /// least the layer's `κ_min`.
    pub fn with_state(mut self, state: LayerState) -> SsdResult<Self> {
        check_len("energy", self.num_layers(), state.energy.len())?;
        check_len("inertia", self.num_layers(), state.inertia.len())?;

        for (i, &e) in state.energy.iter().enumerate() {
            if !e.is_finite() || e < 0.0 {
                return Err(SsdError::Validation(format!(
                    "energy[{i}] must be finite and >= 0, got {e}"
                )));
            }
        }
        let floors = &self.config.layers.kappa_min;
        for (i, (&k, &k_min)) in state.inertia.iter().zip(floors).enumerate() {
            if !k.is_finite() || k < k_min {
                return Err(SsdError::Validation(format!(
                    "inertia[{i}] must be finite and >= kappa_min {k_min}, got {k}"
                )));
            }
        }

        self.state = state;
        Ok(self)
    }

    pub fn config(&self) -> &SsdConfig {
        &self.config
    }

    pub fn global(&self) -> &GlobalParams {
        &self.config.global
    }

    pub fn layers(&self) -> &LayerParams {
        &self.config.layers
    }

    pub fn num_layers(&self) -> usize {
        self.config.num_layers
    }

    pub fn backend(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Leaps observed per layer since construction or the last reset.
    pub fn leap_counts(&self) -> &[u64] {
        &self.leap_counts
    }

    /// Advance arbitrary `(p, E, κ)` by one tick without touching the
    /// engine's own state. Fails before producing any output if an
    /// array does not have `num_layers` entries.
    pub fn step(&self, p: &[f64], energy: &[f64], inertia: &[f64]) -> SsdResult<StepOutput> {
        self.check_inputs(p, energy, inertia)?;
        self.backend.step(p, energy, inertia, &self.config)
    }

    /// Advance the engine's own state by one tick with pressure `p`.
    pub fn tick(&mut self, p: &[f64]) -> SsdResult<StepOutput> {
        check_len("p", self.num_layers(), p.len())?;

        self.backend.step_into(
            p,
            &self.state.energy,
            &self.state.inertia,
            &self.config,
            &mut self.scratch,
        )?;
        self.state.energy.copy_from_slice(&self.scratch.energy);
        self.state.inertia.copy_from_slice(&self.scratch.inertia);
        self.tick_count += 1;

        for (count, &leapt) in self.leap_counts.iter_mut().zip(&self.scratch.leap) {
            if leapt {
                *count += 1;
            }
        }
        if self.scratch.any_leap() {
            log::debug!(
                "tick {}: leap in layers {:?}",
                self.tick_count,
                self.scratch.leap_indices()
            );
        }

        Ok(self.scratch.clone())
    }

    /// Hold pressure `p` for `n_ticks` ticks. Returns the last output,
    /// or `None` when `n_ticks == 0`.
    pub fn run(&mut self, p: &[f64], n_ticks: u64) -> SsdResult<Option<StepOutput>> {
        check_len("p", self.num_layers(), p.len())?;
        let mut last = None;
        for _ in 0..n_ticks {
            last = Some(self.tick(p)?);
        }
        Ok(last)
    }

    /// Back to the relaxed initial state; counters cleared.
    pub fn reset(&mut self) {
        self.state = LayerState::initial(&self.config);
        self.tick_count = 0;
        self.leap_counts.iter_mut().for_each(|c| *c = 0);
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            tick: self.tick_count,
            backend: self.backend(),
            state: self.state.clone(),
            leap_counts: self.leap_counts.clone(),
        }
    }

    fn check_inputs(&self, p: &[f64], energy: &[f64], inertia: &[f64]) -> SsdResult<()> {
        let n = self.num_layers();
        check_len("p", n, p.len())?;
        check_len("energy", n, energy.len())?;
        check_len("inertia", n, inertia.len())
    }
}

/// One tick over flat arrays, for callers that hold no engine.
///
/// Validates the parameters it is given on every call and runs on the
/// process-wide backend.
#[allow(clippy::too_many_arguments)]
pub fn compute_step(
    p: &[f64],
    energy: &[f64],
    inertia: &[f64],
    alpha_t: f64,
    log_base: f64,
    g0: f64,
    g: f64,
    gamma: &[f64],
    beta: &[f64],
    eta: &[f64],
    lambda: &[f64],
    kappa_min: &[f64],
    theta: &[f64],
) -> SsdResult<StepOutput> {
    let config = SsdConfig::new(
        p.len(),
        GlobalParams {
            alpha_t,
            log_base,
            g0,
            g,
        },
        LayerParams {
            gamma: gamma.to_vec(),
            beta: beta.to_vec(),
            eta: eta.to_vec(),
            lambda: lambda.to_vec(),
            kappa_min: kappa_min.to_vec(),
            theta: theta.to_vec(),
        },
    )?;
    check_len("energy", config.num_layers, energy.len())?;
    check_len("inertia", config.num_layers, inertia.len())?;
    active_step_backend().step(p, energy, inertia, &config)
}
