// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Core Engine
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Per-tick structural-pressure kernel over independent layers.
//!
//! Each layer carries energy E and inertia κ. Every tick, raw pressure
//! is log-aligned, converted to a flow through conductance `G0 + g·κ`,
//! the undischarged residual accumulates as energy, a threshold
//! crossing fires a leap and empties the layer, and inertia adapts to
//! the flow it carried.
//!
//! # Invariants
//!
//! 1. **Energy is never negative** and is exactly `0.0` on a leap tick.
//!    Otherwise it stays strictly below the layer threshold Θ.
//!
//! 2. **Inertia never drops below κ_min** after a step.
//!
//! 3. **Backends are interchangeable**: the reference and accelerated
//!    backends evaluate the same per-layer law and agree bit-for-bit.
//!    The process-wide choice is made once and never per call.
//!
//! 4. **Errors precede output**: a step either returns all four arrays
//!    or fails validation without producing any.

pub mod backend;
pub mod dispatch;
pub mod engine;
pub mod kernel;

pub use backend::{ReferenceBackend, StepBackend};
#[cfg(feature = "parallel")]
pub use backend::ParallelBackend;
pub use dispatch::{acceleration_available, active_backend, active_step_backend, backend_for};
pub use engine::{compute_step, EngineSnapshot, SsdEngine};
pub use kernel::{
    detect_leap, energy_update, inertia_update, log_alignment, ohm_flow, step_layer, LayerStep,
};

pub use ssd_types::{
    BackendKind, GlobalParams, LayerParams, LayerRates, LayerState, SsdConfig, SsdError,
    SsdResult, StepOutput,
};
