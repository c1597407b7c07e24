// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Types
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! structural-pressure kernel.

pub mod config;
pub mod error;
pub mod state;

pub use config::{GlobalParams, LayerParams, LayerRates, SsdConfig};
pub use error::{SsdError, SsdResult};
pub use state::{BackendKind, LayerState, StepOutput};
