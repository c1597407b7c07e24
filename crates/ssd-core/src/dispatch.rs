// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Backend Dispatch
// ─────────────────────────────────────────────────────────────────────
//! Process-wide backend selection.
//!
//! The accelerated backend is compiled with the `parallel` feature and
//! is picked automatically when the host has more than one hardware
//! thread. Selection runs once, on first use, and is cached for the
//! lifetime of the process:
//!   `SSD_KERNEL_BACKEND` override → capability check → reference.
//!
//! A missing accelerator is never an error; it only changes which
//! backend [`active_backend`] reports.

use std::sync::OnceLock;

use ssd_types::BackendKind;

use crate::backend::{ReferenceBackend, StepBackend};

#[cfg(feature = "parallel")]
use crate::backend::ParallelBackend;

/// Environment variable overriding automatic selection:
/// `reference`, `accelerated` or `auto`.
pub const BACKEND_ENV: &str = "SSD_KERNEL_BACKEND";

static REFERENCE: ReferenceBackend = ReferenceBackend;

#[cfg(feature = "parallel")]
static PARALLEL: ParallelBackend = ParallelBackend;

static ACCELERATION: OnceLock<bool> = OnceLock::new();
static ACTIVE: OnceLock<BackendKind> = OnceLock::new();
static ACTIVE_BACKEND: OnceLock<&'static dyn StepBackend> = OnceLock::new();

/// Whether the accelerated backend was compiled into this build.
pub const fn accelerated_compiled() -> bool {
    cfg!(feature = "parallel")
}

/// Capability flag: accelerated backend compiled in and the host can
/// run it on more than one thread. Probed once.
pub fn acceleration_available() -> bool {
    *ACCELERATION.get_or_init(|| {
        accelerated_compiled()
            && std::thread::available_parallelism()
                .map(|n| n.get() > 1)
                .unwrap_or(false)
    })
}

/// Backend bound by engines that do not request one explicitly.
pub fn active_backend() -> BackendKind {
    *ACTIVE.get_or_init(|| {
        let request = std::env::var(BACKEND_ENV).ok();
        let kind = resolve(request.as_deref(), acceleration_available());
        log::info!(
            "SSD kernel backend: {kind} (acceleration available: {})",
            acceleration_available()
        );
        kind
    })
}

/// Instance of [`active_backend`], resolved once and reused by every
/// engine-free step.
pub fn active_step_backend() -> &'static dyn StepBackend {
    *ACTIVE_BACKEND.get_or_init(|| backend_for(active_backend()))
}

/// Static backend instance for `kind`.
///
/// An accelerated request in a build without the `parallel` feature
/// binds the reference backend.
pub fn backend_for(kind: BackendKind) -> &'static dyn StepBackend {
    match kind {
        BackendKind::Reference => &REFERENCE,
        BackendKind::Accelerated => accelerated_or_reference(),
    }
}

#[cfg(feature = "parallel")]
fn accelerated_or_reference() -> &'static dyn StepBackend {
    &PARALLEL
}

#[cfg(not(feature = "parallel"))]
fn accelerated_or_reference() -> &'static dyn StepBackend {
    log::warn!("accelerated backend not compiled in, using reference");
    &REFERENCE
}

/// Map an override request and the capability flag to a backend.
fn resolve(request: Option<&str>, available: bool) -> BackendKind {
    let auto = if available {
        BackendKind::Accelerated
    } else {
        BackendKind::Reference
    };

    let request = match request.map(str::trim) {
        None | Some("") => return auto,
        Some(r) if r.eq_ignore_ascii_case("auto") => return auto,
        Some(r) => r,
    };

    match request.parse::<BackendKind>() {
        Ok(BackendKind::Accelerated) if !accelerated_compiled() => {
            log::warn!("{BACKEND_ENV}=accelerated but the parallel feature is off, using reference");
            BackendKind::Reference
        }
        Ok(kind) => kind,
        Err(_) => {
            log::warn!("ignoring unknown {BACKEND_ENV}={request:?}, falling back to auto");
            auto
        }
    }
}
