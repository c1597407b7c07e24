// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Step Backends
// ─────────────────────────────────────────────────────────────────────
//! Two interchangeable implementations of the all-layers step:
//!
//! - [`ReferenceBackend`] — sequential loop, always compiled.
//! - [`ParallelBackend`] — rayon loop across layers (`parallel` feature).
//!
//! Layers never interact within a tick, so both evaluate the same
//! [`step_layer`] per index and agree bit-for-bit.

use ssd_types::error::check_len;
use ssd_types::{BackendKind, SsdConfig, SsdResult, StepOutput};

use crate::kernel::step_layer;

/// One full tick over every layer.
///
/// `p`, `energy`, `inertia`, every column of `config.layers` and every
/// `out` array must have `config.num_layers` entries. A mismatch fails
/// before `out` is written. Parameter values are not re-validated.
pub trait StepBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn step_into(
        &self,
        p: &[f64],
        energy: &[f64],
        inertia: &[f64],
        config: &SsdConfig,
        out: &mut StepOutput,
    ) -> SsdResult<()>;

    fn step(
        &self,
        p: &[f64],
        energy: &[f64],
        inertia: &[f64],
        config: &SsdConfig,
    ) -> SsdResult<StepOutput> {
        let mut out = StepOutput::zeros(config.num_layers);
        self.step_into(p, energy, inertia, config, &mut out)?;
        Ok(out)
    }
}

fn check_shapes(
    p: &[f64],
    energy: &[f64],
    inertia: &[f64],
    config: &SsdConfig,
    out: &StepOutput,
) -> SsdResult<()> {
    let n = config.num_layers;
    check_len("p", n, p.len())?;
    check_len("energy", n, energy.len())?;
    check_len("inertia", n, inertia.len())?;
    config.layers.check_len(n)?;
    check_len("out.flow", n, out.flow.len())?;
    check_len("out.energy", n, out.energy.len())?;
    check_len("out.inertia", n, out.inertia.len())?;
    check_len("out.leap", n, out.leap.len())
}

/// Sequential reference implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceBackend;

impl StepBackend for ReferenceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Reference
    }

    fn step_into(
        &self,
        p: &[f64],
        energy: &[f64],
        inertia: &[f64],
        config: &SsdConfig,
        out: &mut StepOutput,
    ) -> SsdResult<()> {
        check_shapes(p, energy, inertia, config, out)?;

        #[allow(clippy::needless_range_loop)]
        for i in 0..p.len() {
            let s = step_layer(
                p[i],
                energy[i],
                inertia[i],
                &config.global,
                &config.layers.rates(i),
            );
            out.flow[i] = s.flow;
            out.energy[i] = s.energy;
            out.inertia[i] = s.inertia;
            out.leap[i] = s.leap;
        }
        Ok(())
    }
}

/// Data-parallel implementation distributing layers across the rayon pool.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelBackend;

/// Smallest batch of layers handed to one rayon task.
#[cfg(feature = "parallel")]
pub const MIN_LAYERS_PER_TASK: usize = 256;

#[cfg(feature = "parallel")]
impl StepBackend for ParallelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn step_into(
        &self,
        p: &[f64],
        energy: &[f64],
        inertia: &[f64],
        config: &SsdConfig,
        out: &mut StepOutput,
    ) -> SsdResult<()> {
        use rayon::prelude::*;

        check_shapes(p, energy, inertia, config, out)?;

        let global = &config.global;
        let layers = &config.layers;

        (
            out.flow.par_iter_mut(),
            out.energy.par_iter_mut(),
            out.inertia.par_iter_mut(),
            out.leap.par_iter_mut(),
        )
            .into_par_iter()
            .enumerate()
            .with_min_len(MIN_LAYERS_PER_TASK)
            .for_each(|(i, (flow, e, k, leap))| {
                let s = step_layer(p[i], energy[i], inertia[i], global, &layers.rates(i));
                *flow = s.flow;
                *e = s.energy;
                *k = s.inertia;
                *leap = s.leap;
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssd_types::{GlobalParams, LayerRates, SsdError};

    fn golden_config() -> SsdConfig {
        SsdConfig::uniform(1, GlobalParams::default(), LayerRates::default())
    }

    #[test]
    fn test_reference_golden() {
        let out = ReferenceBackend
            .step(&[5.0], &[0.0], &[1.0], &golden_config())
            .unwrap();
        assert!((out.flow[0] - 0.087_744_375_108_173_44).abs() < 1e-12);
        assert!((out.energy[0] - 0.497_218_125_612_982_73).abs() < 1e-12);
        assert!((out.inertia[0] - 0.958_774_437_510_817_4).abs() < 1e-12);
        assert!(!out.leap[0]);
    }

    #[test]
    fn test_reference_layers_are_independent() {
        let cfg = SsdConfig::uniform(3, GlobalParams::default(), LayerRates::default());
        let all = ReferenceBackend
            .step(&[1.0, -4.0, 9.0], &[0.5, 2.0, 3.0], &[1.0, 0.3, 2.0], &cfg)
            .unwrap();
        let single = golden_config();
        let mid = ReferenceBackend
            .step(&[-4.0], &[2.0], &[0.3], &single)
            .unwrap();
        assert_eq!(all.flow[1], mid.flow[0]);
        assert_eq!(all.energy[1], mid.energy[0]);
        assert_eq!(all.inertia[1], mid.inertia[0]);
    }

    fn backends() -> Vec<&'static dyn StepBackend> {
        let mut all: Vec<&'static dyn StepBackend> = vec![&ReferenceBackend];
        #[cfg(feature = "parallel")]
        all.push(&ParallelBackend);
        all
    }

    #[test]
    fn test_arrays_longer_than_config_rejected() {
        let one_layer = golden_config();
        for backend in backends() {
            let err = backend
                .step(&[1.0, 2.0], &[0.0, 0.0], &[1.0, 1.0], &one_layer)
                .unwrap_err();
            assert_eq!(
                err,
                SsdError::LengthMismatch {
                    field: "p",
                    expected: 1,
                    got: 2
                },
                "{}",
                backend.kind()
            );
        }
    }

    #[test]
    fn test_short_layer_columns_rejected() {
        let mut cfg = SsdConfig::uniform(3, GlobalParams::default(), LayerRates::default());
        cfg.layers.theta.truncate(1);
        for backend in backends() {
            let err = backend
                .step(&[1.0; 3], &[0.0; 3], &[1.0; 3], &cfg)
                .unwrap_err();
            assert!(
                matches!(err, SsdError::LengthMismatch { field: "theta", .. }),
                "{}: {err}",
                backend.kind()
            );
        }
    }

    #[test]
    fn test_mismatch_leaves_output_untouched() {
        let cfg = SsdConfig::uniform(2, GlobalParams::default(), LayerRates::default());
        for backend in backends() {
            let mut out = StepOutput::zeros(2);
            assert!(backend
                .step_into(&[5.0, 5.0], &[0.0], &[1.0, 1.0], &cfg, &mut out)
                .is_err());
            assert_eq!(out, StepOutput::zeros(2));

            let mut short = StepOutput::zeros(1);
            assert!(backend
                .step_into(&[5.0, 5.0], &[0.0; 2], &[1.0; 2], &cfg, &mut short)
                .is_err());
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ReferenceBackend.kind(), BackendKind::Reference);
        #[cfg(feature = "parallel")]
        assert_eq!(ParallelBackend.kind(), BackendKind::Accelerated);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_reference_across_task_boundaries() {
        let n = MIN_LAYERS_PER_TASK * 4 + 17;
        let cfg = SsdConfig::uniform(n, GlobalParams::default(), LayerRates::default());
        let p: Vec<f64> = (0..n).map(|i| (i as f64 - 500.0) * 0.37).collect();
        let e: Vec<f64> = (0..n).map(|i| (i % 13) as f64 * 0.8).collect();
        let k: Vec<f64> = (0..n).map(|i| 0.1 + (i % 7) as f64).collect();

        let a = ReferenceBackend.step(&p, &e, &k, &cfg).unwrap();
        let b = ParallelBackend.step(&p, &e, &k, &cfg).unwrap();
        assert_eq!(a, b);
    }
}
