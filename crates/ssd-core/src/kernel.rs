// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Per-Layer Update Law
// ─────────────────────────────────────────────────────────────────────
//! Scalar update law for one layer and one tick:
//!
//!   p̂   = sign(p) · ln(1 + α_t |p|) / ln(base)
//!   j   = (G0 + g κ) · p̂
//!   r   = p̂ − j
//!   E'  = max(0, E + γ r − β E)          leap ⇔ E' ≥ Θ, then E' := 0
//!   κ'  = max(κ_min, κ + η |j| − λ κ)
//!
//! Every backend evaluates [`step_layer`]; none re-implements the law.

use ssd_types::{GlobalParams, LayerRates};

/// Sign-preserving logarithmic compression of raw pressure.
///
/// Zero maps to exactly `+0.0`, including `-0.0` input.
#[inline]
pub fn log_alignment(p: f64, alpha_t: f64, log_base: f64) -> f64 {
    if p == 0.0 {
        return 0.0;
    }
    let sign = if p > 0.0 { 1.0 } else { -1.0 };
    sign * (1.0 + alpha_t * p.abs()).ln() / log_base.ln()
}

/// Ohmic response: conductance `G0 + g·κ` times aligned pressure.
#[inline]
pub fn ohm_flow(p_hat: f64, g0: f64, g: f64, kappa: f64) -> f64 {
    let conductance = g0 + g * kappa;
    conductance * p_hat
}

/// Accumulate the undischarged residual into energy, floored at 0.
#[inline]
pub fn energy_update(energy: f64, residual: f64, gamma: f64, beta: f64) -> f64 {
    let d_energy = gamma * residual - beta * energy;
    (energy + d_energy).max(0.0)
}

/// Threshold test on updated energy. Inclusive: `E' == Θ` leaps.
///
/// Returns the energy to carry forward and the leap flag.
#[inline]
pub fn detect_leap(energy: f64, theta: f64) -> (f64, bool) {
    if energy >= theta {
        (0.0, true)
    } else {
        (energy, false)
    }
}

/// Usage-reinforced inertia with continuous decay, floored at `κ_min`.
#[inline]
pub fn inertia_update(kappa: f64, usage: f64, eta: f64, lambda: f64, kappa_min: f64) -> f64 {
    let d_kappa = eta * usage - lambda * kappa;
    (kappa + d_kappa).max(kappa_min)
}

/// Outcome of one layer for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStep {
    pub flow: f64,
    pub energy: f64,
    pub inertia: f64,
    pub leap: bool,
}

/// Full update of one layer in the fixed order
/// align → flow → residual → energy → leap → inertia.
#[inline]
pub fn step_layer(
    p: f64,
    energy: f64,
    kappa: f64,
    global: &GlobalParams,
    rates: &LayerRates,
) -> LayerStep {
    let p_hat = log_alignment(p, global.alpha_t, global.log_base);
    let flow = ohm_flow(p_hat, global.g0, global.g, kappa);
    let residual = p_hat - flow;

    let accumulated = energy_update(energy, residual, rates.gamma, rates.beta);
    let (energy, leap) = detect_leap(accumulated, rates.theta);

    let inertia = inertia_update(kappa, flow.abs(), rates.eta, rates.lambda, rates.kappa_min);

    LayerStep {
        flow,
        energy,
        inertia,
        leap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_zero_is_exact() {
        for (alpha, base) in [(0.1, 2.0), (0.0, 1.5), (3.0, 10.0)] {
            let z = log_alignment(0.0, alpha, base);
            assert_eq!(z, 0.0);
            assert!(z.is_sign_positive());
            assert!(log_alignment(-0.0, alpha, base).is_sign_positive());
        }
    }

    #[test]
    fn test_alignment_preserves_sign() {
        for p in [1e-12, 0.3, 5.0, 1e6] {
            assert!(log_alignment(p, 0.1, 2.0) > 0.0, "p={p}");
            assert!(log_alignment(-p, 0.1, 2.0) < 0.0, "p=-{p}");
        }
    }

    #[test]
    fn test_alignment_is_odd() {
        let a = log_alignment(7.5, 0.4, 3.0);
        let b = log_alignment(-7.5, 0.4, 3.0);
        assert_eq!(a, -b);
    }

    #[test]
    fn test_alignment_value() {
        // ln(1 + 0.1·5) / ln 2 = log2(1.5)
        let v = log_alignment(5.0, 0.1, 2.0);
        assert!((v - 1.5f64.log2()).abs() < 1e-15, "v={v}");
    }

    #[test]
    fn test_alignment_compresses() {
        assert!(log_alignment(1000.0, 1.0, std::f64::consts::E) < 10.0);
    }

    #[test]
    fn test_zero_gain_alignment_vanishes() {
        assert_eq!(log_alignment(42.0, 0.0, 2.0), 0.0);
    }

    #[test]
    fn test_ohm_flow() {
        assert!((ohm_flow(2.0, 0.1, 0.05, 1.0) - 0.3).abs() < 1e-15);
        assert_eq!(ohm_flow(-2.0, 0.0, 0.0, 5.0), -0.0);
    }

    #[test]
    fn test_energy_floor() {
        assert_eq!(energy_update(1.0, -100.0, 1.0, 0.1), 0.0);
        assert_eq!(energy_update(4.0, 8.0, 0.5, 0.25), 7.0);
    }

    #[test]
    fn test_leap_is_inclusive() {
        assert_eq!(detect_leap(7.0, 7.0), (0.0, true));
        assert_eq!(detect_leap(7.5, 7.0), (0.0, true));
        assert_eq!(detect_leap(6.5, 7.0), (6.5, false));
    }

    #[test]
    fn test_inertia_floor() {
        assert_eq!(inertia_update(0.2, 0.0, 0.1, 0.9, 0.1), 0.1);
        assert!((inertia_update(1.0, 2.0, 0.1, 0.05, 0.1) - 1.15).abs() < 1e-15);
    }

    #[test]
    fn test_step_layer_chain() {
        let global = GlobalParams::default();
        let rates = LayerRates::default();
        let s = step_layer(5.0, 0.0, 1.0, &global, &rates);

        let p_hat = log_alignment(5.0, 0.1, 2.0);
        let j = (0.1 + 0.05 * 1.0) * p_hat;
        assert_eq!(s.flow, j);
        assert_eq!(s.energy, (p_hat - j).max(0.0));
        assert_eq!(s.inertia, (1.0f64 + (0.1 * j.abs() - 0.05 * 1.0)).max(0.1));
        assert!(!s.leap);
    }

    #[test]
    fn test_negative_pressure_reinforces_inertia() {
        let global = GlobalParams::default();
        let rates = LayerRates {
            lambda: 0.0,
            ..Default::default()
        };
        let s = step_layer(-50.0, 0.0, 1.0, &global, &rates);
        assert!(s.flow < 0.0);
        assert!(s.inertia > 1.0);
        // Negative residual cannot build tension from zero.
        assert_eq!(s.energy, 0.0);
    }
}
