//! Compartment kinetics core.
//!
//! Closed-form solutions of the single-compartment gas-exchange ODE
//! dP/dt = k (P_gas − P), k = ln 2 / half-time, for the two exposure shapes
//! the models need: constant ambient pressure and ambient pressure changing
//! at a fixed rate. Also the Bühlmann tolerated-pressure formula with the
//! gradient-factor extension.

use crate::error::Defect;

/// Tolerance on the agreement between the natural-log and power-of-two
/// forms of the exponential update. Divergence is a defect, not a domain
/// error: the two forms are algebraically identical.
const FORM_TOLERANCE: f64 = 1e-5;

/// Constant-exposure update: tissue pressure after `time` at a fixed
/// inspired inert-gas pressure `p_gas`.
///
/// Computed as p0 + (p_gas − p0)(1 − 2^(−t/half)) and cross-checked
/// against the e^(−kt) form.
pub fn constant_exposure(p0: f64, half_time: f64, time: f64, p_gas: f64) -> Result<f64, Defect> {
    let k = std::f64::consts::LN_2 / half_time;
    let via_ln = p0 + (p_gas - p0) * (1.0 - (-k * time).exp());
    let via_pow = p0 + (p_gas - p0) * (1.0 - 2.0_f64.powf(-time / half_time));
    if (via_ln - via_pow).abs() > FORM_TOLERANCE {
        return Err(Defect::NumericInconsistency { via_ln, via_pow });
    }
    Ok(via_pow)
}

/// Changing-exposure update: tissue pressure after `time` while the
/// inspired inert-gas pressure ramps linearly at `rate` per minute,
/// ending at `p_gas` (Schreiner form).
pub fn linear_exposure(p0: f64, half_time: f64, time: f64, p_gas: f64, rate: f64) -> f64 {
    let k = std::f64::consts::LN_2 / half_time;
    p_gas + rate * (time - 1.0 / k) - (p_gas - p0 - rate / k) * (-k * time).exp()
}

/// Bühlmann tolerated ambient pressure for a compartment holding pressure
/// `p` with coefficients `a` and `b`, under gradient factor `gf`.
///
/// At gf = 1 this is the plain (p − a) · b. For gf < 1 the coefficients are
/// scaled as a' = a·gf, b' = gf/b + 1 − gf, tolerating a fraction of the
/// supersaturation the raw model would allow.
pub fn buhlmann_tolerated(p: f64, a: f64, b: f64, gf: f64) -> f64 {
    if gf == 1.0 {
        return (p - a) * b;
    }
    let a = a * gf;
    let b = gf / b + 1.0 - gf;
    (p - a) / b
}
