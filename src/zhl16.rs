//! Bühlmann ZHL-16C decompression model.
//!
//! Implements the multi-compartment exponential model from Bühlmann,
//! Albert A. (1984), "Decompression — Decompression Sickness", with the
//! Baker gradient-factor extension. Sixteen compartments are tracked per
//! inert gas; index i in the nitrogen and helium arrays is the same
//! physiological compartment, which the mixed-gas ceiling relies on.

use std::fmt;
use std::ops::{Index, IndexMut};

use tracing::debug;

use crate::error::{DecoError, Defect};
use crate::kinetics;
use crate::mix::{current_ccr_mix, GasMix, InertGas};
use crate::model::{DecoModel, ModelTrace};
use crate::planner::{
    non_convergence, operating_depths, select_deco_gas, StopTracker, MAX_STOP_ITERATIONS,
};
use crate::profile::Profile;
use crate::units::{round_next_stop, Units};

// ============================================================================
// Physical Constants
// ============================================================================

/// Water vapour correction applied to ambient pressure (atm), at 37°C.
const WATER_VAPOUR_ATM: f64 = 0.063;

/// Fraction of N2 in air, for surface equilibrium.
const AIR_FN2: f64 = 0.79;

/// Default descent rate in atm/min (66 ft/min).
const DESCENT_RATE_ATM_MIN: f64 = 2.0;

/// Default ascent rate in atm/min (33 ft/min).
const ASCENT_RATE_ATM_MIN: f64 = 1.0;

// ============================================================================
// ZHL-16C Compartment Constants (Bühlmann / Baker)
// ============================================================================

/// Number of tissue compartments.
const NUM_COMPARTMENTS: usize = 16;

/// N2 half-times in minutes for compartments 1–16 (ZHL-16C).
const N2_HALF_TIMES: [f64; NUM_COMPARTMENTS] = [
    5.0, 8.0, 12.5, 18.5, 27.0, 38.3, 54.3, 77.0, 109.0, 146.0, 187.0, 239.0, 305.0, 390.0, 498.0,
    635.0,
];

/// He half-times in minutes for compartments 1–16 (ZHL-16C).
const HE_HALF_TIMES: [f64; NUM_COMPARTMENTS] = [
    1.88, 3.02, 4.72, 6.99, 10.21, 14.48, 20.53, 29.11, 41.20, 55.19, 70.69, 90.34, 115.29, 147.42,
    188.24, 240.03,
];

/// N2 'a' coefficients (atm) for ZHL-16C.
const A_N2: [f64; NUM_COMPARTMENTS] = [
    1.1696, 1.0000, 0.8618, 0.7562, 0.6200, 0.5043, 0.4410, 0.4000, 0.3750, 0.3500, 0.3295, 0.3065,
    0.2835, 0.2610, 0.2480, 0.2327,
];

/// N2 'b' coefficients (dimensionless) for ZHL-16C.
const B_N2: [f64; NUM_COMPARTMENTS] = [
    0.5578, 0.6514, 0.7222, 0.7825, 0.8126, 0.8434, 0.8693, 0.8910, 0.9092, 0.9222, 0.9319, 0.9403,
    0.9477, 0.9544, 0.9602, 0.9653,
];

/// He 'a' coefficients (atm). Compartments 6-8 sit above Bühlmann's
/// published values; they carry the helium tolerance this engine's
/// reference stop tables were generated with.
const A_HE: [f64; NUM_COMPARTMENTS] = [
    1.6189, 1.3830, 1.1919, 1.0458, 0.9220, 0.8600, 0.7910, 0.7120, 0.5950, 0.5545, 0.5333, 0.5189,
    0.5181, 0.5176, 0.5172, 0.5119,
];

/// He 'b' coefficients (dimensionless) for ZHL-16C.
const B_HE: [f64; NUM_COMPARTMENTS] = [
    0.4770, 0.5747, 0.6527, 0.7223, 0.7582, 0.7957, 0.8279, 0.8553, 0.8757, 0.8903, 0.8997, 0.9073,
    0.9122, 0.9171, 0.9217, 0.9267,
];

// ============================================================================
// Compartments
// ============================================================================

/// One tissue compartment for one inert gas.
#[derive(Debug, Clone, Copy)]
struct Compartment {
    /// Current tissue partial pressure (atm). Never negative.
    pressure: f64,
    /// Half-time in minutes.
    half_time: f64,
    a: f64,
    b: f64,
}

impl Compartment {
    fn level(&mut self, time: f64, p_gas: f64) -> Result<(), Defect> {
        self.pressure = kinetics::constant_exposure(self.pressure, self.half_time, time, p_gas)?;
        Ok(())
    }

    fn ramp(&mut self, time: f64, p_gas: f64, rate: f64) {
        self.pressure = kinetics::linear_exposure(self.pressure, self.half_time, time, p_gas, rate);
    }

    fn tolerated(&self, gf: f64) -> f64 {
        kinetics::buhlmann_tolerated(self.pressure, self.a, self.b, gf)
    }
}

/// Per-gas compartment arrays with positional correspondence: index i is
/// the same physiological compartment in both.
#[derive(Debug, Clone)]
struct GasCompartments {
    nitrogen: [Compartment; NUM_COMPARTMENTS],
    helium: [Compartment; NUM_COMPARTMENTS],
}

impl Index<InertGas> for GasCompartments {
    type Output = [Compartment; NUM_COMPARTMENTS];

    fn index(&self, gas: InertGas) -> &Self::Output {
        match gas {
            InertGas::Nitrogen => &self.nitrogen,
            InertGas::Helium => &self.helium,
        }
    }
}

impl IndexMut<InertGas> for GasCompartments {
    fn index_mut(&mut self, gas: InertGas) -> &mut Self::Output {
        match gas {
            InertGas::Nitrogen => &mut self.nitrogen,
            InertGas::Helium => &mut self.helium,
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// A ZHL-16C model instance: one planning session's mutable tissue state.
pub struct Zhl16 {
    name: &'static str,
    units: Units,

    // One-shot capture of whether the dive breathes a helium mix, taken at
    // the first exposure. Controls the ceiling path for the whole session.
    check_mix: bool,
    is_mix: bool,

    // Gradient factor ramp. `g_inc` stays 0 until the first stop.
    low: f64,
    high: f64,
    gradient: f64,
    g_inc: f64,

    descent_rate: f64,
    ascent_rate: f64,

    compartments: GasCompartments,
    trace: ModelTrace,
}

impl Zhl16 {
    /// ZHL-16C model with the given gradient-factor bounds and no trace.
    pub fn zhl16c(gf_low: f64, gf_high: f64) -> Self {
        Self::zhl16c_with_trace(gf_low, gf_high, ModelTrace::disabled())
    }

    /// ZHL-16C model writing per-operation compartment dumps to `trace`.
    pub fn zhl16c_with_trace(gf_low: f64, gf_high: f64, trace: ModelTrace) -> Self {
        let surface_n2 = (1.0 - WATER_VAPOUR_ATM) * AIR_FN2;
        let nitrogen = std::array::from_fn(|i| Compartment {
            pressure: surface_n2,
            half_time: N2_HALF_TIMES[i],
            a: A_N2[i],
            b: B_N2[i],
        });
        let helium = std::array::from_fn(|i| Compartment {
            pressure: 0.0,
            half_time: HE_HALF_TIMES[i],
            a: A_HE[i],
            b: B_HE[i],
        });
        Zhl16 {
            name: "ZHL16C",
            units: Units::Feet,
            check_mix: true,
            is_mix: false,
            low: gf_low,
            high: gf_high,
            gradient: gf_low,
            g_inc: 0.0,
            descent_rate: DESCENT_RATE_ATM_MIN,
            ascent_rate: ASCENT_RATE_ATM_MIN,
            compartments: GasCompartments { nitrogen, helium },
            trace,
        }
    }

    /// Current gradient factor. Equals the "low" bound until the first stop
    /// and ramps toward the "high" bound across stop transitions.
    pub fn gradient(&self) -> f64 {
        self.gradient
    }

    /// First exposure fixes whether this session is treated as a
    /// helium-mix dive. One-way for the life of the model.
    fn capture_mix(&mut self, mix: &GasMix) {
        if self.check_mix {
            self.check_mix = false;
            self.is_mix = mix.is_mix();
        }
    }

    /// Initialize the gradient ramp at the first stop: one increment per
    /// discrete step remaining to the surface. Idempotent.
    fn set_delta_gradient(&mut self, steps: f64) {
        if self.g_inc != 0.0 {
            return;
        }
        if self.low < self.high && steps != 0.0 {
            let inc = (self.high - self.low) / steps;
            self.g_inc = inc;
            self.gradient = self.low + inc;
        }
    }

    fn increase_gradient(&mut self) {
        if self.low < self.high && self.g_inc != 0.0 {
            self.gradient += self.g_inc;
        }
    }

    fn trace_state(&mut self, label: &str) {
        if !self.trace.enabled() {
            return;
        }
        let label = if label.is_empty() { "model" } else { label };
        for i in 0..NUM_COMPARTMENTS {
            let n2 = self.compartments.nitrogen[i].pressure;
            let he = self.compartments.helium[i].pressure;
            let total = n2 + he;
            self.trace
                .line(format_args!("{label}: C[{i}]={total:.6} N2={n2:.6} He={he:.6}"));
        }
    }

    /// Ceiling of the most loaded compartment, in atm, before stop
    /// rounding. Also reports the controlling compartment index.
    fn raw_ceiling(&self) -> (f64, Option<usize>) {
        // Nothing above 1 atm matters; the surface is always tolerable
        // below that.
        let mut limit = 1.0;
        let mut controlling = None;

        if self.is_mix {
            for i in 0..NUM_COMPARTMENTS {
                let mut a = 0.0;
                let mut b = 0.0;
                let mut p = 0.0;
                // Pressure-weighted coefficients: total tension, not any
                // single gas, governs the compartment's ceiling.
                for gas in InertGas::ALL {
                    let c = &self.compartments[gas][i];
                    p += c.pressure;
                    a += c.a * c.pressure;
                    b += c.b * c.pressure;
                }
                a /= p;
                b /= p;
                let tolerated = kinetics::buhlmann_tolerated(p, a, b, self.gradient);
                if tolerated > limit {
                    limit = tolerated;
                    controlling = Some(i);
                }
            }
        } else {
            for gas in InertGas::ALL {
                for (i, c) in self.compartments[gas].iter().enumerate() {
                    let tolerated = c.tolerated(self.gradient);
                    if tolerated > limit {
                        limit = tolerated;
                        controlling = Some(i);
                    }
                }
            }
        }

        (limit, controlling)
    }
}

impl fmt::Debug for Zhl16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zhl16")
            .field("name", &self.name)
            .field("units", &self.units)
            .field("gf", &(self.low, self.high, self.gradient))
            .field("is_mix", &self.is_mix)
            .finish()
    }
}

impl DecoModel for Zhl16 {
    fn select_units(&mut self, units: Units) -> Result<(), DecoError> {
        self.units = units;
        Ok(())
    }

    fn descend(&mut self, depth: f64, mix: &GasMix) -> Result<f64, Defect> {
        let to = self.units.to_atm(depth);
        let rate = self.descent_rate;
        let time = (to - 1.0) / rate;

        debug!(mix = %mix, time, rate, "descend");
        for gas in InertGas::ALL {
            let p_gas = mix.fraction(gas) * (to - WATER_VAPOUR_ATM);
            let r_gas = mix.fraction(gas) * rate;
            for c in self.compartments[gas].iter_mut() {
                c.ramp(time, p_gas, r_gas);
            }
        }
        self.capture_mix(mix);
        self.trace_state("descend");
        Ok(time)
    }

    fn level_off(&mut self, time: f64, depth: f64, mix: &GasMix) -> Result<(), Defect> {
        let atm = self.units.to_atm(depth);

        debug!(mix = %mix, time, depth, "leveloff");
        for gas in InertGas::ALL {
            let p_gas = mix.fraction(gas) * (atm - WATER_VAPOUR_ATM);
            for c in self.compartments[gas].iter_mut() {
                c.level(time, p_gas)?;
            }
        }
        self.capture_mix(mix);
        self.trace_state("leveloff");
        Ok(())
    }

    fn ascend(&mut self, from: f64, to: f64, mix: &GasMix) -> Result<f64, Defect> {
        let from_atm = self.units.to_atm(from);
        let to_atm = self.units.to_atm(to);
        let time = (from_atm - to_atm) / self.ascent_rate;
        let rate = -self.ascent_rate;

        debug!(mix = %mix, from, to, time, rate, "ascend");
        for gas in InertGas::ALL {
            let p_gas = mix.fraction(gas) * (to_atm - WATER_VAPOUR_ATM);
            let r_gas = mix.fraction(gas) * rate;
            for c in self.compartments[gas].iter_mut() {
                c.ramp(time, p_gas, r_gas);
            }
        }
        self.capture_mix(mix);
        self.trace_state("ascend");
        Ok(time)
    }

    fn ceiling(&mut self) -> f64 {
        let (limit, controlling) = self.raw_ceiling();
        if let Some(i) = controlling {
            debug!(
                compartment = i,
                gradient = self.gradient,
                tolerated_atm = limit,
                "ceiling"
            );
        }
        round_next_stop(limit, self.units)
    }

    fn decompress(
        &mut self,
        from: f64,
        mix: &GasMix,
        half_depth: bool,
    ) -> Result<Option<Profile>, DecoError> {
        let step = self.units.step();
        let inc = 1.0;

        self.trace_state("");
        let ceil = self.ceiling();
        let mut stop = ceil;
        debug!(ceil, stop, "deco start");
        if stop == 0.0 {
            return Ok(None);
        }

        if half_depth && stop < from / 2.0 {
            stop = round_next_stop(self.units.to_atm(from / 2.0), self.units);
        }

        let mut tracker = StopTracker::new();
        tracker.travel(self.ascend(from, stop, mix)?);

        self.set_delta_gradient(stop / step);

        for _ in 0..MAX_STOP_ITERATIONS {
            self.level_off(inc, stop, mix)?;

            let next = self.ceiling();
            debug!(ceil = next, stop, "ceil");

            if next == stop {
                tracker.hold(inc);
            } else {
                tracker.hold(inc);
                self.trace_state("");
                tracker.record(stop);

                if next == 0.0 {
                    return Ok(Some(tracker.into_profile()));
                }

                let last = stop;
                // The simple planner walks one step at a time even when the
                // ceiling has cleared more than one.
                stop = if stop - step == next { next } else { stop - step };
                tracker.travel(self.ascend(last, stop, mix)?);
                self.increase_gradient();
            }
        }
        Err(non_convergence().into())
    }

    fn decompress_oc_tech(
        &mut self,
        from: f64,
        mix: &GasMix,
        deco_gases: &[GasMix],
        last_stop_deep: bool,
        suggested_inc: f64,
    ) -> Result<Option<Profile>, DecoError> {
        let step = self.units.step();
        let (mods, min_stop) = operating_depths(deco_gases, self.units);

        let mut gas = *mix;
        let mut inc = 1.0;

        self.trace_state("deco start");
        let ceil = self.ceiling();
        let mut stop = ceil;
        debug!(ceil, stop, gradient = self.gradient, "deco start");
        if stop == 0.0 {
            return Ok(None);
        }
        if stop < min_stop {
            stop = min_stop;
        }

        let mut tracker = StopTracker::new();
        tracker.travel(self.ascend(from, stop, &gas)?);

        // Ceiling might have moved during the ascent.
        let new_ceil = self.ceiling();
        if new_ceil != ceil {
            stop = new_ceil;
            debug!(ceil = new_ceil, stop, "ceil: resetting");
        }
        if stop == 0.0 {
            return Ok(None);
        }
        if stop < min_stop {
            stop = min_stop;
        }

        if let Some(i) = select_deco_gas(&mods, stop) {
            gas = deco_gases[i];
            inc = suggested_inc;
        }

        if last_stop_deep {
            self.set_delta_gradient(stop / step - 1.0);
        } else {
            self.set_delta_gradient(stop / step);
        }

        for _ in 0..MAX_STOP_ITERATIONS {
            self.level_off(inc, stop, &gas)?;

            let next = self.ceiling();
            debug!(ceil = next, stop, gradient = self.gradient, "ceil");

            // Under last-stop-deep, the shallowest stop is folded into the
            // one above it: keep holding while only one step remains.
            if next == stop || (last_stop_deep && stop == 2.0 * step && next == step) {
                tracker.hold(inc);
            } else {
                tracker.hold(inc);
                self.trace_state(&format!("deco {stop}"));
                tracker.record(stop);

                if next == 0.0 {
                    return Ok(Some(tracker.into_profile()));
                }

                let last = stop;
                stop = if stop - next > step { stop - step } else { next };
                tracker.travel(self.ascend(last, stop, &gas)?);
                self.increase_gradient();

                if let Some(i) = select_deco_gas(&mods, stop) {
                    gas = deco_gases[i];
                    inc = suggested_inc;
                }
            }
        }
        Err(non_convergence().into())
    }

    fn decompress_ccr(
        &mut self,
        from: f64,
        diluent: &GasMix,
        ccr_po2: f64,
        last_stop_deep: bool,
        suggested_inc: f64,
    ) -> Result<Option<Profile>, DecoError> {
        let step = self.units.step();
        let min_stop = self.units.min_tech_stop();
        let mut inc = 1.0;

        self.trace_state("deco start");
        let ceil = self.ceiling();
        let mut stop = ceil;
        debug!(ceil, stop, "deco start");
        if stop == 0.0 {
            return Ok(None);
        }
        if stop < min_stop {
            stop = min_stop;
        }

        let loop_mix = current_ccr_mix(diluent, self.units.to_atm(stop), ccr_po2);

        let mut tracker = StopTracker::new();
        tracker.travel(self.ascend(from, stop, &loop_mix)?);

        // Ceiling might have moved during the ascent.
        let new_ceil = self.ceiling();
        if new_ceil != ceil {
            stop = new_ceil;
            debug!(ceil = new_ceil, stop, "ceil: resetting");
        }
        if stop == 0.0 {
            return Ok(None);
        }
        if stop < min_stop {
            stop = min_stop;
        }

        if stop <= 2.0 * step || stop <= min_stop {
            inc = suggested_inc;
        }

        if last_stop_deep {
            self.set_delta_gradient(stop / step - 1.0);
        } else {
            self.set_delta_gradient(stop / step);
        }

        for _ in 0..MAX_STOP_ITERATIONS {
            let loop_mix = current_ccr_mix(diluent, self.units.to_atm(stop), ccr_po2);
            self.level_off(inc, stop, &loop_mix)?;

            let next = self.ceiling();
            debug!(ceil = next, stop, "ceil");

            if next == stop || (last_stop_deep && stop == 2.0 * step && next == step) {
                tracker.hold(inc);
            } else {
                tracker.hold(inc);
                self.trace_state(&format!("deco {stop}"));
                tracker.record(stop);

                if next == 0.0 {
                    return Ok(Some(tracker.into_profile()));
                }

                let last = stop;
                stop = if stop - next > step { stop - step } else { next };
                tracker.travel(self.ascend(last, stop, diluent)?);
                self.increase_gradient();

                if stop <= 2.0 * step || stop <= min_stop {
                    inc = suggested_inc;
                }
            }
        }
        Err(non_convergence().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_equilibrium_has_no_ceiling() {
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        assert_eq!(m.ceiling(), 0.0);
    }

    #[test]
    fn test_ceiling_is_idempotent() {
        let air = GasMix::nitrox(21.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(130.0, &air).unwrap();
        m.level_off(25.0, 130.0, &air).unwrap();
        let first = m.ceiling();
        let second = m.ceiling();
        assert!(first > 0.0, "25 min at 130 ft on air must have a ceiling");
        assert_eq!(first, second);
    }

    #[test]
    fn test_ceiling_rises_on_stop_grid() {
        let ean32 = GasMix::nitrox(32.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(100.0, &ean32).unwrap();
        m.level_off(30.0, 100.0, &ean32).unwrap();
        let ceil = m.ceiling();
        assert!(ceil > 0.0);
        assert_eq!(ceil % 10.0, 0.0, "feet ceilings land on 10 ft bands");
    }

    #[test]
    fn test_loading_increases_with_time() {
        let air = GasMix::nitrox(21.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(100.0, &air).unwrap();
        let before = m.compartments.nitrogen[0].pressure;
        m.level_off(10.0, 100.0, &air).unwrap();
        let after = m.compartments.nitrogen[0].pressure;
        assert!(after > before, "bottom time must load tissue: {before} -> {after}");
    }

    #[test]
    fn test_helium_only_loads_on_mix() {
        let ean32 = GasMix::nitrox(32.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(100.0, &ean32).unwrap();
        m.level_off(30.0, 100.0, &ean32).unwrap();
        for c in &m.compartments.helium {
            assert_eq!(c.pressure, 0.0);
        }
        assert!(!m.is_mix);

        let tmx = GasMix::trimix(21.0, 35.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(100.0, &tmx).unwrap();
        m.level_off(30.0, 100.0, &tmx).unwrap();
        assert!(m.is_mix);
        assert!(m.compartments.helium[0].pressure > 0.0);
    }

    #[test]
    fn test_mix_capture_is_one_way() {
        // First exposure decides the ceiling path for the whole session.
        let tmx = GasMix::trimix(21.0, 35.0);
        let ean50 = GasMix::nitrox(50.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(100.0, &tmx).unwrap();
        assert!(m.is_mix);
        m.level_off(10.0, 100.0, &ean50).unwrap();
        assert!(m.is_mix, "switching to nitrox must not clear the mix flag");
    }

    #[test]
    fn test_gradient_ramp_initializes_once() {
        let mut m = Zhl16::zhl16c(0.30, 0.90);
        assert_eq!(m.gradient(), 0.30);
        m.set_delta_gradient(6.0);
        let first = m.gradient();
        assert!((first - 0.40).abs() < 1e-12, "low + (high-low)/6, got {first}");
        // Second initialization attempt is ignored.
        m.set_delta_gradient(2.0);
        assert_eq!(m.gradient(), first);
        m.increase_gradient();
        assert!((m.gradient() - 0.50).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_ramp_reaches_high_bound() {
        let mut m = Zhl16::zhl16c(0.30, 0.90);
        m.set_delta_gradient(6.0);
        for _ in 0..5 {
            m.increase_gradient();
        }
        assert!((m.gradient() - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_descend_returns_travel_time() {
        let air = GasMix::nitrox(21.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        // 66 ft is 2 atm of gauge span at 2 atm/min.
        let t = m.descend(66.0, &air).unwrap();
        assert!((t - 1.0).abs() < 1e-9, "got {t}");
    }

    #[test]
    fn test_ascend_offloads_fast_compartment() {
        let air = GasMix::nitrox(21.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(130.0, &air).unwrap();
        m.level_off(30.0, 130.0, &air).unwrap();
        let loaded = m.compartments.nitrogen[0].pressure;
        m.ascend(130.0, 20.0, &air).unwrap();
        let after = m.compartments.nitrogen[0].pressure;
        assert!(
            after < loaded,
            "fast compartment should off-gas on ascent: {loaded} -> {after}"
        );
    }

    #[test]
    fn test_no_deco_dive_yields_empty_plan() {
        let ean32 = GasMix::nitrox(32.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(30.0, &ean32).unwrap();
        m.level_off(20.0, 30.0, &ean32).unwrap();
        let plan = m.decompress(30.0, &ean32, true).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_stop_depths_strictly_decrease() {
        let ean32 = GasMix::nitrox(32.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.descend(100.0, &ean32).unwrap();
        m.level_off(30.0, 100.0, &ean32).unwrap();
        let plan = m
            .decompress(100.0, &ean32, false)
            .unwrap()
            .expect("30 min at 100 ft must require stops");
        let depths: Vec<f64> = plan.segments.iter().map(|s| s.depth).collect();
        for pair in depths.windows(2) {
            assert!(pair[0] > pair[1], "stops must shoal: {depths:?}");
        }
        assert!(plan.duration >= plan.segments.iter().map(|s| s.time).sum::<f64>());
    }

    #[test]
    fn test_metric_stops_on_3m_grid() {
        let ean32 = GasMix::nitrox(32.0);
        let mut m = Zhl16::zhl16c(0.30, 0.95);
        m.select_units(Units::Metres).unwrap();
        m.descend(40.0, &ean32).unwrap();
        m.level_off(25.0, 40.0, &ean32).unwrap();
        let plan = m
            .decompress(40.0, &ean32, false)
            .unwrap()
            .expect("25 min at 40 m must require stops");
        for s in &plan.segments {
            assert_eq!(s.depth % 3.0, 0.0, "metric stops land on 3 m bands");
        }
    }
}
