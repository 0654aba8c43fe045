//! Thalmann-style LEM decompression model.
//!
//! Implements the linear-exponential model described in NEDU TR 18-05
//! (December 2018), "Thalmann Algorithm Parameter Sets for Support of
//! Constant 1.3 atm PO2 He-O2 Diving to 300 fsw" (Doolette, Murphy,
//! Gerth). The model tracks total inert-gas loading in a single compartment
//! array, bounds it with a depth-indexed maximum-permissible-tension table,
//! and switches from exponential to linear kinetics near saturation.
//!
//! Fixed to imperial feet and closed-circuit 1.3 atm PO2 diving; the simple
//! and open-circuit planners are rejected as unsupported configurations.

use std::fmt;

use tracing::debug;

use crate::error::{DecoError, Defect};
use crate::kinetics;
use crate::mix::GasMix;
use crate::model::{DecoModel, ModelTrace};
use crate::planner::{non_convergence, StopTracker, MAX_STOP_ITERATIONS};
use crate::profile::Profile;
use crate::units::Units;

// ============================================================================
// Model Constants (NEDU TR 18-05)
// ============================================================================

/// Loop PO2 setpoint below the switch depth during descent (atm).
const LOW_PO2: f64 = 0.7;

/// Loop PO2 setpoint at depth and throughout ascent (atm).
const HIGH_PO2: f64 = 1.3;

/// Descent depth (ft) past which the loop setpoint rises to [`HIGH_PO2`].
const SETPOINT_SWITCH_FT: f64 = 20.0;

/// Deepest modeled depth (ft); the MPT tables hold one entry per 10-ft
/// band from the surface down to this.
const MAX_DEPTH_FT: f64 = 320.0;
const MPT_BANDS: usize = 32;

/// Venous CO2 partial pressure (fsw).
const PV_CO2: f64 = 2.3;
/// Venous O2 partial pressure (fsw).
const PV_O2: f64 = 2.0;
/// Water vapour (fsw); folded into the fixed alveolar budget.
const P_H2O: f64 = 0.0;
/// Back-pressure offset (fsw).
const P_BOVP: f64 = 0.0;
/// Fixed alveolar-gas budget (fsw).
const P_FVG: f64 = PV_O2 + PV_CO2 + P_H2O;

/// Arterial offset subtracted from ambient pressure in the linear regime
/// (fsw); NEDU report EQ 12 and 13.
const ARTERIAL_OFFSET_FSW: f64 = 42.9 + 1.5 + 0.0;

/// Water vapour correction on the ambient pressure used to derive the
/// diluent fraction (atm).
const WATER_VAPOUR_ATM: f64 = 0.063;

/// Descent rate (ft/min).
const DESCENT_RATE_FT_MIN: f64 = 65.0;

/// Ascent rate (ft/min).
const ASCENT_RATE_FT_MIN: f64 = 20.0;

/// Surface tissue tension (fsw). The model carries total tissue tension,
/// which equilibrates to ambient pressure at the surface.
const SURFACE_TENSION_FSW: f64 = 33.0;

/// Half-time (min) and surfacing delay ratio per compartment.
const COMPARTMENTS: [(f64, f64); 9] = [
    (3.0, 1.0),
    (5.0, 1.0),
    (10.0, 1.0),
    (20.0, 1.0),
    (40.0, 0.4),
    (50.0, 1.0),
    (60.0, 0.4),
    (70.0, 1.0),
    (200.0, 1.0),
];

/// Maximum permissible tissue tension (fsw), one row per compartment, one
/// entry per 10-ft band from the surface to 320 ft.
#[rustfmt::skip]
const MPT: [[f64; MPT_BANDS]; 9] = [
    [
        34.00, 34.00, 34.00, 37.22, 58.01, 81.07, 139.66, 139.66,
        139.66, 139.66, 139.66, 139.66, 150.15, 190.52, 239.80, 239.80,
        289.40, 339.00, 388.60, 438.20, 487.80, 537.40, 587.00, 636.60,
        686.20, 735.80, 785.40, 835.00, 884.60, 934.20, 983.80, 1033.40,
    ],
    [
        34.00, 34.00, 34.00, 56.29, 84.49, 103.95, 139.62, 139.66,
        139.66, 139.66, 144.99, 164.44, 183.90, 208.91, 238.72, 238.72,
        284.01, 329.30, 374.59, 419.88, 465.17, 510.46, 555.75, 601.04,
        646.33, 691.62, 736.91, 782.20, 827.49, 872.78, 918.07, 963.36,
    ],
    [
        34.00, 37.70, 65.86, 95.04, 110.33, 120.06, 137.80, 139.42,
        157.15, 170.16, 179.89, 189.62, 199.35, 211.86, 224.66, 230.81,
        251.15, 271.49, 291.83, 312.17, 332.51, 352.85, 373.19, 393.53,
        413.87, 434.21, 454.55, 474.89, 495.23, 515.57, 535.91, 556.25,
    ],
    [
        34.00, 57.29, 90.57, 105.17, 115.58, 121.84, 126.70, 139.33,
        153.92, 161.56, 166.43, 171.29, 176.16, 182.41, 185.48, 190.35,
        195.91, 201.47, 207.03, 212.59, 218.15, 223.71, 229.27, 234.83,
        240.39, 245.95, 251.51, 257.07, 262.63, 268.19, 273.75, 279.31,
    ],
    [
        79.14, 95.81, 112.48, 115.39, 118.31, 121.51, 124.43, 127.62,
        130.54, 131.52, 132.76, 133.56, 134.13, 134.58, 134.68, 134.68,
        134.68, 135.18, 135.68, 136.18, 136.68, 137.18, 137.68, 138.18,
        138.68, 139.18, 139.68, 140.18, 140.68, 141.18, 141.68, 142.18,
    ],
    [
        47.85, 68.69, 89.53, 95.37, 101.76, 104.26, 107.54, 113.93,
        119.77, 121.69, 123.74, 124.91, 125.64, 126.00, 126.00, 126.00,
        126.00, 126.50, 127.00, 127.50, 128.00, 128.50, 129.00, 129.50,
        130.00, 130.50, 131.00, 131.50, 132.00, 132.50, 133.00, 133.50,
    ],
    [
        74.09, 84.75, 95.42, 97.36, 99.46, 101.44, 103.54, 105.52,
        107.30, 107.97, 108.27, 108.40, 108.40, 108.40, 108.40, 108.40,
        108.40, 108.90, 109.40, 109.90, 110.40, 110.90, 111.40, 111.90,
        112.40, 112.90, 113.40, 113.90, 114.40, 114.90, 115.40, 115.90,
    ],
    [
        49.02, 65.72, 82.42, 86.59, 91.16, 92.94, 97.08, 101.57,
        105.08, 105.96, 106.69, 106.92, 106.92, 106.92, 106.92, 106.92,
        106.92, 107.42, 107.92, 108.42, 108.92, 109.42, 109.92, 110.42,
        110.92, 111.42, 111.92, 112.42, 112.92, 113.42, 113.92, 114.42,
    ],
    [
        44.04, 52.62, 61.21, 62.67, 63.91, 64.91, 65.49, 65.73,
        65.73, 65.73, 65.73, 65.73, 65.73, 65.73, 65.73, 65.73,
        65.73, 66.23, 66.73, 67.23, 67.73, 68.23, 68.73, 69.23,
        69.73, 70.23, 70.73, 71.23, 71.73, 72.23, 72.73, 73.23,
    ],
];

// ============================================================================
// Compartments
// ============================================================================

/// One tissue compartment tracking total inert-gas tension (fsw).
#[derive(Debug, Clone)]
struct TissueCompartment {
    pressure: f64,
    /// Half-time in minutes. Divided once by `sdr` at the first ceiling
    /// query when the ratio is not 1.
    half_time: f64,
    /// Surfacing delay ratio: models changed off-gassing efficiency once
    /// the ascent phase begins.
    sdr: f64,
    half_reduced: bool,
    /// One-way switch into the linear/exponential crossover regime.
    linear: bool,
    /// Maximum permissible tissue tension per 10-ft band; entry i bounds
    /// an ascent to depth 10·i.
    mpt: [f64; MPT_BANDS],
}

impl TissueCompartment {
    /// Constant exposure at `depth` for `time` minutes with inspired
    /// inert-gas pressure `p_gas` (all fsw).
    ///
    /// In the linear regime, while ambient pressure sits below the tissue
    /// tension plus the fixed alveolar budget, the tissue is integrated
    /// linearly in ambient pressure; otherwise the exponential solution
    /// applies.
    fn level(&mut self, depth: f64, time: f64, p_gas: f64) -> Result<(), Defect> {
        let exponential =
            kinetics::constant_exposure(self.pressure, self.half_time, time, p_gas)?;

        if self.linear {
            let p_amb = depth + 33.0;
            if p_amb < self.pressure + P_FVG - P_BOVP {
                let k = std::f64::consts::LN_2 / self.half_time;
                let p_a = p_amb - ARTERIAL_OFFSET_FSW;
                self.pressure += (p_a - p_amb + P_FVG - P_BOVP) * time * k;
                return Ok(());
            }
        }
        self.pressure = exponential;
        Ok(())
    }

    /// Shallowest banded depth whose permissible tension exceeds the
    /// current loading; 0 when the compartment tolerates the surface.
    ///
    /// The first call also applies the one-way per-dive transitions: the
    /// surfacing-delay half-time reduction and the switch into the linear
    /// crossover regime.
    fn ceiling(&mut self) -> f64 {
        if self.sdr != 1.0 && !self.half_reduced {
            self.half_time /= self.sdr;
            self.half_reduced = true;
            debug!(half_time = self.half_time, "ceiling: half-time reduced");
        }
        if !self.linear {
            self.linear = true;
            debug!(half_time = self.half_time, "ceiling: switching to linear regime");
        }
        for (i, mpt) in self.mpt.iter().enumerate() {
            if *mpt > self.pressure {
                return (i as f64) * 10.0;
            }
        }
        0.0
    }
}

// ============================================================================
// Model
// ============================================================================

/// A LEM model instance: one planning session's mutable tissue state.
pub struct Lem {
    name: &'static str,
    descent_rate: f64,
    ascent_rate: f64,
    compartments: Vec<TissueCompartment>,
    trace: ModelTrace,
}

/// Inspired diluent inert-gas pressure (fsw) at `depth` for a loop holding
/// `po2` atm of oxygen.
fn dil_pressure_fsw(depth: f64, po2: f64) -> f64 {
    let atm = depth / 33.0 + 1.0 - WATER_VAPOUR_ATM;
    let f_o2 = po2 / atm;
    let f_dil = 1.0 - f_o2;
    f_dil * (depth + 33.0)
}

impl Lem {
    /// XVAL-He-9.040 parameter set, fsw units.
    ///
    /// Nine compartments, each bounded by its row of the banded [`MPT`]
    /// table, with a surfacing-delay ratio on two of the intermediate
    /// compartments.
    pub fn xval_he_9_040_fsw() -> Self {
        Self::xval_he_9_040_fsw_with_trace(ModelTrace::disabled())
    }

    /// XVAL-He-9.040 writing per-operation compartment dumps to `trace`.
    pub fn xval_he_9_040_fsw_with_trace(trace: ModelTrace) -> Self {
        let compartments = COMPARTMENTS
            .iter()
            .zip(MPT.iter())
            .map(|(&(half_time, sdr), mpt)| TissueCompartment {
                pressure: SURFACE_TENSION_FSW,
                half_time,
                sdr,
                half_reduced: false,
                linear: false,
                mpt: *mpt,
            })
            .collect();

        Lem {
            name: "XVAL-He-9.040",
            descent_rate: DESCENT_RATE_FT_MIN,
            ascent_rate: ASCENT_RATE_FT_MIN,
            compartments,
            trace,
        }
    }

    fn trace_state(&mut self, label: &str) {
        if !self.trace.enabled() {
            return;
        }
        let label = if label.is_empty() { "model" } else { label };
        for i in 0..self.compartments.len() {
            let half = self.compartments[i].half_time;
            let p = self.compartments[i].pressure;
            self.trace
                .line(format_args!("{label}: C[{half:6.4}]={p:.4}"));
        }
    }
}

impl fmt::Debug for Lem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lem")
            .field("name", &self.name)
            .field("max_depth", &MAX_DEPTH_FT)
            .field("compartments", &self.compartments.len())
            .finish()
    }
}

impl DecoModel for Lem {
    fn select_units(&mut self, units: Units) -> Result<(), DecoError> {
        match units {
            Units::Feet => Ok(()),
            Units::Metres => Err(DecoError::Unsupported("LEM models imperial feet only")),
        }
    }

    fn descend(&mut self, depth: f64, _mix: &GasMix) -> Result<f64, Defect> {
        // One foot at a time: the loop gas itself changes with depth, so
        // there is no single closed-form jump.
        let mut po2 = LOW_PO2;
        debug!(low = LOW_PO2, high = HIGH_PO2, depth, "descend ccr");
        let mut band = 1.0;
        while band <= depth {
            let time = 1.0 / self.descent_rate;
            let p_gas = dil_pressure_fsw(band, po2);
            for c in &mut self.compartments {
                c.level(band, time, p_gas)?;
            }
            if po2 == LOW_PO2 && band > SETPOINT_SWITCH_FT {
                po2 = HIGH_PO2;
            }
            band += 1.0;
        }
        self.trace_state("descend");
        Ok(depth / self.descent_rate)
    }

    fn level_off(&mut self, time: f64, depth: f64, _mix: &GasMix) -> Result<(), Defect> {
        let p_gas = dil_pressure_fsw(depth, HIGH_PO2);
        debug!(time, depth, p_gas, "leveloff");
        for c in &mut self.compartments {
            c.level(depth, time, p_gas)?;
        }
        self.trace_state("leveloff");
        Ok(())
    }

    fn ascend(&mut self, from: f64, to: f64, _mix: &GasMix) -> Result<f64, Defect> {
        debug!(po2 = HIGH_PO2, from, to, "ascend ccr");
        let mut band = from - 1.0;
        while band >= to {
            let time = 1.0 / self.ascent_rate;
            let p_gas = dil_pressure_fsw(band, HIGH_PO2);
            for c in &mut self.compartments {
                c.level(band, time, p_gas)?;
            }
            band -= 1.0;
        }
        self.trace_state("ascend");
        Ok((from - to) / self.ascent_rate)
    }

    fn ceiling(&mut self) -> f64 {
        let mut deepest = 0.0;
        let mut controlling = 0.0;
        for c in &mut self.compartments {
            let ceil = c.ceiling();
            if ceil > deepest {
                deepest = ceil;
                controlling = c.half_time;
            }
        }
        debug!(ceiling = deepest, controlling, "ceiling");
        deepest
    }

    fn decompress(
        &mut self,
        _from: f64,
        _mix: &GasMix,
        _half_depth: bool,
    ) -> Result<Option<Profile>, DecoError> {
        Err(DecoError::Unsupported(
            "LEM supports closed-circuit decompression only",
        ))
    }

    fn decompress_oc_tech(
        &mut self,
        _from: f64,
        _mix: &GasMix,
        _deco_gases: &[GasMix],
        _last_stop_deep: bool,
        _suggested_inc: f64,
    ) -> Result<Option<Profile>, DecoError> {
        Err(DecoError::Unsupported(
            "LEM supports closed-circuit decompression only",
        ))
    }

    fn decompress_ccr(
        &mut self,
        from: f64,
        diluent: &GasMix,
        _ccr_po2: f64,
        _last_stop_deep: bool,
        _suggested_inc: f64,
    ) -> Result<Option<Profile>, DecoError> {
        let inc = 1.0;

        self.trace_state("deco start");
        let ceil = self.ceiling();
        let mut stop = ceil;
        if stop == 0.0 {
            return Ok(None);
        }

        let mut tracker = StopTracker::new();
        tracker.travel(self.ascend(from, stop, diluent)?);

        // Ceiling might have moved during the ascent.
        let new_ceil = self.ceiling();
        if new_ceil != ceil {
            stop = new_ceil;
            debug!(from = ceil, to = new_ceil, "ceil: resetting");
        }
        if stop == 0.0 {
            return Ok(None);
        }

        for _ in 0..MAX_STOP_ITERATIONS {
            self.level_off(inc, stop, diluent)?;

            let next = self.ceiling();
            // A 20-ft stop is held as an implicit floor while any ceiling
            // remains; tied to the 10-ft table granularity of the source
            // model.
            if next == stop || (stop == 20.0 && next != 0.0) {
                tracker.hold(inc);
            } else {
                tracker.hold(inc);
                self.trace_state(&format!("deco {stop}"));
                tracker.record(stop);

                if next == 0.0 {
                    return Ok(Some(tracker.into_profile()));
                }

                let last = stop;
                stop = if stop - next > 10.0 { stop - 10.0 } else { next };
                tracker.travel(self.ascend(last, stop, diluent)?);
            }
        }
        Err(non_convergence().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_unsupported() {
        let mut m = Lem::xval_he_9_040_fsw();
        assert!(m.select_units(Units::Feet).is_ok());
        assert!(matches!(
            m.select_units(Units::Metres),
            Err(DecoError::Unsupported(_))
        ));
    }

    #[test]
    fn test_open_circuit_planners_unsupported() {
        let heliox = GasMix::heliox(18.0);
        let mut m = Lem::xval_he_9_040_fsw();
        assert!(matches!(
            m.decompress(150.0, &heliox, false),
            Err(DecoError::Unsupported(_))
        ));
        assert!(matches!(
            m.decompress_oc_tech(150.0, &heliox, &[], false, 1.0),
            Err(DecoError::Unsupported(_))
        ));
    }

    #[test]
    fn test_surface_state_has_no_ceiling() {
        let mut m = Lem::xval_he_9_040_fsw();
        assert_eq!(m.ceiling(), 0.0);
    }

    #[test]
    fn test_ceiling_is_idempotent() {
        let heliox = GasMix::heliox(18.0);
        let mut m = Lem::xval_he_9_040_fsw();
        m.descend(150.0, &heliox).unwrap();
        m.level_off(60.0, 150.0, &heliox).unwrap();
        let first = m.ceiling();
        let second = m.ceiling();
        assert!(first > 0.0, "an hour at 150 ft must have a ceiling");
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_way_flags_trigger_once() {
        let heliox = GasMix::heliox(18.0);
        let mut m = Lem::xval_he_9_040_fsw();
        m.descend(150.0, &heliox).unwrap();
        m.level_off(60.0, 150.0, &heliox).unwrap();

        let before: Vec<f64> = m.compartments.iter().map(|c| c.half_time).collect();
        m.ceiling();
        let after_first: Vec<f64> = m.compartments.iter().map(|c| c.half_time).collect();
        m.ceiling();
        let after_second: Vec<f64> = m.compartments.iter().map(|c| c.half_time).collect();

        // Compartments with sdr != 1 lengthen exactly once.
        assert_ne!(before, after_first);
        assert_eq!(after_first, after_second);
        for c in &m.compartments {
            assert!(c.linear);
            assert!(c.half_reduced || c.sdr == 1.0);
        }
    }

    #[test]
    fn test_ceiling_lands_on_10ft_bands() {
        let heliox = GasMix::heliox(18.0);
        let mut m = Lem::xval_he_9_040_fsw();
        m.descend(150.0, &heliox).unwrap();
        m.level_off(60.0, 150.0, &heliox).unwrap();
        let ceil = m.ceiling();
        assert_eq!(ceil % 10.0, 0.0, "got {ceil}");
        assert!(ceil <= MAX_DEPTH_FT);
    }

    #[test]
    fn test_ccr_stops_shoal_and_end_at_20ft() {
        let heliox = GasMix::heliox(18.0);
        let mut m = Lem::xval_he_9_040_fsw();
        m.descend(150.0, &heliox).unwrap();
        m.level_off(60.0, 150.0, &heliox).unwrap();
        let plan = m
            .decompress_ccr(150.0, &heliox, 1.3, true, 8.0)
            .unwrap()
            .expect("an hour at 150 ft must require stops");

        let depths: Vec<f64> = plan.segments.iter().map(|s| s.depth).collect();
        for pair in depths.windows(2) {
            assert!(pair[0] > pair[1], "stops must shoal: {depths:?}");
        }
        // The 20-ft floor rule makes the last stop 20 ft, never 10.
        assert_eq!(*depths.last().unwrap(), 20.0);
        assert!(plan.duration >= plan.segments.iter().map(|s| s.time).sum::<f64>());
    }

    fn ccr_schedule(diluent: &GasMix, depth: f64, bottom_min: f64) -> Vec<(f64, f64)> {
        let mut m = Lem::xval_he_9_040_fsw();
        let dt = m.descend(depth, diluent).unwrap();
        m.level_off(bottom_min - dt, depth, diluent).unwrap();
        let plan = m
            .decompress_ccr(depth, diluent, 1.3, true, 8.0)
            .unwrap()
            .expect("deco required");
        plan.segments.iter().map(|s| (s.depth, s.time)).collect()
    }

    #[test]
    fn test_heliox_150ft_60min_schedule() {
        let stops = ccr_schedule(&GasMix::heliox(18.0), 150.0, 60.0);
        assert_eq!(
            stops,
            [(60.0, 3.0), (50.0, 3.0), (40.0, 5.0), (30.0, 10.0), (20.0, 57.0)]
        );
    }

    #[test]
    fn test_heliox_150ft_90min_schedule() {
        let stops = ccr_schedule(&GasMix::heliox(18.0), 150.0, 90.0);
        assert_eq!(
            stops,
            [
                (70.0, 3.0),
                (60.0, 3.0),
                (50.0, 4.0),
                (40.0, 11.0),
                (30.0, 10.0),
                (20.0, 113.0)
            ]
        );
    }

    #[test]
    fn test_heliox_250ft_40min_schedule() {
        let stops = ccr_schedule(&GasMix::heliox(15.0), 250.0, 40.0);
        assert_eq!(
            stops,
            [
                (140.0, 1.0),
                (130.0, 4.0),
                (120.0, 3.0),
                (110.0, 3.0),
                (100.0, 3.0),
                (90.0, 5.0),
                (80.0, 10.0),
                (70.0, 10.0),
                (60.0, 11.0),
                (50.0, 10.0),
                (40.0, 11.0),
                (30.0, 10.0),
                (20.0, 117.0)
            ]
        );
    }

    #[test]
    fn test_heliox_300ft_30min_schedule() {
        let stops = ccr_schedule(&GasMix::heliox(12.0), 300.0, 30.0);
        assert_eq!(
            stops,
            [
                (160.0, 4.0),
                (150.0, 3.0),
                (140.0, 3.0),
                (130.0, 4.0),
                (120.0, 3.0),
                (110.0, 3.0),
                (100.0, 4.0),
                (90.0, 3.0),
                (80.0, 10.0),
                (70.0, 11.0),
                (60.0, 10.0),
                (50.0, 11.0),
                (40.0, 10.0),
                (30.0, 10.0),
                (20.0, 125.0)
            ]
        );
    }

    #[test]
    fn test_short_shallow_dive_needs_no_deco() {
        let heliox = GasMix::heliox(18.0);
        let mut m = Lem::xval_he_9_040_fsw();
        m.descend(30.0, &heliox).unwrap();
        m.level_off(10.0, 30.0, &heliox).unwrap();
        let plan = m.decompress_ccr(30.0, &heliox, 1.3, false, 1.0).unwrap();
        assert!(plan.is_none());
    }
}
