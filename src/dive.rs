//! Dive session driver.
//!
//! A [`Dive`] owns a model for one planning session: it applies the bottom
//! profile segment by segment (descend, then level off; checking the
//! ceiling before each subsequent segment), then dispatches to the
//! decompression planner selected by its options.

use std::fmt::Write as _;

use crate::error::DecoError;
use crate::mix::{current_ccr_mix, GasMix};
use crate::model::DecoModel;
use crate::profile::Profile;
use crate::units::Units;

/// Closed-circuit setpoints: bottom-phase and deco-phase loop PO2 (atm).
#[derive(Debug, Clone, Copy, PartialEq)]
struct CcrSetpoints {
    bottom_po2: f64,
    deco_po2: f64,
}

/// Planner options fixed at session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiveOptions {
    /// O2 percentage of the primary open-circuit deco gas.
    pub deco_nitrox: f64,
    /// Add pure oxygen on top of the deco-gas list.
    pub use_oxygen: bool,
    /// Fold the shallowest stop into the one above it.
    pub last_stop_deep: bool,
    /// Stop-length increment (minutes) once a deco gas is active, for
    /// rounder stop times.
    pub stop_increment: f64,
}

impl Default for DiveOptions {
    fn default() -> Self {
        DiveOptions {
            deco_nitrox: 50.0,
            use_oxygen: false,
            last_stop_deep: false,
            stop_increment: 1.0,
        }
    }
}

/// One dive: a model, a bottom mix, a bottom profile and the planner
/// configuration. Owns the model for the whole session.
#[derive(Debug)]
pub struct Dive<M: DecoModel> {
    model: M,
    mix: GasMix,
    bottom: Profile,
    deco: Option<Profile>,

    last_depth: f64,
    options: DiveOptions,
    ccr: Option<CcrSetpoints>,
    half_depth: bool,
    simple_deco: bool,
    units: Units,
}

impl<M: DecoModel> Dive<M> {
    pub fn new(model: M, mix: GasMix, bottom: Profile, options: DiveOptions) -> Self {
        Dive {
            model,
            mix,
            bottom,
            deco: None,
            last_depth: 0.0,
            options,
            ccr: None,
            half_depth: false,
            simple_deco: false,
            units: Units::Feet,
        }
    }

    /// Plan as a closed-circuit dive with the given bottom and deco
    /// setpoints.
    pub fn set_ccr(&mut self, bottom_po2: f64, deco_po2: f64) {
        self.ccr = Some(CcrSetpoints {
            bottom_po2,
            deco_po2,
        });
    }

    /// Force the first deco stop to at least half the bottom depth
    /// (simple planner only).
    pub fn use_half_depth(&mut self) {
        self.half_depth = true;
    }

    /// Plan the ascent on the bottom gas alone.
    pub fn use_simple_deco(&mut self) {
        self.simple_deco = true;
    }

    /// Switch the session to metres. Fails on models fixed to feet.
    pub fn use_metres(&mut self) -> Result<(), DecoError> {
        self.model.select_units(Units::Metres)?;
        self.units = Units::Metres;
        Ok(())
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The gas actually breathed at `depth`: the bottom mix, or on CCR the
    /// loop mix derived from the diluent and the bottom setpoint.
    pub fn breathing_mix(&self, depth: f64) -> GasMix {
        match self.ccr {
            None => self.mix,
            Some(sp) => current_ccr_mix(&self.mix, self.units.to_atm(depth), sp.bottom_po2),
        }
    }

    /// Apply the bottom profile to the model.
    ///
    /// The first segment descends from the surface; later segments travel
    /// from the previous depth, failing with [`DecoError::CeilingViolation`]
    /// if they sit above the current ceiling. Every segment must last at
    /// least as long as the travel into it.
    pub fn run(&mut self) -> Result<(), DecoError> {
        self.last_depth = 0.0;
        let mut total = 0.0;

        // Locals so the segment borrow does not pin the whole struct.
        let ccr = self.ccr;
        let bottom_mix = self.mix;
        let units = self.units;

        for (i, s) in self.bottom.segments.iter().enumerate() {
            let mix = match ccr {
                None => bottom_mix,
                Some(sp) => current_ccr_mix(&bottom_mix, units.to_atm(s.depth), sp.bottom_po2),
            };

            if i == 0 {
                let dt = self.model.descend(s.depth, &mix)?;
                // Segment times include travel; a segment shorter than its
                // own travel would integrate a negative level-off.
                if s.time < dt {
                    return Err(DecoError::SegmentTooShort {
                        depth: s.depth,
                        time: s.time,
                        travel: dt,
                    });
                }
                self.model.level_off(s.time - dt, s.depth, &mix)?;
            } else {
                let ceiling = self.model.ceiling();
                if s.depth < ceiling {
                    return Err(DecoError::CeilingViolation {
                        depth: s.depth,
                        ceiling,
                    });
                }
                let at = self.model.ascend(self.last_depth, s.depth, &mix)?;
                if s.time < at {
                    return Err(DecoError::SegmentTooShort {
                        depth: s.depth,
                        time: s.time,
                        travel: at,
                    });
                }
                self.model.level_off(s.time - at, s.depth, &mix)?;
            }
            total += s.time;
            self.last_depth = s.depth;
        }
        self.bottom.duration = total;
        Ok(())
    }

    /// Plan the return to the surface with the configured planner variant.
    ///
    /// Returns the stop schedule, or `None` when no decompression is
    /// required. The schedule is also retained on the session for
    /// [`summary`](Dive::summary).
    pub fn decompress(&mut self) -> Result<Option<&Profile>, DecoError> {
        let plan = if let Some(sp) = self.ccr {
            self.model.decompress_ccr(
                self.last_depth,
                &self.mix,
                sp.deco_po2,
                self.options.last_stop_deep,
                self.options.stop_increment,
            )?
        } else if self.simple_deco {
            self.model
                .decompress(self.last_depth, &self.mix, self.half_depth)?
        } else {
            let mut deco_gases = vec![GasMix::nitrox(self.options.deco_nitrox)];
            if self.options.use_oxygen {
                deco_gases.push(GasMix::nitrox(100.0));
            }
            self.model.decompress_oc_tech(
                self.last_depth,
                &self.mix,
                &deco_gases,
                self.options.last_stop_deep,
                self.options.stop_increment,
            )?
        };
        self.deco = plan;
        Ok(self.deco.as_ref())
    }

    /// Human-readable plan: bottom profile, stop schedule, total deco and
    /// runtime.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "mix {}", self.mix);
        let _ = writeln!(out, "profile");
        let _ = write!(out, "{}", self.bottom);
        match &self.deco {
            Some(deco) => {
                if self.ccr.is_some() {
                    let _ = writeln!(out, "deco ccr");
                } else if !self.simple_deco {
                    let _ = writeln!(
                        out,
                        "deco using {} inc {}",
                        self.options.deco_nitrox, self.options.stop_increment
                    );
                }
                let _ = write!(out, "{deco}");
                let _ = writeln!(
                    out,
                    "total deco {} runtime {}",
                    deco.duration.round(),
                    (self.bottom.duration + deco.duration).round()
                );
            }
            None => {
                let _ = writeln!(out, "no deco runtime {}", self.bottom.duration.round());
            }
        }
        out
    }
}
