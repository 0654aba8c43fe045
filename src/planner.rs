//! Shared machinery for the stepwise-ascent planners.
//!
//! Each planner variant runs the same loop shape — hold at a stop in fixed
//! increments, re-query the ceiling, record the stop and step up once it
//! clears — differing only in gas policy. The bookkeeping for that loop
//! lives here, along with the deco-gas operating-depth table used by the
//! open-circuit technical variant.

use crate::error::Defect;
use crate::mix::GasMix;
use crate::profile::{Profile, Segment};
use crate::units::{round_next_stop, Units};

/// Hard cap on hold increments per planned ascent. Hitting it means the
/// model cannot off-gas its way to the surface under the configured rates
/// and steps, which is an engine defect rather than a property of the dive.
pub(crate) const MAX_STOP_ITERATIONS: usize = 10_000;

pub(crate) fn non_convergence() -> Defect {
    Defect::NonConvergence {
        iterations: MAX_STOP_ITERATIONS,
    }
}

/// Accumulates the stop schedule while a planner walks toward the surface.
#[derive(Debug)]
pub(crate) struct StopTracker {
    stops: Vec<Segment>,
    total: f64,
    hold: f64,
}

impl StopTracker {
    pub(crate) fn new() -> Self {
        StopTracker {
            stops: Vec::with_capacity(32),
            total: 0.0,
            hold: 0.0,
        }
    }

    /// Account one hold increment at the current stop.
    pub(crate) fn hold(&mut self, inc: f64) {
        self.hold += inc;
    }

    /// Account travel time between stops.
    pub(crate) fn travel(&mut self, time: f64) {
        self.total += time;
    }

    /// Close out the current stop: record it with the accumulated hold
    /// time and fold that time into the total.
    pub(crate) fn record(&mut self, depth: f64) -> f64 {
        let held = self.hold;
        self.stops.push(Segment::new(depth, held));
        self.total += held;
        self.hold = 0.0;
        held
    }

    pub(crate) fn into_profile(self) -> Profile {
        Profile::with_duration(self.stops, self.total)
    }
}

/// Maximum operating depths for a deco-gas list, rounded onto the stop
/// grid, and the resulting minimum first-stop depth.
///
/// The depth bound comes from the unit system's PO2 ceiling, except that a
/// 32% mix is treated as a recreational gas and held to a 0.5 atm bound.
/// The minimum stop starts at the unit system's technical floor and is
/// raised to the deepest listed gas's operating depth.
pub(crate) fn operating_depths(deco_gases: &[GasMix], units: Units) -> (Vec<f64>, f64) {
    let mut min_stop = units.min_tech_stop();
    let max_po2 = units.max_po2();
    let mods = deco_gases
        .iter()
        .map(|g| {
            let bound = if g.o2() == 0.32 { max_po2 / 0.5 } else { max_po2 / g.o2() };
            let mod_depth = round_next_stop(bound, units);
            if mod_depth > min_stop {
                min_stop = mod_depth;
            }
            mod_depth
        })
        .collect();
    (mods, min_stop)
}

/// Index of the gas to breathe at `stop`, if any listed gas can be.
///
/// Later list entries win ties, so callers order the list lean-to-rich.
pub(crate) fn select_deco_gas(mods: &[f64], stop: f64) -> Option<usize> {
    let mut selected = None;
    for (i, &mod_depth) in mods.iter().enumerate() {
        if stop <= mod_depth {
            selected = Some(i);
        }
    }
    selected
}
