//! Depth and ambient-pressure conversion.
//!
//! Depths are expressed in feet or metres of seawater; ambient pressure in
//! atmospheres. The conversions use the planning approximations 33 fsw/atm
//! and 10 msw/atm, matching the published tables the models were fit to.

/// Unit system a model operates in. Controls depth/pressure conversion and
/// the discrete stop increment used when rounding ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Feet,
    Metres,
}

impl Units {
    /// Discrete stop increment: 10 ft or 3 m.
    pub fn step(&self) -> f64 {
        match self {
            Units::Feet => 10.0,
            Units::Metres => 3.0,
        }
    }

    /// Shallowest depth considered for the first technical stop before the
    /// deco-gas operating depths are taken into account: 70 ft or 21 m.
    pub fn min_tech_stop(&self) -> f64 {
        match self {
            Units::Feet => 70.0,
            Units::Metres => 21.0,
        }
    }

    /// PO2 bound used to derive a deco gas's maximum operating depth.
    pub fn max_po2(&self) -> f64 {
        match self {
            Units::Feet => 1.56,
            Units::Metres => 1.5,
        }
    }

    /// Depth to absolute ambient pressure (atm).
    pub fn to_atm(&self, depth: f64) -> f64 {
        match self {
            Units::Feet => (depth + 33.0) / 33.0,
            Units::Metres => (depth + 10.0) / 10.0,
        }
    }

    /// Absolute ambient pressure (atm) to depth.
    pub fn from_atm(&self, atm: f64) -> f64 {
        match self {
            Units::Feet => atm * 33.0 - 33.0,
            Units::Metres => atm * 10.0 - 10.0,
        }
    }
}

/// Round an ambient pressure up to the next discrete stop depth.
///
/// Anything at or above the surface (≤ 1 atm) rounds to 0; otherwise the
/// result is the smallest multiple of the unit step that is at least the
/// equivalent depth.
pub fn round_next_stop(atm: f64, units: Units) -> f64 {
    let depth = units.from_atm(atm);
    if depth <= 0.0 {
        return 0.0;
    }
    let step = units.step();
    let bands = (depth / step).ceil();
    (bands * step).max(step)
}
