//! Breathing-gas mixtures.
//!
//! A [`GasMix`] is an immutable value object built from whole O2/He
//! percentages. Inert fractions are stored per [`InertGas`] in a fixed
//! structure rather than a map: the mixed-gas ceiling computation depends on
//! every gas's compartment array being walked in the same order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inert gases tracked by the models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InertGas {
    Nitrogen,
    Helium,
}

impl InertGas {
    /// Stable iteration order used everywhere compartments are walked.
    pub const ALL: [InertGas; 2] = [InertGas::Nitrogen, InertGas::Helium];
}

/// A diving mix: nitrox, heliox or trimix.
///
/// Fractions are in 0–1 and sum to 1. `is_mix` marks helium-bearing mixes;
/// it is set by the constructor, not by the helium content, so a "trimix"
/// blended down to 0% He still drives the mixed-gas ceiling path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasMix {
    o2: f64,
    nitrogen: f64,
    helium: f64,
    is_mix: bool,
}

impl GasMix {
    /// Nitrox from an O2 percentage; the balance is nitrogen.
    pub fn nitrox(o2_pct: f64) -> Self {
        GasMix {
            o2: o2_pct / 100.0,
            nitrogen: (100.0 - o2_pct) / 100.0,
            helium: 0.0,
            is_mix: false,
        }
    }

    /// Heliox from an O2 percentage; the balance is helium.
    pub fn heliox(o2_pct: f64) -> Self {
        GasMix {
            o2: o2_pct / 100.0,
            nitrogen: 0.0,
            helium: (100.0 - o2_pct) / 100.0,
            is_mix: true,
        }
    }

    /// Trimix from independent O2 and He percentages; the balance is nitrogen.
    pub fn trimix(o2_pct: f64, he_pct: f64) -> Self {
        GasMix {
            o2: o2_pct / 100.0,
            nitrogen: (100.0 - o2_pct - he_pct) / 100.0,
            helium: he_pct / 100.0,
            is_mix: true,
        }
    }

    pub fn o2(&self) -> f64 {
        self.o2
    }

    /// Fraction of the given inert gas.
    pub fn fraction(&self, gas: InertGas) -> f64 {
        match gas {
            InertGas::Nitrogen => self.nitrogen,
            InertGas::Helium => self.helium,
        }
    }

    /// Whether this is a helium-bearing mix (heliox/trimix) as opposed to
    /// plain nitrox.
    pub fn is_mix(&self) -> bool {
        self.is_mix
    }
}

impl fmt::Display for GasMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.o2 * 100.0,
            self.nitrogen * 100.0,
            self.helium * 100.0
        )
    }
}

/// Derive the gas a closed-circuit loop delivers from its diluent.
///
/// The loop holds O2 at `po2` atm, so the O2 fraction is `po2 / atm`, capped
/// at 1.0 when shallower than the setpoint allows. The remainder is diluent,
/// split between helium and nitrogen in the diluent's own ratio. The result
/// is rounded to whole percentages, as a real blender would report it.
pub fn current_ccr_mix(diluent: &GasMix, atm: f64, po2: f64) -> GasMix {
    let f_o2 = (po2 / atm).min(1.0);
    let f_dil = 1.0 - f_o2;
    let f_he = f_dil * diluent.fraction(InertGas::Helium);
    if f_he == 0.0 {
        GasMix::nitrox((f_o2 * 100.0).round())
    } else {
        GasMix::trimix((f_o2 * 100.0).round(), (f_he * 100.0).round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nitrox_fractions() {
        let ean32 = GasMix::nitrox(32.0);
        assert!((ean32.o2() - 0.32).abs() < 1e-12);
        assert!((ean32.fraction(InertGas::Nitrogen) - 0.68).abs() < 1e-12);
        assert_eq!(ean32.fraction(InertGas::Helium), 0.0);
        assert!(!ean32.is_mix());
    }

    #[test]
    fn test_heliox_fractions() {
        let heliox = GasMix::heliox(18.0);
        assert!((heliox.o2() - 0.18).abs() < 1e-12);
        assert_eq!(heliox.fraction(InertGas::Nitrogen), 0.0);
        assert!((heliox.fraction(InertGas::Helium) - 0.82).abs() < 1e-12);
        assert!(heliox.is_mix());
    }

    #[test]
    fn test_trimix_fractions_sum_to_one() {
        let tmx = GasMix::trimix(21.0, 35.0);
        let sum = tmx.o2()
            + tmx.fraction(InertGas::Nitrogen)
            + tmx.fraction(InertGas::Helium);
        assert!((sum - 1.0).abs() < 1e-12, "fractions must sum to 1, got {sum}");
        assert!((tmx.fraction(InertGas::Nitrogen) - 0.44).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        assert_eq!(GasMix::nitrox(32.0).to_string(), "32/68/0");
        assert_eq!(GasMix::trimix(18.0, 45.0).to_string(), "18/37/45");
    }

    #[test]
    fn test_ccr_mix_from_trimix_diluent() {
        // PO2 1.3 at 2.0 atm on a 45% He diluent: O2 = round(1.3/2.0) = 65%,
        // diluent remainder 35% split toward He as 0.35 * 0.45 = 15.75 → 16%.
        let diluent = GasMix::trimix(18.0, 45.0);
        let loop_mix = current_ccr_mix(&diluent, 2.0, 1.3);
        assert!((loop_mix.o2() - 0.65).abs() < 1e-12);
        assert!((loop_mix.fraction(InertGas::Helium) - 0.16).abs() < 1e-12);
        assert!((loop_mix.fraction(InertGas::Nitrogen) - 0.19).abs() < 1e-12);
        assert!(loop_mix.is_mix());
    }

    #[test]
    fn test_ccr_mix_caps_o2_at_shallow_depth() {
        // Setpoint deeper than ambient pressure allows: pure O2.
        let diluent = GasMix::nitrox(32.0);
        let loop_mix = current_ccr_mix(&diluent, 1.0, 1.3);
        assert!((loop_mix.o2() - 1.0).abs() < 1e-12);
        assert!(!loop_mix.is_mix());
    }

    #[test]
    fn test_ccr_mix_nitrox_diluent_stays_nitrox() {
        let diluent = GasMix::nitrox(32.0);
        let loop_mix = current_ccr_mix(&diluent, 3.0, 1.3);
        assert!(!loop_mix.is_mix());
        assert_eq!(loop_mix.fraction(InertGas::Helium), 0.0);
        // round(1.3/3.0 * 100) = 43%
        assert!((loop_mix.o2() - 0.43).abs() < 1e-12);
    }
}
