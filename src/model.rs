//! The decompression-model contract and its diagnostic trace sink.

use std::fmt;
use std::io::Write;

use crate::error::{DecoError, Defect};
use crate::mix::GasMix;
use crate::profile::Profile;
use crate::units::Units;

/// A decompression model: tissue-loading state plus the ascent planners
/// built on it.
///
/// Depths are in the model's unit system (see [`select_units`]); times are
/// minutes. Every exposure call mutates compartment state, so one model
/// instance serves exactly one planning session. Gradient-factor ramps and
/// other one-way per-dive flags are never reset; start a new session with a
/// fresh model instead of reusing one.
///
/// [`select_units`]: DecoModel::select_units
pub trait DecoModel {
    /// Choose the unit system. Fails with [`DecoError::Unsupported`] on
    /// models fixed to one system. Call before any exposure.
    fn select_units(&mut self, units: Units) -> Result<(), DecoError>;

    /// Expose the model to a constant-rate descent from the surface to
    /// `depth`. Returns the elapsed time in minutes.
    fn descend(&mut self, depth: f64, mix: &GasMix) -> Result<f64, Defect>;

    /// Expose the model to `time` minutes at a constant `depth`.
    fn level_off(&mut self, time: f64, depth: f64, mix: &GasMix) -> Result<(), Defect>;

    /// Expose the model to a constant-rate ascent between two depths.
    /// Returns the elapsed time in minutes.
    fn ascend(&mut self, from: f64, to: f64, mix: &GasMix) -> Result<f64, Defect>;

    /// Shallowest depth the diver may ascend to under the current loading,
    /// rounded to the model's discrete stop increment. 0 means a direct
    /// ascent to the surface is tolerated.
    fn ceiling(&mut self) -> f64;

    /// Plain ascent plan on a single gas. `half_depth` forces the first
    /// stop to at least half the starting depth. `None` when no
    /// decompression is required.
    fn decompress(
        &mut self,
        from: f64,
        mix: &GasMix,
        half_depth: bool,
    ) -> Result<Option<Profile>, DecoError>;

    /// Technical open-circuit ascent plan. `deco_gases` is a priority list
    /// of switchable gases; `last_stop_deep` folds the shallowest stop into
    /// the one above it; `suggested_inc` is the stop-length increment used
    /// once a deco gas is active.
    fn decompress_oc_tech(
        &mut self,
        from: f64,
        mix: &GasMix,
        deco_gases: &[GasMix],
        last_stop_deep: bool,
        suggested_inc: f64,
    ) -> Result<Option<Profile>, DecoError>;

    /// Closed-circuit ascent plan: the breathing mix is re-derived from the
    /// diluent and `ccr_po2` at every hold increment.
    fn decompress_ccr(
        &mut self,
        from: f64,
        diluent: &GasMix,
        ccr_po2: f64,
        last_stop_deep: bool,
        suggested_inc: f64,
    ) -> Result<Option<Profile>, DecoError>;
}

/// Optional per-step diagnostic sink, injected at model construction.
///
/// Purely observational: models write compartment-state dumps after each
/// exposure, nothing reads them back. Write errors are ignored. The default
/// is disabled.
#[derive(Default)]
pub struct ModelTrace {
    sink: Option<Box<dyn Write>>,
}

impl ModelTrace {
    pub fn disabled() -> Self {
        ModelTrace { sink: None }
    }

    pub fn to_sink(sink: Box<dyn Write>) -> Self {
        ModelTrace { sink: Some(sink) }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub(crate) fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = writeln!(sink, "{args}");
        }
    }
}

impl fmt::Debug for ModelTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTrace")
            .field("enabled", &self.enabled())
            .finish()
    }
}
