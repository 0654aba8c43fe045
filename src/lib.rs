//! Decompression planning core.
//!
//! Simulates inert-gas loading in body tissue compartments across a dive
//! profile and derives a decompression-stop schedule for the ascent. Two
//! models are provided behind the [`DecoModel`] trait: the Bühlmann
//! ZHL-16C multi-compartment exponential model with gradient factors
//! ([`Zhl16`]) and a Thalmann-style linear-exponential model with a
//! maximum-permissible-tension table ([`Lem`]). Three planner variants sit
//! on top: plain single-gas ascent, technical open-circuit with gas
//! switching, and closed-circuit with a dynamically blended loop mix.
//!
//! # Example
//!
//! ```
//! use deco_engine::{Dive, DiveOptions, GasMix, Profile, Segment, Zhl16};
//!
//! let mut dive = Dive::new(
//!     Zhl16::zhl16c(0.30, 0.95),
//!     GasMix::nitrox(32.0),
//!     Profile::new(vec![Segment::new(100.0, 30.0)]),
//!     DiveOptions {
//!         deco_nitrox: 32.0,
//!         last_stop_deep: true,
//!         ..DiveOptions::default()
//!     },
//! );
//! dive.run().expect("profile applies");
//! let plan = dive.decompress().expect("planner converges");
//! assert!(plan.is_some(), "30 min at 100 ft requires stops");
//! ```

pub mod dive;
pub mod error;
pub mod kinetics;
pub mod lem;
pub mod mix;
pub mod model;
mod planner;
pub mod profile;
pub mod units;
pub mod zhl16;

pub use dive::{Dive, DiveOptions};
pub use error::{DecoError, Defect};
pub use lem::Lem;
pub use mix::{current_ccr_mix, GasMix, InertGas};
pub use model::{DecoModel, ModelTrace};
pub use profile::{Profile, Segment};
pub use units::Units;
pub use zhl16::Zhl16;
