use thiserror::Error;

/// Error type for dive planning.
///
/// Domain errors (`CeilingViolation`, `Unsupported`) mean the requested plan
/// is invalid and the caller can correct it. A [`Defect`] means the engine
/// itself misbehaved; it is carried on a distinct type so callers can tell
/// the two classes apart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecoError {
    #[error("ceiling violation: segment at {depth} is shallower than the current ceiling {ceiling}")]
    CeilingViolation { depth: f64, ceiling: f64 },

    #[error("segment at {depth} lasts {time} min but travel there alone takes {travel} min")]
    SegmentTooShort { depth: f64, time: f64, travel: f64 },

    #[error("unsupported configuration: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Defect(#[from] Defect),
}

/// Internal-consistency failures. Never a normal outcome; a plan that ends
/// in a `Defect` must not be retried with the same configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Defect {
    #[error("ascent search did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("exponential kinetics forms disagree: ln form {via_ln} vs pow form {via_pow}")]
    NumericInconsistency { via_ln: f64, via_pow: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecoError::CeilingViolation {
            depth: 40.0,
            ceiling: 50.0,
        };
        assert_eq!(
            err.to_string(),
            "ceiling violation: segment at 40 is shallower than the current ceiling 50"
        );

        let err = DecoError::Unsupported("meters not supported");
        assert_eq!(
            err.to_string(),
            "unsupported configuration: meters not supported"
        );

        let err = DecoError::SegmentTooShort {
            depth: 150.0,
            time: 1.0,
            travel: 2.5,
        };
        assert_eq!(
            err.to_string(),
            "segment at 150 lasts 1 min but travel there alone takes 2.5 min"
        );
    }

    #[test]
    fn test_defect_is_distinguishable() {
        let err: DecoError = Defect::NonConvergence { iterations: 10_000 }.into();
        assert!(matches!(
            err,
            DecoError::Defect(Defect::NonConvergence { .. })
        ));
        assert_eq!(
            err.to_string(),
            "ascent search did not converge within 10000 iterations"
        );
    }
}
