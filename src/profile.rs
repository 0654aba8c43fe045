//! Dive profile value objects.
//!
//! A [`Profile`] is used both as planner input (the bottom portion of a
//! dive) and as planner output (the decompression schedule). In the output
//! case segment depths are non-increasing down to the last stop before the
//! surface.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One section of a dive: a depth held for a duration (minutes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub depth: f64,
    pub time: f64,
}

impl Segment {
    pub fn new(depth: f64, time: f64) -> Self {
        Segment { depth, time }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.depth, self.time)
    }
}

/// An ordered series of segments plus total duration.
///
/// For planner output `duration` also includes travel time between stops,
/// so it can exceed the sum of the segment times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub segments: Vec<Segment>,
    pub duration: f64,
}

impl Profile {
    /// Profile with duration equal to the sum of the segment times.
    pub fn new(segments: Vec<Segment>) -> Self {
        let duration = segments.iter().map(|s| s.time).sum();
        Profile { segments, duration }
    }

    /// Profile with an explicit duration (travel time included).
    pub fn with_duration(segments: Vec<Segment>, duration: f64) -> Self {
        Profile { segments, duration }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.segments {
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_duration_from_segments() {
        let p = Profile::new(vec![Segment::new(100.0, 20.0), Segment::new(60.0, 15.0)]);
        assert_eq!(p.duration, 35.0);
    }

    #[test]
    fn test_profile_display() {
        let p = Profile::new(vec![Segment::new(70.0, 1.0), Segment::new(60.0, 1.0)]);
        assert_eq!(p.to_string(), "70 1\n60 1\n");
    }
}
