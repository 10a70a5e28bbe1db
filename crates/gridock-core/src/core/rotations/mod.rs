//! Discretised sampling of the rotation group.
//!
//! Rotations are described by integer Euler triples (see [`EulerAngles`]) and
//! enumerated for a fixed angular step by [`AngleSet::generate`]. Rotation ids
//! are 1-based, matching the ids written to the score log.

mod angles;

pub use angles::{AngleError, AngleSet, EulerAngles};
