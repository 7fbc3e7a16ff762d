//! Shared primitive types used across the entire simulation.

/// A point on the evaluation grid, in whole time units (months by default).
pub type Time = u32;

/// A stable patient identifier, assigned sequentially from 0.
pub type PatientId = u32;

/// A clinical score. Always an integer inside its configured bounds.
pub type ScoreValue = i32;
