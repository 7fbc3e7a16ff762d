//! The evaluation grid: the fixed, ascending time points at which every
//! patient is re-assessed.

use crate::types::Time;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationGrid {
    /// Time units between consecutive evaluations. Must be > 0.
    pub interval: Time,
    /// Last time unit that may still carry an evaluation.
    pub duration: Time,
}

impl EvaluationGrid {
    pub fn new(interval: Time, duration: Time) -> Self {
        Self { interval, duration }
    }

    /// 0, interval, 2·interval, … up to and including `duration`.
    /// Panics on a zero interval; `SimConfig::validate` rejects that first.
    pub fn times(&self) -> Vec<Time> {
        assert!(self.interval > 0, "times() called on a zero-interval grid");
        (0..=self.duration).step_by(self.interval as usize).collect()
    }

    pub fn len(&self) -> usize {
        if self.interval == 0 {
            return 0;
        }
        (self.duration / self.interval) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, time: Time) -> bool {
        self.interval > 0 && time <= self.duration && time % self.interval == 0
    }
}
