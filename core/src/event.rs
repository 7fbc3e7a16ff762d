//! The run's event log.
//!
//! RULE: Every stage reports what it produced through events, in execution
//! order. The log is part of the deterministic output: two runs with the
//! same seed and config must yield identical logs.

use crate::{risk_set::Arm, types::Time};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrialEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        seed:        u64,
        cohort_size: usize,
        grid_times:  usize,
    },

    // ── Stage events ───────────────────────────────
    CohortGenerated {
        patients: usize,
        treated:  usize,
    },
    TrajectoriesSimulated {
        records: usize,
    },
    RiskSetBuilt {
        time:    Time,
        treated: usize,
        control: usize,
    },
    SubsetBinned {
        time: Time,
        arm:  Arm,
        rows: usize,
    },

    // ── Warnings ───────────────────────────────────
    /// A risk-set arm had no rows. Binning it is a no-op.
    EmptySubset {
        time: Time,
        arm:  Arm,
    },
}

impl TrialEvent {
    /// Stable name of the variant, for logs and tooling.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }        => "run_initialized",
            Self::CohortGenerated { .. }       => "cohort_generated",
            Self::TrajectoriesSimulated { .. } => "trajectories_simulated",
            Self::RiskSetBuilt { .. }          => "risk_set_built",
            Self::SubsetBinned { .. }          => "subset_binned",
            Self::EmptySubset { .. }           => "empty_subset",
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::EmptySubset { .. })
    }
}
