//! The complete output of one run, and its JSON serialization.
//!
//! Everything here is derived from the seed and the config alone, so the
//! serialized form is byte-identical across runs with the same inputs.

use crate::{
    binning::BinnedRiskSets,
    error::SimResult,
    event::TrialEvent,
    record::{EvaluationPanel, EvaluationRecord, Patient},
    risk_set::RiskSets,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TrialDataset {
    pub seed:         u64,
    /// Entry (baseline) table, ordered by id.
    pub entries:      Vec<Patient>,
    pub panel:        EvaluationPanel,
    /// Each treated patient's evaluation at its own treatment time.
    pub at_treatment: Vec<EvaluationRecord>,
    pub risk_sets:    RiskSets,
    /// `None` when binning is disabled.
    pub binned:       Option<BinnedRiskSets>,
    pub events:       Vec<TrialEvent>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DatasetSummary {
    pub patients:         usize,
    pub treated:          usize,
    pub evaluations:      usize,
    pub risk_set_keys:    usize,
    pub empty_partitions: usize,
}

impl TrialDataset {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            patients:         self.entries.len(),
            treated:          self.entries.iter().filter(|p| p.treatment_time.is_some()).count(),
            evaluations:      self.panel.len(),
            risk_set_keys:    self.risk_sets.len(),
            empty_partitions: self
                .risk_sets
                .values()
                .map(|s| s.treated().is_empty() as usize + s.control().is_empty() as usize)
                .sum(),
        }
    }
}
