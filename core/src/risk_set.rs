//! Risk-set construction.
//!
//! For every distinct treatment time t found in the panel, the evaluations
//! recorded at t are split into patients treated exactly at t and everyone
//! else still observed at t (never treated, or treated at another time).

use crate::{
    record::{EvaluationPanel, EvaluationRecord},
    types::Time,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The two arms of a risk set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Treated,
    Control,
}

/// Evaluations at one time point, split by whether the patient was
/// treated at that time. Built only by `RiskSet::partition`, so the arms
/// are always disjoint and together hold every evaluation at the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskSet {
    treated: Vec<EvaluationRecord>,
    control: Vec<EvaluationRecord>,
}

impl RiskSet {
    pub fn partition<'a>(
        time: Time,
        records: impl IntoIterator<Item = &'a EvaluationRecord>,
    ) -> Self {
        let (treated, control) = records
            .into_iter()
            .filter(|r| r.time == time)
            .cloned()
            .partition(|r| r.treated_at(time));
        Self { treated, control }
    }

    pub fn treated(&self) -> &[EvaluationRecord] {
        &self.treated
    }

    pub fn control(&self) -> &[EvaluationRecord] {
        &self.control
    }

    pub fn arm(&self, arm: Arm) -> &[EvaluationRecord] {
        match arm {
            Arm::Treated => &self.treated,
            Arm::Control => &self.control,
        }
    }

    pub fn len(&self) -> usize {
        self.treated.len() + self.control.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type RiskSets = BTreeMap<Time, RiskSet>;

pub struct RiskSetBuilder;

impl RiskSetBuilder {
    /// Distinct treatment times present in the panel, ascending.
    pub fn treatment_times(panel: &EvaluationPanel) -> BTreeSet<Time> {
        panel.records().iter().filter_map(|r| r.treatment_time).collect()
    }

    /// One risk set per distinct treatment time.
    pub fn build(panel: &EvaluationPanel) -> RiskSets {
        Self::build_at(panel, Self::treatment_times(panel))
    }

    /// One risk set per requested key. A key with no evaluations yields an
    /// empty risk set.
    pub fn build_at(panel: &EvaluationPanel, keys: impl IntoIterator<Item = Time>) -> RiskSets {
        keys.into_iter()
            .map(|t| {
                let set = RiskSet::partition(t, panel.at_time(t));
                log::debug!(
                    "risk_set: t={t} treated={} control={}",
                    set.treated.len(),
                    set.control.len()
                );
                (t, set)
            })
            .collect()
    }
}
