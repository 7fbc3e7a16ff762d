//! Trajectory simulation: one evaluation record per patient per grid time.
//!
//! Each trajectory is a fold over the grid: the record at time t is built
//! from the patient's record at the previous grid time (or from the entry
//! record at the first grid time). Patients never interact.
//!
//! Draw order: patients ascending, times ascending, then pain, urgency,
//! nocturnal frequency. One normal draw per score per step, always.

use crate::{
    config::{SimConfig, TreatmentBoundary},
    record::{EvaluationPanel, EvaluationRecord, Patient, Score},
    rng::StageRng,
    types::Time,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    NeverTreated,
    PreTreatment,
    /// Treated less than one early window ago.
    EarlyPostTreatment,
    EstablishedPostTreatment,
}

impl TreatmentStatus {
    /// Status of an evaluation at `time` for a patient treated at
    /// `treatment_time`.
    pub fn at(
        time: Time,
        treatment_time: Option<Time>,
        boundary: TreatmentBoundary,
        early_window: Time,
    ) -> Self {
        let Some(tau) = treatment_time else {
            return Self::NeverTreated;
        };
        let post = match boundary {
            TreatmentBoundary::Exclusive => time > tau,
            TreatmentBoundary::Inclusive => time >= tau,
        };
        if !post {
            Self::PreTreatment
        } else if time < tau.saturating_add(early_window) {
            Self::EarlyPostTreatment
        } else {
            Self::EstablishedPostTreatment
        }
    }
}

pub struct TrajectorySimulator<'a> {
    config: &'a SimConfig,
}

impl<'a> TrajectorySimulator<'a> {
    pub fn new(config: &'a SimConfig) -> Self {
        Self { config }
    }

    pub fn simulate(&self, patients: &[Patient], rng: &mut StageRng) -> EvaluationPanel {
        let times = self.config.grid.times();
        let mut records = Vec::with_capacity(patients.len() * times.len());
        for patient in patients {
            records.extend(self.trajectory(patient, &times, rng));
        }
        log::info!(
            "trajectory: simulated {} evaluations ({} patients x {} grid times) from stream '{}'",
            records.len(),
            patients.len(),
            times.len(),
            rng.name
        );
        EvaluationPanel::new(records)
    }

    /// One patient's records, ascending by time.
    pub fn trajectory(
        &self,
        patient: &Patient,
        times: &[Time],
        rng: &mut StageRng,
    ) -> Vec<EvaluationRecord> {
        let Some(&first) = times.first() else {
            return Vec::new();
        };
        times
            .iter()
            .scan(EvaluationRecord::from_entry(patient, first), |prev, &time| {
                let next = self.step(prev, time, rng);
                *prev = next.clone();
                Some(next)
            })
            .collect()
    }

    /// Derive the record at `time` from its predecessor.
    pub fn step(&self, prev: &EvaluationRecord, time: Time, rng: &mut StageRng) -> EvaluationRecord {
        let status = TreatmentStatus::at(
            time,
            prev.treatment_time,
            self.config.boundary,
            self.config.early_window(),
        );

        let scores = Score::ALL.iter().fold(prev.scores, |scores, &score| {
            let drift = self.config.drift.step(status, score);
            let bounds = self.config.baseline.get(score).bounds;
            let raw = prev.scores.get(score) as f64 + rng.normal(drift.mean_shift, drift.std_dev);
            scores.with(score, bounds.clip_truncate(raw))
        });

        EvaluationRecord {
            scores,
            time,
            ..prev.clone()
        }
    }
}
