//! Cohort generation: the entry (baseline) table.
//!
//! Draw order per patient, ascending id:
//!   gender, pain, urgency, nocturnal frequency, treatment slot.
//! Under `FixedCount` assignment the treated ids are drawn first by a single
//! permutation, and only selected patients draw a treatment slot.

use crate::{
    config::{PerScore, ScoreDistribution, SimConfig, TreatmentAssignment},
    record::{Gender, Patient, Score, Scores},
    rng::StageRng,
    types::{PatientId, Time},
};

pub struct CohortGenerator<'a> {
    config: &'a SimConfig,
}

impl<'a> CohortGenerator<'a> {
    pub fn new(config: &'a SimConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, rng: &mut StageRng) -> Vec<Patient> {
        let n = self.config.cohort_size;
        let grid = self.config.grid.times();

        let selected: Option<Vec<bool>> = match self.config.assignment {
            TreatmentAssignment::Uniform { .. } => None,
            TreatmentAssignment::FixedCount { treated } => {
                let mut mask = vec![false; n];
                for idx in rng.sample_without_replacement(n, treated) {
                    mask[idx] = true;
                }
                Some(mask)
            }
        };

        let mut patients = Vec::with_capacity(n);
        for i in 0..n {
            let gender = *rng.choose(&Gender::ALL);
            let scores = draw_baseline(&self.config.baseline, rng);
            let treatment_time = match (&self.config.assignment, &selected) {
                (TreatmentAssignment::Uniform { never_treated_slots }, _) => {
                    draw_treatment_slot(&grid, *never_treated_slots, rng)
                }
                (TreatmentAssignment::FixedCount { .. }, Some(mask)) if mask[i] => {
                    Some(*rng.choose(&grid))
                }
                (TreatmentAssignment::FixedCount { .. }, _) => None,
            };

            patients.push(Patient {
                id: i as PatientId,
                gender,
                scores,
                treatment_time,
            });
        }

        let treated = patients.iter().filter(|p| p.treatment_time.is_some()).count();
        log::info!(
            "cohort: generated {} patients ({treated} treated, {} never treated) from stream '{}'",
            patients.len(),
            patients.len() - treated,
            rng.name
        );
        patients
    }
}

fn draw_baseline(dists: &PerScore<ScoreDistribution>, rng: &mut StageRng) -> Scores {
    Score::ALL.iter().fold(
        Scores { pain: 0, urgency: 0, nocturnal_frequency: 0 },
        |scores, &score| {
            let d = dists.get(score);
            scores.with(score, d.bounds.clip_truncate(rng.normal(d.mean, d.std_dev)))
        },
    )
}

/// Uniform over `grid.len() + never_treated_slots` slots; the trailing
/// slots mean never treated.
fn draw_treatment_slot(
    grid: &[Time],
    never_treated_slots: usize,
    rng: &mut StageRng,
) -> Option<Time> {
    let slots = grid.len() + never_treated_slots;
    if slots == 0 {
        return None;
    }
    let slot = rng.next_u64_below(slots as u64) as usize;
    grid.get(slot).copied()
}
