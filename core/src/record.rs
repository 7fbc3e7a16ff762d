//! Entry records, evaluation records and the evaluation panel.
//!
//! RULE: Records are values. A stage that needs a changed record builds a
//! new one; nothing mutates a record after it has been appended.

use crate::types::{PatientId, ScoreValue, Time};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];
}

/// The three clinical scores tracked per evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Pain,
    Urgency,
    NocturnalFrequency,
}

impl Score {
    /// Fixed iteration order. RNG draws follow this order.
    pub const ALL: [Score; 3] = [Score::Pain, Score::Urgency, Score::NocturnalFrequency];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pain => "pain",
            Self::Urgency => "urgency",
            Self::NocturnalFrequency => "nocturnal_frequency",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
    pub pain:                ScoreValue,
    pub urgency:             ScoreValue,
    pub nocturnal_frequency: ScoreValue,
}

impl Scores {
    pub fn get(&self, score: Score) -> ScoreValue {
        match score {
            Score::Pain => self.pain,
            Score::Urgency => self.urgency,
            Score::NocturnalFrequency => self.nocturnal_frequency,
        }
    }

    /// Copy with one score replaced.
    pub fn with(mut self, score: Score, value: ScoreValue) -> Self {
        match score {
            Score::Pain => self.pain = value,
            Score::Urgency => self.urgency = value,
            Score::NocturnalFrequency => self.nocturnal_frequency = value,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Treated,
    Untreated,
}

/// One row of the entry (baseline) table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id:             PatientId,
    pub gender:         Gender,
    #[serde(flatten)]
    pub scores:         Scores,
    /// `None` means never treated.
    pub treatment_time: Option<Time>,
}

impl Patient {
    pub fn group(&self) -> Group {
        match self.treatment_time {
            Some(_) => Group::Treated,
            None => Group::Untreated,
        }
    }
}

/// One row of the evaluation panel: a patient as observed at `time`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRecord {
    pub id:             PatientId,
    pub gender:         Gender,
    #[serde(flatten)]
    pub scores:         Scores,
    pub treatment_time: Option<Time>,
    pub time:           Time,
}

impl EvaluationRecord {
    /// Seed record carrying the entry's attributes. Used as the
    /// predecessor of the first grid point.
    pub fn from_entry(patient: &Patient, time: Time) -> Self {
        Self {
            id:             patient.id,
            gender:         patient.gender,
            scores:         patient.scores,
            treatment_time: patient.treatment_time,
            time,
        }
    }

    pub fn treated_at(&self, time: Time) -> bool {
        self.treatment_time == Some(time)
    }
}

/// All evaluation records of a run, in (patient, time) order.
/// Downstream stages filter by value, never by position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EvaluationPanel {
    records: Vec<EvaluationRecord>,
}

impl EvaluationPanel {
    pub fn new(records: Vec<EvaluationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn at_time(&self, time: Time) -> impl Iterator<Item = &EvaluationRecord> {
        self.records.iter().filter(move |r| r.time == time)
    }

    /// One patient's trajectory, ascending by time.
    pub fn for_patient(&self, id: PatientId) -> Vec<&EvaluationRecord> {
        let mut rows: Vec<_> = self.records.iter().filter(|r| r.id == id).collect();
        rows.sort_by_key(|r| r.time);
        rows
    }

    /// For every treated patient, the record taken at its own treatment
    /// time, ordered by patient id.
    pub fn at_treatment(&self) -> Vec<EvaluationRecord> {
        let mut rows: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.treated_at(r.time))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows
    }
}
