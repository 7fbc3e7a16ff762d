//! Percentile tertile binning of risk-set arms.
//!
//! Each arm is binned on its own: cut points come from the arm's own
//! distribution of the covariate, never from the pooled risk set.
//! Classification: lower if v <= p_lo, upper if v > p_hi, middle otherwise.
//! A constant covariate therefore lands every row in `Lower`.

use crate::{
    config::BinningConfig,
    error::{SimError, SimResult},
    record::{EvaluationRecord, Gender, Patient, Score, Scores},
    risk_set::{Arm, RiskSet, RiskSets},
    types::{PatientId, Time},
};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// A continuous covariate available for binning: a score as of the
/// evaluation, or the same score at baseline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Covariate {
    Pain,
    Urgency,
    NocturnalFrequency,
    BaselinePain,
    BaselineUrgency,
    BaselineNocturnalFrequency,
}

impl Covariate {
    fn source(&self) -> (Score, bool) {
        match self {
            Self::Pain => (Score::Pain, false),
            Self::Urgency => (Score::Urgency, false),
            Self::NocturnalFrequency => (Score::NocturnalFrequency, false),
            Self::BaselinePain => (Score::Pain, true),
            Self::BaselineUrgency => (Score::Urgency, true),
            Self::BaselineNocturnalFrequency => (Score::NocturnalFrequency, true),
        }
    }

    pub fn value(&self, current: &Scores, baseline: &Scores) -> f64 {
        let (score, at_baseline) = self.source();
        let scores = if at_baseline { baseline } else { current };
        scores.get(score) as f64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tertile {
    Lower,
    Middle,
    Upper,
}

impl Tertile {
    pub fn classify(value: f64, cuts: Cutpoints) -> Self {
        if value <= cuts.lower {
            Self::Lower
        } else if value > cuts.upper {
            Self::Upper
        } else {
            Self::Middle
        }
    }

    pub fn indicators(&self) -> TertileIndicators {
        TertileIndicators {
            lower:  (*self == Self::Lower) as u8,
            middle: (*self == Self::Middle) as u8,
            upper:  (*self == Self::Upper) as u8,
        }
    }
}

/// The three 0/1 indicator columns of one covariate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TertileIndicators {
    pub lower:  u8,
    pub middle: u8,
    pub upper:  u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Cutpoints {
    pub lower: f64,
    pub upper: f64,
}

/// Percentile with linear interpolation between closest ranks.
/// `sorted` must be ascending. Returns `None` on an empty slice.
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = pct / 100.0 * last as f64;
    let below = rank.floor() as usize;
    let above = (below + 1).min(last);
    let frac = rank - below as f64;
    Some(sorted[below] + frac * (sorted[above] - sorted[below]))
}

/// An evaluation with its baseline entry joined in and one tertile per
/// binned covariate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BinnedRow {
    #[serde(flatten)]
    pub record:   EvaluationRecord,
    pub baseline: Scores,
    #[serde(rename = "indicators", serialize_with = "serialize_indicators")]
    pub tertiles: BTreeMap<Covariate, Tertile>,
}

impl BinnedRow {
    pub fn indicators(&self, covariate: Covariate) -> Option<TertileIndicators> {
        self.tertiles.get(&covariate).map(Tertile::indicators)
    }
}

fn serialize_indicators<S: Serializer>(
    tertiles: &BTreeMap<Covariate, Tertile>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(tertiles.iter().map(|(c, t)| (c, t.indicators())))
}

/// One binned arm. `cutpoints` is empty when the arm had no rows.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BinnedSubset {
    pub rows:      Vec<BinnedRow>,
    pub cutpoints: BTreeMap<Covariate, Cutpoints>,
}

impl BinnedSubset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BinnedRiskSet {
    pub treated: BinnedSubset,
    pub control: BinnedSubset,
}

impl BinnedRiskSet {
    pub fn arm(&self, arm: Arm) -> &BinnedSubset {
        match arm {
            Arm::Treated => &self.treated,
            Arm::Control => &self.control,
        }
    }
}

pub type BinnedRiskSets = BTreeMap<Time, BinnedRiskSet>;

pub struct CovariateBinner<'a> {
    lower_percentile: f64,
    upper_percentile: f64,
    covariates:       &'a [Covariate],
}

impl<'a> CovariateBinner<'a> {
    pub fn new(config: &'a BinningConfig) -> Self {
        Self {
            lower_percentile: config.lower_percentile,
            upper_percentile: config.upper_percentile(),
            covariates:       &config.covariates,
        }
    }

    pub fn bin_all(&self, patients: &[Patient], risk_sets: &RiskSets) -> SimResult<BinnedRiskSets> {
        let baselines = baseline_index(patients);
        risk_sets
            .iter()
            .map(|(&t, set)| Ok((t, self.bin_risk_set(&baselines, set)?)))
            .collect()
    }

    pub fn bin_risk_set(
        &self,
        baselines: &HashMap<(PatientId, Gender), &Patient>,
        set: &RiskSet,
    ) -> SimResult<BinnedRiskSet> {
        Ok(BinnedRiskSet {
            treated: self.bin_subset(baselines, set.treated())?,
            control: self.bin_subset(baselines, set.control())?,
        })
    }

    /// Join baselines into `records` and classify every row against the
    /// subset's own cut points.
    pub fn bin_subset(
        &self,
        baselines: &HashMap<(PatientId, Gender), &Patient>,
        records: &[EvaluationRecord],
    ) -> SimResult<BinnedSubset> {
        let joined = records
            .iter()
            .map(|r| {
                baselines
                    .get(&(r.id, r.gender))
                    .map(|p| (r, p.scores))
                    .ok_or(SimError::MissingBaseline { patient_id: r.id })
            })
            .collect::<SimResult<Vec<_>>>()?;

        let mut cutpoints = BTreeMap::new();
        for &covariate in self.covariates {
            let mut values: Vec<f64> =
                joined.iter().map(|(r, base)| covariate.value(&r.scores, base)).collect();
            values.sort_by(f64::total_cmp);
            if let (Some(lower), Some(upper)) = (
                percentile(&values, self.lower_percentile),
                percentile(&values, self.upper_percentile),
            ) {
                cutpoints.insert(covariate, Cutpoints { lower, upper });
            }
        }

        let rows = joined
            .into_iter()
            .map(|(record, baseline)| {
                let tertiles = cutpoints
                    .iter()
                    .map(|(&c, &cuts)| (c, Tertile::classify(c.value(&record.scores, &baseline), cuts)))
                    .collect();
                BinnedRow { record: record.clone(), baseline, tertiles }
            })
            .collect();

        Ok(BinnedSubset { rows, cutpoints })
    }
}

/// Entry rows keyed by the join columns (id, gender).
pub fn baseline_index(patients: &[Patient]) -> HashMap<(PatientId, Gender), &Patient> {
    patients.iter().map(|p| ((p.id, p.gender), p)).collect()
}
