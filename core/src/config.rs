use crate::{
    binning::Covariate,
    error::{SimError, SimResult},
    grid::EvaluationGrid,
    record::Score,
    trajectory::TreatmentStatus,
    types::{ScoreValue, Time},
};
use serde::{Deserialize, Serialize};

/// One value per clinical score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PerScore<T> {
    pub pain:                T,
    pub urgency:             T,
    pub nocturnal_frequency: T,
}

impl<T> PerScore<T> {
    pub fn get(&self, score: Score) -> &T {
        match score {
            Score::Pain => &self.pain,
            Score::Urgency => &self.urgency,
            Score::NocturnalFrequency => &self.nocturnal_frequency,
        }
    }
}

/// Closed domain of a score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBounds {
    pub lo: ScoreValue,
    pub hi: ScoreValue,
}

impl ScoreBounds {
    /// Clip to [lo, hi], then truncate toward zero.
    pub fn clip_truncate(&self, value: f64) -> ScoreValue {
        value.clamp(self.lo as f64, self.hi as f64).trunc() as ScoreValue
    }

    pub fn contains(&self, value: ScoreValue) -> bool {
        (self.lo..=self.hi).contains(&value)
    }
}

/// Baseline distribution of a score: Normal(mean, std_dev), clipped to
/// `bounds`. The same bounds clip every later evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreDistribution {
    pub mean:    f64,
    pub std_dev: f64,
    pub bounds:  ScoreBounds,
}

/// Additive update applied to a score at one evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DriftStep {
    pub mean_shift: f64,
    pub std_dev:    f64,
}

impl DriftStep {
    pub const fn new(mean_shift: f64, std_dev: f64) -> Self {
        Self { mean_shift, std_dev }
    }
}

/// Drift table keyed by treatment status.
/// Untreated patients drift with the pre-treatment row.
///
/// Every step is clipped and truncated toward zero, which costs a positive
/// score about 0.5 per step on average. A row only worsens scores in
/// expectation when its `mean_shift` exceeds that loss.
///
/// With the `Exclusive` boundary and an early window equal to the grid
/// interval, no grid time falls inside the early window, so
/// `early_post_treatment` never applies on an aligned grid. Set
/// `SimConfig::early_window` wider than the interval, or use the
/// `Inclusive` boundary, to see it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftPolicy {
    pub pre_treatment:              PerScore<DriftStep>,
    pub early_post_treatment:       PerScore<DriftStep>,
    pub established_post_treatment: PerScore<DriftStep>,
}

impl DriftPolicy {
    pub fn step(&self, status: TreatmentStatus, score: Score) -> DriftStep {
        let row = match status {
            TreatmentStatus::NeverTreated | TreatmentStatus::PreTreatment => &self.pre_treatment,
            TreatmentStatus::EarlyPostTreatment => &self.early_post_treatment,
            TreatmentStatus::EstablishedPostTreatment => &self.established_post_treatment,
        };
        *row.get(score)
    }

    fn steps(&self) -> impl Iterator<Item = &DriftStep> {
        [&self.pre_treatment, &self.early_post_treatment, &self.established_post_treatment]
            .into_iter()
            .flat_map(|row| [&row.pain, &row.urgency, &row.nocturnal_frequency])
    }
}

/// Which side of the treatment instant an evaluation taken exactly at
/// `t == τ` falls on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentBoundary {
    /// `t <= τ` is pre-treatment; the effect starts after τ.
    Exclusive,
    /// `t < τ` is pre-treatment; the evaluation at τ is already post.
    Inclusive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TreatmentAssignment {
    /// Each patient draws uniformly from the grid times plus
    /// `never_treated_slots` sentinel slots.
    Uniform { never_treated_slots: usize },
    /// Exactly `treated` patients, chosen by permutation, get a uniformly
    /// drawn grid time; everyone else is never treated.
    FixedCount { treated: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BinningConfig {
    pub enabled:          bool,
    /// Lower cut in percent. The upper cut is `100 - lower_percentile`.
    pub lower_percentile: f64,
    pub covariates:       Vec<Covariate>,
}

impl BinningConfig {
    pub fn upper_percentile(&self) -> f64 {
        100.0 - self.lower_percentile
    }
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            enabled:          true,
            lower_percentile: 33.0,
            covariates:       vec![
                Covariate::Pain,
                Covariate::Urgency,
                Covariate::NocturnalFrequency,
                Covariate::BaselinePain,
                Covariate::BaselineUrgency,
                Covariate::BaselineNocturnalFrequency,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub seed:         u64,
    pub cohort_size:  usize,
    pub grid:         EvaluationGrid,
    pub baseline:     PerScore<ScoreDistribution>,
    pub assignment:   TreatmentAssignment,
    pub boundary:     TreatmentBoundary,
    /// Length of the early post-treatment phase. Defaults to one
    /// evaluation interval when absent.
    pub early_window: Option<Time>,
    pub drift:        DriftPolicy,
    pub binning:      BinningConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        let grid = EvaluationGrid::new(3, 36);
        Self {
            seed: 69,
            cohort_size: 200,
            grid,
            baseline: PerScore {
                pain: ScoreDistribution {
                    mean:    5.0,
                    std_dev: 2.5,
                    bounds:  ScoreBounds { lo: 0, hi: 9 },
                },
                urgency: ScoreDistribution {
                    mean:    5.0,
                    std_dev: 2.5,
                    bounds:  ScoreBounds { lo: 0, hi: 9 },
                },
                nocturnal_frequency: ScoreDistribution {
                    mean:    10.0,
                    std_dev: 5.0,
                    bounds:  ScoreBounds { lo: 0, hi: 20 },
                },
            },
            // As many sentinel slots as grid slots: about half never treated.
            assignment: TreatmentAssignment::Uniform { never_treated_slots: grid.len() },
            boundary: TreatmentBoundary::Exclusive,
            early_window: None,
            drift: DriftPolicy {
                // Net of truncation: about +0.25, +0.25 and +0.5 per step.
                pre_treatment: PerScore {
                    pain:                DriftStep::new(0.75, 1.0),
                    urgency:             DriftStep::new(0.75, 0.75),
                    nocturnal_frequency: DriftStep::new(1.0, 1.5),
                },
                early_post_treatment: PerScore {
                    pain:                DriftStep::new(-2.0, 1.5),
                    urgency:             DriftStep::new(-1.5, 1.25),
                    nocturnal_frequency: DriftStep::new(-3.0, 3.0),
                },
                established_post_treatment: PerScore {
                    pain:                DriftStep::new(-0.75, 1.0),
                    urgency:             DriftStep::new(-0.5, 0.75),
                    nocturnal_frequency: DriftStep::new(-1.0, 1.5),
                },
            },
            binning: BinningConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. Missing fields fall back to the defaults.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Small cohort on a short grid, for fast tests.
    pub fn default_test() -> Self {
        let grid = EvaluationGrid::new(3, 12);
        Self {
            seed: 42,
            cohort_size: 40,
            grid,
            assignment: TreatmentAssignment::Uniform { never_treated_slots: grid.len() },
            ..Self::default()
        }
    }

    pub fn early_window(&self) -> Time {
        self.early_window.unwrap_or(self.grid.interval)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.cohort_size == 0 {
            return Err(SimError::invalid_config("cohort_size", "must be at least 1"));
        }
        if self.grid.interval == 0 {
            return Err(SimError::invalid_config("grid.interval", "must be > 0"));
        }
        if self.early_window == Some(0) {
            return Err(SimError::invalid_config("early_window", "must be > 0"));
        }

        for score in Score::ALL {
            let dist = self.baseline.get(score);
            if dist.bounds.lo > dist.bounds.hi {
                return Err(SimError::invalid_config(
                    "baseline.bounds",
                    format!(
                        "{}: lower bound {} exceeds upper bound {}",
                        score.name(),
                        dist.bounds.lo,
                        dist.bounds.hi
                    ),
                ));
            }
            if !dist.mean.is_finite() || !dist.std_dev.is_finite() || dist.std_dev < 0.0 {
                return Err(SimError::invalid_config(
                    "baseline",
                    format!("{}: mean and std_dev must be finite, std_dev >= 0", score.name()),
                ));
            }
        }

        if self
            .drift
            .steps()
            .any(|s| !s.mean_shift.is_finite() || !s.std_dev.is_finite() || s.std_dev < 0.0)
        {
            return Err(SimError::invalid_config(
                "drift",
                "mean_shift and std_dev must be finite, std_dev >= 0",
            ));
        }

        if let TreatmentAssignment::FixedCount { treated } = self.assignment {
            if treated > self.cohort_size {
                return Err(SimError::invalid_config(
                    "assignment.treated",
                    format!("{treated} treated exceeds cohort size {}", self.cohort_size),
                ));
            }
        }

        let lower = self.binning.lower_percentile;
        if !(lower > 0.0 && lower < 50.0) {
            return Err(SimError::invalid_config(
                "binning.lower_percentile",
                format!("{lower} is outside (0, 50)"),
            ));
        }
        if self.binning.enabled && self.binning.covariates.is_empty() {
            return Err(SimError::invalid_config(
                "binning.covariates",
                "binning is enabled but no covariates are listed",
            ));
        }
        Ok(())
    }
}
