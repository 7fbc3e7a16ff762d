//! Trajectory simulation tests.

use trialsim_core::{
    config::{DriftStep, PerScore, SimConfig, TreatmentBoundary},
    engine::TrialEngine,
    grid::EvaluationGrid,
    record::{Gender, Patient, Score, Scores},
    rng::{RngBank, StageSlot},
    trajectory::TrajectorySimulator,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn zero_noise(mut row: PerScore<DriftStep>) -> PerScore<DriftStep> {
    row.pain.std_dev = 0.0;
    row.urgency.std_dev = 0.0;
    row.nocturnal_frequency.std_dev = 0.0;
    row
}

fn patient(id: u32, pain: i32, treatment_time: Option<u32>) -> Patient {
    Patient {
        id,
        gender: if id % 2 == 0 { Gender::Female } else { Gender::Male },
        scores: Scores { pain, urgency: 4, nocturnal_frequency: 10 },
        treatment_time,
    }
}

fn score_series(config: &SimConfig, p: &Patient, seed: u64, score: Score) -> Vec<i32> {
    let mut rng = RngBank::new(seed).for_stage(StageSlot::Trajectory);
    TrajectorySimulator::new(config)
        .trajectory(p, &config.grid.times(), &mut rng)
        .iter()
        .map(|r| r.scores.get(score))
        .collect()
}

fn pain_series(config: &SimConfig, p: &Patient, seed: u64) -> Vec<i32> {
    score_series(config, p, seed, Score::Pain)
}

/// Per-grid-time mean of one score over `runs` seeds.
fn mean_series(config: &SimConfig, p: &Patient, runs: u64, score: Score) -> Vec<f64> {
    let mut sums = vec![0.0; config.grid.len()];
    for seed in 0..runs {
        for (sum, v) in sums.iter_mut().zip(score_series(config, p, seed, score)) {
            *sum += v as f64;
        }
    }
    sums.into_iter().map(|s| s / runs as f64).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Ten patients on grid {0,3,6}; patient 0 is treated at 3 with pain 8.
/// With every std_dev at zero the path is fully determined:
///   t=0: 8 + 0.75 truncates to 8 (equal to baseline)
///   t=3: still pre-treatment (exclusive boundary), 8
///   t=6: established post-treatment, 8 - 0.75 truncates to 7
#[test]
fn scenario_treated_at_three_improves_by_six() {
    let mut config = SimConfig { cohort_size: 10, grid: EvaluationGrid::new(3, 6), ..SimConfig::default() };
    config.drift.pre_treatment = zero_noise(config.drift.pre_treatment);
    config.drift.early_post_treatment = zero_noise(config.drift.early_post_treatment);
    config.drift.established_post_treatment = zero_noise(config.drift.established_post_treatment);
    config.validate().unwrap();

    let patients: Vec<_> = (0..10)
        .map(|i| if i == 0 { patient(0, 8, Some(3)) } else { patient(i, 5, None) })
        .collect();
    let mut rng = RngBank::new(config.seed).for_stage(StageSlot::Trajectory);
    let panel = TrajectorySimulator::new(&config).simulate(&patients, &mut rng);

    assert_eq!(panel.len(), 30);
    let pain: Vec<i32> = panel.for_patient(0).iter().map(|r| r.scores.pain).collect();
    assert_eq!(pain, vec![8, 8, 7], "pain path for the treated patient");
    assert!(pain[2] <= pain[1]);
}

#[test]
fn scores_stay_within_bounds_under_heavy_noise() {
    let mut config = SimConfig { cohort_size: 100, ..SimConfig::default_test() };
    for row in [
        &mut config.drift.pre_treatment,
        &mut config.drift.early_post_treatment,
        &mut config.drift.established_post_treatment,
    ] {
        row.pain.std_dev = 25.0;
        row.urgency.std_dev = 25.0;
        row.nocturnal_frequency.std_dev = 25.0;
    }
    let dataset = TrialEngine::new(config.clone()).unwrap().run().unwrap();

    let mut saw_lo = false;
    let mut saw_hi = false;
    for r in dataset.panel.records() {
        for score in Score::ALL {
            let bounds = config.baseline.get(score).bounds;
            let v = r.scores.get(score);
            assert!(bounds.contains(v), "patient {} t={} {} = {v}", r.id, r.time, score.name());
            saw_lo |= v == bounds.lo;
            saw_hi |= v == bounds.hi;
        }
    }
    assert!(saw_lo && saw_hi, "Heavy noise should saturate at both bounds");
}

#[test]
fn every_patient_has_one_record_per_grid_time() {
    let config = SimConfig::default_test();
    let dataset = TrialEngine::new(config.clone()).unwrap().run().unwrap();
    let times = config.grid.times();
    assert_eq!(dataset.panel.len(), dataset.entries.len() * times.len());

    for p in &dataset.entries {
        let rows = dataset.panel.for_patient(p.id);
        let row_times: Vec<u32> = rows.iter().map(|r| r.time).collect();
        assert_eq!(row_times, times, "patient {} grid coverage", p.id);
    }
}

#[test]
fn treatment_time_and_gender_never_change_along_a_trajectory() {
    let dataset = TrialEngine::build_test(123).unwrap().run().unwrap();
    for p in &dataset.entries {
        for r in dataset.panel.for_patient(p.id) {
            assert_eq!(r.treatment_time, p.treatment_time, "patient {} t={}", p.id, r.time);
            assert_eq!(r.gender, p.gender);
        }
    }
}

#[test]
fn at_treatment_rows_match_each_treated_patient() {
    let dataset = TrialEngine::build_test(5).unwrap().run().unwrap();
    let treated: Vec<_> = dataset.entries.iter().filter(|p| p.treatment_time.is_some()).collect();
    assert_eq!(dataset.at_treatment.len(), treated.len());
    for (row, p) in dataset.at_treatment.iter().zip(&treated) {
        assert_eq!(row.id, p.id);
        assert_eq!(Some(row.time), p.treatment_time);
    }
}

/// Default drift, averaged over many seeds: the score after treatment sits
/// below both the score at the treatment instant and an untreated twin.
#[test]
fn treatment_improves_scores_in_distribution() {
    let config = SimConfig { grid: EvaluationGrid::new(3, 9), ..SimConfig::default() };
    const RUNS: u64 = 1000;

    let treated = mean_series(&config, &patient(0, 5, Some(3)), RUNS, Score::Pain);
    let untreated = mean_series(&config, &patient(0, 5, None), RUNS, Score::Pain);
    assert!(
        treated[2] < treated[1],
        "mean pain after treatment {:.2} should be below {:.2}",
        treated[2],
        treated[1]
    );
    assert!(
        treated[3] + 1.0 < untreated[3],
        "treated {:.2} vs untreated {:.2} at t=9",
        treated[3],
        untreated[3]
    );
}

/// Default drift, averaged over many seeds: never-treated scores rise
/// across the default grid despite truncation toward zero.
#[test]
fn untreated_patients_worsen_in_distribution() {
    let config = SimConfig::default();
    let p = patient(0, 5, None);
    const RUNS: u64 = 1000;

    for score in Score::ALL {
        let means = mean_series(&config, &p, RUNS, score);
        let (first, last) = (means[0], means[means.len() - 1]);
        assert!(
            last > first + 1.0,
            "mean {} should rise over the grid: t=0 {first:.2}, t={} {last:.2}",
            score.name(),
            config.grid.duration
        );
    }

    let pain = mean_series(&config, &p, RUNS, Score::Pain);
    let midpoint = pain[pain.len() / 2];
    assert!(pain[0] < midpoint, "pain mean should already rise by mid-trial: {pain:?}");
}

#[test]
fn noise_free_upward_drift_saturates_at_the_upper_bound() {
    let mut config = SimConfig { grid: EvaluationGrid::new(3, 30), ..SimConfig::default() };
    config.drift.pre_treatment.pain = DriftStep::new(1.0, 0.0);
    let pain = pain_series(&config, &patient(0, 2, None), 1);
    assert_eq!(pain[0], 3);
    assert!(pain.windows(2).all(|w| w[1] >= w[0]), "pain must not fall: {pain:?}");
    assert_eq!(*pain.last().unwrap(), 9, "pain must saturate at the upper bound");
}

/// With the default window the first post-treatment grid time is already
/// established; widening the window past one interval brings in the sharp
/// early improvement.
#[test]
fn early_window_wider_than_interval_shows_sharp_early_improvement() {
    let narrow = SimConfig { grid: EvaluationGrid::new(3, 9), ..SimConfig::default() };
    let wide = SimConfig { early_window: Some(4), ..narrow.clone() };
    wide.validate().unwrap();
    let p = patient(0, 7, Some(3));
    const RUNS: u64 = 1000;

    let narrow = mean_series(&narrow, &p, RUNS, Score::Pain);
    let wide = mean_series(&wide, &p, RUNS, Score::Pain);
    assert_eq!(narrow[1], wide[1], "pre-treatment steps do not depend on the window");

    let established_drop = narrow[1] - narrow[2];
    let early_drop = wide[1] - wide[2];
    assert!(
        early_drop > established_drop + 0.5,
        "early drop {early_drop:.2} should exceed established drop {established_drop:.2}"
    );
}

#[test]
fn inclusive_boundary_applies_early_drift_at_the_treatment_instant() {
    let mut config = SimConfig { grid: EvaluationGrid::new(3, 6), ..SimConfig::default() };
    config.boundary = TreatmentBoundary::Inclusive;
    config.drift.early_post_treatment.pain = DriftStep::new(-3.0, 0.0);
    config.drift.pre_treatment.pain = DriftStep::new(0.0, 0.0);
    config.drift.established_post_treatment.pain = DriftStep::new(-1.0, 0.0);

    let pain = pain_series(&config, &patient(0, 8, Some(3)), 9);
    assert_eq!(pain, vec![8, 5, 4]);
}
