//! Cohort (entry table) generation tests.

use trialsim_core::{
    config::{SimConfig, TreatmentAssignment},
    engine::TrialEngine,
    record::{Gender, Group, Score},
};

#[test]
fn initial_population_generates_correct_count() {
    let dataset = TrialEngine::build_test(42).unwrap().run().unwrap();
    assert_eq!(dataset.entries.len(), 40, "Expected 40 test patients, got {}", dataset.entries.len());

    let ids: Vec<u32> = dataset.entries.iter().map(|p| p.id).collect();
    assert_eq!(ids, (0..40).collect::<Vec<_>>(), "Ids must be sequential from 0");
}

#[test]
fn baseline_scores_respect_bounds() {
    let config = SimConfig { cohort_size: 500, ..SimConfig::default_test() };
    let dataset = TrialEngine::new(config.clone()).unwrap().run().unwrap();

    for p in &dataset.entries {
        for score in Score::ALL {
            let bounds = config.baseline.get(score).bounds;
            let v = p.scores.get(score);
            assert!(bounds.contains(v), "patient {} {} = {v} outside {bounds:?}", p.id, score.name());
        }
    }
}

#[test]
fn both_genders_and_both_groups_appear() {
    let config = SimConfig { cohort_size: 200, ..SimConfig::default_test() };
    let dataset = TrialEngine::new(config).unwrap().run().unwrap();

    for g in Gender::ALL {
        assert!(dataset.entries.iter().any(|p| p.gender == g), "No {g:?} patients in 200");
    }
    let treated = dataset.entries.iter().filter(|p| p.group() == Group::Treated).count();
    assert!(treated > 0 && treated < 200, "Expected a mix of groups, got {treated} treated");
}

#[test]
fn treatment_times_lie_on_the_grid() {
    let config = SimConfig::default_test();
    let dataset = TrialEngine::new(config.clone()).unwrap().run().unwrap();
    for p in &dataset.entries {
        if let Some(t) = p.treatment_time {
            assert!(config.grid.contains(t), "patient {} treated off-grid at {t}", p.id);
        }
    }
}

#[test]
fn sentinel_slots_control_the_untreated_fraction() {
    // grid has 5 slots; 45 sentinel slots ⇒ ~90% never treated.
    let mut config = SimConfig { cohort_size: 1000, ..SimConfig::default_test() };
    config.assignment = TreatmentAssignment::Uniform { never_treated_slots: 45 };
    let dataset = TrialEngine::new(config).unwrap().run().unwrap();

    let untreated = dataset.entries.iter().filter(|p| p.treatment_time.is_none()).count();
    let fraction = untreated as f64 / 1000.0;
    assert!(
        (0.85..0.95).contains(&fraction),
        "Untreated fraction {fraction:.3} should be near 0.90"
    );
}

#[test]
fn fixed_count_assignment_treats_exactly_that_many() {
    let mut config = SimConfig { cohort_size: 200, ..SimConfig::default_test() };
    config.assignment = TreatmentAssignment::FixedCount { treated: 100 };
    let summary = TrialEngine::new(config).unwrap().run().unwrap().summary();
    assert_eq!(summary.treated, 100);
    assert_eq!(summary.patients, 200);
}
