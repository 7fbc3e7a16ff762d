//! The trial engine: runs the generation pipeline end to end.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Cohort generation     (StageSlot::Cohort)
//!   2. Trajectory simulation (StageSlot::Trajectory)
//!   3. Risk-set construction (no randomness)
//!   4. Covariate binning     (no randomness, skipped when disabled)
//!
//! RULES:
//!   - Each stage reads ONLY the outputs of earlier stages.
//!   - All randomness flows through the RngBank.
//!   - Every stage reports its output in the event log.
//!   - Empty risk-set partitions are reported as warnings whether or not
//!     binning runs.

use crate::{
    binning::{BinnedRiskSets, CovariateBinner},
    cohort::CohortGenerator,
    config::SimConfig,
    dataset::TrialDataset,
    error::SimResult,
    event::TrialEvent,
    record::Patient,
    risk_set::{Arm, RiskSetBuilder, RiskSets},
    rng::{RngBank, StageSlot},
    trajectory::TrajectorySimulator,
};

pub struct TrialEngine {
    rng_bank: RngBank,
    config:   SimConfig,
}

impl TrialEngine {
    /// Validates the config; nothing runs until `run()`.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            rng_bank: RngBank::new(config.seed),
            config,
        })
    }

    /// Engine over the small test config with the given seed.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        Self::new(SimConfig { seed, ..SimConfig::default_test() })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run every stage in order. Calling this twice yields identical
    /// datasets: each call starts fresh stage streams from the seed.
    pub fn run(&self) -> SimResult<TrialDataset> {
        let mut events = vec![TrialEvent::RunInitialized {
            seed:        self.config.seed,
            cohort_size: self.config.cohort_size,
            grid_times:  self.config.grid.len(),
        }];

        let mut rng = self.rng_bank.for_stage(StageSlot::Cohort);
        let entries = CohortGenerator::new(&self.config).generate(&mut rng);
        events.push(TrialEvent::CohortGenerated {
            patients: entries.len(),
            treated:  entries.iter().filter(|p| p.treatment_time.is_some()).count(),
        });

        let mut rng = self.rng_bank.for_stage(StageSlot::Trajectory);
        let panel = TrajectorySimulator::new(&self.config).simulate(&entries, &mut rng);
        events.push(TrialEvent::TrajectoriesSimulated { records: panel.len() });

        let risk_sets = RiskSetBuilder::build(&panel);
        for (&time, set) in &risk_sets {
            events.push(TrialEvent::RiskSetBuilt {
                time,
                treated: set.treated().len(),
                control: set.control().len(),
            });
            for arm in [Arm::Treated, Arm::Control] {
                if set.arm(arm).is_empty() {
                    log::warn!("risk_set: t={time} {arm:?} partition is empty");
                    events.push(TrialEvent::EmptySubset { time, arm });
                }
            }
        }
        log::info!("risk_set: built {} risk sets", risk_sets.len());

        let binned = if self.config.binning.enabled {
            Some(self.bin(&entries, &risk_sets, &mut events)?)
        } else {
            log::info!("binning: disabled");
            None
        };

        Ok(TrialDataset {
            seed: self.config.seed,
            at_treatment: panel.at_treatment(),
            entries,
            panel,
            risk_sets,
            binned,
            events,
        })
    }

    fn bin(
        &self,
        entries: &[Patient],
        risk_sets: &RiskSets,
        events: &mut Vec<TrialEvent>,
    ) -> SimResult<BinnedRiskSets> {
        let binned = CovariateBinner::new(&self.config.binning).bin_all(entries, risk_sets)?;
        for (&time, set) in &binned {
            // Empty arms were already reported when the risk set was built.
            for arm in [Arm::Treated, Arm::Control] {
                let subset = set.arm(arm);
                if !subset.is_empty() {
                    events.push(TrialEvent::SubsetBinned { time, arm, rows: subset.rows.len() });
                }
            }
        }
        log::info!(
            "binning: binned {} risk sets on {} covariates",
            binned.len(),
            self.config.binning.covariates.len()
        );
        Ok(binned)
    }
}
