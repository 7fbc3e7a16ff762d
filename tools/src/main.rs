//! trial-runner: headless generator for the emulated-trial dataset.
//!
//! Usage:
//!   trial-runner --seed 69 --patients 200
//!   trial-runner --config trial.json --json > dataset.json

use anyhow::Result;
use trialsim_core::{config::SimConfig, dataset::TrialDataset, engine::TrialEngine};
use std::env;
use std::io::{self, Write};

#[derive(serde::Serialize)]
struct Export<'a> {
    generated_at: String,
    generator:    &'static str,
    dataset:      &'a TrialDataset,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json_mode = args.iter().any(|a| a == "--json");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let mut config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.cohort_size = parse_arg(&args, "--patients", config.cohort_size);

    if !json_mode {
        println!("Emulated trial: trial-runner");
        println!("  seed:      {}", config.seed);
        println!("  patients:  {}", config.cohort_size);
        println!(
            "  grid:      every {} up to {} ({} evaluations)",
            config.grid.interval,
            config.grid.duration,
            config.grid.len()
        );
        println!("  config:    {}", config_path.unwrap_or("(defaults)"));
        println!();
    }

    let engine = TrialEngine::new(config)?;
    let dataset = engine.run()?;

    if json_mode {
        let export = Export {
            generated_at: chrono::Utc::now().to_rfc3339(),
            generator:    env!("CARGO_PKG_VERSION"),
            dataset:      &dataset,
        };
        let mut stdout = io::stdout().lock();
        serde_json::to_writer(&mut stdout, &export)?;
        writeln!(stdout)?;
    } else {
        print_summary(&dataset);
    }
    Ok(())
}

fn print_summary(dataset: &TrialDataset) {
    let summary = dataset.summary();
    println!("=== RUN SUMMARY ===");
    println!("  patients:         {}", summary.patients);
    println!("  treated:          {}", summary.treated);
    println!("  never treated:    {}", summary.patients - summary.treated);
    println!("  evaluations:      {}", summary.evaluations);
    println!("  risk-set keys:    {}", summary.risk_set_keys);
    println!("  empty partitions: {}", summary.empty_partitions);

    println!();
    println!("=== RISK SETS ===");
    if dataset.risk_sets.is_empty() {
        println!("  (No patient was treated)");
    }
    for (time, set) in &dataset.risk_sets {
        println!(
            "  t={time:>3} | treated: {:>4} | control: {:>4}",
            set.treated().len(),
            set.control().len()
        );
    }

    let warnings = dataset.events.iter().filter(|e| e.is_warning()).count();
    if warnings > 0 {
        log::warn!("{warnings} empty risk-set partitions");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
