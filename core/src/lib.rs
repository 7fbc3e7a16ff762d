pub mod binning;
pub mod cohort;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod record;
pub mod risk_set;
pub mod rng;
pub mod trajectory;
pub mod types;
