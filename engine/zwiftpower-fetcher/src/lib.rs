//! ZwiftPower Fetcher
//!
//! Pulls club rosters and rider histories from the ZwiftPower results cache,
//! aggregates them with `rider-stats` and writes one CSV row per rider.
//! Runs once from the command line or as a small HTTP trigger service.

pub mod config;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod output;
pub mod service;

pub use config::FetcherConfig;
pub use fetcher::ZwiftPowerFetcher;
pub use models::{ImportEvent, RiderReport};
pub use output::RowWriter;
pub use service::TriggerService;
