//! # Rider Stats
//!
//! Rolling-window race statistics for ZwiftPower riders.
//!
//! A run fetches a club roster, pulls each rider's event history through a
//! [`ResultsSource`], folds the history into one [`WindowAccumulator`] per
//! configured window length and projects the result into table rows.
//! "Now" is captured once per run so every rider shares the same windows.

pub mod coercion;
pub mod config;
pub mod error;
pub mod models;
pub mod rider;
pub mod row;
pub mod team;
pub mod window;

// Re-export main types for easy usage
pub use coercion::coerce;
pub use config::{RowLimit, StatsConfig, DEFAULT_WINDOW_DAYS};
pub use error::{Result, StatsError};
pub use models::{ClubRoster, Event, LooseNumber, PowerDuration, RiderHistory, RosterRider};
pub use rider::{LatestEvent, LatestRace, RiderAggregate, RiderAggregator};
pub use row::{category_label, header_row, to_row};
pub use team::{ResultsSource, TeamAggregator};
pub use window::WindowAccumulator;
