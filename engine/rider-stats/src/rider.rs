//! # Rider Aggregation
//!
//! Folds one rider's event history into lifetime counters, "latest" tracking
//! and one [`WindowAccumulator`] per configured window length.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::coercion::coerce;
use crate::error::Result;
use crate::models::{Event, RosterRider};
use crate::window::WindowAccumulator;

/// Most recent event of any kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestEvent {
    pub title: String,
    pub date: DateTime<Utc>,
}

/// Most recent race, with its headline ratios
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestRace {
    pub title: String,
    pub date: DateTime<Utc>,
    pub avg_wkg: f64,
    pub wkg_ftp: f64,
}

/// Everything derived for one rider in one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiderAggregate {
    pub name: String,
    pub zwid: u64,
    pub div: i32,
    pub divw: i32,
    pub weight: f64,
    pub rides: u32,
    pub races: u32,
    pub windows: Vec<WindowAccumulator>,
    pub latest_event: Option<LatestEvent>,
    pub latest_race: Option<LatestRace>,
}

impl RiderAggregate {
    /// Identity-only aggregate with empty windows
    fn seeded(rider: &RosterRider, window_days: &[u32]) -> Result<Self> {
        Ok(Self {
            name: rider.name.trim().to_string(),
            zwid: rider.zwid,
            div: rider.div,
            divw: rider.divw,
            weight: coerce("w", rider.weight.as_ref())?,
            rides: 0,
            races: 0,
            windows: window_days.iter().copied().map(WindowAccumulator::new).collect(),
            latest_event: None,
            latest_race: None,
        })
    }

    /// The accumulator for a given window length, if configured
    pub fn window(&self, window_days: u32) -> Option<&WindowAccumulator> {
        self.windows.iter().find(|w| w.window_days() == window_days)
    }
}

/// Whole days between `occurred` and `now`, truncated toward zero
pub fn days_ago(now: DateTime<Utc>, occurred: DateTime<Utc>) -> i64 {
    (now - occurred).num_hours() / 24
}

/// Single-pass aggregator bound to a window set and a fixed "now"
#[derive(Debug, Clone)]
pub struct RiderAggregator {
    window_days: Vec<u32>,
    now: DateTime<Utc>,
}

impl RiderAggregator {
    /// Create an aggregator. `now` must be shared by every rider in a run.
    pub fn new(window_days: Vec<u32>, now: DateTime<Utc>) -> Self {
        Self { window_days, now }
    }

    /// Aggregate a rider's events, in delivered order
    pub fn aggregate(&self, rider: &RosterRider, events: &[Event]) -> Result<RiderAggregate> {
        let mut aggregate = RiderAggregate::seeded(rider, &self.window_days)?;

        if events.is_empty() {
            info!("No event data for rider {}", rider.zwid);
            return Ok(aggregate);
        }

        let mut latest_event_date = DateTime::<Utc>::default();
        let mut latest_race_date = DateTime::<Utc>::default();

        for event in events {
            let occurred = event.occurred_at();
            let days_ago = days_ago(self.now, occurred);
            let is_race = event.is_race();

            aggregate.rides += 1;
            if is_race {
                aggregate.races += 1;
                for window in &mut aggregate.windows {
                    window.observe(event, days_ago)?;
                }
            }

            if occurred > latest_event_date {
                latest_event_date = occurred;
                aggregate.latest_event =
                    Some(LatestEvent { title: event.title.clone(), date: occurred });
            }

            if is_race && occurred > latest_race_date {
                latest_race_date = occurred;
                aggregate.latest_race = Some(LatestRace {
                    title: event.title.clone(),
                    date: occurred,
                    avg_wkg: coerce("avg_wkg", event.avg_wkg.as_ref())?,
                    wkg_ftp: coerce("wkg_ftp", event.wkg_ftp.as_ref())?,
                });
            }
        }

        debug!(
            "Aggregated rider {}: {} rides, {} races across {} windows",
            aggregate.zwid,
            aggregate.rides,
            aggregate.races,
            aggregate.windows.len()
        );

        Ok(aggregate)
    }
}
