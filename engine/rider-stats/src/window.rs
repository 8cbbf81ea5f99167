//! # Window Accumulation
//!
//! Running race statistics over a fixed lookback period in days.

use serde::Serialize;

use crate::coercion::coerce;
use crate::error::Result;
use crate::models::{Event, PowerDuration};

/// Running maxima, one slot per canonical duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerBuckets {
    best: [f64; 7],
}

impl PowerBuckets {
    /// Best value for a duration
    pub fn get(&self, duration: PowerDuration) -> f64 {
        self.best[duration.index()]
    }

    /// Replace the stored value if `value` is strictly greater
    fn offer(&mut self, duration: PowerDuration, value: f64) {
        replace_if_greater(&mut self.best[duration.index()], value);
    }
}

/// Coerced race values, built before any accumulator state changes
#[derive(Debug, Clone, Copy, Default)]
pub struct RaceEffort {
    pub ftp_ratio: f64,
    pub watts: [f64; 7],
    pub wkg: [f64; 7],
}

impl RaceEffort {
    /// Coerce all fifteen window fields of an event
    pub fn from_event(event: &Event) -> Result<Self> {
        let mut effort =
            Self { ftp_ratio: coerce("wkg_ftp", event.wkg_ftp.as_ref())?, ..Default::default() };
        for duration in PowerDuration::ALL {
            let (name, raw) = event.watts(duration);
            effort.watts[duration.index()] = coerce(name, raw)?;
            let (name, raw) = event.wkg(duration);
            effort.wkg[duration.index()] = coerce(name, raw)?;
        }
        Ok(effort)
    }
}

/// Race statistics for one window length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowAccumulator {
    window_days: u32,
    races: u32,
    best_ftp_ratio: f64,
    watts: PowerBuckets,
    wkg: PowerBuckets,
}

impl WindowAccumulator {
    /// Create an empty accumulator for `window_days`
    pub fn new(window_days: u32) -> Self {
        Self {
            window_days,
            races: 0,
            best_ftp_ratio: 0.0,
            watts: PowerBuckets::default(),
            wkg: PowerBuckets::default(),
        }
    }

    /// Fold one event in. Events outside the window and non-races are ignored.
    pub fn observe(&mut self, event: &Event, days_ago: i64) -> Result<()> {
        if !self.contains(days_ago) || !event.is_race() {
            return Ok(());
        }
        let effort = RaceEffort::from_event(event)?;
        self.apply(&effort);
        Ok(())
    }

    /// Fold an already-coerced race effort into the window
    pub fn apply(&mut self, effort: &RaceEffort) {
        self.races += 1;
        replace_if_greater(&mut self.best_ftp_ratio, effort.ftp_ratio);
        for duration in PowerDuration::ALL {
            self.watts.offer(duration, effort.watts[duration.index()]);
            self.wkg.offer(duration, effort.wkg[duration.index()]);
        }
    }

    /// Whether an event `days_ago` days old falls inside this window
    pub fn contains(&self, days_ago: i64) -> bool {
        days_ago <= i64::from(self.window_days)
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn races(&self) -> u32 {
        self.races
    }

    pub fn best_ftp_ratio(&self) -> f64 {
        self.best_ftp_ratio
    }

    /// Best absolute power for a duration
    pub fn best_watts(&self, duration: PowerDuration) -> f64 {
        self.watts.get(duration)
    }

    /// Best power-to-weight for a duration
    pub fn best_wkg(&self, duration: PowerDuration) -> f64 {
        self.wkg.get(duration)
    }
}

fn replace_if_greater(current: &mut f64, value: f64) {
    if value > *current {
        *current = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LooseNumber;

    fn race(ftp: f64, w20: f64, wkg20: &str) -> Event {
        let mut event = Event {
            kind: "RACE".to_string(),
            wkg_ftp: Some(LooseNumber::number(ftp)),
            avg_wkg: Some(LooseNumber::number(0.0)),
            ..Default::default()
        };
        for duration in PowerDuration::ALL {
            event.set_power(duration, LooseNumber::number(0.0), LooseNumber::number(0.0));
        }
        event.set_power(PowerDuration::Min20, LooseNumber::number(w20), LooseNumber::text(wkg20));
        event
    }

    #[test]
    fn test_race_inside_window() {
        let mut window = WindowAccumulator::new(30);
        window.observe(&race(1.1, 250.0, "3.5"), 10).unwrap();

        assert_eq!(window.races(), 1);
        assert_eq!(window.best_ftp_ratio(), 1.1);
        assert_eq!(window.best_watts(PowerDuration::Min20), 250.0);
        assert_eq!(window.best_wkg(PowerDuration::Min20), 3.5);
        assert_eq!(window.best_watts(PowerDuration::Sec5), 0.0);
    }

    #[test]
    fn test_window_exclusion() {
        let mut window = WindowAccumulator::new(30);
        window.observe(&race(1.3, 300.0, "4.0"), 31).unwrap();
        assert_eq!(window, WindowAccumulator::new(30));

        // The boundary day is still inside
        window.observe(&race(1.3, 300.0, "4.0"), 30).unwrap();
        assert_eq!(window.races(), 1);
    }

    #[test]
    fn test_non_race_ignored() {
        let mut window = WindowAccumulator::new(30);
        let mut ride = race(1.3, 300.0, "4.0");
        ride.kind = "RIDE".to_string();
        window.observe(&ride, 1).unwrap();
        assert_eq!(window, WindowAccumulator::new(30));
    }

    #[test]
    fn test_max_fold_is_order_independent() {
        let events = [race(1.0, 240.0, "3.4"), race(1.2, 260.0, "3.3"), race(0.9, 250.0, "3.6")];

        let mut forward = WindowAccumulator::new(42);
        let mut previous = 0.0;
        for event in &events {
            forward.observe(event, 5).unwrap();
            assert!(forward.best_watts(PowerDuration::Min20) >= previous);
            previous = forward.best_watts(PowerDuration::Min20);
        }

        let mut backward = WindowAccumulator::new(42);
        for event in events.iter().rev() {
            backward.observe(event, 5).unwrap();
        }

        assert_eq!(forward, backward);
        assert_eq!(forward.races(), 3);
        assert_eq!(forward.best_ftp_ratio(), 1.2);
        assert_eq!(forward.best_watts(PowerDuration::Min20), 260.0);
        assert_eq!(forward.best_wkg(PowerDuration::Min20), 3.6);
    }

    #[test]
    fn test_malformed_field_leaves_state_untouched() {
        let mut window = WindowAccumulator::new(30);
        let mut broken = race(1.1, 250.0, "3.5");
        broken.w5 = None;

        assert!(window.observe(&broken, 1).is_err());
        assert_eq!(window, WindowAccumulator::new(30));
    }
}
