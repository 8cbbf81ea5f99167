//! # Configuration
//!
//! Aggregation settings shared by every rider in a run.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Window lengths used by the reference deployment
pub const DEFAULT_WINDOW_DAYS: [u32; 4] = [30, 42, 60, 90];

/// Aggregation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Lookback windows in days, in column order
    pub window_days: Vec<u32>,
    /// Riders fetched and aggregated at the same time (1 = sequential)
    pub concurrency: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { window_days: DEFAULT_WINDOW_DAYS.to_vec(), concurrency: 1 }
    }
}

impl StatsConfig {
    /// Reject configurations that cannot produce a meaningful table
    pub fn validate(&self) -> Result<()> {
        if self.window_days.is_empty() {
            return Err(StatsError::InvalidConfig("at least one window length is required".into()));
        }
        if self.window_days.contains(&0) {
            return Err(StatsError::InvalidConfig("window lengths must be positive".into()));
        }
        for (i, days) in self.window_days.iter().enumerate() {
            if self.window_days[..i].contains(days) {
                return Err(StatsError::InvalidConfig(format!("duplicate window length {days}")));
            }
        }
        if self.concurrency == 0 {
            return Err(StatsError::InvalidConfig("concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse a comma-separated window list such as `30,42,60,90`
    pub fn parse_window_days(raw: &str) -> Result<Vec<u32>> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>().map_err(|e| {
                    StatsError::InvalidConfig(format!("invalid window length `{part}`: {e}"))
                })
            })
            .collect()
    }
}

/// Cap on how many riders a team run produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLimit(Option<usize>);

impl RowLimit {
    /// No cap
    pub const UNLIMITED: RowLimit = RowLimit(None);

    /// Positive values cap the run; zero or negative values mean no cap
    pub fn from_raw(limit: i64) -> Self {
        if limit > 0 {
            Self(Some(limit as usize))
        } else {
            Self(None)
        }
    }

    /// Number of riders to process from a roster of `roster_len`
    pub fn apply(self, roster_len: usize) -> usize {
        self.0.map_or(roster_len, |limit| limit.min(roster_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StatsConfig::default();
        assert_eq!(config.window_days, vec![30, 42, 60, 90]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let empty = StatsConfig { window_days: vec![], ..Default::default() };
        assert!(empty.validate().is_err());

        let zero = StatsConfig { window_days: vec![30, 0], ..Default::default() };
        assert!(zero.validate().is_err());

        let serial = StatsConfig { concurrency: 0, ..Default::default() };
        assert!(serial.validate().is_err());

        let duplicate = StatsConfig { window_days: vec![30, 60, 30], ..Default::default() };
        let err = duplicate.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate window length 30"));
    }

    #[test]
    fn test_parse_window_days() {
        assert_eq!(StatsConfig::parse_window_days("30, 60,90").unwrap(), vec![30, 60, 90]);
        assert_eq!(StatsConfig::parse_window_days("7,").unwrap(), vec![7]);
        assert!(StatsConfig::parse_window_days("30,abc").is_err());
    }

    #[test]
    fn test_row_limit() {
        assert_eq!(RowLimit::from_raw(2).apply(5), 2);
        assert_eq!(RowLimit::from_raw(10).apply(5), 5);
        assert_eq!(RowLimit::from_raw(0).apply(5), 5);
        assert_eq!(RowLimit::from_raw(-3).apply(5), 5);
        assert_eq!(RowLimit::UNLIMITED.apply(7), 7);
        assert_eq!(RowLimit::UNLIMITED, RowLimit::from_raw(0));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: StatsConfig = serde_json::from_str(r#"{"window_days": [14]}"#).unwrap();
        assert_eq!(config.window_days, vec![14]);
        assert_eq!(config.concurrency, 1);
    }
}
