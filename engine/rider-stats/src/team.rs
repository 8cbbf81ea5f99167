//! # Team Aggregation
//!
//! Runs the rider aggregator over a club roster. History retrieval is behind
//! [`ResultsSource`] so the engine never talks to the network directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

use crate::config::{RowLimit, StatsConfig};
use crate::error::Result;
use crate::models::{Event, RosterRider};
use crate::rider::{RiderAggregate, RiderAggregator};

/// Where rosters and rider histories come from
#[async_trait]
pub trait ResultsSource: Send + Sync {
    /// Ordered rider stubs for a club
    async fn fetch_roster(&self, club_id: u64) -> Result<Vec<RosterRider>>;

    /// A rider's event history; an empty history is not an error
    async fn fetch_history(&self, zwid: u64) -> Result<Vec<Event>>;
}

/// Aggregates every rider of a roster with a shared time reference
pub struct TeamAggregator<S> {
    config: StatsConfig,
    source: S,
}

impl<S: ResultsSource> TeamAggregator<S> {
    /// Create a team aggregator
    pub fn new(config: StatsConfig, source: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, source })
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Fetch a club roster and aggregate it, with "now" taken once for the run
    pub async fn import_team(&self, club_id: u64, limit: RowLimit) -> Result<Vec<RiderAggregate>> {
        let now = Utc::now();
        let roster = self.source.fetch_roster(club_id).await.map_err(|e| e.for_club(club_id))?;
        info!("Loaded {} riders for club {}", roster.len(), club_id);

        self.aggregate_team(&roster, limit, now).await.map_err(|e| e.for_club(club_id))
    }

    /// Aggregate a single rider known only by id
    pub async fn import_rider(&self, zwid: u64) -> Result<RiderAggregate> {
        let aggregator = RiderAggregator::new(self.config.window_days.clone(), Utc::now());
        self.import_one(&aggregator, &RosterRider::with_id(zwid)).await
    }

    /// Aggregate roster riders in order, stopping at the first failure
    pub async fn aggregate_team(
        &self,
        roster: &[RosterRider],
        limit: RowLimit,
        now: DateTime<Utc>,
    ) -> Result<Vec<RiderAggregate>> {
        let aggregator = RiderAggregator::new(self.config.window_days.clone(), now);
        let count = limit.apply(roster.len());
        if count < roster.len() {
            info!("Limiting output to {} riders", count);
        }

        let aggregator = &aggregator;
        stream::iter(roster[..count].to_vec())
            .map(|rider| async move { self.import_one(aggregator, &rider).await })
            .buffered(self.config.concurrency)
            .try_collect()
            .await
    }

    async fn import_one(
        &self,
        aggregator: &RiderAggregator,
        rider: &RosterRider,
    ) -> Result<RiderAggregate> {
        info!("Importing rider {}", rider.zwid);
        let name = rider.name.trim();

        let events = self
            .source
            .fetch_history(rider.zwid)
            .await
            .map_err(|e| e.for_rider(name, rider.zwid))?;
        aggregator.aggregate(rider, &events).map_err(|e| e.for_rider(name, rider.zwid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LooseNumber, PowerDuration};
    use crate::StatsError;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn rider(zwid: u64, name: &str) -> RosterRider {
        RosterRider {
            name: name.to_string(),
            zwid,
            weight: Some(LooseNumber::number(70.0)),
            div: 30,
            divw: 0,
        }
    }

    fn race(days: i64, w20: f64) -> Event {
        let mut event = Event {
            kind: "RACE".to_string(),
            title: format!("Race {days}d"),
            event_date_secs: (now() - Duration::days(days)).timestamp(),
            avg_wkg: Some(LooseNumber::number(3.0)),
            wkg_ftp: Some(LooseNumber::number(1.1)),
            ..Default::default()
        };
        for duration in PowerDuration::ALL {
            event.set_power(duration, LooseNumber::number(0.0), LooseNumber::number(0.0));
        }
        event.set_power(PowerDuration::Min20, LooseNumber::number(w20), LooseNumber::text("3.5"));
        event
    }

    #[derive(Default)]
    struct InMemorySource {
        roster: Vec<RosterRider>,
        histories: HashMap<u64, Vec<Event>>,
        failing: Option<u64>,
        history_calls: AtomicUsize,
    }

    #[async_trait]
    impl ResultsSource for InMemorySource {
        async fn fetch_roster(&self, club_id: u64) -> Result<Vec<RosterRider>> {
            if self.roster.is_empty() {
                return Err(StatsError::fetch(format!("club {club_id}"), "unexpected status 404"));
            }
            Ok(self.roster.clone())
        }

        async fn fetch_history(&self, zwid: u64) -> Result<Vec<Event>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing == Some(zwid) {
                return Err(StatsError::fetch(format!("profile {zwid}"), "connection reset"));
            }
            Ok(self.histories.get(&zwid).cloned().unwrap_or_default())
        }
    }

    fn five_rider_source() -> InMemorySource {
        let roster: Vec<RosterRider> =
            (1..=5).map(|id| rider(id, &format!("Rider {id} "))).collect();
        let histories = (1..=5).map(|id| (id, vec![race(10, 200.0 + id as f64)])).collect();
        InMemorySource { roster, histories, ..Default::default() }
    }

    #[tokio::test]
    async fn test_limit_caps_riders_in_roster_order() {
        let team = TeamAggregator::new(StatsConfig::default(), five_rider_source()).unwrap();
        let roster = team.source.roster.clone();

        let riders = team.aggregate_team(&roster, RowLimit::from_raw(2), now()).await.unwrap();

        assert_eq!(riders.len(), 2);
        assert_eq!(riders[0].zwid, 1);
        assert_eq!(riders[1].zwid, 2);
        assert_eq!(riders[0].name, "Rider 1");
        assert_eq!(team.source.history_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_limit_processes_everyone() {
        let team = TeamAggregator::new(StatsConfig::default(), five_rider_source()).unwrap();
        let roster = team.source.roster.clone();

        let riders = team.aggregate_team(&roster, RowLimit::from_raw(0), now()).await.unwrap();

        assert_eq!(riders.len(), 5);
        let ids: Vec<u64> = riders.iter().map(|r| r.zwid).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(riders[4].window(30).unwrap().best_watts(PowerDuration::Min20), 205.0);
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_roster_order() {
        let config = StatsConfig { concurrency: 4, ..Default::default() };
        let team = TeamAggregator::new(config, five_rider_source()).unwrap();
        let roster = team.source.roster.clone();

        let riders = team.aggregate_team(&roster, RowLimit::UNLIMITED, now()).await.unwrap();

        let ids: Vec<u64> = riders.iter().map(|r| r.zwid).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_with_identity() {
        let source = InMemorySource { failing: Some(3), ..five_rider_source() };
        let team = TeamAggregator::new(StatsConfig::default(), source).unwrap();
        let roster = team.source.roster.clone();

        let err = team.aggregate_team(&roster, RowLimit::UNLIMITED, now()).await.unwrap_err();

        match &err {
            StatsError::Rider { name, id, .. } => {
                assert_eq!(name, "Rider 3");
                assert_eq!(*id, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root_cause(), StatsError::Fetch { .. }));
        assert_eq!(team.source.history_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_history_aborts_run() {
        let mut source = five_rider_source();
        let mut broken = race(3, 250.0);
        broken.wkg_ftp = Some(LooseNumber::Other(serde_json::json!("1.1")));
        source.histories.insert(2, vec![broken]);
        let team = TeamAggregator::new(StatsConfig::default(), source).unwrap();
        let roster = team.source.roster.clone();

        let err = team.aggregate_team(&roster, RowLimit::UNLIMITED, now()).await.unwrap_err();

        assert!(matches!(err, StatsError::Rider { id: 2, .. }));
        assert!(matches!(err.root_cause(), StatsError::MalformedField { field: "wkg_ftp", .. }));
    }

    #[tokio::test]
    async fn test_roster_failure_names_club() {
        let team = TeamAggregator::new(StatsConfig::default(), InMemorySource::default()).unwrap();

        let err = team.import_team(4242, RowLimit::UNLIMITED).await.unwrap_err();

        assert!(matches!(err, StatsError::Club { club_id: 4242, .. }));
    }

    #[tokio::test]
    async fn test_import_rider_without_history() {
        let team = TeamAggregator::new(StatsConfig::default(), five_rider_source()).unwrap();

        let aggregate = team.import_rider(98588).await.unwrap();

        assert_eq!(aggregate.zwid, 98588);
        assert_eq!(aggregate.rides, 0);
        assert_eq!(aggregate.windows.len(), 4);
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_import_futures_are_send() {
        let team = TeamAggregator::new(StatsConfig::default(), five_rider_source()).unwrap();
        let roster = team.source.roster.clone();

        assert_send(team.import_team(1, RowLimit::UNLIMITED));
        assert_send(team.aggregate_team(&roster, RowLimit::UNLIMITED, now()));
        assert_send(team.import_rider(1));
    }

    #[tokio::test]
    async fn test_import_team_runs_on_spawned_task() {
        let config = StatsConfig { concurrency: 3, ..Default::default() };
        let team = std::sync::Arc::new(TeamAggregator::new(config, five_rider_source()).unwrap());

        let handle = {
            let team = team.clone();
            tokio::spawn(async move { team.import_team(9, RowLimit::from_raw(4)).await })
        };
        let riders = handle.await.unwrap().unwrap();

        let ids: Vec<u64> = riders.iter().map(|r| r.zwid).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StatsConfig { window_days: vec![], ..Default::default() };
        assert!(TeamAggregator::new(config, InMemorySource::default()).is_err());
    }
}
