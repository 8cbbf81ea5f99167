use chrono::{DateTime, Utc};
use rider_stats::RiderAggregate;
use serde::Serialize;

/// Events emitted by an import run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ImportEvent {
    /// Rows written for a club
    RowsWritten {
        club_id: u64,
        count: usize,
        target: String,
        timestamp: DateTime<Utc>,
    },

    /// The run aborted
    ImportFailed {
        club_id: u64,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl ImportEvent {
    pub fn rows_written(club_id: u64, count: usize, target: impl Into<String>) -> Self {
        Self::RowsWritten { club_id, count, target: target.into(), timestamp: Utc::now() }
    }

    pub fn import_failed(club_id: u64, error: impl ToString) -> Self {
        Self::ImportFailed { club_id, error: error.to_string(), timestamp: Utc::now() }
    }
}

/// Single-rider report printed by `zp rider --json`
#[derive(Debug, Clone, Serialize)]
pub struct RiderReport<'a> {
    #[serde(flatten)]
    pub rider: &'a RiderAggregate,

    /// Header and values of the rider's table row
    pub columns: Vec<(String, String)>,
}

impl<'a> RiderReport<'a> {
    pub fn new(rider: &'a RiderAggregate) -> Self {
        let header = rider_stats::header_row(
            &rider.windows.iter().map(|w| w.window_days()).collect::<Vec<_>>(),
        );
        let columns = header.into_iter().zip(rider_stats::to_row(rider)).collect();
        Self { rider, columns }
    }
}
