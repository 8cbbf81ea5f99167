//! Error types for rider statistics aggregation

use thiserror::Error;

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while importing and aggregating rider data
#[derive(Error, Debug)]
pub enum StatsError {
    /// Retrieval failed or the remote answered with a non-success status
    #[error("fetching {target}: {reason}")]
    Fetch { target: String, reason: String },

    /// A response body did not decode into the expected shape
    #[error("malformed record in {context}: {reason}")]
    MalformedRecord { context: String, reason: String },

    /// A loosely-typed numeric field had the wrong shape
    #[error("malformed field `{field}`: {reason}")]
    MalformedField { field: &'static str, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Failure while importing one rider
    #[error("loading data for {name} ({id}): {source}")]
    Rider {
        name: String,
        id: u64,
        #[source]
        source: Box<StatsError>,
    },

    /// Failure while importing a club roster
    #[error("loading club {club_id}: {source}")]
    Club {
        club_id: u64,
        #[source]
        source: Box<StatsError>,
    },
}

impl StatsError {
    /// Create a new fetch error
    pub fn fetch(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch { target: target.into(), reason: reason.to_string() }
    }

    /// Create a new malformed record error
    pub fn malformed_record(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedRecord { context: context.into(), reason: reason.to_string() }
    }

    /// Create a new malformed field error
    pub fn malformed_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedField { field, reason: reason.into() }
    }

    /// Attach rider identity to an error
    pub fn for_rider(self, name: impl Into<String>, id: u64) -> Self {
        Self::Rider { name: name.into(), id, source: Box::new(self) }
    }

    /// Attach club identity to an error
    pub fn for_club(self, club_id: u64) -> Self {
        Self::Club { club_id, source: Box::new(self) }
    }

    /// The innermost error, with identity wrappers removed
    pub fn root_cause(&self) -> &StatsError {
        match self {
            Self::Rider { source, .. } | Self::Club { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
