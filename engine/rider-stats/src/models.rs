//! Wire models for the ZwiftPower results cache
//!
//! The cache encodes most numeric values as a sequence whose first element is
//! either a JSON number or a numeric string, e.g. `[250]`, `["3.5"]` or
//! `["3.2", 0]`. Only the first element carries the value; trailing elements
//! may be anything. Those fields are decoded into [`LooseNumber`] and only
//! turned into floats through [`crate::coercion::coerce`].

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, StatsError};

/// A loosely-typed numeric field as delivered by the cache
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LooseNumber {
    /// The expected shape: a sequence, classified by its first element
    Sequence(Vec<serde_json::Value>),
    /// Anything else; rejected by coercion
    Other(serde_json::Value),
}

impl LooseNumber {
    /// A single numeric element, the shape the cache uses for clean values
    pub fn number(value: f64) -> Self {
        Self::Sequence(vec![serde_json::Value::from(value)])
    }

    /// A single string element
    pub fn text(value: impl Into<String>) -> Self {
        Self::Sequence(vec![serde_json::Value::String(value.into())])
    }
}

/// The seven canonical effort durations tracked per window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerDuration {
    Min20,
    Min5,
    Min2,
    Min1,
    Sec30,
    Sec15,
    Sec5,
}

impl PowerDuration {
    /// All durations, longest first. Row and header order follow this.
    pub const ALL: [PowerDuration; 7] = [
        PowerDuration::Min20,
        PowerDuration::Min5,
        PowerDuration::Min2,
        PowerDuration::Min1,
        PowerDuration::Sec30,
        PowerDuration::Sec15,
        PowerDuration::Sec5,
    ];

    /// Column label fragment, e.g. `20min` or `30sec`
    pub fn label(self) -> &'static str {
        match self {
            PowerDuration::Min20 => "20min",
            PowerDuration::Min5 => "5min",
            PowerDuration::Min2 => "2min",
            PowerDuration::Min1 => "1min",
            PowerDuration::Sec30 => "30sec",
            PowerDuration::Sec15 => "15sec",
            PowerDuration::Sec5 => "5sec",
        }
    }

    /// Position within [`PowerDuration::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One rider entry from a club roster
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RosterRider {
    #[serde(default)]
    pub name: String,

    pub zwid: u64,

    /// Body weight in kg, loosely typed
    #[serde(rename = "w", default)]
    pub weight: Option<LooseNumber>,

    /// Category code (5 = A+, 10 = A, 20 = B, 30 = C, 40 = D)
    #[serde(default)]
    pub div: i32,

    /// Women's category code, same mapping as `div`
    #[serde(default)]
    pub divw: i32,
}

impl RosterRider {
    /// Stub for a rider known only by id (single-rider imports)
    pub fn with_id(zwid: u64) -> Self {
        Self { name: String::new(), zwid, weight: Some(LooseNumber::number(0.0)), div: 0, divw: 0 }
    }
}

/// Club roster response: `{"data": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubRoster {
    #[serde(rename = "data", default)]
    pub riders: Vec<RosterRider>,
}

impl ClubRoster {
    /// Decode a roster body
    pub fn from_slice(body: &[u8], context: &str) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| StatsError::malformed_record(context, e))
    }
}

/// One historical activity from a rider profile
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Event {
    /// Free-text classifier; races contain `RACE`
    #[serde(rename = "f_t", default)]
    pub kind: String,

    /// Seconds since epoch; absent or unparsable values resolve to zero
    #[serde(rename = "event_date", default, deserialize_with = "lenient_epoch_secs")]
    pub event_date_secs: i64,

    #[serde(rename = "event_title", default)]
    pub title: String,

    #[serde(default)]
    pub avg_wkg: Option<LooseNumber>,
    #[serde(default)]
    pub wkg_ftp: Option<LooseNumber>,

    #[serde(default)]
    pub wkg1200: Option<LooseNumber>,
    #[serde(default)]
    pub wkg300: Option<LooseNumber>,
    #[serde(default)]
    pub wkg120: Option<LooseNumber>,
    #[serde(default)]
    pub wkg60: Option<LooseNumber>,
    #[serde(default)]
    pub wkg30: Option<LooseNumber>,
    #[serde(default)]
    pub wkg15: Option<LooseNumber>,
    #[serde(default)]
    pub wkg5: Option<LooseNumber>,

    #[serde(default)]
    pub w1200: Option<LooseNumber>,
    #[serde(default)]
    pub w300: Option<LooseNumber>,
    #[serde(default)]
    pub w120: Option<LooseNumber>,
    #[serde(default)]
    pub w60: Option<LooseNumber>,
    #[serde(default)]
    pub w30: Option<LooseNumber>,
    #[serde(default)]
    pub w15: Option<LooseNumber>,
    #[serde(default)]
    pub w5: Option<LooseNumber>,
}

impl Event {
    /// Races are identified by a case-sensitive `RACE` substring in the kind
    pub fn is_race(&self) -> bool {
        self.kind.contains("RACE")
    }

    /// Occurrence time; out-of-range values fall back to the epoch
    pub fn occurred_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.event_date_secs, 0).single().unwrap_or_default()
    }

    /// Raw absolute power field for a duration, with its wire name
    pub fn watts(&self, duration: PowerDuration) -> (&'static str, Option<&LooseNumber>) {
        match duration {
            PowerDuration::Min20 => ("w1200", self.w1200.as_ref()),
            PowerDuration::Min5 => ("w300", self.w300.as_ref()),
            PowerDuration::Min2 => ("w120", self.w120.as_ref()),
            PowerDuration::Min1 => ("w60", self.w60.as_ref()),
            PowerDuration::Sec30 => ("w30", self.w30.as_ref()),
            PowerDuration::Sec15 => ("w15", self.w15.as_ref()),
            PowerDuration::Sec5 => ("w5", self.w5.as_ref()),
        }
    }

    /// Raw power-to-weight field for a duration, with its wire name
    pub fn wkg(&self, duration: PowerDuration) -> (&'static str, Option<&LooseNumber>) {
        match duration {
            PowerDuration::Min20 => ("wkg1200", self.wkg1200.as_ref()),
            PowerDuration::Min5 => ("wkg300", self.wkg300.as_ref()),
            PowerDuration::Min2 => ("wkg120", self.wkg120.as_ref()),
            PowerDuration::Min1 => ("wkg60", self.wkg60.as_ref()),
            PowerDuration::Sec30 => ("wkg30", self.wkg30.as_ref()),
            PowerDuration::Sec15 => ("wkg15", self.wkg15.as_ref()),
            PowerDuration::Sec5 => ("wkg5", self.wkg5.as_ref()),
        }
    }

    /// Set the absolute and per-kg values for one duration
    #[cfg(test)]
    pub(crate) fn set_power(
        &mut self,
        duration: PowerDuration,
        watts: LooseNumber,
        wkg: LooseNumber,
    ) {
        let (w, k) = match duration {
            PowerDuration::Min20 => (&mut self.w1200, &mut self.wkg1200),
            PowerDuration::Min5 => (&mut self.w300, &mut self.wkg300),
            PowerDuration::Min2 => (&mut self.w120, &mut self.wkg120),
            PowerDuration::Min1 => (&mut self.w60, &mut self.wkg60),
            PowerDuration::Sec30 => (&mut self.w30, &mut self.wkg30),
            PowerDuration::Sec15 => (&mut self.w15, &mut self.wkg15),
            PowerDuration::Sec5 => (&mut self.w5, &mut self.wkg5),
        };
        *w = Some(watts);
        *k = Some(wkg);
    }
}

/// Profile history response: `{"data": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiderHistory {
    #[serde(rename = "data", default)]
    pub events: Vec<Event>,
}

impl RiderHistory {
    /// Decode a profile body. An empty body is an empty history.
    pub fn from_slice(body: &[u8], context: &str) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| StatsError::malformed_record(context, e))
    }
}

/// `event_date` is usually a number but sometimes an empty or numeric string
fn lenient_epoch_secs<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let secs = match value {
        serde_json::Value::Number(n) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0)
        }
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    Ok(secs)
}
