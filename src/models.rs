//! Typed entities exchanged with the prediction service.
//!
//! Every response body is parsed into these types at the boundary, so a
//! negative demand, a missing field or an unknown enum label fails there
//! instead of leaking into derived metrics.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseVariantError;

// ==================== Locations ====================

/// A selectable bus stop / city returned by `GET /locations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ==================== Request Context ====================

/// Part of the day the prediction covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
    #[default]
    #[serde(rename = "Full_Day")]
    FullDay,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 5] = [
        TimePeriod::Morning,
        TimePeriod::Afternoon,
        TimePeriod::Evening,
        TimePeriod::Night,
        TimePeriod::FullDay,
    ];

    /// Value sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "Morning",
            TimePeriod::Afternoon => "Afternoon",
            TimePeriod::Evening => "Evening",
            TimePeriod::Night => "Night",
            TimePeriod::FullDay => "Full_Day",
        }
    }

    /// Human-readable label (`Full_Day` becomes `Full Day`).
    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::FullDay => "Full Day",
            other => other.as_str(),
        }
    }
}

/// Kind of day the prediction is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Occasion {
    #[default]
    Regular,
    Weekend,
    Holiday,
    Festival,
    #[serde(rename = "Special Event")]
    SpecialEvent,
}

impl Occasion {
    pub const ALL: [Occasion; 5] = [
        Occasion::Regular,
        Occasion::Weekend,
        Occasion::Holiday,
        Occasion::Festival,
        Occasion::SpecialEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Occasion::Regular => "Regular",
            Occasion::Weekend => "Weekend",
            Occasion::Holiday => "Holiday",
            Occasion::Festival => "Festival",
            Occasion::SpecialEvent => "Special Event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Season {
    Spring,
    #[default]
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

/// Parse a label case-insensitively, accepting `_`, `-` and spaces
/// interchangeably (`full day`, `Full_Day` and `full-day` are the same).
fn parse_variant<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    as_str: fn(&T) -> &'static str,
) -> Result<T, ParseVariantError> {
    let normalize = |s: &str| {
        s.trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect::<String>()
    };
    let wanted = normalize(value);
    all.iter()
        .find(|variant| normalize(as_str(*variant)) == wanted)
        .copied()
        .ok_or_else(|| ParseVariantError {
            kind,
            value: value.to_string(),
        })
}

impl FromStr for TimePeriod {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("time period", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for Occasion {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("occasion", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for Season {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("season", s, &Self::ALL, Self::as_str)
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Occasion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Prediction ====================

/// A validated prediction request, ready to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionRequest {
    pub start_location_id: i64,
    pub end_location_id: i64,
    pub time_period: TimePeriod,
    pub occasion: Occasion,
    pub season: Season,
}

/// Prediction for a single named time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotPrediction {
    pub time_slot: String,
    pub predicted_demand: u32,
    pub buses_needed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEndpoints {
    pub start: Location,
    pub end: Location,
}

impl RouteEndpoints {
    /// `"Austin (ID: 1) to Dallas (ID: 2)"`
    pub fn describe(&self) -> String {
        format!(
            "{} (ID: {}) to {} (ID: {})",
            self.start.name, self.start.id, self.end.name, self.end.id
        )
    }
}

/// Response of `POST /predict`.
///
/// `predictions` keeps the order the service returned. The totals are the
/// service's own figures; see [`crate::metrics::derive`] for the recomputed
/// ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub route: RouteEndpoints,
    pub time_period: TimePeriod,
    pub occasion: Occasion,
    pub season: Season,
    pub predictions: Vec<TimeSlotPrediction>,
    pub total_predicted_demand: u64,
    pub total_buses_needed: u64,
}

// ==================== History ====================

/// One entry of `GET /predictions/history`, with the route flattened to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub start_location_id: Option<i64>,
    pub start_location_name: String,
    #[serde(default)]
    pub end_location_id: Option<i64>,
    pub end_location_name: String,
    pub time_period: TimePeriod,
    pub occasion: Occasion,
    pub season: Season,
    pub total_predicted_demand: u64,
    pub total_buses_needed: u64,
}

/// Parse either an RFC 3339 instant or a naive `YYYY-MM-DD HH:MM:SS`
/// (optionally with `T` and fractional seconds), the latter taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}
