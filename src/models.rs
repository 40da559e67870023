use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a log entry records. Unknown kinds survive a round trip untouched
/// and are ignored by prediction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogKind {
    Period,
    Cramps,
    Sex,
    Other(String),
}

pub const PERIOD_VALUES: &[&str] = &["extra light", "light", "medium", "heavy", "extra heavy"];
pub const CRAMPS_VALUES: &[&str] = &["light", "medium", "heavy"];
pub const SEX_VALUES: &[&str] = &["protected", "unprotected"];

impl LogKind {
    pub fn as_str(&self) -> &str {
        match self {
            LogKind::Period => "period",
            LogKind::Cramps => "cramps",
            LogKind::Sex => "sex",
            LogKind::Other(name) => name.as_str(),
        }
    }

    /// Values the day sheet offers for this kind. `None` means unconstrained.
    pub fn allowed_values(&self) -> Option<&'static [&'static str]> {
        match self {
            LogKind::Period => Some(PERIOD_VALUES),
            LogKind::Cramps => Some(CRAMPS_VALUES),
            LogKind::Sex => Some(SEX_VALUES),
            LogKind::Other(_) => None,
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.allowed_values()
            .map_or(true, |values| values.contains(&value))
    }
}

impl From<String> for LogKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "period" => LogKind::Period,
            "cramps" => LogKind::Cramps,
            "sex" => LogKind::Sex,
            _ => LogKind::Other(name),
        }
    }
}

impl From<&str> for LogKind {
    fn from(name: &str) -> Self {
        LogKind::from(name.to_string())
    }
}

impl From<LogKind> for String {
    fn from(kind: LogKind) -> Self {
        match kind {
            LogKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged event. At most one entry exists per (date, kind).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(default)]
    pub value: Option<String>,
}

impl LogEntry {
    pub fn new(date: NaiveDate, kind: LogKind, value: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            kind,
            value,
        }
    }
}

/// A run of flow days, inclusive on both ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cycle {
    pub start_date: NaiveDate,
    /// Bleed length in days, inclusive.
    pub duration: i64,
    /// Days until the next cycle starts; unknown for the latest cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_length: Option<i64>,
}

impl Cycle {
    pub fn is_completed(&self) -> bool {
        self.cycle_length.is_some()
    }

    /// Last logged flow day of this cycle.
    pub fn period_end(&self) -> NaiveDate {
        self.start_date + chrono::Duration::days(self.duration - 1)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub cycles: Vec<Cycle>,
    pub predictions: Vec<Prediction>,
    /// Weighted cycle length, rounded to one decimal for display.
    pub avg_cycle_length: f64,
    /// Sample standard deviation of completed cycle lengths, one decimal.
    pub std_dev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub completed_cycles: usize,
    pub avg_cycle_length: Option<f64>,
    pub avg_period_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

/// Markers for one rendered calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayMarks {
    pub date: NaiveDate,
    pub period: bool,
    pub cramps: bool,
    pub sex: bool,
    pub predicted: bool,
    pub today: bool,
}

/// Data returned for a month view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Blank cells before day 1 in a Sunday-first grid.
    pub first_weekday_offset: u32,
    pub days: Vec<DayMarks>,
}
