use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Position of a bar on the time axis.
///
/// Intraday datasets use Unix timestamps (seconds); daily and coarser
/// datasets use calendar dates. Encoded as an integer or a `"YYYY-MM-DD"`
/// string respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimePoint {
    Unix(i64),
    Date(NaiveDate),
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(ts) => write!(f, "{ts}"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for TimePoint {
    fn from(ts: i64) -> Self {
        Self::Unix(ts)
    }
}

impl From<NaiveDate> for TimePoint {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: TimePoint,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Midpoint of the bar's range.
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub time: TimePoint,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Output shape shared by every indicator series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: TimePoint,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SeriesPoint {
    pub fn new(time: TimePoint, value: f64) -> Self {
        Self {
            time,
            value,
            color: None,
        }
    }

    pub fn with_color(time: TimePoint, value: f64, color: impl Into<String>) -> Self {
        Self {
            time,
            value,
            color: Some(color.into()),
        }
    }
}

/// A location in chart space: the source of truth for drawings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: TimePoint,
    pub price: f64,
}

impl ChartPoint {
    pub fn new(time: impl Into<TimePoint>, price: f64) -> Self {
        Self {
            time: time.into(),
            price,
        }
    }
}

/// Extract close prices as a series keyed by candle time.
pub fn close_series(candles: &[Candle]) -> Vec<SeriesPoint> {
    candles
        .iter()
        .map(|c| SeriesPoint::new(c.time, c.close))
        .collect()
}
