pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod ma;
pub mod macd;
pub mod params;
pub mod supertrend;
pub mod volume;

use error_stack::{Report, bail};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::model::SeriesPoint;

use self::aroon::AroonOutput;
use self::bollinger::BollingerOutput;
use self::macd::MacdOutput;
use self::supertrend::SuperTrendOutput;

/// A technical analysis indicator computed over a whole dataset.
///
/// Candles must be in ascending chronological order (oldest first).
/// Implementations are pure: the same dataset always yields the same series,
/// and insufficient data yields an empty series rather than an error.
pub trait Indicator {
    /// Minimum number of candles required to produce at least one output value.
    fn required_candles(&self) -> usize;

    /// Recompute the full output from scratch.
    fn compute(&self, dataset: &Dataset) -> IndicatorSeries;
}

/// Computed output of one indicator, one variant per output shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum IndicatorSeries {
    Histogram(Vec<SeriesPoint>),
    Line(Vec<SeriesPoint>),
    Macd(Option<MacdOutput>),
    Bands(Option<BollingerOutput>),
    Aroon(Option<AroonOutput>),
    AroonOsc(Option<Vec<SeriesPoint>>),
    SuperTrend(Option<SuperTrendOutput>),
}

impl IndicatorSeries {
    /// Number of points on the primary output line.
    pub fn primary_len(&self) -> usize {
        match self {
            Self::Histogram(points) | Self::Line(points) => points.len(),
            Self::Macd(out) => out.as_ref().map_or(0, |o| o.macd.len()),
            Self::Bands(out) => out.as_ref().map_or(0, |o| o.middle.len()),
            Self::Aroon(out) => out.as_ref().map_or(0, |o| o.up.len()),
            Self::AroonOsc(out) => out.as_ref().map_or(0, Vec::len),
            Self::SuperTrend(out) => out.as_ref().map_or(0, |o| o.line.len()),
        }
    }

    /// Fixed output lines in render order, with empty slices for a `None`
    /// output. SuperTrend yields nothing here since it renders as segments.
    pub fn lines(&self) -> Vec<&[SeriesPoint]> {
        const EMPTY: &[SeriesPoint] = &[];

        match self {
            Self::Histogram(points) | Self::Line(points) => vec![points.as_slice()],
            Self::AroonOsc(out) => vec![out.as_deref().unwrap_or(EMPTY)],
            Self::Macd(out) => out.as_ref().map_or(vec![EMPTY; 3], |o| {
                vec![&o.histogram[..], &o.macd[..], &o.signal[..]]
            }),
            Self::Bands(out) => out.as_ref().map_or(vec![EMPTY; 3], |o| {
                vec![&o.upper[..], &o.middle[..], &o.lower[..]]
            }),
            Self::Aroon(out) => out
                .as_ref()
                .map_or(vec![EMPTY; 2], |o| vec![&o.up[..], &o.down[..]]),
            Self::SuperTrend(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary_len() == 0
    }
}

/// Largest period any indicator accepts.
pub const MAX_PERIOD: usize = 100_000;

pub(crate) fn validate_period(name: &str, period: usize) -> Result<(), Report<IndicatorError>> {
    if period == 0 || period > MAX_PERIOD {
        bail!(IndicatorError::InvalidParameter {
            name: format!("{name} must be in 1..={MAX_PERIOD}, got {period}"),
        });
    }
    Ok(())
}

pub(crate) fn validate_multiplier(multiplier: f64) -> Result<(), Report<IndicatorError>> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        bail!(IndicatorError::InvalidParameter {
            name: "multiplier must be a finite number > 0".into(),
        });
    }
    Ok(())
}
