use error_stack::Report;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorSeries, validate_period};
use crate::model::{Candle, SeriesPoint, close_series};

/// Simple Moving Average of close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sma {
    period: usize,
}

impl Default for Sma {
    fn default() -> Self {
        Self { period: 9 }
    }
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// One point per full window; the first `period - 1` candles are omitted.
    pub fn calculate(&self, candles: &[Candle]) -> Vec<SeriesPoint> {
        if candles.len() < self.period {
            return Vec::new();
        }
        candles
            .windows(self.period)
            .map(|w| {
                let sum: f64 = w.iter().map(|c| c.close).sum();
                SeriesPoint::new(w[w.len() - 1].time, sum / self.period as f64)
            })
            .collect()
    }
}

impl Indicator for Sma {
    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Line(self.calculate(&dataset.candles))
    }
}

/// Exponential Moving Average.
///
/// Also serves as a general smoother over arbitrary value series (MACD signal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    period: usize,
}

impl Default for Ema {
    fn default() -> Self {
        Self { period: 9 }
    }
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn calculate(&self, candles: &[Candle]) -> Vec<SeriesPoint> {
        self.calculate_series(&close_series(candles))
    }

    /// Smooth any value series.
    ///
    /// The seed is the mean of the first `min(period, n)` values, emitted at
    /// index `min(period, n) - 1`, so a short input still yields one point.
    pub fn calculate_series(&self, values: &[SeriesPoint]) -> Vec<SeriesPoint> {
        if values.is_empty() {
            return Vec::new();
        }

        let k = 2.0 / (self.period as f64 + 1.0);
        let seed_len = self.period.min(values.len());
        let mut ema = values[..seed_len].iter().map(|p| p.value).sum::<f64>() / seed_len as f64;

        let mut results = Vec::with_capacity(values.len() - seed_len + 1);
        results.push(SeriesPoint::new(values[seed_len - 1].time, ema));

        for point in values.iter().skip(self.period) {
            ema = point.value * k + ema * (1.0 - k);
            results.push(SeriesPoint::new(point.time, ema));
        }

        results
    }
}

impl Indicator for Ema {
    fn required_candles(&self) -> usize {
        1
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Line(self.calculate(&dataset.candles))
    }
}
