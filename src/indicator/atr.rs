use error_stack::Report;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorSeries, validate_period};
use crate::model::{Candle, SeriesPoint};

/// Average True Range using Wilder's smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// ATR values; the first one lands on candle index `period - 1`.
    pub fn calculate(&self, candles: &[Candle]) -> Vec<SeriesPoint> {
        if candles.len() < 2 {
            return Vec::new();
        }
        let trs = true_ranges(candles);
        if trs.len() < self.period {
            return Vec::new();
        }

        let mut atr = trs[..self.period].iter().sum::<f64>() / self.period as f64;
        let mut results = Vec::with_capacity(trs.len() - self.period + 1);
        results.push(SeriesPoint::new(candles[self.period - 1].time, atr));

        for (candle, &tr) in candles.iter().zip(&trs).skip(self.period) {
            atr = (atr * (self.period - 1) as f64 + tr) / self.period as f64;
            results.push(SeriesPoint::new(candle.time, atr));
        }

        results
    }
}

impl Indicator for Atr {
    fn required_candles(&self) -> usize {
        self.period.max(2)
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Line(self.calculate(&dataset.candles))
    }
}

/// True range per candle. The first bar has no previous close and uses `high - low`.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    let Some(first) = candles.first() else {
        return Vec::new();
    };
    let mut trs = Vec::with_capacity(candles.len());
    trs.push(first.high - first.low);
    for pair in candles.windows(2) {
        trs.push(true_range(&pair[1], pair[0].close));
    }
    trs
}

pub(crate) fn true_range(candle: &Candle, prev_close: f64) -> f64 {
    (candle.high - candle.low)
        .max((candle.high - prev_close).abs())
        .max((candle.low - prev_close).abs())
}
