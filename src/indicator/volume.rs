use error_stack::Report;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorSeries, validate_period};
use crate::model::{Candle, SeriesPoint, VolumePoint};

/// Raw volume shown as a histogram in its own pane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeHistogram;

impl Indicator for VolumeHistogram {
    fn required_candles(&self) -> usize {
        1
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Histogram(
            dataset
                .volume
                .iter()
                .map(|v| SeriesPoint {
                    time: v.time,
                    value: v.value,
                    color: v.color.clone(),
                })
                .collect(),
        )
    }
}

/// Volume Weighted Moving Average of close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vwma {
    period: usize,
}

impl Default for Vwma {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Vwma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// `Σ(close·volume) / Σ(volume)` over each trailing window.
    ///
    /// Candles and volume must be index-aligned; a length mismatch yields an
    /// empty series. A window with zero total volume yields `0`.
    pub fn calculate(&self, candles: &[Candle], volumes: &[VolumePoint]) -> Vec<SeriesPoint> {
        if candles.is_empty() || volumes.is_empty() || candles.len() != volumes.len() {
            return Vec::new();
        }
        if candles.len() < self.period {
            return Vec::new();
        }

        candles
            .windows(self.period)
            .zip(volumes.windows(self.period))
            .map(|(cw, vw)| {
                let (price_volume, volume) = cw
                    .iter()
                    .zip(vw)
                    .fold((0.0, 0.0), |(pv, v), (c, vol)| {
                        (pv + c.close * vol.value, v + vol.value)
                    });
                let value = if volume == 0.0 {
                    0.0
                } else {
                    price_volume / volume
                };
                SeriesPoint::new(cw[cw.len() - 1].time, value)
            })
            .collect()
    }
}

impl Indicator for Vwma {
    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Line(self.calculate(&dataset.candles, &dataset.volume))
    }
}
