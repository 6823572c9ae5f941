use error_stack::Report;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::{Indicator, IndicatorSeries, validate_period};
use crate::model::{Candle, SeriesPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AroonOutput {
    pub up: Vec<SeriesPoint>,
    pub down: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aroon {
    period: usize,
}

impl Default for Aroon {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Aroon {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Aroon Up/Down for every index `i >= period`.
    ///
    /// The window is the trailing `period + 1` bars scanned from the current
    /// bar backwards; only a strictly better extreme replaces the current
    /// best, so ties resolve to the most recent bar.
    pub fn calculate(&self, candles: &[Candle]) -> Option<AroonOutput> {
        if candles.len() < self.period {
            return None;
        }

        let period = self.period as f64;
        let mut up = Vec::with_capacity(candles.len().saturating_sub(self.period));
        let mut down = Vec::with_capacity(candles.len().saturating_sub(self.period));

        for i in self.period..candles.len() {
            let mut highest = f64::NEG_INFINITY;
            let mut lowest = f64::INFINITY;
            let mut since_high = 0;
            let mut since_low = 0;

            for offset in 0..=self.period {
                let candle = &candles[i - offset];
                if candle.high > highest {
                    highest = candle.high;
                    since_high = offset;
                }
                if candle.low < lowest {
                    lowest = candle.low;
                    since_low = offset;
                }
            }

            let time = candles[i].time;
            up.push(SeriesPoint::new(
                time,
                (period - since_high as f64) / period * 100.0,
            ));
            down.push(SeriesPoint::new(
                time,
                (period - since_low as f64) / period * 100.0,
            ));
        }

        Some(AroonOutput { up, down })
    }
}

impl Indicator for Aroon {
    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Aroon(self.calculate(&dataset.candles))
    }
}

/// Aroon Up minus Aroon Down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AroonOscillator {
    aroon: Aroon,
}

impl Default for AroonOscillator {
    fn default() -> Self {
        Self {
            aroon: Aroon::default(),
        }
    }
}

impl AroonOscillator {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            aroon: Aroon::new(period)?,
        })
    }

    pub fn period(&self) -> usize {
        self.aroon.period()
    }

    pub fn calculate(&self, candles: &[Candle]) -> Option<Vec<SeriesPoint>> {
        let aroon = self.aroon.calculate(candles)?;
        Some(
            aroon
                .up
                .iter()
                .zip(&aroon.down)
                .map(|(u, d)| SeriesPoint::new(u.time, u.value - d.value))
                .collect(),
        )
    }
}

impl Indicator for AroonOscillator {
    fn required_candles(&self) -> usize {
        self.aroon.required_candles()
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::AroonOsc(self.calculate(&dataset.candles))
    }
}
