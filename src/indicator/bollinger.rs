use error_stack::Report;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, IndicatorSeries, validate_multiplier, validate_period};
use crate::model::{Candle, SeriesPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerOutput {
    pub upper: Vec<SeriesPoint>,
    pub middle: Vec<SeriesPoint>,
    pub lower: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        validate_multiplier(std_dev_multiplier)?;
        Ok(Self {
            period,
            std_dev_multiplier,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> f64 {
        self.std_dev_multiplier
    }

    /// Bands around the SMA using the population standard deviation.
    pub fn calculate(&self, candles: &[Candle]) -> Option<BollingerOutput> {
        if candles.len() < self.period {
            return None;
        }

        let middle = Sma::new(self.period).ok()?.calculate(candles);
        let mut upper = Vec::with_capacity(middle.len());
        let mut lower = Vec::with_capacity(middle.len());

        for (window, mid) in candles.windows(self.period).zip(&middle) {
            let variance = window
                .iter()
                .map(|c| (c.close - mid.value).powi(2))
                .sum::<f64>()
                / self.period as f64;
            let width = variance.sqrt() * self.std_dev_multiplier;
            upper.push(SeriesPoint::new(mid.time, mid.value + width));
            lower.push(SeriesPoint::new(mid.time, mid.value - width));
        }

        Some(BollingerOutput {
            upper,
            middle,
            lower,
        })
    }
}

impl Indicator for BollingerBands {
    fn required_candles(&self) -> usize {
        self.period
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Bands(self.calculate(&dataset.candles))
    }
}
