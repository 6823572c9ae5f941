use std::collections::HashMap;

use error_stack::Report;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::ma::Ema;
use crate::indicator::{Indicator, IndicatorSeries, validate_period};
use crate::model::{Candle, SeriesPoint, TimePoint, close_series};

pub const HISTOGRAM_UP_COLOR: &str = "#26a69a";
pub const HISTOGRAM_DOWN_COLOR: &str = "#ef5350";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdOutput {
    pub macd: Vec<SeriesPoint>,
    pub signal: Vec<SeriesPoint>,
    pub histogram: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        validate_period("fast_period", fast_period)?;
        validate_period("slow_period", slow_period)?;
        validate_period("signal_period", signal_period)?;
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    pub fn periods(&self) -> (usize, usize, usize) {
        (self.fast_period, self.slow_period, self.signal_period)
    }

    /// MACD, signal and histogram lines, joined on exact time keys.
    ///
    /// Returns `None` only for empty input; short input degrades to the
    /// points the EMA seeds can still produce.
    pub fn calculate(&self, candles: &[Candle]) -> Option<MacdOutput> {
        if candles.is_empty() {
            return None;
        }
        let closes = close_series(candles);

        // Periods are validated in `new`, so these cannot fail.
        let fast = Ema::new(self.fast_period).ok()?.calculate_series(&closes);
        let slow = Ema::new(self.slow_period).ok()?.calculate_series(&closes);

        let fast_by_time: HashMap<TimePoint, f64> =
            fast.iter().map(|p| (p.time, p.value)).collect();
        let macd: Vec<SeriesPoint> = slow
            .iter()
            .filter_map(|s| {
                fast_by_time
                    .get(&s.time)
                    .map(|f| SeriesPoint::new(s.time, f - s.value))
            })
            .collect();

        let signal = Ema::new(self.signal_period).ok()?.calculate_series(&macd);

        let signal_by_time: HashMap<TimePoint, f64> =
            signal.iter().map(|p| (p.time, p.value)).collect();
        let histogram = macd
            .iter()
            .filter_map(|m| {
                signal_by_time.get(&m.time).map(|s| {
                    let value = m.value - s;
                    let color = if value >= 0.0 {
                        HISTOGRAM_UP_COLOR
                    } else {
                        HISTOGRAM_DOWN_COLOR
                    };
                    SeriesPoint::with_color(m.time, value, color)
                })
            })
            .collect();

        Some(MacdOutput {
            macd,
            signal,
            histogram,
        })
    }
}

impl Indicator for Macd {
    // The EMA seeds shrink to the available input, so one candle is enough.
    fn required_candles(&self) -> usize {
        1
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Macd(self.calculate(&dataset.candles))
    }
}
