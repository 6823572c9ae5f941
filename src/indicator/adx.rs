use error_stack::Report;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::atr::true_range;
use crate::indicator::{Indicator, IndicatorSeries, validate_period};
use crate::model::{Candle, SeriesPoint};

/// Average Directional Index (Wilder).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adx {
    period: usize,
}

impl Default for Adx {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Adx {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// ADX values starting at candle index `2 * period - 1`.
    pub fn calculate(&self, candles: &[Candle]) -> Vec<SeriesPoint> {
        let n = candles.len();
        let period = self.period;
        if n < 2 * period {
            return Vec::new();
        }

        // Index 0 has no previous bar and is padded with zeros.
        let mut trs = vec![0.0; n];
        let mut plus_dm = vec![0.0; n];
        let mut minus_dm = vec![0.0; n];
        for i in 1..n {
            let (prev, curr) = (&candles[i - 1], &candles[i]);
            trs[i] = true_range(curr, prev.close);

            let up_move = curr.high - prev.high;
            let down_move = prev.low - curr.low;
            if up_move > down_move && up_move > 0.0 {
                plus_dm[i] = up_move;
            }
            if down_move > up_move && down_move > 0.0 {
                minus_dm[i] = down_move;
            }
        }

        let smooth_tr = wilder_running_sum(&trs, period);
        let smooth_plus = wilder_running_sum(&plus_dm, period);
        let smooth_minus = wilder_running_sum(&minus_dm, period);

        let mut dxs = vec![0.0; n];
        for i in period..n {
            if smooth_tr[i] == 0.0 {
                continue;
            }
            let plus_di = 100.0 * smooth_plus[i] / smooth_tr[i];
            let minus_di = 100.0 * smooth_minus[i] / smooth_tr[i];
            let sum_di = plus_di + minus_di;
            if sum_di != 0.0 {
                dxs[i] = 100.0 * (plus_di - minus_di).abs() / sum_di;
            }
        }

        let start = 2 * period - 1;
        let mut adx = dxs[period..2 * period].iter().sum::<f64>() / period as f64;
        let mut results = Vec::with_capacity(n - start);
        results.push(SeriesPoint::new(candles[start].time, adx));

        for i in start + 1..n {
            adx = (adx * (period - 1) as f64 + dxs[i]) / period as f64;
            results.push(SeriesPoint::new(candles[i].time, adx));
        }

        results
    }
}

impl Indicator for Adx {
    fn required_candles(&self) -> usize {
        2 * self.period
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::Line(self.calculate(&dataset.candles))
    }
}

/// Wilder's running-sum smoothing.
///
/// Seeded at index `period` with the raw sum of `values[1..=period]`, then
/// `s[i] = s[i-1] - s[i-1] / period + values[i]`. Earlier slots stay zero.
fn wilder_running_sum(values: &[f64], period: usize) -> Vec<f64> {
    let mut smooth = vec![0.0; values.len()];
    if values.len() <= period {
        return smooth;
    }

    smooth[period] = values[1..=period].iter().sum();
    for i in period + 1..values.len() {
        smooth[i] = smooth[i - 1] - smooth[i - 1] / period as f64 + values[i];
    }
    smooth
}
