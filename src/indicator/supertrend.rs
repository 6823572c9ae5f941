use error_stack::Report;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::atr::Atr;
use crate::indicator::{Indicator, IndicatorSeries, validate_multiplier, validate_period};
use crate::model::{Candle, SeriesPoint, TimePoint};

pub const UP_COLOR: &str = "#00E676";
pub const DOWN_COLOR: &str = "#FF5252";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuperTrendPoint {
    pub time: TimePoint,
    /// Lower band in an uptrend, upper band in a downtrend.
    pub value: f64,
    pub trend: Trend,
    pub upper_band: f64,
    pub lower_band: f64,
}

/// A trend reversal: `Up` is a buy, `Down` is a sell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSignal {
    pub time: TimePoint,
    pub value: f64,
    pub direction: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuperTrendOutput {
    pub line: Vec<SuperTrendPoint>,
    pub signals: Vec<TrendSignal>,
}

/// A contiguous run of same-trend points, ready to become one line series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSegment {
    pub trend: Trend,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
}

/// Buy/sell annotation attached to the candle series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub time: TimePoint,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTrend {
    period: usize,
    multiplier: f64,
}

impl Default for SuperTrend {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

impl SuperTrend {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        validate_period("period", period)?;
        validate_multiplier(multiplier)?;
        Ok(Self { period, multiplier })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn calculate(&self, candles: &[Candle]) -> Option<SuperTrendOutput> {
        if candles.len() <= self.period {
            return None;
        }
        let atr = Atr::new(self.period).ok()?.calculate(candles);
        if atr.is_empty() {
            return None;
        }

        // ATR starts on candle `period - 1` and then covers every bar.
        let offset = self.period - 1;
        let mut line = Vec::with_capacity(atr.len());
        let mut signals = Vec::new();

        let mut upper = 0.0;
        let mut lower = 0.0;
        let mut trend = Trend::Up;

        for (j, atr_point) in atr.iter().enumerate() {
            let i = offset + j;
            let candle = &candles[i];
            let hl2 = candle.hl2();
            let basic_upper = hl2 + self.multiplier * atr_point.value;
            let basic_lower = hl2 - self.multiplier * atr_point.value;

            let prev_trend = trend;
            if j == 0 {
                upper = basic_upper;
                lower = basic_lower;
                trend = if candle.close > hl2 {
                    Trend::Up
                } else {
                    Trend::Down
                };
            } else {
                let prev_close = candles[i - 1].close;
                lower = if basic_lower > lower || prev_close < lower {
                    basic_lower
                } else {
                    lower
                };
                upper = if basic_upper < upper || prev_close > upper {
                    basic_upper
                } else {
                    upper
                };

                trend = match trend {
                    Trend::Up if candle.close < lower => Trend::Down,
                    Trend::Down if candle.close > upper => Trend::Up,
                    unchanged => unchanged,
                };
            }

            let value = match trend {
                Trend::Up => lower,
                Trend::Down => upper,
            };
            line.push(SuperTrendPoint {
                time: candle.time,
                value,
                trend,
                upper_band: upper,
                lower_band: lower,
            });

            if j > 0 && prev_trend != trend {
                signals.push(TrendSignal {
                    time: candle.time,
                    value,
                    direction: trend,
                });
            }
        }

        Some(SuperTrendOutput { line, signals })
    }
}

impl Indicator for SuperTrend {
    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        IndicatorSeries::SuperTrend(self.calculate(&dataset.candles))
    }
}

/// Split the line into same-trend runs.
///
/// The first point of a new trend also closes the previous run, so adjacent
/// segments share an endpoint and join visually.
pub fn segments(line: &[SuperTrendPoint]) -> Vec<TrendSegment> {
    let Some(first) = line.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = TrendSegment {
        trend: first.trend,
        points: vec![SeriesPoint::new(first.time, first.value)],
    };

    for point in &line[1..] {
        let series_point = SeriesPoint::new(point.time, point.value);
        if point.trend != current.trend {
            current.points.push(series_point.clone());
            let next = TrendSegment {
                trend: point.trend,
                points: vec![series_point],
            };
            segments.push(std::mem::replace(&mut current, next));
        } else {
            current.points.push(series_point);
        }
    }
    segments.push(current);
    segments
}

/// Buy/Sell markers for every reversal, sorted by time.
pub fn markers(signals: &[TrendSignal]) -> Vec<Marker> {
    let mut markers: Vec<Marker> = signals
        .iter()
        .map(|signal| match signal.direction {
            Trend::Up => Marker {
                time: signal.time,
                position: MarkerPosition::BelowBar,
                shape: MarkerShape::ArrowUp,
                color: UP_COLOR.into(),
                text: "Buy".into(),
            },
            Trend::Down => Marker {
                time: signal.time,
                position: MarkerPosition::AboveBar,
                shape: MarkerShape::ArrowDown,
                color: DOWN_COLOR.into(),
                text: "Sell".into(),
            },
        })
        .collect();
    markers.sort_by_key(|m| m.time);
    markers
}

pub fn trend_color(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => UP_COLOR,
        Trend::Down => DOWN_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                time: TimePoint::Unix(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
            })
            .collect()
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.15).sin() * 25.0 + (i as f64 * 1.3).cos() * 2.0)
            .collect()
    }

    #[test]
    fn supertrend_invalid_params() {
        assert!(SuperTrend::new(0, 3.0).is_err());
        assert!(SuperTrend::new(10, 0.0).is_err());
    }

    #[test]
    fn supertrend_needs_period_plus_one() {
        let st = SuperTrend::new(5, 3.0).unwrap();
        assert!(st.calculate(&candles_from_closes(&zigzag(5))).is_none());
        let out = st.calculate(&candles_from_closes(&zigzag(6))).unwrap();
        // first ATR bar is index 4
        assert_eq!(out.line.len(), 2);
        assert_eq!(out.line[0].time, TimePoint::Unix(4));
    }

    #[test]
    fn rising_market_stays_up_with_rising_lower_band() {
        // closes near the high so the first bar starts an uptrend
        let candles: Vec<Candle> = (0..40)
            .map(|i| {
                let mid = 50.0 + i as f64 * 2.0;
                Candle {
                    time: TimePoint::Unix(i),
                    open: mid - 0.5,
                    high: mid + 1.0,
                    low: mid - 1.0,
                    close: mid + 0.8,
                }
            })
            .collect();
        let out = SuperTrend::new(5, 2.0).unwrap().calculate(&candles).unwrap();
        assert!(out.signals.is_empty());
        assert!(out.line.iter().all(|p| p.trend == Trend::Up));
        for pair in out.line.windows(2) {
            assert!(pair[1].lower_band >= pair[0].lower_band);
            assert_eq!(pair[1].value, pair[1].lower_band);
        }
    }

    #[test]
    fn bands_ratchet_within_a_trend() {
        let closes = zigzag(200);
        let candles = candles_from_closes(&closes);
        let out = SuperTrend::new(10, 3.0).unwrap().calculate(&candles).unwrap();
        assert!(!out.signals.is_empty(), "zigzag should flip at least once");

        let offset = 9;
        for (j, pair) in out.line.windows(2).enumerate() {
            let prev_close = closes[offset + j];
            let (prev, curr) = (&pair[0], &pair[1]);
            if prev.trend == Trend::Up && curr.trend == Trend::Up && prev_close >= prev.lower_band {
                assert!(curr.lower_band >= prev.lower_band);
            }
            if prev.trend == Trend::Down
                && curr.trend == Trend::Down
                && prev_close <= prev.upper_band
            {
                assert!(curr.upper_band <= prev.upper_band);
            }
        }
    }

    #[test]
    fn signals_mark_every_flip() {
        let out = SuperTrend::new(10, 3.0)
            .unwrap()
            .calculate(&candles_from_closes(&zigzag(200)))
            .unwrap();
        let flips: Vec<(TimePoint, Trend)> = out
            .line
            .windows(2)
            .filter(|w| w[0].trend != w[1].trend)
            .map(|w| (w[1].time, w[1].trend))
            .collect();
        let signalled: Vec<(TimePoint, Trend)> =
            out.signals.iter().map(|s| (s.time, s.direction)).collect();
        assert_eq!(flips, signalled);
    }

    #[test]
    fn segments_share_boundary_points() {
        let out = SuperTrend::new(10, 3.0)
            .unwrap()
            .calculate(&candles_from_closes(&zigzag(200)))
            .unwrap();
        let segs = segments(&out.line);
        assert_eq!(segs.len(), out.signals.len() + 1);
        for pair in segs.windows(2) {
            assert_ne!(pair[0].trend, pair[1].trend);
            assert_eq!(pair[0].points.last(), pair[1].points.first());
        }
        let total: usize = segs.iter().map(|s| s.points.len()).sum();
        assert_eq!(total, out.line.len() + out.signals.len());
    }

    #[test]
    fn markers_are_sorted_and_labelled() {
        let signals = vec![
            TrendSignal {
                time: TimePoint::Unix(9),
                value: 1.0,
                direction: Trend::Down,
            },
            TrendSignal {
                time: TimePoint::Unix(3),
                value: 2.0,
                direction: Trend::Up,
            },
        ];
        let markers = markers(&signals);
        assert_eq!(markers[0].time, TimePoint::Unix(3));
        assert_eq!(markers[0].text, "Buy");
        assert_eq!(markers[0].position, MarkerPosition::BelowBar);
        assert_eq!(markers[1].text, "Sell");
        assert_eq!(markers[1].shape, MarkerShape::ArrowDown);
    }

    #[test]
    fn empty_line_has_no_segments() {
        assert!(segments(&[]).is_empty());
    }
}
