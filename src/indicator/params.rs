use std::fmt;
use std::str::FromStr;

use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::indicator::adx::Adx;
use crate::indicator::aroon::{Aroon, AroonOscillator};
use crate::indicator::atr::Atr;
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::ma::{Ema, Sma};
use crate::indicator::macd::Macd;
use crate::indicator::supertrend::SuperTrend;
use crate::indicator::volume::{VolumeHistogram, Vwma};
use crate::indicator::{Indicator, IndicatorSeries, MAX_PERIOD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Volume,
    Sma,
    Ema,
    Vwma,
    Atr,
    Macd,
    #[serde(rename = "bb")]
    BollingerBands,
    #[serde(rename = "supertrend")]
    SuperTrend,
    Adx,
    Aroon,
    AroonOsc,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 11] = [
        Self::Volume,
        Self::Sma,
        Self::Ema,
        Self::Vwma,
        Self::Atr,
        Self::Macd,
        Self::BollingerBands,
        Self::SuperTrend,
        Self::Adx,
        Self::Aroon,
        Self::AroonOsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Sma => "sma",
            Self::Ema => "ema",
            Self::Vwma => "vwma",
            Self::Atr => "atr",
            Self::Macd => "macd",
            Self::BollingerBands => "bb",
            Self::SuperTrend => "supertrend",
            Self::Adx => "adx",
            Self::Aroon => "aroon",
            Self::AroonOsc => "aroon_osc",
        }
    }

    /// Singleton kinds may be active at most once and use their name as id.
    pub fn is_singleton(&self) -> bool {
        !matches!(self, Self::Sma | Self::Ema | Self::BollingerBands)
    }

    /// Whether the kind renders in its own pane below the price pane.
    pub fn has_own_pane(&self) -> bool {
        matches!(
            self,
            Self::Volume | Self::Atr | Self::Macd | Self::Adx | Self::Aroon | Self::AroonOsc
        )
    }

    pub fn default_params(&self) -> IndicatorParams {
        match self {
            Self::Volume => IndicatorParams::Volume(VolumeHistogram),
            Self::Sma => IndicatorParams::Sma(Sma::default()),
            Self::Ema => IndicatorParams::Ema(Ema::default()),
            Self::Vwma => IndicatorParams::Vwma(Vwma::default()),
            Self::Atr => IndicatorParams::Atr(Atr::default()),
            Self::Macd => IndicatorParams::Macd(Macd::default()),
            Self::BollingerBands => IndicatorParams::BollingerBands(BollingerBands::default()),
            Self::SuperTrend => IndicatorParams::SuperTrend(SuperTrend::default()),
            Self::Adx => IndicatorParams::Adx(Adx::default()),
            Self::Aroon => IndicatorParams::Aroon(Aroon::default()),
            Self::AroonOsc => IndicatorParams::AroonOsc(AroonOscillator::default()),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = Report<IndicatorError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                Report::new(IndicatorError::UnknownKind {
                    kind: s.to_string(),
                })
            })
    }
}

/// Validated parameters of one indicator instance.
///
/// Each variant holds the configured indicator itself, so a value of this
/// type can always be computed. Edits replace the whole value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorParams {
    Volume(VolumeHistogram),
    Sma(Sma),
    Ema(Ema),
    Vwma(Vwma),
    Atr(Atr),
    Macd(Macd),
    BollingerBands(BollingerBands),
    SuperTrend(SuperTrend),
    Adx(Adx),
    Aroon(Aroon),
    AroonOsc(AroonOscillator),
}

impl IndicatorParams {
    /// Parse the text encoding used by the parameter field.
    ///
    /// - `macd`: `"fast, slow, signal"`, exactly three integers
    /// - `bb`, `supertrend`: `"period, multiplier"`, at least two numbers,
    ///   the period is rounded
    /// - everything else: a single leading integer period
    ///
    /// Entries that are not numbers are dropped before the arity check.
    pub fn parse(kind: IndicatorKind, raw: &str) -> Result<Self, Report<IndicatorError>> {
        match kind {
            IndicatorKind::Volume => bail!(IndicatorError::Arity {
                expected: 0,
                got: raw.split(',').count(),
            }),
            IndicatorKind::Macd => {
                let parts: Vec<i64> = raw.split(',').filter_map(parse_leading_int).collect();
                if parts.len() != 3 {
                    bail!(IndicatorError::Arity {
                        expected: 3,
                        got: parts.len(),
                    });
                }
                Ok(Self::Macd(Macd::new(
                    to_period(parts[0])?,
                    to_period(parts[1])?,
                    to_period(parts[2])?,
                )?))
            }
            IndicatorKind::BollingerBands | IndicatorKind::SuperTrend => {
                let parts: Vec<f64> = raw.split(',').filter_map(parse_leading_float).collect();
                if parts.len() < 2 {
                    bail!(IndicatorError::Arity {
                        expected: 2,
                        got: parts.len(),
                    });
                }
                let period = rounded_period(parts[0])?;
                let multiplier = parts[1];
                Ok(match kind {
                    IndicatorKind::BollingerBands => {
                        Self::BollingerBands(BollingerBands::new(period, multiplier)?)
                    }
                    _ => Self::SuperTrend(SuperTrend::new(period, multiplier)?),
                })
            }
            IndicatorKind::Sma
            | IndicatorKind::Ema
            | IndicatorKind::Vwma
            | IndicatorKind::Atr
            | IndicatorKind::Adx
            | IndicatorKind::Aroon
            | IndicatorKind::AroonOsc => {
                let Some(value) = parse_leading_int(raw) else {
                    bail!(IndicatorError::Parse {
                        input: raw.to_string(),
                    });
                };
                let period = to_period(value)?;
                Ok(match kind {
                    IndicatorKind::Sma => Self::Sma(Sma::new(period)?),
                    IndicatorKind::Ema => Self::Ema(Ema::new(period)?),
                    IndicatorKind::Vwma => Self::Vwma(Vwma::new(period)?),
                    IndicatorKind::Atr => Self::Atr(Atr::new(period)?),
                    IndicatorKind::Adx => Self::Adx(Adx::new(period)?),
                    IndicatorKind::Aroon => Self::Aroon(Aroon::new(period)?),
                    _ => Self::AroonOsc(AroonOscillator::new(period)?),
                })
            }
        }
    }

    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::Volume(_) => IndicatorKind::Volume,
            Self::Sma(_) => IndicatorKind::Sma,
            Self::Ema(_) => IndicatorKind::Ema,
            Self::Vwma(_) => IndicatorKind::Vwma,
            Self::Atr(_) => IndicatorKind::Atr,
            Self::Macd(_) => IndicatorKind::Macd,
            Self::BollingerBands(_) => IndicatorKind::BollingerBands,
            Self::SuperTrend(_) => IndicatorKind::SuperTrend,
            Self::Adx(_) => IndicatorKind::Adx,
            Self::Aroon(_) => IndicatorKind::Aroon,
            Self::AroonOsc(_) => IndicatorKind::AroonOsc,
        }
    }

    pub fn indicator(&self) -> &dyn Indicator {
        match self {
            Self::Volume(i) => i,
            Self::Sma(i) => i,
            Self::Ema(i) => i,
            Self::Vwma(i) => i,
            Self::Atr(i) => i,
            Self::Macd(i) => i,
            Self::BollingerBands(i) => i,
            Self::SuperTrend(i) => i,
            Self::Adx(i) => i,
            Self::Aroon(i) => i,
            Self::AroonOsc(i) => i,
        }
    }

    pub fn compute(&self, dataset: &Dataset) -> IndicatorSeries {
        self.indicator().compute(dataset)
    }
}

/// Same text encoding that `parse` accepts.
impl fmt::Display for IndicatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volume(_) => Ok(()),
            Self::Sma(i) => write!(f, "{}", i.period()),
            Self::Ema(i) => write!(f, "{}", i.period()),
            Self::Vwma(i) => write!(f, "{}", i.period()),
            Self::Atr(i) => write!(f, "{}", i.period()),
            Self::Adx(i) => write!(f, "{}", i.period()),
            Self::Aroon(i) => write!(f, "{}", i.period()),
            Self::AroonOsc(i) => write!(f, "{}", i.period()),
            Self::Macd(i) => {
                let (fast, slow, signal) = i.periods();
                write!(f, "{fast}, {slow}, {signal}")
            }
            Self::BollingerBands(i) => write!(f, "{}, {}", i.period(), i.multiplier()),
            Self::SuperTrend(i) => write!(f, "{}, {}", i.period(), i.multiplier()),
        }
    }
}

fn to_period(value: i64) -> Result<usize, Report<IndicatorError>> {
    match usize::try_from(value) {
        Ok(period) if period >= 1 => Ok(period),
        _ => bail!(IndicatorError::InvalidParameter {
            name: format!("period must be >= 1, got {value}"),
        }),
    }
}

fn rounded_period(value: f64) -> Result<usize, Report<IndicatorError>> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > MAX_PERIOD as f64 {
        bail!(IndicatorError::InvalidParameter {
            name: format!("period must be >= 1, got {value}"),
        });
    }
    Ok(rounded as usize)
}

/// Leading signed integer after optional whitespace; trailing text is ignored.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    text[..sign_len + digits].parse().ok()
}

/// Longest leading decimal number after optional whitespace.
fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(text.starts_with(['+', '-']));
    let mut digits = 0;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when complete.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candle, TimePoint, VolumePoint};

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.as_str().parse::<IndicatorKind>().unwrap(), kind);
        }
        assert!("rsi".parse::<IndicatorKind>().is_err());
    }

    #[test]
    fn kind_names_match_serde() {
        let kind: IndicatorKind = serde_json::from_str("\"aroon_osc\"").unwrap();
        assert_eq!(kind, IndicatorKind::AroonOsc);
        let kind: IndicatorKind = serde_json::from_str("\"bb\"").unwrap();
        assert_eq!(kind, IndicatorKind::BollingerBands);
        assert_eq!(
            serde_json::to_string(&IndicatorKind::SuperTrend).unwrap(),
            "\"supertrend\""
        );
    }

    #[test]
    fn only_moving_averages_and_bands_repeat() {
        let repeatable: Vec<IndicatorKind> = IndicatorKind::ALL
            .into_iter()
            .filter(|k| !k.is_singleton())
            .collect();
        assert_eq!(
            repeatable,
            vec![
                IndicatorKind::Sma,
                IndicatorKind::Ema,
                IndicatorKind::BollingerBands
            ]
        );
    }

    #[test]
    fn default_params_match_kind() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.default_params().kind(), kind);
        }
        assert_eq!(IndicatorKind::Macd.default_params().to_string(), "12, 26, 9");
        assert_eq!(IndicatorKind::BollingerBands.default_params().to_string(), "20, 2");
        assert_eq!(IndicatorKind::SuperTrend.default_params().to_string(), "10, 3");
        assert_eq!(IndicatorKind::Vwma.default_params().to_string(), "20");
        assert_eq!(IndicatorKind::Sma.default_params().to_string(), "9");
    }

    #[test]
    fn parse_macd_requires_exactly_three_integers() {
        let params = IndicatorParams::parse(IndicatorKind::Macd, "8, 21, 5").unwrap();
        assert_eq!(params, IndicatorParams::Macd(Macd::new(8, 21, 5).unwrap()));

        assert!(IndicatorParams::parse(IndicatorKind::Macd, "12, 26").is_err());
        assert!(IndicatorParams::parse(IndicatorKind::Macd, "1, 2, 3, 4").is_err());
        // non-numeric entries are dropped before counting
        let params = IndicatorParams::parse(IndicatorKind::Macd, "x, 12, 26, 9").unwrap();
        assert_eq!(params.to_string(), "12, 26, 9");
    }

    #[test]
    fn parse_bands_rounds_period() {
        let params = IndicatorParams::parse(IndicatorKind::BollingerBands, "19.6, 2.5").unwrap();
        assert_eq!(
            params,
            IndicatorParams::BollingerBands(BollingerBands::new(20, 2.5).unwrap())
        );
        let params = IndicatorParams::parse(IndicatorKind::SuperTrend, "7, 1.5, 99").unwrap();
        assert_eq!(params.to_string(), "7, 1.5");
        assert!(IndicatorParams::parse(IndicatorKind::SuperTrend, "7").is_err());
        assert!(IndicatorParams::parse(IndicatorKind::SuperTrend, "0.2, 3").is_err());
    }

    #[test]
    fn parse_rejects_periods_beyond_the_limit() {
        for raw in ["18446744073709551616, 3", "1e30, 3", "100001, 3"] {
            assert!(IndicatorParams::parse(IndicatorKind::SuperTrend, raw).is_err(), "{raw}");
            assert!(IndicatorParams::parse(IndicatorKind::BollingerBands, raw).is_err(), "{raw}");
        }
        assert!(IndicatorParams::parse(IndicatorKind::Adx, "9223372036854775807").is_err());
        assert!(IndicatorParams::parse(IndicatorKind::Macd, "12, 9223372036854775807, 9").is_err());

        let params = IndicatorParams::parse(IndicatorKind::SuperTrend, "100000, 3").unwrap();
        assert_eq!(params.to_string(), "100000, 3");
        let candles: Vec<Candle> = (0..5)
            .map(|i| Candle {
                time: TimePoint::Unix(i * 60),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0,
            })
            .collect();
        let dataset = Dataset::new(candles, Vec::new(), true);
        assert_eq!(params.compute(&dataset), IndicatorSeries::SuperTrend(None));
    }

    #[test]
    fn parse_single_period_takes_leading_integer() {
        let params = IndicatorParams::parse(IndicatorKind::Sma, " 50abc").unwrap();
        assert_eq!(params, IndicatorParams::Sma(Sma::new(50).unwrap()));
        let params = IndicatorParams::parse(IndicatorKind::Atr, "21.9").unwrap();
        assert_eq!(params.to_string(), "21");

        assert!(IndicatorParams::parse(IndicatorKind::Ema, "abc").is_err());
        assert!(IndicatorParams::parse(IndicatorKind::Ema, "0").is_err());
        assert!(IndicatorParams::parse(IndicatorKind::Adx, "-4").is_err());
        assert!(IndicatorParams::parse(IndicatorKind::Volume, "5").is_err());
    }

    fn dataset(n: usize) -> Dataset {
        let candles: Vec<Candle> = (0..n)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.9).sin() * 5.0;
                Candle {
                    time: TimePoint::Unix(i as i64 * 60),
                    open: base,
                    high: base + 1.5,
                    low: base - 1.5,
                    close: base + 0.25,
                }
            })
            .collect();
        let volume = candles
            .iter()
            .map(|c| VolumePoint {
                time: c.time,
                value: 500.0,
                color: None,
            })
            .collect();
        Dataset::new(candles, volume, true)
    }

    #[test]
    fn required_candles_is_the_first_productive_length() {
        for kind in IndicatorKind::ALL {
            let params = kind.default_params();
            let required = params.indicator().required_candles();
            assert!(
                !params.compute(&dataset(required)).is_empty(),
                "{kind} at {required} candles"
            );
            assert!(
                params.compute(&dataset(required - 1)).is_empty(),
                "{kind} at {} candles",
                required - 1
            );
        }
    }

    #[test]
    fn leading_number_parsers() {
        assert_eq!(parse_leading_int("  -12px"), Some(-12));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_float(" 2.5x"), Some(2.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("1e3"), Some(1000.0));
        assert_eq!(parse_leading_float("4e"), Some(4.0));
        assert_eq!(parse_leading_float("."), None);
    }
}
