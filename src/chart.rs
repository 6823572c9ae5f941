pub mod headless;

use serde::Serialize;

use crate::indicator::supertrend::Marker;
use crate::model::{Candle, ChartPoint, SeriesPoint, TimePoint};

/// A position in overlay pixels, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PaneId(pub u32);

impl PaneId {
    /// The price pane holding the candles.
    pub const MAIN: PaneId = PaneId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesShape {
    Line,
    Histogram,
}

/// Horizontal reference line drawn across a series' pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLine {
    pub price: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub shape: SeriesShape,
    /// `None` for histograms colored per point.
    pub color: Option<String>,
    pub line_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_line: Option<PriceLine>,
}

impl SeriesStyle {
    pub fn line(color: impl Into<String>, line_width: f64) -> Self {
        Self {
            shape: SeriesShape::Line,
            color: Some(color.into()),
            line_width,
            title: None,
            price_line: None,
        }
    }

    pub fn histogram() -> Self {
        Self {
            shape: SeriesShape::Histogram,
            color: None,
            line_width: 1.0,
            title: None,
            price_line: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_price_line(mut self, price: f64, color: impl Into<String>) -> Self {
        self.price_line = Some(PriceLine {
            price,
            color: color.into(),
        });
        self
    }
}

/// Conversions between chart space (time, price) and overlay pixels.
///
/// Every conversion may fail when the value is not representable, e.g. a
/// time with no bar or a degenerate price axis. Callers skip the element
/// for that frame instead of propagating NaN.
pub trait CoordinateTransform {
    fn time_to_coordinate(&self, time: TimePoint) -> Option<f64>;
    fn coordinate_to_time(&self, x: f64) -> Option<TimePoint>;
    fn price_to_coordinate(&self, price: f64) -> Option<f64>;
    fn coordinate_to_price(&self, y: f64) -> Option<f64>;
    fn viewport(&self) -> Viewport;

    fn chart_to_screen(&self, point: &ChartPoint) -> Option<ScreenPoint> {
        Some(ScreenPoint::new(
            self.time_to_coordinate(point.time)?,
            self.price_to_coordinate(point.price)?,
        ))
    }

    fn screen_to_chart(&self, point: ScreenPoint) -> Option<ChartPoint> {
        Some(ChartPoint {
            time: self.coordinate_to_time(point.x)?,
            price: self.coordinate_to_price(point.y)?,
        })
    }
}

/// The charting widget the engines render into.
pub trait Chart: CoordinateTransform {
    fn set_candles(&mut self, candles: &[Candle]);
    fn create_pane(&mut self, title: &str, height: f64) -> PaneId;
    /// Removes the pane together with every series it holds.
    fn remove_pane(&mut self, pane: PaneId);
    fn add_series(&mut self, pane: PaneId, style: SeriesStyle) -> SeriesId;
    fn set_series_data(&mut self, series: SeriesId, data: &[SeriesPoint]);
    fn set_series_color(&mut self, series: SeriesId, color: &str);
    fn remove_series(&mut self, series: SeriesId);
    /// Replace the markers on the candle series.
    fn set_markers(&mut self, markers: &[Marker]);
    /// Attach the drawing overlay to the candle series.
    fn attach_overlay(&mut self);
    fn request_overlay_update(&mut self);
}
