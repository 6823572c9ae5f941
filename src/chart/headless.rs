use std::collections::BTreeMap;

use serde::Serialize;

use crate::chart::{Chart, CoordinateTransform, PaneId, SeriesId, SeriesStyle, Viewport};
use crate::indicator::supertrend::Marker;
use crate::model::{Candle, SeriesPoint, TimePoint};

const PRICE_PADDING: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaneRecord {
    pub title: String,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRecord {
    pub pane: PaneId,
    pub style: SeriesStyle,
    pub data: Vec<SeriesPoint>,
}

/// In-process chart with linear time and price axes.
///
/// Bars sit `bar_spacing` pixels apart starting at x = 0, each centred in
/// its slot. The price axis spans the candles' low/high range padded by 10%
/// on both sides and maps onto `[0, height]` with y growing downward.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessChart {
    viewport: Viewport,
    bar_spacing: f64,
    #[serde(skip)]
    times: Vec<TimePoint>,
    #[serde(skip)]
    price_range: Option<(f64, f64)>,
    panes: BTreeMap<PaneId, PaneRecord>,
    series: BTreeMap<SeriesId, SeriesRecord>,
    markers: Vec<Marker>,
    overlay_attached: bool,
    overlay_updates: usize,
    #[serde(skip)]
    next_pane: u32,
    #[serde(skip)]
    next_series: u32,
}

impl HeadlessChart {
    pub fn new(viewport: Viewport, bar_spacing: f64) -> Self {
        let mut panes = BTreeMap::new();
        panes.insert(
            PaneId::MAIN,
            PaneRecord {
                title: "Price".into(),
                height: viewport.height,
            },
        );
        Self {
            viewport,
            bar_spacing,
            times: Vec::new(),
            price_range: None,
            panes,
            series: BTreeMap::new(),
            markers: Vec::new(),
            overlay_attached: false,
            overlay_updates: 0,
            next_pane: 1,
            next_series: 0,
        }
    }

    pub fn pane(&self, id: PaneId) -> Option<&PaneRecord> {
        self.panes.get(&id)
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn series(&self, id: SeriesId) -> Option<&SeriesRecord> {
        self.series.get(&id)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn overlay_attached(&self) -> bool {
        self.overlay_attached
    }

    pub fn overlay_updates(&self) -> usize {
        self.overlay_updates
    }

    /// Visible price range as `(bottom, top)`.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.price_range
    }
}

impl CoordinateTransform for HeadlessChart {
    fn time_to_coordinate(&self, time: TimePoint) -> Option<f64> {
        let index = self.times.binary_search(&time).ok()?;
        Some((index as f64 + 0.5) * self.bar_spacing)
    }

    fn coordinate_to_time(&self, x: f64) -> Option<TimePoint> {
        if !x.is_finite() || x < 0.0 {
            return None;
        }
        let index = (x / self.bar_spacing).floor() as usize;
        self.times.get(index).copied()
    }

    fn price_to_coordinate(&self, price: f64) -> Option<f64> {
        let (bottom, top) = self.price_range?;
        if !price.is_finite() {
            return None;
        }
        Some((top - price) / (top - bottom) * self.viewport.height)
    }

    fn coordinate_to_price(&self, y: f64) -> Option<f64> {
        let (bottom, top) = self.price_range?;
        if !y.is_finite() {
            return None;
        }
        Some(top - y / self.viewport.height * (top - bottom))
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl Chart for HeadlessChart {
    fn set_candles(&mut self, candles: &[Candle]) {
        self.times = candles.iter().map(|c| c.time).collect();

        let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let high = candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let padding = (high - low) * PRICE_PADDING;
        let (bottom, top) = (low - padding, high + padding);

        self.price_range = (top > bottom && top.is_finite() && bottom.is_finite())
            .then_some((bottom, top));
        if self.price_range.is_none() {
            tracing::debug!(candles = candles.len(), "price axis is degenerate");
        }
    }

    fn create_pane(&mut self, title: &str, height: f64) -> PaneId {
        let id = PaneId(self.next_pane);
        self.next_pane += 1;
        self.panes.insert(
            id,
            PaneRecord {
                title: title.to_string(),
                height,
            },
        );
        id
    }

    fn remove_pane(&mut self, pane: PaneId) {
        if pane == PaneId::MAIN {
            return;
        }
        self.panes.remove(&pane);
        self.series.retain(|_, s| s.pane != pane);
    }

    fn add_series(&mut self, pane: PaneId, style: SeriesStyle) -> SeriesId {
        let id = SeriesId(self.next_series);
        self.next_series += 1;
        self.series.insert(
            id,
            SeriesRecord {
                pane,
                style,
                data: Vec::new(),
            },
        );
        id
    }

    fn set_series_data(&mut self, series: SeriesId, data: &[SeriesPoint]) {
        if let Some(record) = self.series.get_mut(&series) {
            record.data = data.to_vec();
        }
    }

    fn set_series_color(&mut self, series: SeriesId, color: &str) {
        if let Some(record) = self.series.get_mut(&series) {
            record.style.color = Some(color.to_string());
        }
    }

    fn remove_series(&mut self, series: SeriesId) {
        self.series.remove(&series);
    }

    fn set_markers(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
    }

    fn attach_overlay(&mut self) {
        self.overlay_attached = true;
    }

    fn request_overlay_update(&mut self) {
        if self.overlay_attached {
            self.overlay_updates += 1;
        }
    }
}
