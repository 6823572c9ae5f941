use serde::Serialize;

use crate::chart::{Chart, PaneId, SeriesId, SeriesStyle};
use crate::dataset::Dataset;
use crate::indicator::IndicatorSeries;
use crate::indicator::params::{IndicatorKind, IndicatorParams};
use crate::indicator::supertrend;

/// Height of every indicator sub-pane, in pixels.
pub const PANE_HEIGHT: f64 = 150.0;

/// Colors handed out to SMA/EMA lines in turn.
pub const MA_PALETTE: [&str; 6] = [
    "#2962ff", "#e040fb", "#00bcd4", "#ff9800", "#4caf50", "#f44336",
];

const VWMA_COLOR: &str = "#9C27B0";
const ATR_COLOR: &str = "#b71c1c";
const ADX_COLOR: &str = "#ff4081";
const AROON_OSC_COLOR: &str = "#9c27b0";
const ZERO_LINE_COLOR: &str = "#787b86";
const MACD_LINE_COLOR: &str = "#2962ff";
const MACD_SIGNAL_COLOR: &str = "#ff6d00";
const BB_BAND_COLOR: &str = "#2962ff";
const BB_MIDDLE_COLOR: &str = "#ff6d00";
const AROON_UP_COLOR: &str = "#ff6d00";
const AROON_DOWN_COLOR: &str = "#2962ff";

/// Chart objects owned by one indicator instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderHandles {
    /// Sub-pane below the price pane, for kinds that get one.
    pub pane: Option<PaneId>,
    /// One series per entry of `IndicatorSeries::lines`, in the same order.
    pub lines: Vec<SeriesId>,
    /// SuperTrend runs, rebuilt on every render.
    pub segments: Vec<SeriesId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorInstance {
    pub id: String,
    pub params: IndicatorParams,
    pub series: IndicatorSeries,
    pub handles: RenderHandles,
    /// Line color for single-line kinds and the outer Bollinger bands.
    pub color: Option<String>,
}

impl IndicatorInstance {
    pub fn kind(&self) -> IndicatorKind {
        self.params.kind()
    }
}

/// Active indicators in insertion order.
#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    instances: Vec<IndicatorInstance>,
    counter: u64,
    ma_color: usize,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `kind` with its default parameters and render it.
    ///
    /// Returns `None` when `kind` is a singleton that is already active.
    pub fn add<C: Chart>(
        &mut self,
        kind: IndicatorKind,
        dataset: &Dataset,
        chart: &mut C,
    ) -> Option<String> {
        let counter = self.counter;
        self.counter += 1;

        if kind.is_singleton() && self.get(kind.as_str()).is_some() {
            tracing::debug!(kind = %kind, "indicator already active");
            return None;
        }

        let id = if kind.is_singleton() {
            kind.as_str().to_string()
        } else {
            format!("ind_{counter}")
        };
        let color = self.initial_color(kind);
        let params = kind.default_params();
        let mut instance = IndicatorInstance {
            handles: allocate_handles(kind, color, chart),
            series: compute(&params, dataset),
            color: color.map(String::from),
            id: id.clone(),
            params,
        };
        render(&mut instance.handles, &instance.series, chart);

        tracing::info!(
            id = %id,
            kind = %kind,
            params = %params,
            points = instance.series.primary_len(),
            "indicator added"
        );
        self.instances.push(instance);
        Some(id)
    }

    /// Remove an indicator and release its chart objects.
    pub fn remove<C: Chart>(&mut self, id: &str, chart: &mut C) -> bool {
        let Some(index) = self.instances.iter().position(|i| i.id == id) else {
            return false;
        };
        let instance = self.instances.remove(index);
        release_handles(instance.kind(), &instance.handles, chart);
        tracing::info!(id, kind = %instance.kind(), "indicator removed");
        true
    }

    /// Re-parameterize from the text field encoding.
    ///
    /// Invalid input leaves the instance untouched; the new parameters and
    /// series are only swapped in once both are built.
    pub fn update_parameters<C: Chart>(
        &mut self,
        id: &str,
        raw: &str,
        dataset: &Dataset,
        chart: &mut C,
    ) -> bool {
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            tracing::debug!(id, "parameter update for unknown indicator");
            return false;
        };

        let params = match IndicatorParams::parse(instance.kind(), raw) {
            Ok(params) => params,
            Err(report) => {
                tracing::debug!(id, input = raw, error = ?report, "ignoring invalid parameters");
                return false;
            }
        };
        let series = compute(&params, dataset);

        instance.params = params;
        instance.series = series;
        render(&mut instance.handles, &instance.series, chart);

        tracing::info!(id, params = %params, "indicator parameters updated");
        true
    }

    /// Recompute every instance against a new dataset.
    pub fn refresh_all<C: Chart>(&mut self, dataset: &Dataset, chart: &mut C) {
        for instance in &mut self.instances {
            instance.series = compute(&instance.params, dataset);
            render(&mut instance.handles, &instance.series, chart);
        }
        tracing::debug!(count = self.instances.len(), "indicators refreshed");
    }

    /// Recolor a single-line indicator, or the outer Bollinger bands.
    pub fn set_color<C: Chart>(&mut self, id: &str, color: &str, chart: &mut C) -> bool {
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        let targets: Vec<SeriesId> = match instance.kind() {
            IndicatorKind::Sma
            | IndicatorKind::Ema
            | IndicatorKind::Vwma
            | IndicatorKind::Atr
            | IndicatorKind::Adx
            | IndicatorKind::AroonOsc => instance.handles.lines.clone(),
            // upper and lower; the middle line keeps its own color
            IndicatorKind::BollingerBands => {
                instance.handles.lines.iter().copied().step_by(2).collect()
            }
            IndicatorKind::Volume
            | IndicatorKind::Macd
            | IndicatorKind::SuperTrend
            | IndicatorKind::Aroon => return false,
        };
        for series in targets {
            chart.set_series_color(series, color);
        }
        instance.color = Some(color.to_string());
        true
    }

    pub fn get(&self, id: &str) -> Option<&IndicatorInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorInstance> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn initial_color(&mut self, kind: IndicatorKind) -> Option<&'static str> {
        match kind {
            IndicatorKind::Sma | IndicatorKind::Ema => {
                let color = MA_PALETTE[self.ma_color % MA_PALETTE.len()];
                self.ma_color += 1;
                Some(color)
            }
            IndicatorKind::Vwma => Some(VWMA_COLOR),
            IndicatorKind::Atr => Some(ATR_COLOR),
            IndicatorKind::Adx => Some(ADX_COLOR),
            IndicatorKind::AroonOsc => Some(AROON_OSC_COLOR),
            IndicatorKind::BollingerBands => Some(BB_BAND_COLOR),
            IndicatorKind::Volume
            | IndicatorKind::Macd
            | IndicatorKind::SuperTrend
            | IndicatorKind::Aroon => None,
        }
    }
}

fn compute(params: &IndicatorParams, dataset: &Dataset) -> IndicatorSeries {
    let required = params.indicator().required_candles();
    if dataset.candles.len() < required {
        tracing::debug!(
            kind = %params.kind(),
            params = %params,
            candles = dataset.candles.len(),
            required,
            "not enough candles, series stays empty"
        );
    }
    params.compute(dataset)
}

fn pane_title(kind: IndicatorKind) -> &'static str {
    match kind {
        IndicatorKind::Volume => "Volume",
        IndicatorKind::Atr => "ATR",
        IndicatorKind::Macd => "MACD",
        IndicatorKind::Adx => "ADX",
        IndicatorKind::Aroon => "Aroon",
        IndicatorKind::AroonOsc => "Aroon Osc",
        IndicatorKind::Sma
        | IndicatorKind::Ema
        | IndicatorKind::Vwma
        | IndicatorKind::BollingerBands
        | IndicatorKind::SuperTrend => kind.as_str(),
    }
}

/// Styles of the fixed lines, in `IndicatorSeries::lines` order.
fn line_styles(kind: IndicatorKind, color: Option<&str>) -> Vec<SeriesStyle> {
    let line_color = color.unwrap_or(MA_PALETTE[0]);
    match kind {
        IndicatorKind::Volume => vec![SeriesStyle::histogram()],
        IndicatorKind::Sma | IndicatorKind::Ema | IndicatorKind::Atr | IndicatorKind::Adx => {
            vec![SeriesStyle::line(line_color, 2.0)]
        }
        IndicatorKind::Vwma => vec![SeriesStyle::line(line_color, 2.0).with_title("VWMA")],
        IndicatorKind::AroonOsc => vec![
            SeriesStyle::line(line_color, 2.0).with_price_line(0.0, ZERO_LINE_COLOR),
        ],
        IndicatorKind::Macd => vec![
            SeriesStyle::histogram(),
            SeriesStyle::line(MACD_LINE_COLOR, 2.0),
            SeriesStyle::line(MACD_SIGNAL_COLOR, 2.0),
        ],
        IndicatorKind::BollingerBands => vec![
            SeriesStyle::line(line_color, 1.0),
            SeriesStyle::line(BB_MIDDLE_COLOR, 1.0),
            SeriesStyle::line(line_color, 1.0),
        ],
        IndicatorKind::Aroon => vec![
            SeriesStyle::line(AROON_UP_COLOR, 2.0).with_title("Aroon Up"),
            SeriesStyle::line(AROON_DOWN_COLOR, 2.0).with_title("Aroon Down"),
        ],
        IndicatorKind::SuperTrend => Vec::new(),
    }
}

fn allocate_handles<C: Chart>(
    kind: IndicatorKind,
    color: Option<&str>,
    chart: &mut C,
) -> RenderHandles {
    let pane = kind
        .has_own_pane()
        .then(|| chart.create_pane(pane_title(kind), PANE_HEIGHT));
    let target = pane.unwrap_or(PaneId::MAIN);
    let lines = line_styles(kind, color)
        .into_iter()
        .map(|style| chart.add_series(target, style))
        .collect();

    RenderHandles {
        pane,
        lines,
        segments: Vec::new(),
    }
}

fn release_handles<C: Chart>(kind: IndicatorKind, handles: &RenderHandles, chart: &mut C) {
    match handles.pane {
        Some(pane) => chart.remove_pane(pane),
        None => {
            for series in &handles.lines {
                chart.remove_series(*series);
            }
        }
    }
    for series in &handles.segments {
        chart.remove_series(*series);
    }
    if kind == IndicatorKind::SuperTrend {
        chart.set_markers(&[]);
    }
}

/// Push computed output into the chart. A `None` output clears the series.
fn render<C: Chart>(handles: &mut RenderHandles, series: &IndicatorSeries, chart: &mut C) {
    for (id, points) in handles.lines.iter().zip(series.lines()) {
        chart.set_series_data(*id, points);
    }

    if let IndicatorSeries::SuperTrend(out) = series {
        for id in handles.segments.drain(..) {
            chart.remove_series(id);
        }
        let Some(out) = out.as_ref().filter(|o| !o.line.is_empty()) else {
            chart.set_markers(&[]);
            return;
        };
        for segment in supertrend::segments(&out.line) {
            let id = chart.add_series(
                PaneId::MAIN,
                SeriesStyle::line(supertrend::trend_color(segment.trend), 2.0),
            );
            chart.set_series_data(id, &segment.points);
            handles.segments.push(id);
        }
        chart.set_markers(&supertrend::markers(&out.signals));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Viewport;
    use crate::chart::headless::HeadlessChart;
    use crate::model::{Candle, TimePoint, VolumePoint};

    fn dataset(n: usize) -> Dataset {
        let candles: Vec<Candle> = (0..n)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.7).sin() * 10.0 + i as f64 * 0.2;
                Candle {
                    time: TimePoint::Unix(i as i64 * 60),
                    open: base,
                    high: base + 2.0,
                    low: base - 2.0,
                    close: base + 0.5,
                }
            })
            .collect();
        let volume = candles
            .iter()
            .map(|c| VolumePoint {
                time: c.time,
                value: 1000.0,
                color: None,
            })
            .collect();
        Dataset::new(candles, volume, true)
    }

    fn chart() -> HeadlessChart {
        HeadlessChart::new(
            Viewport {
                width: 800.0,
                height: 400.0,
            },
            6.0,
        )
    }

    #[test]
    fn singletons_use_kind_name_and_reject_duplicates() {
        let data = dataset(60);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();

        assert_eq!(
            registry.add(IndicatorKind::Macd, &data, &mut chart).as_deref(),
            Some("macd")
        );
        assert_eq!(registry.add(IndicatorKind::Macd, &data, &mut chart), None);
        assert_eq!(registry.len(), 1);
        // main pane + MACD pane
        assert_eq!(chart.pane_count(), 2);
    }

    #[test]
    fn repeatable_kinds_get_counter_ids_and_palette_colors() {
        let data = dataset(30);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();

        let first = registry.add(IndicatorKind::Sma, &data, &mut chart).unwrap();
        registry.add(IndicatorKind::Atr, &data, &mut chart);
        let second = registry.add(IndicatorKind::Ema, &data, &mut chart).unwrap();

        assert_eq!(first, "ind_0");
        assert_eq!(second, "ind_2");
        assert_eq!(registry.get(&first).unwrap().color.as_deref(), Some(MA_PALETTE[0]));
        assert_eq!(registry.get(&second).unwrap().color.as_deref(), Some(MA_PALETTE[1]));
    }

    #[test]
    fn add_renders_series_on_chart() {
        let data = dataset(30);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        let id = registry.add(IndicatorKind::Sma, &data, &mut chart).unwrap();

        let handles = &registry.get(&id).unwrap().handles;
        assert_eq!(handles.pane, None);
        assert_eq!(handles.lines.len(), 1);
        let record = chart.series(handles.lines[0]).unwrap();
        assert_eq!(record.pane, PaneId::MAIN);
        assert_eq!(record.data.len(), 30 - 9 + 1);
    }

    #[test]
    fn remove_releases_pane_and_series() {
        let data = dataset(40);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        registry.add(IndicatorKind::Aroon, &data, &mut chart);
        registry.add(IndicatorKind::BollingerBands, &data, &mut chart);
        assert_eq!(chart.series_count(), 5);

        assert!(registry.remove("aroon", &mut chart));
        assert_eq!(chart.pane_count(), 1);
        assert_eq!(chart.series_count(), 3);
        assert!(!registry.remove("aroon", &mut chart));
    }

    #[test]
    fn supertrend_renders_segments_and_markers() {
        let data = dataset(80);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        registry.add(IndicatorKind::SuperTrend, &data, &mut chart);

        let segments = &registry.get("supertrend").unwrap().handles.segments;
        assert!(!segments.is_empty());
        assert_eq!(chart.series_count(), segments.len());
        let IndicatorSeries::SuperTrend(Some(out)) = &registry.get("supertrend").unwrap().series
        else {
            panic!("expected supertrend output");
        };
        assert_eq!(chart.markers().len(), out.signals.len());

        registry.remove("supertrend", &mut chart);
        assert_eq!(chart.series_count(), 0);
        assert!(chart.markers().is_empty());
    }

    #[test]
    fn invalid_parameters_keep_previous_state() {
        let data = dataset(40);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        registry.add(IndicatorKind::Macd, &data, &mut chart);
        let before = registry.get("macd").unwrap().clone();

        assert!(!registry.update_parameters("macd", "12, 26", &data, &mut chart));
        assert!(!registry.update_parameters("macd", "0, 26, 9", &data, &mut chart));
        assert_eq!(registry.get("macd").unwrap(), &before);

        assert!(registry.update_parameters("macd", "5, 10, 3", &data, &mut chart));
        assert_eq!(registry.get("macd").unwrap().params.to_string(), "5, 10, 3");
    }

    #[test]
    fn update_recomputes_series() {
        let data = dataset(30);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        let id = registry.add(IndicatorKind::Sma, &data, &mut chart).unwrap();

        assert!(registry.update_parameters(&id, "20", &data, &mut chart));
        let instance = registry.get(&id).unwrap();
        assert_eq!(instance.series.primary_len(), 11);
        assert_eq!(chart.series(instance.handles.lines[0]).unwrap().data.len(), 11);
    }

    #[test]
    fn refresh_all_follows_dataset() {
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        registry.add(IndicatorKind::Atr, &dataset(30), &mut chart);
        registry.add(IndicatorKind::BollingerBands, &dataset(30), &mut chart);

        registry.refresh_all(&dataset(10), &mut chart);
        assert!(registry.iter().all(|i| i.series.is_empty()));

        registry.refresh_all(&dataset(50), &mut chart);
        assert_eq!(registry.get("atr").unwrap().series.primary_len(), 50 - 14 + 1);
    }

    #[test]
    fn set_color_only_for_line_kinds() {
        let data = dataset(30);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        registry.add(IndicatorKind::Vwma, &data, &mut chart);
        registry.add(IndicatorKind::Macd, &data, &mut chart);

        assert!(registry.set_color("vwma", "#123456", &mut chart));
        let series = registry.get("vwma").unwrap().handles.lines[0];
        assert_eq!(
            chart.series(series).unwrap().style.color.as_deref(),
            Some("#123456")
        );
        assert!(!registry.set_color("macd", "#123456", &mut chart));
    }

    #[test]
    fn handles_match_output_lines_for_every_kind() {
        let data = dataset(60);
        for kind in IndicatorKind::ALL {
            let mut chart = chart();
            let mut registry = IndicatorRegistry::new();
            let id = registry.add(kind, &data, &mut chart).unwrap();
            let instance = registry.get(&id).unwrap();

            assert_eq!(instance.handles.lines.len(), instance.series.lines().len(), "{kind}");
            assert_eq!(instance.handles.pane.is_some(), kind.has_own_pane(), "{kind}");
            for (id, points) in instance.handles.lines.iter().zip(instance.series.lines()) {
                assert_eq!(chart.series(*id).unwrap().data.len(), points.len(), "{kind}");
            }
        }
    }

    #[test]
    fn set_color_recolors_outer_bands_only() {
        let data = dataset(30);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        let id = registry
            .add(IndicatorKind::BollingerBands, &data, &mut chart)
            .unwrap();

        assert!(registry.set_color(&id, "#00ff00", &mut chart));
        let lines = &registry.get(&id).unwrap().handles.lines;
        let color = |i: usize| chart.series(lines[i]).unwrap().style.color.clone();
        assert_eq!(color(0).as_deref(), Some("#00ff00"));
        assert_eq!(color(1).as_deref(), Some(BB_MIDDLE_COLOR));
        assert_eq!(color(2).as_deref(), Some("#00ff00"));
    }

    #[test]
    fn short_dataset_leaves_series_empty() {
        let data = dataset(5);
        let mut chart = chart();
        let mut registry = IndicatorRegistry::new();
        registry.add(IndicatorKind::Adx, &data, &mut chart);

        let instance = registry.get("adx").unwrap();
        assert!(instance.series.is_empty());
        assert!(chart.series(instance.handles.lines[0]).unwrap().data.is_empty());
    }
}
