use std::collections::HashSet;
use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::chart::Viewport;
use crate::drawing::{DrawingKind, DrawingSettings, Stroke};
use crate::error::ConfigError;
use crate::indicator::params::{IndicatorKind, IndicatorParams};
use crate::model::ChartPoint;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_width() -> f64 {
    1200.0
}

fn default_height() -> f64 {
    600.0
}

fn default_bar_spacing() -> f64 {
    6.0
}

fn default_drawing_color() -> String {
    crate::drawing::DEFAULT_COLOR.into()
}

fn default_line_width() -> f64 {
    crate::drawing::DEFAULT_LINE_WIDTH
}

fn default_preview_line_width() -> f64 {
    crate::drawing::PREVIEW_LINE_WIDTH
}

fn default_select_threshold() -> f64 {
    12.0
}

fn default_pointer_tolerance() -> f64 {
    10.0
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
    #[serde(default)]
    pub indicators: Vec<IndicatorConfig>,
    #[serde(default)]
    pub drawings: Vec<DrawingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatasetConfig {
    /// JSON file in the `{candles, volume, intraday}` shape. The CLI flag
    /// takes precedence.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_bar_spacing")]
    pub bar_spacing: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            bar_spacing: default_bar_spacing(),
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DrawingConfig {
    #[serde(default = "default_drawing_color")]
    pub color: String,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default = "default_drawing_color")]
    pub preview_color: String,
    #[serde(default = "default_preview_line_width")]
    pub preview_line_width: f64,
    #[serde(default = "default_select_threshold")]
    pub select_threshold: f64,
    #[serde(default = "default_pointer_tolerance")]
    pub context_menu_threshold: f64,
    #[serde(default = "default_pointer_tolerance")]
    pub drag_threshold: f64,
    #[serde(default = "default_pointer_tolerance")]
    pub handle_radius: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            color: default_drawing_color(),
            line_width: default_line_width(),
            preview_color: default_drawing_color(),
            preview_line_width: default_preview_line_width(),
            select_threshold: default_select_threshold(),
            context_menu_threshold: default_pointer_tolerance(),
            drag_threshold: default_pointer_tolerance(),
            handle_radius: default_pointer_tolerance(),
        }
    }
}

impl DrawingConfig {
    pub fn settings(&self) -> DrawingSettings {
        DrawingSettings {
            stroke: Stroke::new(&self.color, self.line_width),
            preview_stroke: Stroke::new(&self.preview_color, self.preview_line_width),
            select_threshold: self.select_threshold,
            context_menu_threshold: self.context_menu_threshold,
            drag_threshold: self.drag_threshold,
            handle_radius: self.handle_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IndicatorConfig {
    pub kind: String,
    /// Same text encoding as the parameter field, e.g. `"12, 26, 9"`.
    pub params: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DrawingEntry {
    pub tool: String,
    pub a: ChartPoint,
    pub b: Option<ChartPoint>,
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_log_format(config)?;
    validate_viewport(config)?;
    validate_drawing_settings(config)?;
    validate_indicators(config)?;
    validate_drawings(config)?;
    Ok(())
}

fn validation(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_log_format(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let format = config.general.log_format.as_str();
    if !VALID_LOG_FORMATS.contains(&format) {
        return Err(validation(format!(
            "general.log_format \"{format}\" is not one of {VALID_LOG_FORMATS:?}"
        )));
    }
    Ok(())
}

fn ensure_positive(field: &str, value: f64) -> Result<(), Report<ConfigError>> {
    if !value.is_finite() || value <= 0.0 {
        return Err(validation(format!("{field} must be > 0, got {value}")));
    }
    Ok(())
}

fn validate_viewport(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let viewport = &config.viewport;
    ensure_positive("viewport.width", viewport.width)?;
    ensure_positive("viewport.height", viewport.height)?;
    ensure_positive("viewport.bar_spacing", viewport.bar_spacing)?;
    Ok(())
}

fn validate_drawing_settings(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let drawing = &config.drawing;
    for (field, value) in [
        ("drawing.line_width", drawing.line_width),
        ("drawing.preview_line_width", drawing.preview_line_width),
        ("drawing.select_threshold", drawing.select_threshold),
        ("drawing.context_menu_threshold", drawing.context_menu_threshold),
        ("drawing.drag_threshold", drawing.drag_threshold),
        ("drawing.handle_radius", drawing.handle_radius),
    ] {
        ensure_positive(field, value)?;
    }
    Ok(())
}

fn validate_indicators(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let mut singletons = HashSet::new();
    for (index, indicator) in config.indicators.iter().enumerate() {
        let kind = indicator.kind.parse::<IndicatorKind>().map_err(|report| {
            report.change_context(ConfigError::Validation {
                field: format!("indicators[{index}].kind \"{}\" is unknown", indicator.kind),
            })
        })?;

        if kind.is_singleton() && !singletons.insert(kind) {
            return Err(validation(format!(
                "indicators[{index}]: \"{kind}\" may only be added once"
            )));
        }

        if let Some(raw) = &indicator.params {
            IndicatorParams::parse(kind, raw).map_err(|report| {
                report.change_context(ConfigError::Validation {
                    field: format!("indicators[{index}].params \"{raw}\" are not valid for {kind}"),
                })
            })?;
        }
    }
    Ok(())
}

fn validate_drawings(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    for (index, entry) in config.drawings.iter().enumerate() {
        let tool = entry.tool.parse::<DrawingKind>().map_err(|report| {
            report.change_context(ConfigError::Validation {
                field: format!("drawings[{index}].tool \"{}\" is unknown", entry.tool),
            })
        })?;

        if tool.is_two_click() && entry.b.is_none() {
            return Err(validation(format!(
                "drawings[{index}].b is required for tool \"{tool}\""
            )));
        }
    }
    Ok(())
}
