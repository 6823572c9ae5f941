use std::path::Path;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chart_engine::chart::headless::HeadlessChart;
use chart_engine::config::{self, AppConfig};
use chart_engine::dataset;
use chart_engine::drawing::overlay::Shape;
use chart_engine::drawing::{Drawing, DrawingKind};
use chart_engine::indicator::IndicatorSeries;
use chart_engine::indicator::params::IndicatorKind;
use chart_engine::session::ChartSession;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("dataset error")]
    Dataset,
    #[display("drawing error")]
    Drawing,
    #[display("failed to write report")]
    Output,
}

#[derive(Parser)]
#[command(name = "chart-engine", about = "Render indicators and drawings over a candle dataset")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "chart.toml")]
    config: String,
    /// Dataset JSON file, overriding `[dataset].path`
    #[arg(short, long)]
    dataset: Option<String>,
}

#[derive(Serialize)]
struct IndicatorSummary<'a> {
    id: &'a str,
    kind: IndicatorKind,
    params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
    series: &'a IndicatorSeries,
}

#[derive(Serialize)]
struct ChartReport<'a> {
    candles: usize,
    indicators: Vec<IndicatorSummary<'a>>,
    drawings: Vec<&'a Drawing>,
    overlay: &'a [Shape],
    chart: &'a HeadlessChart,
}

fn main() {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let dataset_path = cli
        .dataset
        .or_else(|| config.dataset.path.clone())
        .ok_or_else(|| {
            Report::new(AppError::Config).attach("no dataset path in [dataset] or --dataset")
        })?;
    let dataset = dataset::load(Path::new(&dataset_path)).change_context(AppError::Dataset)?;

    let chart = HeadlessChart::new(config.viewport.viewport(), config.viewport.bar_spacing);
    let mut session = ChartSession::new(chart, config.drawing.settings());
    session.set_dataset(dataset);

    for indicator in &config.indicators {
        let kind = indicator
            .kind
            .parse::<IndicatorKind>()
            .change_context(AppError::Config)?;
        let Some(id) = session.add_indicator(kind) else {
            continue;
        };
        if let Some(raw) = &indicator.params {
            session.update_indicator(&id, raw);
        }
    }

    for entry in &config.drawings {
        let tool = entry
            .tool
            .parse::<DrawingKind>()
            .change_context(AppError::Config)?;
        session
            .place(tool, entry.a, entry.b)
            .change_context(AppError::Drawing)?;
    }

    let shapes = session.repaint();
    let report = ChartReport {
        candles: session.dataset().len(),
        indicators: session
            .indicators()
            .iter()
            .map(|i| IndicatorSummary {
                id: &i.id,
                kind: i.kind(),
                params: i.params.to_string(),
                color: i.color.as_deref(),
                series: &i.series,
            })
            .collect(),
        drawings: session.drawings().iter().collect(),
        overlay: &shapes,
        chart: session.chart(),
    };

    let json = serde_json::to_string_pretty(&report).change_context(AppError::Output)?;
    println!("{json}");

    info!(
        indicators = report.indicators.len(),
        drawings = report.drawings.len(),
        shapes = shapes.len(),
        "chart rendered"
    );
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
