use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::model::{Candle, VolumePoint};

/// Candles and volume for one (symbol, interval) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub volume: Vec<VolumePoint>,
    #[serde(default)]
    pub intraday: bool,
}

impl Dataset {
    pub fn new(candles: Vec<Candle>, volume: Vec<VolumePoint>, intraday: bool) -> Self {
        Self {
            candles,
            volume,
            intraday,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Whether volume is index-aligned 1:1 with the candles.
    pub fn volume_aligned(&self) -> bool {
        self.candles.len() == self.volume.len()
            && self
                .candles
                .iter()
                .zip(&self.volume)
                .all(|(c, v)| c.time == v.time)
    }
}

/// Load a dataset from a JSON file in the `{candles, volume, intraday}` shape.
pub fn load(path: &Path) -> Result<Dataset, Report<DatasetError>> {
    let content = std::fs::read_to_string(path)
        .change_context(DatasetError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let dataset = parse(&content).attach_with(|| format!("path: {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        candles = dataset.candles.len(),
        volume = dataset.volume.len(),
        intraday = dataset.intraday,
        "dataset loaded"
    );

    Ok(dataset)
}

/// Parse and validate a dataset from JSON text.
pub fn parse(content: &str) -> Result<Dataset, Report<DatasetError>> {
    let dataset: Dataset = serde_json::from_str(content).change_context(DatasetError::Parse {
        reason: "invalid JSON or schema mismatch".into(),
    })?;

    validate(&dataset)?;

    if !dataset.volume.is_empty() && !dataset.volume_aligned() {
        tracing::warn!(
            candles = dataset.candles.len(),
            volume = dataset.volume.len(),
            "volume is not aligned with candles; volume-weighted indicators will be empty"
        );
    }

    Ok(dataset)
}

fn validate(dataset: &Dataset) -> Result<(), Report<DatasetError>> {
    for (index, pair) in dataset.candles.windows(2).enumerate() {
        if pair[1].time <= pair[0].time {
            return Err(Report::new(DatasetError::Unsorted { index: index + 1 })
                .attach(format!("{} follows {}", pair[1].time, pair[0].time)));
        }
    }
    Ok(())
}
