//! JSON loaders for charts, judge tables and input replays.

use std::fs;
use std::path::{Path, PathBuf};

use fw_engine::JudgeConfig;
use fw_ir::{Chart, ChartError, InputCommand};
use thiserror::Error;

/// Failure loading game data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid chart: {0}")]
    Chart(#[from] ChartError),
}

/// Parse a chart and derive its step times from the tempo map.
pub fn load_chart(json: &str) -> Result<Chart, LoadError> {
    let mut chart: Chart = serde_json::from_str(json)?;
    chart.validate()?;
    chart.populate_times();
    log::debug!("loaded chart '{}' ({} steps)", chart.title, chart.steps.len());
    Ok(chart)
}

/// Parse a judge table. Missing fields take their default values.
pub fn load_judge_config(json: &str) -> Result<JudgeConfig, LoadError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse an input replay, ordered by time.
pub fn load_inputs(json: &str) -> Result<Vec<InputCommand>, LoadError> {
    let mut inputs: Vec<InputCommand> = serde_json::from_str(json)?;
    inputs.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(inputs)
}

pub fn read_chart(path: &Path) -> Result<Chart, LoadError> {
    load_chart(&read(path)?)
}

pub fn read_judge_config(path: &Path) -> Result<JudgeConfig, LoadError> {
    load_judge_config(&read(path)?)
}

pub fn read_inputs(path: &Path) -> Result<Vec<InputCommand>, LoadError> {
    load_inputs(&read(path)?)
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}
