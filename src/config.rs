use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::combine::{ResampleParams, SampleLookup};
use crate::data::writer::OutputSchema;

/// What a combine run does with the paired slices. On the command line the
/// `merge` and `split` subcommands set it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Average every channel across all groups.
    #[default]
    Average,
    /// Exactly two groups; `channel` of each becomes output channel 1 and 2.
    Split,
}

/// Settings for one pipeline run. Nothing is kept between runs.
///
/// ```json
/// { "resolution": 6000, "channel": 1, "mode": "split", "lookup": "step-hold",
///   "schema": { "channel_labels": ["AF488", "tdTom", "Cy5"], "total_columns": 8 } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output rows per combined slice. Set it above the row count of the
    /// largest input slice.
    pub resolution: usize,
    /// 1-based channel used by split mode and by normalization.
    pub channel: usize,
    pub mode: MergeMode,
    pub lookup: SampleLookup,
    pub schema: OutputSchema,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: 6000,
            channel: 1,
            mode: MergeMode::default(),
            lookup: SampleLookup::default(),
            schema: OutputSchema::default(),
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn resample_params(&self) -> ResampleParams {
        ResampleParams::new(self.resolution, self.lookup)
    }
}
