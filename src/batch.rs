use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{error, info, warn};

use crate::combine::merge::merge_traces;
use crate::combine::split::split_channels;
use crate::config::{Config, MergeMode};
use crate::data::loader::load_trace;
use crate::data::model::Trace;
use crate::data::normalize::normalize_traces;
use crate::data::writer::{write_combined, write_normalized};

// ---------------------------------------------------------------------------
// Directory discovery
// ---------------------------------------------------------------------------

/// Group name → slice files in lexicographic order.
pub type Groups = BTreeMap<String, Vec<PathBuf>>;

/// Regular, non-hidden files of `dir`, sorted by name.
///
/// Hidden files such as `.gitkeep` are skipped.
pub fn list_trace_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Every sub-directory of `root` is one group (brain).
pub fn discover_groups(root: &Path) -> Result<Groups> {
    let mut groups = Groups::new();
    for entry in std::fs::read_dir(root).with_context(|| format!("listing {}", root.display()))? {
        let entry = entry.with_context(|| format!("listing {}", root.display()))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        groups.insert(name, list_trace_files(&path)?);
    }
    Ok(groups)
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// One output slice: the `index`-th file of every group.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub index: usize,
    /// `(group, file)` in group order.
    pub inputs: Vec<(String, PathBuf)>,
}

impl Job {
    /// Output file name, `S00.csv`, `S01.csv`, …
    pub fn output_name(&self) -> String {
        format!("S{:02}.csv", self.index)
    }

    fn describe(&self) -> String {
        self.inputs
            .iter()
            .map(|(group, path)| {
                let file = path.file_name().unwrap_or_default().to_string_lossy();
                format!("brain {group} slice {file}")
            })
            .collect::<Vec<_>>()
            .join(" with ")
    }
}

/// Pair files across groups by position.
///
/// Only as many jobs as the shortest group has files are produced; leftover
/// files in longer groups are reported and skipped.
pub fn pair_jobs(groups: &Groups) -> Vec<Job> {
    let count = groups.values().map(Vec::len).min().unwrap_or(0);
    for (group, files) in groups {
        if files.len() > count {
            warn!(
                "brain {group}: {} slice(s) have no partner in every other brain and are skipped",
                files.len() - count
            );
        }
    }

    (0..count)
        .map(|index| Job {
            index,
            inputs: groups
                .iter()
                .map(|(group, files)| (group.clone(), files[index].clone()))
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// A job that produced no output.
#[derive(Debug)]
pub struct JobFailure {
    pub job: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<JobFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Combine (merge / split)
// ---------------------------------------------------------------------------

/// Combine the n-th slice of every group into `out_dir/Snn.csv`.
///
/// A failing job is logged and recorded; the other jobs still run.
pub fn run_combine(groups: &Groups, out_dir: &Path, config: &Config) -> Result<BatchReport> {
    if groups.is_empty() {
        bail!("no brain folders found");
    }
    if config.mode == MergeMode::Split && groups.len() != 2 {
        bail!(
            "split mode needs exactly 2 brain folders, found {}: {:?}",
            groups.len(),
            groups.keys().collect::<Vec<_>>()
        );
    }
    info!(
        "found brains {:?} with {:?} slices",
        groups.keys().collect::<Vec<_>>(),
        groups.values().map(Vec::len).collect::<Vec<_>>()
    );
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut report = BatchReport::default();
    for job in pair_jobs(groups) {
        info!("combining {} into S{:02}", job.describe(), job.index);
        match combine_job(&job, out_dir, config) {
            Ok(path) => report.written.push(path),
            Err(err) => {
                error!("S{:02}: {err:#}", job.index);
                report.failed.push(JobFailure {
                    job: job.output_name(),
                    error: err,
                });
            }
        }
    }
    Ok(report)
}

/// Load, combine and write one job. Nothing is written on failure.
pub fn combine_job(job: &Job, out_dir: &Path, config: &Config) -> Result<PathBuf> {
    let traces = load_all(job.inputs.iter().map(|(_, p)| p.as_path()))?;
    let params = config.resample_params();

    let combined = match config.mode {
        MergeMode::Average => merge_traces(&traces, &params),
        MergeMode::Split => match traces.as_slice() {
            [a, b] => split_channels(a, b, config.channel, &params),
            _ => bail!("split mode needs 2 slices, job has {}", traces.len()),
        },
    }
    .with_context(|| format!("combining into {}", job.output_name()))?;

    let path = out_dir.join(job.output_name());
    write_combined(&path, &combined, &config.schema)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Normalize
// ---------------------------------------------------------------------------

/// Normalize `config.channel` across all `inputs` and write each result
/// under its own file name in `out_dir`.
///
/// The range is shared by the whole batch, so any load or range error fails
/// the batch before anything is written.
pub fn run_normalize(inputs: &[PathBuf], out_dir: &Path, config: &Config) -> Result<BatchReport> {
    info!(
        "normalizing channel {} throughout {} slices",
        config.channel,
        inputs.len()
    );
    let traces = load_all(inputs.iter().map(PathBuf::as_path))?;
    let (range, normalized) = normalize_traces(&traces, config.channel)
        .with_context(|| format!("normalizing channel {}", config.channel))?;
    info!("minimum value {} will be normalized to 0.0", range.min);
    info!("maximum value {} will be normalized to 1.0", range.max);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut report = BatchReport::default();
    for ((input, trace), result) in inputs.iter().zip(&traces).zip(&normalized) {
        let Some(name) = input.file_name() else {
            bail!("{} has no file name", input.display());
        };
        let path = out_dir.join(name);
        match write_normalized(&path, result, trace.offset, &config.schema) {
            Ok(()) => report.written.push(path),
            Err(err) => {
                error!("{err}");
                report.failed.push(JobFailure {
                    job: name.to_string_lossy().into_owned(),
                    error: err.into(),
                });
            }
        }
    }
    Ok(report)
}

fn load_all<'a>(paths: impl Iterator<Item = &'a Path>) -> Result<Vec<Trace>> {
    paths
        .map(|p| load_trace(p).with_context(|| format!("loading {}", p.display())))
        .collect()
}
