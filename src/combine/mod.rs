//! Resampling engine: puts several traces on one evenly spaced distance axis.
//!
//! ```text
//!   Trace ─┐
//!   Trace ─┼─► Cursor per trace ─► row i = i/resolution of each trace's length
//!   Trace ─┘                          │
//!                     ┌───────────────┴───────────────┐
//!                     ▼                               ▼
//!               merge: mean per channel      split: channel k of trace A,
//!                                                   channel k of trace B
//! ```

pub mod merge;
pub mod resample;
pub mod split;

use log::{debug, warn};

use crate::data::model::Trace;
use crate::error::{Result, TraceError};
pub use resample::SampleLookup;

/// Parameters shared by merge and split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleParams {
    /// Number of output rows. Should exceed the sample count of every input.
    pub resolution: usize,
    pub lookup: SampleLookup,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            resolution: 6000,
            lookup: SampleLookup::default(),
        }
    }
}

impl ResampleParams {
    pub fn new(resolution: usize, lookup: SampleLookup) -> Self {
        Self { resolution, lookup }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(TraceError::InvalidResolution);
        }
        Ok(())
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len() as f64;
    values.sum::<f64>() / n
}

/// Every trace needs at least one sample before a cursor can walk it.
fn check_not_empty<'a>(traces: impl IntoIterator<Item = &'a Trace>) -> Result<()> {
    if let Some(idx) = traces.into_iter().position(|t| t.is_empty()) {
        return Err(TraceError::EmptyTrace {
            path: format!("trace {idx}").into(),
        });
    }
    Ok(())
}

fn warn_if_undersampled<'a, I>(traces: I, resolution: usize)
where
    I: IntoIterator<Item = &'a Trace> + Clone,
{
    let longest = traces.clone().into_iter().map(Trace::len).max().unwrap_or(0);
    if resolution <= longest {
        warn!(
            "resolution {resolution} does not exceed the longest input ({longest} rows); \
             samples will be skipped"
        );
    }
    for (idx, trace) in traces.into_iter().enumerate() {
        debug!("max distance of trace {idx}: {}", trace.max_distance());
    }
}
