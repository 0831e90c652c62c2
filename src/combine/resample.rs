use clap::ValueEnum;
use serde::Deserialize;

use crate::data::model::{Sample, Trace};

// ---------------------------------------------------------------------------
// Lookup policy
// ---------------------------------------------------------------------------

/// How a target distance is turned into channel values.
///
/// `StepHold` is the historical behaviour and the default: values are held
/// from the last sample at or before the target, never interpolated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SampleLookup {
    /// Last sample whose distance does not exceed the target.
    #[default]
    StepHold,
    /// First sample whose distance exceeds the target (last sample if none).
    NextSample,
    /// Linear interpolation between the two samples bracketing the target.
    Linear,
}

// ---------------------------------------------------------------------------
// Reference lookup
// ---------------------------------------------------------------------------

/// Index of the last sample whose distance does not exceed `target`.
///
/// Scans from the start and stops at the first sample past the target.
/// Returns 0 when even the first sample lies past the target.
pub fn locate(samples: &[Sample], target: f64) -> usize {
    let mut last = 0;
    for (idx, sample) in samples.iter().enumerate() {
        if sample.distance > target {
            break;
        }
        last = idx;
    }
    last
}

/// Sample index for fractional position `t` (`i / resolution`) along `trace`.
pub fn resolve(trace: &Trace, t: f64) -> usize {
    locate(&trace.samples, trace.max_distance() * t)
}

/// `i / resolution` as used for every output row.
pub fn fraction(i: usize, resolution: usize) -> f64 {
    i as f64 / resolution as f64
}

// ---------------------------------------------------------------------------
// Probe – where a lookup landed
// ---------------------------------------------------------------------------

/// Result of one lookup: a sample index, or two with a blend weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub lower: usize,
    pub upper: usize,
    /// Share of `upper` in the blend; 0 for the step lookups.
    pub weight: f64,
}

impl Probe {
    pub fn at(idx: usize) -> Self {
        Self {
            lower: idx,
            upper: idx,
            weight: 0.0,
        }
    }

    /// Value of the 0-based channel `idx` at this probe.
    pub fn value(&self, samples: &[Sample], idx: usize) -> f64 {
        let a = samples[self.lower].channels[idx];
        if self.weight == 0.0 {
            return a;
        }
        let b = samples[self.upper].channels[idx];
        a + (b - a) * self.weight
    }
}

// ---------------------------------------------------------------------------
// Cursor – incremental lookup for one full resampling pass
// ---------------------------------------------------------------------------

/// Walks one trace while targets increase, so a pass over `resolution` rows
/// costs O(samples + resolution) instead of a scan per row.
///
/// A target below the previous one restarts the walk, so results always match
/// [`locate`].
pub struct Cursor<'a> {
    samples: &'a [Sample],
    pos: usize,
    lookup: SampleLookup,
}

impl<'a> Cursor<'a> {
    /// `samples` must not be empty.
    pub fn new(samples: &'a [Sample], lookup: SampleLookup) -> Self {
        debug_assert!(!samples.is_empty());
        Self {
            samples,
            pos: 0,
            lookup,
        }
    }

    pub fn seek(&mut self, target: f64) -> Probe {
        let samples = self.samples;
        if self.pos > 0 && target < samples[self.pos].distance {
            self.pos = 0;
        }
        while self.pos + 1 < samples.len() && samples[self.pos + 1].distance <= target {
            self.pos += 1;
        }
        let pos = self.pos;

        match self.lookup {
            SampleLookup::StepHold => Probe::at(pos),
            SampleLookup::NextSample => {
                if samples[pos].distance > target || pos + 1 == samples.len() {
                    Probe::at(pos)
                } else {
                    Probe::at(pos + 1)
                }
            }
            SampleLookup::Linear => {
                let lo = &samples[pos];
                match samples.get(pos + 1) {
                    Some(hi) if hi.distance > lo.distance && target > lo.distance => Probe {
                        lower: pos,
                        upper: pos + 1,
                        weight: ((target - lo.distance) / (hi.distance - lo.distance)).min(1.0),
                    },
                    _ => Probe::at(pos),
                }
            }
        }
    }
}
