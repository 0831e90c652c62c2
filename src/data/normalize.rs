use super::model::{ChannelRange, NormalizedTrace, Trace};
use crate::error::{Result, TraceError};

// ---------------------------------------------------------------------------
// Batch-wide channel normalization
// ---------------------------------------------------------------------------

/// Smallest and largest value of a 1-based `channel` over every sample of
/// every trace in the batch.
pub fn channel_range(traces: &[Trace], channel: usize) -> Result<ChannelRange> {
    if traces.is_empty() {
        return Err(TraceError::EmptyInput);
    }
    for (index, trace) in traces.iter().enumerate() {
        trace.check_channel_count(index, trace.channel_count())?;
        if channel == 0 || channel > trace.channel_count() {
            return Err(TraceError::InvalidChannelIndex {
                channel,
                arity: trace.channel_count(),
            });
        }
    }

    let idx = channel - 1;
    let (min, max) = traces
        .iter()
        .flat_map(|t| &t.samples)
        .map(|s| s.channels[idx])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min == max {
        return Err(TraceError::DegenerateRange {
            channel,
            value: min,
        });
    }
    Ok(ChannelRange { min, max })
}

/// Rescale `channel` of every trace into `[0, 1]` using one range shared by
/// the whole batch.
///
/// Each output keeps its trace's header and distance text unchanged and
/// carries only the normalized channel; other channels are left out.
pub fn normalize_traces(
    traces: &[Trace],
    channel: usize,
) -> Result<(ChannelRange, Vec<NormalizedTrace>)> {
    let range = channel_range(traces, channel)?;
    let idx = channel - 1;

    let normalized = traces
        .iter()
        .map(|trace| NormalizedTrace {
            header: trace.header.clone(),
            rows: trace
                .samples
                .iter()
                .enumerate()
                .map(|(i, s)| (trace.distance_text(i), range.remap(s.channels[idx])))
                .collect(),
        })
        .collect();

    Ok((range, normalized))
}
