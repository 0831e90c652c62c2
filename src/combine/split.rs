use log::debug;

use super::resample::{fraction, Cursor};
use super::{check_not_empty, warn_if_undersampled, ResampleParams};
use crate::data::model::{CombinedTrace, Sample, Trace};
use crate::error::{Result, TraceError};

/// Put the same channel of two traces side by side.
///
/// Output channel 1 comes only from `a`, output channel 2 only from `b`; no
/// values are averaged. `channel` is 1-based (column 0 of a file is the
/// distance). Distance axis and offset are the means of the two inputs.
pub fn split_channels(
    a: &Trace,
    b: &Trace,
    channel: usize,
    params: &ResampleParams,
) -> Result<CombinedTrace> {
    params.validate()?;
    let pair = [a, b];
    check_not_empty(pair)?;

    for (index, trace) in pair.into_iter().enumerate() {
        trace.check_channel_count(index, trace.channel_count())?;
        if channel == 0 || channel > trace.channel_count() {
            return Err(TraceError::InvalidChannelIndex {
                channel,
                arity: trace.channel_count(),
            });
        }
    }
    warn_if_undersampled(pair, params.resolution);

    let max_a = a.max_distance();
    let max_b = b.max_distance();
    let combined_max = (max_a + max_b) / 2.0;
    let offset = (a.offset + b.offset) / 2.0;
    debug!("splitting channel {channel}: lengths {max_a} and {max_b}, combined {combined_max}");

    let idx = channel - 1;
    let mut cursor_a = Cursor::new(&a.samples, params.lookup);
    let mut cursor_b = Cursor::new(&b.samples, params.lookup);

    let rows = (0..params.resolution)
        .map(|i| {
            let t = fraction(i, params.resolution);
            let from_a = cursor_a.seek(max_a * t).value(&a.samples, idx);
            let from_b = cursor_b.seek(max_b * t).value(&b.samples, idx);
            Sample::new(combined_max * t, vec![from_a, from_b])
        })
        .collect();

    Ok(CombinedTrace { offset, rows })
}
