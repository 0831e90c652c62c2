use super::resample::{fraction, Cursor, Probe};
use super::{check_not_empty, mean, warn_if_undersampled, ResampleParams};
use crate::data::model::{CombinedTrace, Sample, Trace};
use crate::error::{Result, TraceError};

/// Average any number of traces onto `params.resolution` evenly spaced rows.
///
/// Row `i` samples every trace at `i / resolution` of its own length and
/// averages each channel across traces. The output distance axis spans the
/// mean of the input lengths; the output offset is the mean input offset.
///
/// Every sample of every trace must have the same number of channels.
pub fn merge_traces(traces: &[Trace], params: &ResampleParams) -> Result<CombinedTrace> {
    let first = traces.first().ok_or(TraceError::EmptyInput)?;
    params.validate()?;
    check_not_empty(traces)?;

    let channels = first.channel_count();
    for (index, trace) in traces.iter().enumerate() {
        trace.check_channel_count(index, channels)?;
    }
    warn_if_undersampled(traces, params.resolution);

    let max_distances: Vec<f64> = traces.iter().map(Trace::max_distance).collect();
    let combined_max = mean(max_distances.iter().copied());
    let offset = mean(traces.iter().map(|t| t.offset));
    let count = traces.len() as f64;

    let mut cursors: Vec<Cursor> = traces
        .iter()
        .map(|t| Cursor::new(&t.samples, params.lookup))
        .collect();
    let mut probes: Vec<Probe> = Vec::with_capacity(traces.len());
    let mut rows = Vec::with_capacity(params.resolution);

    for i in 0..params.resolution {
        let t = fraction(i, params.resolution);

        probes.clear();
        for (cursor, &max) in cursors.iter_mut().zip(&max_distances) {
            probes.push(cursor.seek(max * t));
        }

        let values = (0..channels)
            .map(|c| {
                let sum: f64 = probes
                    .iter()
                    .zip(traces)
                    .map(|(probe, trace)| probe.value(&trace.samples, c))
                    .sum();
                sum / count
            })
            .collect();

        rows.push(Sample::new(combined_max * t, values));
    }

    Ok(CombinedTrace { offset, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::SampleLookup;

    fn trace<const N: usize>(offset: f64, points: &[(f64, [f64; N])]) -> Trace {
        Trace::from_samples(
            offset,
            points
                .iter()
                .map(|&(d, v)| Sample::new(d, v.to_vec()))
                .collect(),
        )
    }

    fn params(resolution: usize) -> ResampleParams {
        ResampleParams::new(resolution, SampleLookup::StepHold)
    }

    #[test]
    fn averages_each_channel_across_traces() {
        let a = trace(0.0, &[(0.0, [2.0]), (10.0, [4.0])]);
        let b = trace(0.0, &[(0.0, [6.0]), (10.0, [8.0])]);

        let held = merge_traces(&[a.clone(), b.clone()], &params(1)).unwrap();
        assert_eq!(held.rows, vec![Sample::new(0.0, vec![4.0])]);

        // Resolving each trace to its endpoint gives (4 + 8) / 2.
        let next = merge_traces(&[a, b], &ResampleParams::new(1, SampleLookup::NextSample)).unwrap();
        assert_eq!(next.rows, vec![Sample::new(0.0, vec![6.0])]);
    }

    #[test]
    fn output_axis_uses_mean_length_and_offset() {
        let a = trace(100.0, &[(0.0, [1.0, 1.0]), (8.0, [1.0, 1.0])]);
        let b = trace(200.0, &[(0.0, [3.0, 5.0]), (12.0, [3.0, 5.0])]);
        let merged = merge_traces(&[a, b], &params(4)).unwrap();

        assert_eq!(merged.offset, 150.0);
        assert_eq!(merged.len(), 4);
        let distances: Vec<f64> = merged.rows.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![0.0, 2.5, 5.0, 7.5]);
        for row in &merged.rows {
            assert_eq!(row.channels, vec![2.0, 3.0]);
        }
    }

    #[test]
    fn each_trace_is_sampled_along_its_own_length() {
        // Halfway along `a` is 5.0, halfway along `b` is 50.0.
        let a = trace(0.0, &[(0.0, [0.0]), (5.0, [10.0]), (10.0, [0.0])]);
        let b = trace(0.0, &[(0.0, [0.0]), (50.0, [30.0]), (100.0, [0.0])]);
        let merged = merge_traces(&[a, b], &params(2)).unwrap();
        assert_eq!(merged.rows[1].distance, 27.5);
        assert_eq!(merged.rows[1].channels, vec![20.0]);
    }

    #[test]
    fn distances_strictly_increase() {
        let a = trace(0.0, &[(0.0, [1.0]), (0.4, [2.0]), (3.0, [3.0])]);
        let b = trace(0.0, &[(0.0, [1.0]), (7.0, [2.0])]);
        let merged = merge_traces(&[a, b], &params(50)).unwrap();
        assert_eq!(merged.len(), 50);
        assert!(merged.rows.windows(2).all(|w| w[0].distance < w[1].distance));
    }

    #[test]
    fn merging_is_deterministic() {
        let a = trace(1.0, &[(0.0, [1.0, 9.0]), (0.7, [2.0, 8.0]), (2.2, [3.0, 7.0])]);
        let b = trace(3.0, &[(0.0, [4.0, 6.0]), (1.1, [5.0, 5.0]), (1.9, [6.0, 4.0])]);
        let traces = [a, b];
        let first = merge_traces(&traces, &params(33)).unwrap();
        let second = merge_traces(&traces, &params(33)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_trace_keeps_its_values() {
        let a = trace(5.0, &[(0.0, [1.0]), (1.0, [2.0]), (2.0, [3.0]), (3.0, [4.0])]);
        let merged = merge_traces(&[a], &params(3)).unwrap();
        let values: Vec<f64> = merged.rows.iter().map(|r| r.channels[0]).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(merged.offset, 5.0);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            merge_traces(&[], &params(10)),
            Err(TraceError::EmptyInput)
        ));
    }

    #[test]
    fn rejects_zero_resolution() {
        let a = trace(0.0, &[(0.0, [1.0])]);
        assert!(matches!(
            merge_traces(&[a], &params(0)),
            Err(TraceError::InvalidResolution)
        ));
    }

    #[test]
    fn rejects_mismatched_channel_counts() {
        let a = trace(0.0, &[(0.0, [1.0, 2.0, 3.0])]);
        let b = trace(0.0, &[(0.0, [1.0, 2.0])]);
        match merge_traces(&[a, b], &params(10)) {
            Err(TraceError::InconsistentChannelCount {
                index,
                expected,
                found,
            }) => assert_eq!((index, expected, found), (1, 3, 2)),
            other => panic!("expected InconsistentChannelCount, got {other:?}"),
        }
    }

    #[test]
    fn rejects_ragged_trace() {
        let a = trace(0.0, &[(0.0, [1.0, 2.0]), (1.0, [3.0, 4.0])]);
        let mut b = a.clone();
        b.samples[1].channels.pop();
        match merge_traces(&[a, b], &params(10)) {
            Err(TraceError::InconsistentChannelCount {
                index,
                expected,
                found,
            }) => assert_eq!((index, expected, found), (1, 2, 1)),
            other => panic!("expected InconsistentChannelCount, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trace_without_samples() {
        let a = trace(0.0, &[(0.0, [1.0])]);
        let empty = Trace::from_samples(0.0, Vec::new());
        assert!(matches!(
            merge_traces(&[a, empty], &params(10)),
            Err(TraceError::EmptyTrace { .. })
        ));
    }
}
