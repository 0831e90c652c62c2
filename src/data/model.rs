use crate::error::{Result, TraceError};

// ---------------------------------------------------------------------------
// Sample – one row of a trace file
// ---------------------------------------------------------------------------

/// A single row: distance along the slice plus one intensity per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Distance from the start of the slice (µm).
    pub distance: f64,
    /// Channel intensities, in file column order.
    pub channels: Vec<f64>,
}

impl Sample {
    pub fn new(distance: f64, channels: Vec<f64>) -> Self {
        Self { distance, channels }
    }

    /// Value of a 1-based channel number (column 0 is the distance).
    pub fn channel(&self, channel: usize) -> Option<f64> {
        channel
            .checked_sub(1)
            .and_then(|idx| self.channels.get(idx))
            .copied()
    }
}

// ---------------------------------------------------------------------------
// Trace – one loaded slice file
// ---------------------------------------------------------------------------

/// One slice as loaded from disk.
///
/// Distances are non-decreasing and every sample has the same number of
/// channels; the loader enforces both before a `Trace` is handed out.
#[derive(Debug, Clone)]
pub struct Trace {
    /// Absolute starting position of the slice.
    pub offset: f64,
    /// The two raw header lines, kept so they can be written back verbatim.
    pub header: Vec<String>,
    /// Data rows in file order. Never empty.
    pub samples: Vec<Sample>,
    /// Distance column exactly as spelled in the file, quotes removed.
    /// Empty for traces that were not loaded from text.
    pub raw_distances: Vec<String>,
}

impl Trace {
    /// Build a trace without header lines (used by tests and the sample generator).
    /// Writers fall back to the output schema's header for such traces.
    pub fn from_samples(offset: f64, samples: Vec<Sample>) -> Self {
        Self {
            offset,
            header: Vec::new(),
            samples,
            raw_distances: Vec::new(),
        }
    }

    /// Distance of the last sample.
    pub fn max_distance(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.distance)
    }

    /// Number of channels of the first sample. See [`Trace::check_channel_count`]
    /// for traces that were not built by the loader.
    pub fn channel_count(&self) -> usize {
        self.samples.first().map_or(0, |s| s.channels.len())
    }

    /// Fail unless every sample has `expected` channels. `index` names this
    /// trace in the error.
    pub fn check_channel_count(&self, index: usize, expected: usize) -> Result<()> {
        match self.samples.iter().find(|s| s.channels.len() != expected) {
            Some(s) => Err(TraceError::InconsistentChannelCount {
                index,
                expected,
                found: s.channels.len(),
            }),
            None => Ok(()),
        }
    }

    /// Text of the `idx`-th distance: the file's own spelling when the trace
    /// was loaded, [`format_value`] otherwise.
    pub fn distance_text(&self, idx: usize) -> String {
        match self.raw_distances.get(idx) {
            Some(raw) => raw.clone(),
            None => self.samples.get(idx).map_or_else(String::new, |s| format_value(s.distance)),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Result of merging or splitting traces: `resolution` evenly spaced rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTrace {
    /// Mean offset of the parent traces.
    pub offset: f64,
    pub rows: Vec<Sample>,
}

impl CombinedTrace {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One trace after normalization of a single channel.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrace {
    /// Header lines of the source trace, unchanged.
    pub header: Vec<String>,
    /// `(distance as written in the source, normalized value)` per source row.
    pub rows: Vec<(String, f64)>,
}

/// Global extremes of one channel across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelRange {
    pub min: f64,
    pub max: f64,
}

impl ChannelRange {
    /// Map `value` from `[min, max]` onto `[0, 1]`.
    pub fn remap(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

/// Render a float the way the trace files spell them: shortest round-trip
/// digits with a decimal point (`0.0`, `12.5`), and outside `[1e-4, 1e16)`
/// a signed two-digit exponent (`1e-05`, `2.5e+16`).
pub fn format_value(value: f64) -> String {
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_numbers_are_one_based() {
        let s = Sample::new(1.0, vec![10.0, 20.0, 30.0]);
        assert_eq!(s.channel(0), None);
        assert_eq!(s.channel(1), Some(10.0));
        assert_eq!(s.channel(3), Some(30.0));
        assert_eq!(s.channel(4), None);
    }

    #[test]
    fn max_distance_is_last_sample() {
        let t = Trace::from_samples(
            0.0,
            vec![Sample::new(0.0, vec![1.0]), Sample::new(7.5, vec![2.0])],
        );
        assert_eq!(t.max_distance(), 7.5);
        assert_eq!(t.channel_count(), 1);
    }

    #[test]
    fn values_keep_a_decimal_point() {
        assert_eq!(format_value(0.0), "0.0");
        assert_eq!(format_value(6.0), "6.0");
        assert_eq!(format_value(12.25), "12.25");
        assert_eq!(format_value(0.0001), "0.0001");
        assert_eq!(format_value(1e15), "1000000000000000.0");
    }

    #[test]
    fn exponents_are_signed_with_two_digits() {
        assert_eq!(format_value(1e-5), "1e-05");
        assert_eq!(format_value(1.5e-7), "1.5e-07");
        assert_eq!(format_value(-2.5e-12), "-2.5e-12");
        assert_eq!(format_value(1e16), "1e+16");
        assert_eq!(format_value(1e300), "1e+300");
    }

    #[test]
    fn ragged_samples_are_reported() {
        let t = Trace::from_samples(
            0.0,
            vec![Sample::new(0.0, vec![1.0, 2.0]), Sample::new(1.0, vec![3.0])],
        );
        assert!(matches!(
            t.check_channel_count(4, 2),
            Err(TraceError::InconsistentChannelCount { index: 4, expected: 2, found: 1 })
        ));
        assert!(Trace::from_samples(0.0, Vec::new()).check_channel_count(0, 3).is_ok());
    }

    #[test]
    fn distance_text_prefers_file_spelling() {
        let mut t = Trace::from_samples(0.0, vec![Sample::new(0.0, vec![1.0])]);
        assert_eq!(t.distance_text(0), "0.0");
        t.raw_distances = vec!["0.000".into()];
        assert_eq!(t.distance_text(0), "0.000");
    }
}
