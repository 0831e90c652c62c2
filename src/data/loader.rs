use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::debug;

use super::model::{Sample, Trace};
use crate::error::{Result, TraceError};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one slice file.
///
/// Layout:
/// ```text
/// 1234.5,                                       <- offset
/// "Distance[um]","AF488","tdTom","Cy5", , , ,   <- labels (kept, not interpreted)
/// "0.0","12.0","3.5","0.0", , , ,               <- data rows
/// ```
///
/// The file is read as UTF-8 with a leading byte-order mark dropped; invalid
/// sequences are replaced rather than rejected.
pub fn load_trace(path: &Path) -> Result<Trace> {
    let bytes = std::fs::read(path).map_err(|e| TraceError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let trace = parse_trace(&text, path)?;
    debug!(
        "loaded {}: {} rows, {} channels, offset {}",
        path.display(),
        trace.len(),
        trace.channel_count(),
        trace.offset
    );
    Ok(trace)
}

/// Parse the text of a slice file. `path` is only used in error messages.
pub fn parse_trace(text: &str, path: &Path) -> Result<Trace> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let malformed = |line: u64, reason: String| TraceError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let header: Vec<String> = text.lines().take(2).map(str::to_string).collect();

    // Quotes are stripped per token below, so the reader must leave them alone.
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut offset = None;
    let mut samples: Vec<Sample> = Vec::new();
    let mut raw_distances = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            malformed(line, e.to_string())
        })?;
        let line = record.position().map_or(0, |p| p.line());

        match line {
            1 => {
                let token = record
                    .get(0)
                    .and_then(unquote)
                    .ok_or_else(|| malformed(1, "missing offset".into()))?;
                offset = Some(parse_number(token).map_err(|tok| malformed(1, bad_number(&tok)))?);
            }
            2 => continue,
            _ => {
                let fields = parse_record(&record).map_err(|tok| malformed(line, bad_number(&tok)))?;
                let Some((&(raw, distance), rest)) = fields.split_first() else {
                    continue;
                };
                let channels: Vec<f64> = rest.iter().map(|&(_, value)| value).collect();

                if let Some(prev) = samples.last() {
                    if channels.len() != prev.channels.len() {
                        return Err(malformed(
                            line,
                            format!(
                                "{} channels, earlier rows have {}",
                                channels.len(),
                                prev.channels.len()
                            ),
                        ));
                    }
                    if distance < prev.distance {
                        return Err(malformed(
                            line,
                            format!("distance {distance} is below the previous {}", prev.distance),
                        ));
                    }
                }
                samples.push(Sample::new(distance, channels));
                raw_distances.push(raw.to_string());
            }
        }
    }

    let offset = offset.ok_or_else(|| malformed(1, "missing offset line".into()))?;
    if header.len() < 2 {
        return Err(malformed(2, "missing header line".into()));
    }
    if samples.is_empty() {
        return Err(TraceError::EmptyTrace {
            path: path.to_path_buf(),
        });
    }

    Ok(Trace {
        offset,
        header,
        samples,
        raw_distances,
    })
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

/// All numeric fields of a data row with their unquoted text, blank padding
/// skipped. On failure the offending token is returned.
fn parse_record(record: &StringRecord) -> std::result::Result<Vec<(&str, f64)>, String> {
    record
        .iter()
        .filter_map(unquote)
        .map(|token| parse_number(token).map(|value| (token, value)))
        .collect()
}

/// `None` for blank padding, otherwise the token with one wrapping quote pair removed.
fn unquote(token: &str) -> Option<&str> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed);
    Some(inner.trim())
}

fn parse_number(token: &str) -> std::result::Result<f64, String> {
    token.parse::<f64>().map_err(|_| token.to_string())
}

fn bad_number(token: &str) -> String {
    format!("'{token}' is not a number")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        "12.5, \n",
        "\"Distance[um]\",\"AF488\",\"tdTom\",\"Cy5\", , , , \n",
        "\"0.0\",\"1.0\",\"2.0\",\"3.0\", , , , \n",
        "\"0.5\",\"4.0\",\"5.0\",\"6.0\", , , , \n",
        "\"1.25\",\"7.0\",\"8.0\",\"9.0\", , , , \n",
    );

    fn parse(text: &str) -> Result<Trace> {
        parse_trace(text, Path::new("slice.csv"))
    }

    #[test]
    fn parses_offset_header_and_rows() {
        let trace = parse(SAMPLE).unwrap();
        assert_eq!(trace.offset, 12.5);
        assert_eq!(trace.header.len(), 2);
        assert_eq!(trace.header[0], "12.5, ");
        assert!(trace.header[1].starts_with("\"Distance[um]\""));
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.channel_count(), 3);
        assert_eq!(trace.samples[1], Sample::new(0.5, vec![4.0, 5.0, 6.0]));
        assert_eq!(trace.max_distance(), 1.25);
    }

    #[test]
    fn strips_byte_order_mark_and_crlf() {
        let text = format!("\u{feff}{}", SAMPLE.replace('\n', "\r\n"));
        let trace = parse(&text).unwrap();
        assert_eq!(trace.offset, 12.5);
        assert_eq!(trace.header[0], "12.5, ");
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn accepts_unquoted_numbers() {
        let text = "3,\nlabels\n0,1\n2,3\n";
        let trace = parse(text).unwrap();
        assert_eq!(trace.offset, 3.0);
        assert_eq!(trace.samples[1], Sample::new(2.0, vec![3.0]));
    }

    #[test]
    fn rejects_non_numeric_field() {
        let text = "0, \nh\n\"0.0\",\"abc\", \n";
        match parse(text) {
            Err(TraceError::MalformedRecord { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("abc"), "{reason}");
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn rejects_header_only_file() {
        let text = "0, \n\"Distance[um]\",\"AF488\", \n";
        assert!(matches!(parse(text), Err(TraceError::EmptyTrace { .. })));
    }

    #[test]
    fn rejects_ragged_rows() {
        let text = "0, \nh\n\"0\",\"1\",\"2\"\n\"1\",\"1\"\n";
        assert!(matches!(
            parse(text),
            Err(TraceError::MalformedRecord { line: 4, .. })
        ));
    }

    #[test]
    fn rejects_decreasing_distance() {
        let text = "0, \nh\n\"5\",\"1\"\n\"4\",\"1\"\n";
        assert!(matches!(
            parse(text),
            Err(TraceError::MalformedRecord { line: 4, .. })
        ));
    }

    #[test]
    fn keeps_distance_spelling() {
        let text = "0, \nh\n\"0.000\",\"1.0\", \n\"0.00001\",\"2.0\", \n12,\"3.0\"\n";
        let trace = parse(text).unwrap();
        assert_eq!(trace.raw_distances, vec!["0.000", "0.00001", "12"]);
        assert_eq!(trace.samples[1].distance, 1e-5);
        assert_eq!(trace.distance_text(0), "0.000");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_trace(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, TraceError::Io { .. }));
    }
}
