use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use serde::Deserialize;

use super::model::{format_value, CombinedTrace, NormalizedTrace, Trace};
use crate::error::{Result, TraceError};

// ---------------------------------------------------------------------------
// Output schema
// ---------------------------------------------------------------------------

/// Column layout shared by every file this crate writes.
///
/// Each line is `distance, values…` followed by blank fields until
/// `total_columns` fields have been written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSchema {
    /// Label of column 0.
    pub distance_label: String,
    /// Channel labels written on line 2 of merged/split output.
    pub channel_labels: Vec<String>,
    /// Fixed number of fields per line, blank padding included.
    pub total_columns: usize,
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self {
            distance_label: "Distance[um]".to_string(),
            channel_labels: vec!["AF488".into(), "tdTom".into(), "Cy5".into()],
            total_columns: 8,
        }
    }
}

impl OutputSchema {
    fn padded(&self, mut fields: Vec<String>) -> Vec<String> {
        let missing = self.total_columns.saturating_sub(fields.len());
        fields.extend(std::iter::repeat(" ".to_string()).take(missing));
        fields
    }

    fn label_fields(&self) -> Vec<String> {
        std::iter::once(&self.distance_label)
            .chain(&self.channel_labels)
            .map(|l| quoted(l))
            .collect()
    }

    fn value_fields(&self, distance: f64, values: &[f64]) -> Vec<String> {
        std::iter::once(distance)
            .chain(values.iter().copied())
            .map(|v| quoted(&format_value(v)))
            .collect()
    }
}

fn quoted(s: &str) -> String {
    format!("\"{s}\"")
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write a merged or split trace: offset line, schema labels, one line per row.
pub fn write_combined(path: &Path, trace: &CombinedTrace, schema: &OutputSchema) -> Result<()> {
    write_atomically(path, |out| {
        let mut wtr = record_writer(out);
        write_preamble(&mut wtr, trace.offset, schema)?;
        for row in &trace.rows {
            wtr.write_record(schema.padded(schema.value_fields(row.distance, &row.channels)))?;
        }
        wtr.flush()?;
        Ok(())
    })
}

/// Write a normalized trace: the source header lines and distance text
/// verbatim, then the normalized value per row.
pub fn write_normalized(
    path: &Path,
    trace: &NormalizedTrace,
    offset: f64,
    schema: &OutputSchema,
) -> Result<()> {
    write_atomically(path, |out| {
        let mut wtr = header_writer(out, &trace.header, offset, schema)?;
        for (distance, value) in &trace.rows {
            let fields = vec![quoted(distance), quoted(&format_value(*value))];
            wtr.write_record(schema.padded(fields))?;
        }
        wtr.flush()?;
        Ok(())
    })
}

/// Write a trace in the same layout the loader reads.
pub fn write_trace(path: &Path, trace: &Trace, schema: &OutputSchema) -> Result<()> {
    write_atomically(path, |out| {
        let mut wtr = header_writer(out, &trace.header, trace.offset, schema)?;
        for sample in &trace.samples {
            wtr.write_record(schema.padded(schema.value_fields(sample.distance, &sample.channels)))?;
        }
        wtr.flush()?;
        Ok(())
    })
}

fn record_writer<W: Write>(out: W) -> Writer<W> {
    // Fields arrive pre-quoted; preamble lines differ in length from data lines.
    WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out)
}

fn write_preamble<W: Write>(wtr: &mut Writer<W>, offset: f64, schema: &OutputSchema) -> csv::Result<()> {
    wtr.write_record([format_value(offset), " ".to_string()])?;
    wtr.write_record(schema.padded(schema.label_fields()))
}

/// Record writer positioned after the header.
///
/// Raw header lines go straight to `out`, byte for byte (a blank line stays
/// blank); a trace without them gets the schema preamble.
fn header_writer<W: Write>(
    mut out: W,
    header: &[String],
    offset: f64,
    schema: &OutputSchema,
) -> csv::Result<Writer<W>> {
    if header.len() < 2 {
        let mut wtr = record_writer(out);
        write_preamble(&mut wtr, offset, schema)?;
        return Ok(wtr);
    }
    for line in header {
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(record_writer(out))
}

/// Render into a sibling temp file and rename it over `path`, so a failed
/// write never leaves a truncated result behind.
fn write_atomically<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> csv::Result<()>,
{
    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| TraceError::io(&tmp, e))?;
    let mut out = BufWriter::new(file);

    let written = render(&mut out)
        .map_err(|e| TraceError::io(&tmp, e.into()))
        .and_then(|()| out.flush().map_err(|e| TraceError::io(&tmp, e)));
    drop(out);

    match written {
        Ok(()) => std::fs::rename(&tmp, path).map_err(|e| TraceError::io(path, e)),
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
