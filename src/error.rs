use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, resampling or normalizing traces.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("{}: line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{}: trace has no data rows", path.display())]
    EmptyTrace { path: PathBuf },

    #[error("no traces given")]
    EmptyInput,

    #[error("trace {index} has a row with {found} channels, expected {expected}")]
    InconsistentChannelCount {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("channel {channel} is out of range for a trace with {arity} channels")]
    InvalidChannelIndex { channel: usize, arity: usize },

    #[error("channel {channel} has the same value {value} everywhere; cannot normalize")]
    DegenerateRange { channel: usize, value: f64 },

    #[error("resolution must be at least 1")]
    InvalidResolution,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = TraceError> = std::result::Result<T, E>;
