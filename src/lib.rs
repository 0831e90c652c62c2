//! Resample, merge and normalize multichannel slice traces.
//!
//! Each input file is one slice of a brain: an offset, two header lines, and
//! rows of `distance, channel…`. Slices from several brains are put on a
//! common axis of `resolution` evenly spaced steps and either averaged
//! ([`combine::merge`]) or laid side by side channel-wise ([`combine::split`]).
//! [`data::normalize`] rescales one channel into `[0, 1]` across a batch so
//! brains from different experiments can be compared.

pub mod batch;
pub mod combine;
pub mod config;
pub mod data;
pub mod error;

pub use combine::merge::merge_traces;
pub use combine::split::split_channels;
pub use combine::{ResampleParams, SampleLookup};
pub use config::{Config, MergeMode};
pub use data::model::{ChannelRange, CombinedTrace, NormalizedTrace, Sample, Trace};
pub use data::normalize::normalize_traces;
pub use error::TraceError;
