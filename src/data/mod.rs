//! Data layer: trace types, file I/O, and batch normalization.
//!
//! Architecture:
//! ```text
//!   brains/<group>/*.csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Trace (offset, header, samples)
//!   └──────────┘
//!        │
//!        ├──────────────► combine::{merge, split} → CombinedTrace
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ normalize  │  batch min/max of one channel → NormalizedTrace
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  writer   │  OutputSchema-padded lines → results/*.csv
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod normalize;
pub mod writer;
