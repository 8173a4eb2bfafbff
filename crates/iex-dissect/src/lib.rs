//! # iex-dissect
//!
//! Command-line front end for the IEX transport decoder.
//!
//! This crate provides:
//! - Hex datagram input, one datagram per line
//! - Text summaries and JSON output of decoded segments
//! - Configuration management
//! - Prometheus counters for a decoding run

#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod dissect;
pub mod input;
pub mod metrics;
pub mod render;

pub use config::AppConfig;
pub use dissect::{Dissector, OutputFormat};
pub use metrics::MetricsRegistry;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::dissect::{Dissector, OutputFormat};
    pub use crate::metrics::MetricsRegistry;
}
