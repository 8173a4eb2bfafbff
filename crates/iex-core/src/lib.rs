//! # iex-core
//!
//! Value types and wire constants shared by the IEX transport decoder.
//!
//! This crate provides:
//! - `Price`: signed fixed-point price scaled by 10,000
//! - `Timestamp`: signed nanoseconds since the Unix epoch
//! - `Quantity`: unscaled displayed size
//! - `Symbol`: eight raw bytes of a space-padded ticker
//! - Zero-copy serialization support via `rkyv`
//!
//! ## Example
//!
//! ```rust
//! use iex_core::types::{Price, Symbol, Timestamp};
//!
//! let bid = Price::from_raw(1_502_500); // 150.2500
//! let sym = Symbol::new("AAPL").unwrap();
//! let ts = Timestamp::from_nanos(1_500_000_000_000_000_000);
//! assert_eq!(bid.to_string(), "150.2500");
//! assert_eq!(sym.as_bytes(), b"AAPL    ");
//! assert_eq!(ts.as_secs(), 1_500_000_000);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{Error, Result};
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{Error, Result};
    pub use crate::types::*;
}
