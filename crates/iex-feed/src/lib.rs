//! # iex-feed
//!
//! Decoder for the IEX transport protocol and the TOPS quote messages it
//! carries.
//!
//! This crate provides:
//! - Transport segment parsing with per-conversation gap tracking
//! - A registry mapping protocol ids to message decoders
//! - The fixed 42-byte quote decoder with advisory field validation
//! - A heuristic sniffer for datagrams on unknown ports
//! - Segment encoding and a synthetic quote feed for tests and benches
//!
//! ## Transport overview
//!
//! Every datagram is one segment: a 40-byte little-endian header followed by
//! `count` messages, each prefixed with a 2-byte length. A segment belongs to
//! a conversation identified by (channel, session). Within a conversation the
//! header's stream offset and first sequence number advance by the payload
//! length and message count of every segment, so a missing datagram shows up
//! as a byte gap and a message gap. A segment with no messages and no payload
//! is a heartbeat.
//!
//! ## Example
//!
//! ```rust
//! use iex_feed::builder::SegmentBuilder;
//! use iex_feed::gap::GapTracker;
//! use iex_feed::parser::SegmentDecoder;
//!
//! let datagram = SegmentBuilder::heartbeat(0x8001, 1, 7, 4096, 12).build()?;
//!
//! let decoder = SegmentDecoder::with_defaults();
//! let mut tracker = GapTracker::new();
//! let segment = decoder.decode(&mut tracker, &datagram)?;
//!
//! assert!(segment.is_heartbeat());
//! assert_eq!(segment.protocol_name.as_deref(), Some("IEX-TOPS"));
//! # Ok::<(), iex_feed::FeedError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod config;
pub mod error;
pub mod gap;
pub mod messages;
pub mod parser;
pub mod quote;
pub mod registry;
pub mod sniffer;
pub mod synthetic;
pub mod wire;

pub use config::DecoderConfig;
pub use error::{Anomaly, FeedError, FeedResult, Severity};
pub use gap::{ConcurrentGapTracker, ConversationKey, GapReport, GapTracker};
pub use messages::*;
pub use parser::{parse_segment, SegmentDecoder};
pub use quote::{QuoteDecoder, QuoteFlags, QuoteMessage};
pub use registry::{DecodedMessage, MessageDecoder, Record, SubProtocolRegistry};
pub use sniffer::{looks_like_segment, sniff, Rejection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::SegmentBuilder;
    pub use crate::config::DecoderConfig;
    pub use crate::error::{Anomaly, FeedError, FeedResult};
    pub use crate::gap::{GapReport, GapTracker};
    pub use crate::messages::*;
    pub use crate::parser::SegmentDecoder;
    pub use crate::quote::QuoteMessage;
    pub use crate::registry::SubProtocolRegistry;
}
