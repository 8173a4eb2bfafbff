//! Error and anomaly types for the feed decoder.
//!
//! [`FeedError`] aborts decoding of the current unit (a segment or a single
//! embedded message). [`Anomaly`] is advisory: it is attached to a decoded
//! segment and never stops processing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feed decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedError {
    /// Datagram shorter than the fixed segment header
    #[error("Truncated header: need {needed} bytes, got {actual}")]
    TruncatedHeader {
        /// Header size
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Embedded message runs past the end of the datagram
    #[error("Truncated message #{index}: need {needed} bytes, {remaining} remaining")]
    TruncatedMessage {
        /// Zero-based position of the message in its segment
        index: u16,
        /// Bytes needed from the start of the entry (prefix included)
        needed: usize,
        /// Bytes left in the datagram at the start of the entry
        remaining: usize,
    },

    /// Application record shorter than its fixed size
    #[error("Truncated record: need {needed} bytes, got {actual}")]
    TruncatedRecord {
        /// Record size
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// A decoder is already registered for the protocol id
    #[error("Duplicate registration for protocol {0:#06x}")]
    DuplicateRegistration(u16),

    /// Header fields outside their defined domain
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Encoded payload does not fit its length field
    #[error("Payload too large: {size} bytes exceeds {max}")]
    PayloadTooLarge {
        /// Requested size
        size: usize,
        /// Largest size the length field can express
        max: usize,
    },

    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Configuration value outside its usable range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

impl From<nom::Err<nom::error::Error<&[u8]>>> for FeedError {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(needed) => FeedError::ParseError(format!("incomplete: {needed:?}")),
            nom::Err::Error(e) | nom::Err::Failure(e) => FeedError::ParseError(format!(
                "{:?} with {} bytes left",
                e.code,
                e.input.len()
            )),
        }
    }
}

/// How loudly an anomaly should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, part of normal operation
    Chat,
    /// Worth noting, not a fault
    Note,
    /// Suspicious field content
    Warning,
    /// Loss or malformed content
    Error,
}

/// Advisory condition found while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anomaly {
    /// Segment carries no messages
    Heartbeat,
    /// Bytes missing between the previous segment and this one
    ByteGapDetected {
        /// Number of missing bytes
        bytes: u64,
    },
    /// Messages missing between the previous segment and this one
    MessageGapDetected {
        /// Number of missing messages
        messages: u64,
    },
    /// No decoder registered; messages passed through as raw bytes
    UnrecognizedProtocol {
        /// Protocol id from the segment header
        protocol: u16,
    },
    /// Message type tag outside the defined set
    UnknownMessageType {
        /// Tag as read from the wire
        message_type: u8,
    },
    /// Reserved flag bits are set
    InvalidFlags {
        /// Raw flags byte
        flags: u8,
    },
    /// Timestamp before the Unix epoch
    InvalidTimestamp {
        /// Raw nanosecond value
        nanos: i64,
    },
    /// Bid side is negative or half-populated
    InvalidBid {
        /// Raw bid price
        price: i64,
        /// Bid size
        size: u32,
    },
    /// Ask side is negative or half-populated
    InvalidAsk {
        /// Raw ask price
        price: i64,
        /// Ask size
        size: u32,
    },
}

impl Anomaly {
    /// Severity of this anomaly
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Anomaly::Heartbeat => Severity::Chat,
            Anomaly::UnrecognizedProtocol { .. } => Severity::Note,
            Anomaly::InvalidFlags { .. }
            | Anomaly::InvalidTimestamp { .. }
            | Anomaly::InvalidBid { .. }
            | Anomaly::InvalidAsk { .. } => Severity::Warning,
            Anomaly::ByteGapDetected { .. }
            | Anomaly::MessageGapDetected { .. }
            | Anomaly::UnknownMessageType { .. } => Severity::Error,
        }
    }

    /// Stable machine-readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Anomaly::Heartbeat => "heartbeat",
            Anomaly::ByteGapDetected { .. } => "gap_bytes",
            Anomaly::MessageGapDetected { .. } => "gap_msg",
            Anomaly::UnrecognizedProtocol { .. } => "unrecognized_protocol",
            Anomaly::UnknownMessageType { .. } => "unknown_type",
            Anomaly::InvalidFlags { .. } => "invalid_flags",
            Anomaly::InvalidTimestamp { .. } => "invalid_time",
            Anomaly::InvalidBid { .. } => "invalid_bid",
            Anomaly::InvalidAsk { .. } => "invalid_ask",
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::Heartbeat => write!(f, "The segment is a heartbeat"),
            Anomaly::ByteGapDetected { bytes } => {
                write!(f, "{bytes} previous bytes not captured")
            }
            Anomaly::MessageGapDetected { messages } => {
                write!(f, "{messages} previous messages not captured")
            }
            Anomaly::UnrecognizedProtocol { protocol } => {
                write!(f, "No decoder for protocol {protocol:#06x}")
            }
            Anomaly::UnknownMessageType { message_type } => {
                write!(f, "Unknown message type {message_type:#04x}")
            }
            Anomaly::InvalidFlags { flags } => write!(f, "Reserved flag bits set: {flags:#04x}"),
            Anomaly::InvalidTimestamp { nanos } => write!(f, "Timestamp before epoch: {nanos}"),
            Anomaly::InvalidBid { price, size } => {
                write!(f, "Inconsistent bid: price={price} size={size}")
            }
            Anomaly::InvalidAsk { price, size } => {
                write!(f, "Inconsistent ask: price={price} size={size}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeedError::TruncatedHeader {
            needed: 40,
            actual: 12,
        };
        assert_eq!(err.to_string(), "Truncated header: need 40 bytes, got 12");

        let err = FeedError::DuplicateRegistration(0x8001);
        assert_eq!(err.to_string(), "Duplicate registration for protocol 0x8001");
    }

    #[test]
    fn test_severity() {
        assert_eq!(Anomaly::Heartbeat.severity(), Severity::Chat);
        assert_eq!(Anomaly::ByteGapDetected { bytes: 3 }.severity(), Severity::Error);
        assert_eq!(Anomaly::InvalidFlags { flags: 1 }.severity(), Severity::Warning);
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn test_anomaly_display() {
        let a = Anomaly::MessageGapDetected { messages: 7 };
        assert_eq!(a.to_string(), "7 previous messages not captured");
        assert_eq!(a.name(), "gap_msg");
    }

    #[test]
    fn test_nom_conversion() {
        let input: &[u8] = &[1, 2];
        let err: FeedError =
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)).into();
        assert!(matches!(err, FeedError::ParseError(_)));
    }
}
