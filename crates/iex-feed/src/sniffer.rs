//! Heuristic recognition of transport segments in arbitrary datagrams.
//!
//! Used when the feed is not on a known port. The checks run cheapest and
//! most selective first and stop at the first failure. A datagram that passes
//! is only plausibly a segment; the parser still validates it fully.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FeedError;
use crate::messages::SegmentHeader;
use crate::parser::parse_header;

/// First check a datagram failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Shorter than a segment header
    #[error("datagram too short: {len} bytes")]
    TooShort {
        /// Datagram length
        len: usize,
    },
    /// Version is not 1
    #[error("unsupported version {0}")]
    Version(u8),
    /// Protocol id is zero
    #[error("protocol id is zero")]
    ZeroProtocol,
    /// Stream offset is negative
    #[error("negative stream offset {0}")]
    NegativeOffset(i64),
    /// First sequence number is negative
    #[error("negative sequence number {0}")]
    NegativeSequence(i64),
    /// Send time is negative
    #[error("negative send time {0}")]
    NegativeSendTime(i64),
    /// Channel id is zero
    #[error("channel id is zero")]
    ZeroChannel,
    /// Session id is zero
    #[error("session id is zero")]
    ZeroSession,
}

impl From<Rejection> for FeedError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::TooShort { len } => FeedError::TruncatedHeader {
                needed: SegmentHeader::SIZE,
                actual: len,
            },
            other => FeedError::InvalidHeader(other.to_string()),
        }
    }
}

/// Check whether `buf` looks like a transport segment
pub fn sniff(buf: &[u8]) -> Result<(), Rejection> {
    let result = check(buf);
    if let Err(rejection) = &result {
        tracing::trace!(len = buf.len(), %rejection, "sniffer rejected datagram");
    }
    result
}

/// `true` iff [`sniff`] accepts `buf`
#[must_use]
pub fn looks_like_segment(buf: &[u8]) -> bool {
    sniff(buf).is_ok()
}

fn check(buf: &[u8]) -> Result<(), Rejection> {
    let too_short = Rejection::TooShort { len: buf.len() };
    if buf.len() < SegmentHeader::SIZE {
        return Err(too_short);
    }
    let (_, h) = parse_header(buf).map_err(|_| too_short)?;

    if h.version != iex_core::TRANSPORT_VERSION {
        return Err(Rejection::Version(h.version));
    }
    if h.protocol == 0 {
        return Err(Rejection::ZeroProtocol);
    }
    if h.offset < 0 {
        return Err(Rejection::NegativeOffset(h.offset));
    }
    if h.first_seq < 0 {
        return Err(Rejection::NegativeSequence(h.first_seq));
    }
    if !h.send_time.is_valid() {
        return Err(Rejection::NegativeSendTime(h.send_time.as_nanos()));
    }
    if h.channel == 0 {
        return Err(Rejection::ZeroChannel);
    }
    if h.session == 0 {
        return Err(Rejection::ZeroSession);
    }
    Ok(())
}
