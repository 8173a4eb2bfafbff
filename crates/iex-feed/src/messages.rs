//! Transport segment types: header, embedded messages and decode results.

use std::iter::FusedIterator;
use std::ops::RangeInclusive;

use iex_core::constants::{MESSAGE_LENGTH_PREFIX, SEGMENT_HEADER_SIZE};
use iex_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{Anomaly, FeedError, FeedResult};
use crate::gap::{ConversationKey, GapReport};
use crate::quote::QuoteMessage;
use crate::registry::DecodedMessage;
use crate::wire::{segment_offsets, WireReader};

/// Transport segment header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentHeader {
    /// Transport version
    pub version: u8,
    /// Protocol id of the embedded messages
    pub protocol: u16,
    /// Logical market-data channel
    pub channel: u32,
    /// Sender session (restart epoch)
    pub session: u32,
    /// Bytes of message data after the header, length prefixes included
    pub length: u16,
    /// Number of embedded messages
    pub count: u16,
    /// Stream position of the first payload byte
    pub offset: i64,
    /// Sequence number of the first embedded message
    pub first_seq: i64,
    /// Time the segment was sent
    pub send_time: Timestamp,
}

impl SegmentHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = SEGMENT_HEADER_SIZE;

    /// Conversation this segment belongs to
    #[inline]
    #[must_use]
    pub const fn key(&self) -> ConversationKey {
        ConversationKey::new(self.channel, self.session)
    }

    /// No messages and no payload
    #[inline]
    #[must_use]
    pub const fn is_heartbeat(&self) -> bool {
        self.count == 0 && self.length == 0
    }

    /// Sequence number of the last embedded message
    /// (`first_seq - 1` when the segment is empty)
    #[inline]
    #[must_use]
    pub const fn last_seq(&self) -> i64 {
        self.first_seq.saturating_add(self.count as i64).saturating_sub(1)
    }

    /// Stream offset the next segment should start at
    #[inline]
    #[must_use]
    pub const fn next_offset(&self) -> i64 {
        self.offset.saturating_add(self.length as i64)
    }

    /// Sequence number the next segment should start at
    #[inline]
    #[must_use]
    pub const fn next_seq(&self) -> i64 {
        self.first_seq.saturating_add(self.count as i64)
    }

    /// Stream bytes carried by this segment
    #[must_use]
    pub fn byte_range(&self) -> Option<RangeInclusive<i64>> {
        (self.length > 0).then(|| self.offset..=self.next_offset() - 1)
    }

    /// Sequence numbers carried by this segment
    #[must_use]
    pub fn message_range(&self) -> Option<RangeInclusive<i64>> {
        (self.count > 0).then(|| self.first_seq..=self.last_seq())
    }

    /// Check the fields that must be non-negative and the version
    pub fn validate(&self) -> FeedResult<()> {
        if self.version != iex_core::TRANSPORT_VERSION {
            return Err(FeedError::InvalidHeader(format!(
                "unsupported version {}",
                self.version
            )));
        }
        if self.offset < 0 {
            return Err(FeedError::InvalidHeader(format!(
                "negative offset {}",
                self.offset
            )));
        }
        if self.first_seq < 0 {
            return Err(FeedError::InvalidHeader(format!(
                "negative sequence number {}",
                self.first_seq
            )));
        }
        if !self.send_time.is_valid() {
            return Err(FeedError::InvalidHeader(format!(
                "negative send time {}",
                self.send_time.as_nanos()
            )));
        }
        Ok(())
    }
}

/// One length-prefixed message inside a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedMessage<'a> {
    /// Zero-based position within the segment
    pub index: u16,
    /// Sequence number (`first_seq + index`)
    pub sequence: i64,
    /// Datagram offset of the length prefix
    pub position: usize,
    /// Message bytes, prefix excluded
    pub payload: &'a [u8],
}

impl EmbeddedMessage<'_> {
    /// Declared payload length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// A parsed header over its datagram, with lazy access to the messages
#[derive(Debug, Clone, Copy)]
pub struct RawSegment<'a> {
    /// Parsed header
    pub header: SegmentHeader,
    datagram: &'a [u8],
}

impl<'a> RawSegment<'a> {
    pub(crate) const fn new(header: SegmentHeader, datagram: &'a [u8]) -> Self {
        Self { header, datagram }
    }

    /// The whole datagram, header included
    #[must_use]
    pub const fn datagram(&self) -> &'a [u8] {
        self.datagram
    }

    /// Walk the `count` embedded messages.
    ///
    /// Bytes after the last message are ignored. The declared payload length
    /// is not cross-checked against the messages.
    #[must_use]
    pub fn messages(&self) -> MessageIter<'a> {
        MessageIter {
            reader: WireReader::new(self.datagram),
            position: segment_offsets::MESSAGES,
            index: 0,
            count: self.header.count,
            first_seq: self.header.first_seq,
            done: false,
        }
    }
}

/// Iterator over embedded messages; stops after the first truncation
#[derive(Debug, Clone)]
pub struct MessageIter<'a> {
    reader: WireReader<'a>,
    position: usize,
    index: u16,
    count: u16,
    first_seq: i64,
    done: bool,
}

impl<'a> MessageIter<'a> {
    /// Datagram offset just past the last message walked so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    fn truncated(&mut self, needed: usize) -> FeedError {
        self.done = true;
        FeedError::TruncatedMessage {
            index: self.index,
            needed,
            remaining: self.reader.remaining_from(self.position),
        }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = FeedResult<EmbeddedMessage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.count {
            return None;
        }

        let Some(len) = self.reader.u16_at(self.position) else {
            return Some(Err(self.truncated(MESSAGE_LENGTH_PREFIX)));
        };
        let len = usize::from(len);
        let body_start = self.position + MESSAGE_LENGTH_PREFIX;
        let Some(payload) = self.reader.bytes_at(body_start, len) else {
            return Some(Err(self.truncated(MESSAGE_LENGTH_PREFIX + len)));
        };

        let message = EmbeddedMessage {
            index: self.index,
            sequence: self.first_seq.saturating_add(i64::from(self.index)),
            position: self.position,
            payload,
        };
        self.position = body_start + len;
        self.index += 1;
        Some(Ok(message))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(usize::from(self.count - self.index)))
        }
    }
}

impl FusedIterator for MessageIter<'_> {}

/// Classification of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// No messages; only advances the expected offset and sequence
    Heartbeat,
    /// Carries messages
    Data,
}

/// What became of one embedded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Decoded by the registered decoder
    Decoded(DecodedMessage),
    /// No decoder registered; raw bytes passed through
    Opaque(Vec<u8>),
    /// The registered decoder rejected the payload
    Failed(FeedError),
}

/// Decode outcome for one embedded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOutcome {
    /// Zero-based position within the segment
    pub index: u16,
    /// Sequence number
    pub sequence: i64,
    /// Payload length
    pub length: u16,
    /// Decoded form
    pub body: MessageBody,
}

/// Fully decoded segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedSegment {
    /// Parsed header
    pub header: SegmentHeader,
    /// Heartbeat or data
    pub kind: SegmentKind,
    /// Name of the registered decoder, `None` if unrecognised
    pub protocol_name: Option<String>,
    /// Continuity against the previous segment of the conversation
    pub gap: GapReport,
    /// Messages decoded before any truncation
    pub messages: Vec<MessageOutcome>,
    /// Advisory findings, in discovery order
    pub anomalies: Vec<Anomaly>,
    /// Framing error that cut the message walk short
    pub error: Option<FeedError>,
}

impl DecodedSegment {
    /// Whether this is a heartbeat
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        self.kind == SegmentKind::Heartbeat
    }

    /// Whether every declared message was walked
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Decoded quotes, in wire order
    pub fn quotes(&self) -> impl Iterator<Item = &QuoteMessage> + '_ {
        self.messages.iter().filter_map(|m| match &m.body {
            MessageBody::Decoded(decoded) => decoded.as_quote(),
            _ => None,
        })
    }
}
