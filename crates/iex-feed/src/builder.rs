//! Encoding of transport segments.
//!
//! Used by the synthetic feed, benches and tests. Header counters can be
//! overridden to produce deliberately malformed segments.

use iex_core::constants::{MAX_SEGMENT_PAYLOAD, MESSAGE_LENGTH_PREFIX, TRANSPORT_VERSION};
use iex_core::types::Timestamp;

use crate::error::{FeedError, FeedResult};
use crate::messages::SegmentHeader;
use crate::wire::WireWriter;

/// Builder for one segment datagram
#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    version: u8,
    protocol: u16,
    channel: u32,
    session: u32,
    offset: i64,
    first_seq: i64,
    send_time: Timestamp,
    messages: Vec<Vec<u8>>,
    count_override: Option<u16>,
    length_override: Option<u16>,
}

impl SegmentBuilder {
    /// Start a segment for one conversation; offset 0, sequence 1
    #[must_use]
    pub fn new(protocol: u16, channel: u32, session: u32) -> Self {
        Self {
            version: TRANSPORT_VERSION,
            protocol,
            channel,
            session,
            offset: 0,
            first_seq: 1,
            send_time: Timestamp::EPOCH,
            messages: Vec::new(),
            count_override: None,
            length_override: None,
        }
    }

    /// Heartbeat announcing the next expected offset and sequence number
    #[must_use]
    pub fn heartbeat(protocol: u16, channel: u32, session: u32, offset: i64, next_seq: i64) -> Self {
        Self::new(protocol, channel, session)
            .offset(offset)
            .first_seq(next_seq)
    }

    /// Transport version byte
    #[must_use]
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Stream offset of the first payload byte
    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Sequence number of the first message
    #[must_use]
    pub fn first_seq(mut self, first_seq: i64) -> Self {
        self.first_seq = first_seq;
        self
    }

    /// Send time
    #[must_use]
    pub fn send_time(mut self, send_time: Timestamp) -> Self {
        self.send_time = send_time;
        self
    }

    /// Append a message payload
    #[must_use]
    pub fn message(mut self, payload: Vec<u8>) -> Self {
        self.messages.push(payload);
        self
    }

    /// Write `count` in the header instead of the real message count
    #[must_use]
    pub fn count_override(mut self, count: u16) -> Self {
        self.count_override = Some(count);
        self
    }

    /// Write `length` in the header instead of the real payload length
    #[must_use]
    pub fn length_override(mut self, length: u16) -> Self {
        self.length_override = Some(length);
        self
    }

    /// Payload bytes the messages occupy, prefixes included
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.messages
            .iter()
            .map(|m| MESSAGE_LENGTH_PREFIX + m.len())
            .sum()
    }

    /// Number of messages added so far
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Encode the datagram
    pub fn build(&self) -> FeedResult<Vec<u8>> {
        let payload_len = self.payload_len();
        if payload_len > MAX_SEGMENT_PAYLOAD {
            return Err(FeedError::PayloadTooLarge {
                size: payload_len,
                max: MAX_SEGMENT_PAYLOAD,
            });
        }
        let count = u16::try_from(self.messages.len()).map_err(|_| {
            FeedError::InvalidHeader(format!("{} messages in one segment", self.messages.len()))
        })?;
        // payload_len bounds every message length too
        let length = u16::try_from(payload_len).unwrap_or(u16::MAX);

        let mut w = WireWriter::with_capacity(SegmentHeader::SIZE + payload_len);
        w.put_u8(self.version)
            .put_u8(0)
            .put_u16(self.protocol)
            .put_u32(self.channel)
            .put_u32(self.session)
            .put_u16(self.length_override.unwrap_or(length))
            .put_u16(self.count_override.unwrap_or(count))
            .put_i64(self.offset)
            .put_i64(self.first_seq)
            .put_i64(self.send_time.as_nanos());

        for m in &self.messages {
            w.put_u16(u16::try_from(m.len()).unwrap_or(u16::MAX))
                .put_bytes(m);
        }
        Ok(w.into_inner())
    }
}
