//! Transport segment parser using nom.

use std::sync::Arc;

use iex_core::types::Timestamp;
use nom::{
    bytes::complete::take,
    number::complete::{le_i64, le_u16, le_u32, le_u8},
    IResult,
};

use crate::config::DecoderConfig;
use crate::error::{Anomaly, FeedError, FeedResult};
use crate::gap::{ConcurrentGapTracker, GapReport, GapTracker};
use crate::messages::{
    DecodedSegment, EmbeddedMessage, MessageBody, MessageOutcome, RawSegment, SegmentHeader,
    SegmentKind,
};
use crate::registry::{MessageDecoder, SubProtocolRegistry};
use crate::sniffer;

/// Parse the header of `buf` without touching any conversation state.
///
/// The returned segment borrows `buf`; walk it with [`RawSegment::messages`].
pub fn parse_segment(buf: &[u8]) -> FeedResult<RawSegment<'_>> {
    if buf.len() < SegmentHeader::SIZE {
        return Err(FeedError::TruncatedHeader {
            needed: SegmentHeader::SIZE,
            actual: buf.len(),
        });
    }
    let (_, header) = parse_header(buf)?;
    header.validate()?;
    Ok(RawSegment::new(header, buf))
}

/// Decodes datagrams into [`DecodedSegment`]s.
///
/// Stateless apart from the gap tracker the caller passes in, so one decoder
/// can serve any number of streams and threads.
#[derive(Debug, Clone)]
pub struct SegmentDecoder {
    registry: Arc<SubProtocolRegistry>,
    config: DecoderConfig,
}

impl Default for SegmentDecoder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SegmentDecoder {
    /// Create a decoder over `registry`
    #[must_use]
    pub fn new(registry: Arc<SubProtocolRegistry>, config: DecoderConfig) -> Self {
        Self { registry, config }
    }

    /// Decoder with the default registry and configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(SubProtocolRegistry::with_defaults()),
            DecoderConfig::default(),
        )
    }

    /// Registry used for message dispatch
    #[must_use]
    pub fn registry(&self) -> &SubProtocolRegistry {
        &self.registry
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one datagram, updating `tracker`
    pub fn decode(&self, tracker: &mut GapTracker, buf: &[u8]) -> FeedResult<DecodedSegment> {
        self.decode_with(buf, |header| tracker.observe_header(header))
    }

    /// Decode one datagram against a tracker shared between threads
    pub fn decode_shared(
        &self,
        tracker: &ConcurrentGapTracker,
        buf: &[u8],
    ) -> FeedResult<DecodedSegment> {
        self.decode_with(buf, |header| tracker.observe_header(header))
    }

    /// Decode only if the sniffer accepts the datagram; `Ok(None)` otherwise
    pub fn sniff_and_decode(
        &self,
        tracker: &mut GapTracker,
        buf: &[u8],
    ) -> FeedResult<Option<DecodedSegment>> {
        if sniffer::sniff(buf).is_err() {
            return Ok(None);
        }
        self.decode(tracker, buf).map(Some)
    }

    fn decode_with<F>(&self, buf: &[u8], observe: F) -> FeedResult<DecodedSegment>
    where
        F: FnOnce(&SegmentHeader) -> GapReport,
    {
        if self.config.require_sniff {
            sniffer::sniff(buf)?;
        }
        let raw = parse_segment(buf)?;
        let header = raw.header;
        let gap = observe(&header);

        let mut anomalies = Vec::new();
        if self.config.report_gaps && gap.has_gap() {
            tracing::warn!(
                channel = header.channel,
                session = header.session,
                byte_gap = gap.byte_gap,
                message_gap = gap.message_gap,
                "gap detected"
            );
            anomalies.extend(gap.anomalies());
        }

        let decoder = self.registry.lookup(header.protocol);
        let mut segment = DecodedSegment {
            header,
            kind: SegmentKind::Data,
            protocol_name: decoder.map(|d| d.name().to_string()),
            gap,
            messages: Vec::with_capacity(usize::from(header.count)),
            anomalies,
            error: None,
        };

        if header.is_heartbeat() {
            tracing::debug!(
                channel = header.channel,
                session = header.session,
                next_offset = header.offset,
                next_seq = header.first_seq,
                "heartbeat"
            );
            segment.kind = SegmentKind::Heartbeat;
            segment.anomalies.push(Anomaly::Heartbeat);
            return Ok(segment);
        }

        if decoder.is_none() {
            segment.anomalies.push(Anomaly::UnrecognizedProtocol {
                protocol: header.protocol,
            });
        }

        for entry in raw.messages() {
            match entry {
                Ok(message) => {
                    let outcome = self.dispatch(decoder, &message, &mut segment.anomalies);
                    segment.messages.push(outcome);
                }
                Err(err) => {
                    tracing::warn!(
                        channel = header.channel,
                        session = header.session,
                        error = %err,
                        "segment cut short"
                    );
                    segment.error = Some(err);
                }
            }
        }

        Ok(segment)
    }

    fn dispatch(
        &self,
        decoder: Option<&dyn MessageDecoder>,
        message: &EmbeddedMessage<'_>,
        anomalies: &mut Vec<Anomaly>,
    ) -> MessageOutcome {
        let body = match decoder {
            Some(decoder) => match decoder.decode(message.payload) {
                Ok(decoded) => {
                    anomalies.extend(decoded.anomalies(self.config.validate_quotes));
                    MessageBody::Decoded(decoded)
                }
                Err(err) => {
                    tracing::debug!(
                        decoder = decoder.name(),
                        index = message.index,
                        error = %err,
                        "message rejected"
                    );
                    MessageBody::Failed(err)
                }
            },
            None => MessageBody::Opaque(message.payload.to_vec()),
        };
        tracing::trace!(index = message.index, len = message.len(), "dispatched");

        MessageOutcome {
            index: message.index,
            sequence: message.sequence,
            length: u16::try_from(message.len()).unwrap_or(u16::MAX),
            body,
        }
    }
}

// Internal parsing functions using nom

/// nom parser for the fixed header; fields follow [`crate::wire::segment_offsets`]
pub(crate) fn parse_header(input: &[u8]) -> IResult<&[u8], SegmentHeader> {
    let (input, version) = le_u8(input)?;
    let (input, _reserved) = take(1usize)(input)?;
    let (input, protocol) = le_u16(input)?;
    let (input, channel) = le_u32(input)?;
    let (input, session) = le_u32(input)?;
    let (input, length) = le_u16(input)?;
    let (input, count) = le_u16(input)?;
    let (input, offset) = le_i64(input)?;
    let (input, first_seq) = le_i64(input)?;
    let (input, send_time) = le_i64(input)?;

    Ok((
        input,
        SegmentHeader {
            version,
            protocol,
            channel,
            session,
            length,
            count,
            offset,
            first_seq,
            send_time: Timestamp::from_nanos(send_time),
        },
    ))
}
