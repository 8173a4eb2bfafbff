//! Text and JSON rendering of decoded segments.

use std::fmt::Write as _;

use iex_feed::error::Anomaly;
use iex_feed::messages::{DecodedSegment, MessageBody, MessageOutcome};
use iex_feed::quote::QuoteMessage;
use iex_feed::registry::DecodedMessage;

/// One-line summary of a segment.
///
/// `Protocol: NAME (id): Channel: c, Session: s, ...` followed by the
/// heartbeat's next expected byte and message, or the byte and message
/// ranges the segment carries.
#[must_use]
pub fn summary_line(segment: &DecodedSegment) -> String {
    let h = &segment.header;
    let name = segment.protocol_name.as_deref().unwrap_or("Unknown");
    let mut out = format!(
        "Protocol: {name} ({}): Channel: {}, Session: {}",
        h.protocol, h.channel, h.session
    );

    match (h.byte_range(), h.message_range()) {
        (None, _) => {
            let _ = write!(
                out,
                ", Heartbeat, Next byte: {}, Next message: {}",
                h.offset, h.first_seq
            );
        }
        (Some(bytes), Some(msgs)) if msgs.start() != msgs.end() => {
            let _ = write!(
                out,
                ", Bytes: {} - {}, Messages: {} - {}",
                bytes.start(),
                bytes.end(),
                msgs.start(),
                msgs.end()
            );
        }
        (Some(bytes), _) => {
            let _ = write!(
                out,
                ", Bytes: {} - {}, Message: {}",
                bytes.start(),
                bytes.end(),
                h.first_seq
            );
        }
    }
    out
}

/// Quote in a single line
#[must_use]
pub fn quote_line(q: &QuoteMessage) -> String {
    let mut flags = Vec::new();
    if q.flags.halted() {
        flags.push("halted");
    }
    if q.flags.extended_hours_eligible() {
        flags.push("pre/post");
    }
    let kind = q.kind().map_or("Unknown", |k| k.name());
    format!(
        "{kind} {} {} @ {} x {} @ {} [{}] {}",
        q.symbol.trimmed(),
        q.bid_size,
        q.bid_price,
        q.ask_price,
        q.ask_size,
        flags.join(","),
        q.timestamp
    )
}

fn message_line(m: &MessageOutcome) -> String {
    let body = match &m.body {
        MessageBody::Decoded(DecodedMessage::Quote(q)) => quote_line(q),
        MessageBody::Decoded(DecodedMessage::Record(r)) => r.to_string(),
        MessageBody::Opaque(bytes) => format!("opaque {}", hex::encode(bytes)),
        MessageBody::Failed(err) => format!("error: {err}"),
    };
    format!("  #{} seq {} len {}: {body}", m.index, m.sequence, m.length)
}

fn anomaly_line(a: &Anomaly) -> String {
    format!("  [{:?}] {}: {a}", a.severity(), a.name())
}

/// Summary line followed by one line per message, anomaly and framing error
#[must_use]
pub fn detail_lines(segment: &DecodedSegment) -> Vec<String> {
    let mut lines = vec![summary_line(segment)];
    lines.extend(segment.messages.iter().map(message_line));
    lines.extend(segment.anomalies.iter().map(anomaly_line));
    if let Some(err) = &segment.error {
        lines.push(format!("  [Error] {err}"));
    }
    lines
}

/// Segment as a single-line JSON object
pub fn json_line(segment: &DecodedSegment) -> serde_json::Result<String> {
    serde_json::to_string(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iex_core::types::{Price, Quantity, Symbol, Timestamp};
    use iex_feed::builder::SegmentBuilder;
    use iex_feed::gap::GapTracker;
    use iex_feed::parser::SegmentDecoder;
    use iex_feed::quote::QuoteFlags;
    use iex_feed::registry::Record;

    fn create_test_quote() -> QuoteMessage {
        QuoteMessage {
            message_type: 0x51,
            flags: QuoteFlags::new(true, false),
            timestamp: Timestamp::from_nanos(1_500_000_000_123_456_789),
            symbol: Symbol::new("AAPL").unwrap(),
            bid_size: Quantity::new(100),
            bid_price: Price::from_raw(1_502_500),
            ask_price: Price::from_raw(1_502_600),
            ask_size: Quantity::new(200),
        }
    }

    fn decode(builder: SegmentBuilder) -> DecodedSegment {
        let mut tracker = GapTracker::new();
        SegmentDecoder::with_defaults()
            .decode(&mut tracker, &builder.build().unwrap())
            .unwrap()
    }

    #[test]
    fn test_heartbeat_summary() {
        let seg = decode(SegmentBuilder::heartbeat(0x8001, 1, 2, 500, 9));
        assert_eq!(
            summary_line(&seg),
            "Protocol: IEX-TOPS (32769): Channel: 1, Session: 2, Heartbeat, Next byte: 500, Next message: 9"
        );
    }

    #[test]
    fn test_single_message_summary() {
        let q = create_test_quote();
        let seg = decode(SegmentBuilder::new(0x8001, 1, 2).offset(100).first_seq(7).message(q.encode()));
        assert_eq!(
            summary_line(&seg),
            "Protocol: IEX-TOPS (32769): Channel: 1, Session: 2, Bytes: 100 - 143, Message: 7"
        );
    }

    #[test]
    fn test_unknown_protocol_summary() {
        let seg = decode(
            SegmentBuilder::new(5, 1, 2)
                .message(vec![1, 2])
                .message(vec![3]),
        );
        assert_eq!(
            summary_line(&seg),
            "Protocol: Unknown (5): Channel: 1, Session: 2, Bytes: 0 - 6, Messages: 1 - 2"
        );
        let lines = detail_lines(&seg);
        assert_eq!(lines[1], "  #0 seq 1 len 2: opaque 0102");
        assert_eq!(lines[3], "  [Note] unrecognized_protocol: No decoder for protocol 0x0005");
    }

    #[test]
    fn test_record_message_line() {
        let outcome = MessageOutcome {
            index: 2,
            sequence: 12,
            length: 2,
            body: MessageBody::Decoded(DecodedMessage::Record(
                Record::new("SystemEvent").field("code", 'O'),
            )),
        };
        assert_eq!(message_line(&outcome), "  #2 seq 12 len 2: SystemEvent code=O");
    }

    #[test]
    fn test_quote_line() {
        assert_eq!(
            quote_line(&create_test_quote()),
            "Quote AAPL 100 @ 150.2500 x 150.2600 @ 200 [halted] 2017-07-14 02:40:00.123456789 UTC"
        );
    }

    #[test]
    fn test_json_line() {
        let seg = decode(SegmentBuilder::new(0x8001, 1, 2).message(create_test_quote().encode()));
        let json = json_line(&seg).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["header"]["channel"], 1);
        assert_eq!(value["protocol_name"], "IEX-TOPS");
        assert_eq!(value["messages"].as_array().map(Vec::len), Some(1));
    }
}
