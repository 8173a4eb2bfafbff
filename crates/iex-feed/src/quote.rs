//! TOPS quote message: fixed 42-byte top-of-book update.

use std::fmt;

use iex_core::constants::{QUOTE_MESSAGE_SIZE, SYMBOL_LEN};
use iex_core::types::{Price, Quantity, Symbol, Timestamp};
use nom::{
    bytes::complete::take,
    number::complete::{le_i64, le_u32, le_u8},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{Anomaly, FeedError, FeedResult};
use crate::registry::{DecodedMessage, MessageDecoder};
use crate::wire::WireWriter;

/// Defined message type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Top-of-book quote update ('Q')
    Quote = 0x51,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x51 => Ok(MessageType::Quote),
            _ => Err(()),
        }
    }
}

impl MessageType {
    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MessageType::Quote => "Quote",
        }
    }
}

/// Quote flag byte.
///
/// Only bits 7 and 6 carry meaning; the other six are reserved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteFlags(u8);

impl QuoteFlags {
    /// Symbol is halted
    pub const HALTED: u8 = 0x80;
    /// Quote is valid outside regular market hours
    pub const PRE_POST_MARKET: u8 = 0x40;
    /// All defined bits
    pub const KNOWN: u8 = Self::HALTED | Self::PRE_POST_MARKET;

    /// Wrap a raw flags byte
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Build from the two defined flags
    #[must_use]
    pub const fn new(halted: bool, extended_hours_eligible: bool) -> Self {
        let mut bits = 0;
        if halted {
            bits |= Self::HALTED;
        }
        if extended_hours_eligible {
            bits |= Self::PRE_POST_MARKET;
        }
        Self(bits)
    }

    /// Raw byte
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bit 7
    #[inline]
    #[must_use]
    pub const fn halted(self) -> bool {
        self.0 & Self::HALTED != 0
    }

    /// Bit 6
    #[inline]
    #[must_use]
    pub const fn extended_hours_eligible(self) -> bool {
        self.0 & Self::PRE_POST_MARKET != 0
    }

    /// Reserved bits that are set
    #[inline]
    #[must_use]
    pub const fn reserved_bits(self) -> u8 {
        self.0 & !Self::KNOWN
    }
}

impl fmt::Debug for QuoteFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteFlags")
            .field("bits", &format_args!("{:#04x}", self.0))
            .field("halted", &self.halted())
            .field("extended_hours_eligible", &self.extended_hours_eligible())
            .finish()
    }
}

/// Decoded quote message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMessage {
    /// Message type tag as read, even when unknown
    pub message_type: u8,
    /// Flags
    pub flags: QuoteFlags,
    /// Time of the quote update
    pub timestamp: Timestamp,
    /// Symbol, padding preserved
    pub symbol: Symbol,
    /// Displayed size at the best bid
    pub bid_size: Quantity,
    /// Best bid
    pub bid_price: Price,
    /// Best offer
    pub ask_price: Price,
    /// Displayed size at the best offer
    pub ask_size: Quantity,
}

impl QuoteMessage {
    /// Wire size in bytes
    pub const SIZE: usize = QUOTE_MESSAGE_SIZE;

    /// Decode from the first 42 bytes of `input`; extra bytes are ignored
    pub fn decode(input: &[u8]) -> FeedResult<Self> {
        if input.len() < Self::SIZE {
            return Err(FeedError::TruncatedRecord {
                needed: Self::SIZE,
                actual: input.len(),
            });
        }
        let (_, quote) = parse_quote(input)?;
        Ok(quote)
    }

    /// Encode into a fresh 42-byte buffer
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(Self::SIZE);
        self.encode_into(&mut w);
        w.into_inner()
    }

    /// Append the 42-byte encoding to `w`
    pub fn encode_into(&self, w: &mut WireWriter) {
        w.put_u8(self.message_type)
            .put_u8(self.flags.bits())
            .put_i64(self.timestamp.as_nanos())
            .put_bytes(self.symbol.as_bytes())
            .put_u32(self.bid_size.value())
            .put_i64(self.bid_price.raw())
            .put_i64(self.ask_price.raw())
            .put_u32(self.ask_size.value());
    }

    /// Known message type, if the tag is defined
    #[must_use]
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::try_from(self.message_type).ok()
    }

    /// Advisory findings for this message.
    ///
    /// An unknown type tag is always reported. Field checks run only when
    /// `validate_fields` is set.
    #[must_use]
    pub fn anomalies(&self, validate_fields: bool) -> Vec<Anomaly> {
        let mut out = Vec::new();
        if self.kind().is_none() {
            out.push(Anomaly::UnknownMessageType {
                message_type: self.message_type,
            });
        }
        if !validate_fields {
            return out;
        }
        if self.flags.reserved_bits() != 0 {
            out.push(Anomaly::InvalidFlags {
                flags: self.flags.bits(),
            });
        }
        if !self.timestamp.is_valid() {
            out.push(Anomaly::InvalidTimestamp {
                nanos: self.timestamp.as_nanos(),
            });
        }
        if !side_is_consistent(self.bid_price, self.bid_size) {
            out.push(Anomaly::InvalidBid {
                price: self.bid_price.raw(),
                size: self.bid_size.value(),
            });
        }
        if !side_is_consistent(self.ask_price, self.ask_size) {
            out.push(Anomaly::InvalidAsk {
                price: self.ask_price.raw(),
                size: self.ask_size.value(),
            });
        }
        out
    }
}

/// An empty side has zero price and zero size; a populated side has both
/// non-zero. Prices are never negative.
fn side_is_consistent(price: Price, size: Quantity) -> bool {
    !price.is_negative() && price.is_zero() == size.is_zero()
}

/// Decoder registered under the quote protocol id
#[derive(Debug, Default, Clone, Copy)]
pub struct QuoteDecoder;

impl MessageDecoder for QuoteDecoder {
    fn name(&self) -> &'static str {
        "IEX-TOPS"
    }

    fn decode(&self, payload: &[u8]) -> FeedResult<DecodedMessage> {
        QuoteMessage::decode(payload).map(DecodedMessage::Quote)
    }
}

fn parse_quote(input: &[u8]) -> IResult<&[u8], QuoteMessage> {
    let (input, message_type) = le_u8(input)?;
    let (input, flags) = le_u8(input)?;
    let (input, timestamp) = le_i64(input)?;
    let (input, symbol) = take(SYMBOL_LEN)(input)?;
    let (input, bid_size) = le_u32(input)?;
    let (input, bid_price) = le_i64(input)?;
    let (input, ask_price) = le_i64(input)?;
    let (input, ask_size) = le_u32(input)?;

    let mut symbol_bytes = [0u8; SYMBOL_LEN];
    symbol_bytes.copy_from_slice(symbol);

    Ok((
        input,
        QuoteMessage {
            message_type,
            flags: QuoteFlags::from_bits(flags),
            timestamp: Timestamp::from_nanos(timestamp),
            symbol: Symbol::from_bytes(symbol_bytes),
            bid_size: Quantity::new(bid_size),
            bid_price: Price::from_raw(bid_price),
            ask_price: Price::from_raw(ask_price),
            ask_size: Quantity::new(ask_size),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Field positions within the 42-byte record
    mod quote_offsets {
        pub const MESSAGE_TYPE: usize = 0;
        pub const FLAGS: usize = 1;
        pub const TIMESTAMP: usize = 2;
        pub const BID_SIZE: usize = 18;
        pub const BID_PRICE: usize = 22;
        pub const ASK_PRICE: usize = 30;
        pub const ASK_SIZE: usize = 38;
    }

    fn create_test_quote() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(0x51); // msgtype
        buf.push(0x40); // flags: pre/post-market
        buf.extend_from_slice(&1_500_000_000_123_456_789i64.to_le_bytes());
        buf.extend_from_slice(b"AAPL    ");
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(&123_456i64.to_le_bytes());
        buf.extend_from_slice(&123_556i64.to_le_bytes());
        buf.extend_from_slice(&200u32.to_le_bytes());
        buf
    }

    #[test]
    fn test_decode_fields() {
        let data = create_test_quote();
        assert_eq!(data.len(), QuoteMessage::SIZE);

        let q = QuoteMessage::decode(&data).unwrap();
        assert_eq!(q.kind(), Some(MessageType::Quote));
        assert!(!q.flags.halted());
        assert!(q.flags.extended_hours_eligible());
        assert_eq!(q.timestamp.to_parts(), (1_500_000_000, 123_456_789));
        assert_eq!(q.symbol.as_bytes(), b"AAPL    ");
        assert_eq!(q.bid_size.value(), 100);
        assert_eq!(q.bid_price.integer_part(), 12);
        assert_eq!(q.bid_price.fractional_part(), 3456);
        assert_eq!(q.ask_price.raw(), 123_556);
        assert_eq!(q.ask_size.value(), 200);
        assert!(q.anomalies(true).is_empty());
    }

    #[test]
    fn test_decode_reads_explicit_offsets() {
        let data = create_test_quote();
        let r = crate::wire::WireReader::new(&data);
        let q = QuoteMessage::decode(&data).unwrap();
        assert_eq!(r.i64_at(quote_offsets::BID_PRICE), Some(q.bid_price.raw()));
        assert_eq!(r.u32_at(quote_offsets::ASK_SIZE), Some(q.ask_size.value()));
    }

    #[test]
    fn test_truncated_record() {
        let data = create_test_quote();
        let err = QuoteMessage::decode(&data[..41]).unwrap_err();
        assert_eq!(
            err,
            FeedError::TruncatedRecord {
                needed: 42,
                actual: 41
            }
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut data = create_test_quote();
        data.extend_from_slice(&[0xAA; 6]);
        let q = QuoteMessage::decode(&data).unwrap();
        assert_eq!(q.ask_size.value(), 200);
    }

    #[test]
    fn test_halted_flag() {
        let mut data = create_test_quote();
        data[quote_offsets::FLAGS] = 0x80;
        let q = QuoteMessage::decode(&data).unwrap();
        assert!(q.flags.halted());
        assert!(!q.flags.extended_hours_eligible());
    }

    #[test]
    fn test_unknown_type_still_decodes() {
        let mut data = create_test_quote();
        data[quote_offsets::MESSAGE_TYPE] = 0x54;
        let q = QuoteMessage::decode(&data).unwrap();
        assert_eq!(q.kind(), None);
        assert_eq!(q.symbol.as_bytes(), b"AAPL    ");
        assert_eq!(
            q.anomalies(false),
            vec![Anomaly::UnknownMessageType { message_type: 0x54 }]
        );
    }

    #[test]
    fn test_field_validation() {
        let mut data = create_test_quote();
        data[quote_offsets::FLAGS] = 0x41;
        data[quote_offsets::TIMESTAMP..quote_offsets::TIMESTAMP + 8]
            .copy_from_slice(&(-5i64).to_le_bytes());
        data[quote_offsets::BID_SIZE..quote_offsets::BID_SIZE + 4]
            .copy_from_slice(&0u32.to_le_bytes());
        data[quote_offsets::ASK_PRICE..quote_offsets::ASK_PRICE + 8]
            .copy_from_slice(&(-1i64).to_le_bytes());
        let q = QuoteMessage::decode(&data).unwrap();

        let found = q.anomalies(true);
        assert_eq!(
            found,
            vec![
                Anomaly::InvalidFlags { flags: 0x41 },
                Anomaly::InvalidTimestamp { nanos: -5 },
                Anomaly::InvalidBid {
                    price: 123_456,
                    size: 0
                },
                Anomaly::InvalidAsk {
                    price: -1,
                    size: 200
                },
            ]
        );
        assert!(q.anomalies(false).is_empty());
    }

    #[test]
    fn test_empty_side_is_valid() {
        let q = QuoteMessage {
            message_type: MessageType::Quote as u8,
            flags: QuoteFlags::default(),
            timestamp: Timestamp::from_secs(1),
            symbol: Symbol::new("ZIEXT").unwrap(),
            bid_size: Quantity::ZERO,
            bid_price: Price::ZERO,
            ask_price: Price::ZERO,
            ask_size: Quantity::ZERO,
        };
        assert!(q.anomalies(true).is_empty());
    }

    #[test]
    fn test_encode_matches_wire() {
        let data = create_test_quote();
        let q = QuoteMessage::decode(&data).unwrap();
        assert_eq!(q.encode(), data);
    }

    #[test]
    fn test_flags_new() {
        let f = QuoteFlags::new(true, true);
        assert_eq!(f.bits(), 0xC0);
        assert_eq!(f.reserved_bits(), 0);
        assert_eq!(QuoteFlags::from_bits(0xFF).reserved_bits(), 0x3F);
    }

    #[test]
    fn test_decoder_trait() {
        let data = create_test_quote();
        let decoded = QuoteDecoder.decode(&data).unwrap();
        let q = decoded.as_quote().unwrap();
        assert_eq!(q.bid_size.value(), 100);
        assert_eq!(QuoteDecoder.name(), "IEX-TOPS");
    }
}
