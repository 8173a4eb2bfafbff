//! Constants shared by the transport and quote decoders.

/// Nanoseconds per millisecond
pub const NS_PER_MS: u64 = 1_000_000;

/// Nanoseconds per second
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Wire price scale: one currency unit is 10,000 price units
pub const PRICE_SCALE: i64 = 10_000;

/// Number of fractional digits carried by [`PRICE_SCALE`]
pub const PRICE_DECIMALS: usize = 4;

/// Width of the fixed symbol field in bytes
pub const SYMBOL_LEN: usize = 8;

/// Only transport version understood by the decoder
pub const TRANSPORT_VERSION: u8 = 1;

/// Transport segment header size in bytes
pub const SEGMENT_HEADER_SIZE: usize = 40;

/// Size of the length prefix in front of every embedded message
pub const MESSAGE_LENGTH_PREFIX: usize = 2;

/// Quote message size in bytes
pub const QUOTE_MESSAGE_SIZE: usize = 42;

/// Protocol id the quote decoder registers under (0x8001)
pub const QUOTE_PROTOCOL_ID: u16 = 0x8001;

/// Largest payload a segment can declare
pub const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize;
