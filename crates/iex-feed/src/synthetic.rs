//! Synthetic quote feed generation for testing and development.

use iex_core::constants::{
    MAX_SEGMENT_PAYLOAD, MESSAGE_LENGTH_PREFIX, QUOTE_MESSAGE_SIZE, QUOTE_PROTOCOL_ID,
};
use iex_core::types::{Price, Quantity, Symbol, Timestamp};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::builder::SegmentBuilder;
use crate::error::{FeedError, FeedResult};
use crate::quote::{MessageType, QuoteFlags, QuoteMessage};

/// Configuration for synthetic feed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Symbols to quote
    pub symbols: Vec<String>,
    /// Channel id written into every segment
    pub channel: u32,
    /// Session id written into every segment
    pub session: u32,
    /// Initial mid price (raw, scaled by 10,000)
    pub initial_mid: i64,
    /// Tick size (raw)
    pub tick_size: i64,
    /// Spread in ticks
    pub spread_ticks: u32,
    /// Average displayed size
    pub avg_quantity: u32,
    /// Mid move per quote, in ticks
    pub volatility: f64,
    /// Largest number of quotes packed into one segment
    pub max_quotes_per_segment: u16,
    /// Probability that a segment is a heartbeat
    pub heartbeat_rate: f64,
    /// Probability that a segment is generated but not delivered
    pub drop_rate: f64,
    /// Start time (nanoseconds since epoch)
    pub start_time_ns: i64,
    /// Average time between quotes (nanoseconds)
    pub avg_event_interval_ns: i64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["ZIEXT".to_string(), "AAPL".to_string(), "MSFT".to_string()],
            channel: 1,
            session: 0x4400_0001,
            initial_mid: 1_500_000, // 150.0000
            tick_size: 100,         // 0.0100
            spread_ticks: 2,
            avg_quantity: 200,
            volatility: 0.5,
            max_quotes_per_segment: 4,
            heartbeat_rate: 0.05,
            drop_rate: 0.0,
            start_time_ns: 1_700_000_000_000_000_000,
            avg_event_interval_ns: 50_000,
        }
    }
}

impl SyntheticConfig {
    /// Lossy feed that drops a share of its segments
    #[must_use]
    pub fn lossy(drop_rate: f64) -> Self {
        Self {
            drop_rate,
            ..Default::default()
        }
    }

    /// Check that every value can drive the generator
    pub fn validate(&self) -> FeedResult<()> {
        let invalid = |msg: String| -> FeedResult<()> { Err(FeedError::InvalidConfig(msg)) };
        let max_quotes = MAX_SEGMENT_PAYLOAD / (MESSAGE_LENGTH_PREFIX + QUOTE_MESSAGE_SIZE);

        if !(0.0..=1.0).contains(&self.heartbeat_rate) {
            return invalid(format!("heartbeat_rate {} not in [0, 1]", self.heartbeat_rate));
        }
        if !(0.0..1.0).contains(&self.drop_rate) {
            return invalid(format!("drop_rate {} not in [0, 1)", self.drop_rate));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return invalid(format!("volatility {} must be finite and >= 0", self.volatility));
        }
        if self.initial_mid <= 0 || self.tick_size <= 0 {
            return invalid(format!(
                "initial_mid {} and tick_size {} must be positive",
                self.initial_mid, self.tick_size
            ));
        }
        if self.avg_quantity == 0 || self.avg_quantity > u32::MAX / 2 {
            return invalid(format!(
                "avg_quantity {} not in [1, {}]",
                self.avg_quantity,
                u32::MAX / 2
            ));
        }
        if self.max_quotes_per_segment == 0
            || usize::from(self.max_quotes_per_segment) > max_quotes
        {
            return invalid(format!(
                "max_quotes_per_segment {} not in [1, {max_quotes}]",
                self.max_quotes_per_segment
            ));
        }
        if self.avg_event_interval_ns <= 0 || self.avg_event_interval_ns > i64::MAX / 2 {
            return invalid(format!(
                "avg_event_interval_ns {} out of range",
                self.avg_event_interval_ns
            ));
        }
        if self.start_time_ns < 0 {
            return invalid(format!("start_time_ns {} before epoch", self.start_time_ns));
        }
        Ok(())
    }
}

/// Synthetic generator of quote segment datagrams.
///
/// Keeps the stream offset and sequence number advancing across every
/// generated segment, delivered or dropped, so drops show up as gaps.
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    rng: StdRng,
    books: Vec<(Symbol, i64)>,
    current_time: i64,
    offset: i64,
    next_seq: i64,
    dropped: usize,
}

impl SyntheticGenerator {
    /// Create a new generator with the given config
    pub fn new(config: SyntheticConfig) -> FeedResult<Self> {
        Self::with_seed(config, 42)
    }

    /// Create a new generator with a specific seed.
    ///
    /// Fails with [`FeedError::InvalidConfig`] when a value is out of range.
    pub fn with_seed(config: SyntheticConfig, seed: u64) -> FeedResult<Self> {
        config.validate()?;

        let mut books: Vec<(Symbol, i64)> = config
            .symbols
            .iter()
            .filter_map(|s| match Symbol::new(s) {
                Ok(sym) => Some((sym, config.initial_mid)),
                Err(err) => {
                    tracing::warn!(symbol = %s, error = %err, "skipping symbol");
                    None
                }
            })
            .collect();
        if books.is_empty() {
            books.push((Symbol::default(), config.initial_mid));
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            books,
            current_time: config.start_time_ns,
            offset: 0,
            next_seq: 1,
            dropped: 0,
            config,
        })
    }

    /// Generate the next quote for a random symbol
    pub fn next_quote(&mut self) -> QuoteMessage {
        let interval = self.config.avg_event_interval_ns.max(2);
        let time_dist = Uniform::new(interval / 2, interval.saturating_mul(2));
        self.current_time = self.current_time.saturating_add(time_dist.sample(&mut self.rng));

        let idx = self.rng.gen_range(0..self.books.len());
        let price_change: f64 = self.rng.gen::<f64>() * 2.0 - 1.0;
        #[allow(clippy::cast_possible_truncation)]
        let tick_change = (price_change * self.config.volatility).round() as i64;
        let tick = self.config.tick_size.max(1);
        let half_spread = i64::from(self.config.spread_ticks.max(1)).saturating_mul(tick) / 2;

        let (symbol, mid) = &mut self.books[idx];
        *mid = mid
            .saturating_add(tick_change.saturating_mul(tick))
            .max(half_spread.saturating_add(tick));
        let (symbol, mid) = (*symbol, *mid);

        QuoteMessage {
            message_type: MessageType::Quote as u8,
            flags: QuoteFlags::new(false, false),
            timestamp: Timestamp::from_nanos(self.current_time),
            symbol,
            bid_size: Quantity::new(self.random_quantity()),
            bid_price: Price::from_raw(mid.saturating_sub(half_spread)),
            ask_price: Price::from_raw(mid.saturating_add(half_spread)),
            ask_size: Quantity::new(self.random_quantity()),
        }
    }

    fn random_quantity(&mut self) -> u32 {
        let dist = Uniform::new(1, self.config.avg_quantity.max(1).saturating_mul(2));
        dist.sample(&mut self.rng)
    }

    /// Generate one segment, advancing the stream whether or not it is dropped
    fn generate_segment(&mut self) -> FeedResult<Vec<u8>> {
        let heartbeat = self.rng.gen_bool(self.config.heartbeat_rate);
        let mut builder = SegmentBuilder::new(
            QUOTE_PROTOCOL_ID,
            self.config.channel,
            self.config.session,
        )
        .offset(self.offset)
        .first_seq(self.next_seq);

        if !heartbeat {
            let n = self.rng.gen_range(1..=self.config.max_quotes_per_segment.max(1));
            for _ in 0..n {
                builder = builder.message(self.next_quote().encode());
            }
        }

        let builder = builder.send_time(Timestamp::from_nanos(self.current_time));
        let bytes = builder.build()?;
        self.offset += i64::try_from(builder.payload_len()).unwrap_or(i64::MAX);
        self.next_seq += i64::try_from(builder.message_count()).unwrap_or(i64::MAX);
        Ok(bytes)
    }

    /// Next delivered datagram; dropped segments are skipped
    pub fn next_datagram(&mut self) -> FeedResult<Vec<u8>> {
        loop {
            let bytes = self.generate_segment()?;
            if self.rng.gen_bool(self.config.drop_rate) {
                self.dropped += 1;
                continue;
            }
            return Ok(bytes);
        }
    }

    /// Generate N delivered datagrams
    pub fn generate_n(&mut self, n: usize) -> FeedResult<Vec<Vec<u8>>> {
        (0..n).map(|_| self.next_datagram()).collect()
    }

    /// Segments generated but not delivered so far
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Stream offset of the next segment
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Sequence number of the next message
    #[must_use]
    pub fn next_seq(&self) -> i64 {
        self.next_seq
    }

    /// Current mid price of every symbol
    #[must_use]
    pub fn mids(&self) -> Vec<(Symbol, Price)> {
        self.books
            .iter()
            .map(|(s, m)| (*s, Price::from_raw(*m)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::GapTracker;
    use crate::parser::SegmentDecoder;

    #[test]
    fn test_quotes_are_consistent() {
        let mut gen = SyntheticGenerator::new(SyntheticConfig::default()).unwrap();
        for _ in 0..500 {
            let q = gen.next_quote();
            assert!(q.bid_price < q.ask_price);
            assert!(!q.bid_size.is_zero());
            assert!(q.anomalies(true).is_empty());
        }
    }

    #[test]
    fn test_lossless_feed_has_no_gaps() {
        let decoder = SegmentDecoder::with_defaults();
        let mut tracker = GapTracker::new();
        let mut gen = SyntheticGenerator::new(SyntheticConfig::default()).unwrap();

        let mut heartbeats = 0;
        for datagram in gen.generate_n(200).unwrap() {
            let seg = decoder.decode(&mut tracker, &datagram).unwrap();
            assert!(!seg.gap.has_gap());
            assert!(seg.is_complete());
            if seg.is_heartbeat() {
                heartbeats += 1;
            }
        }
        assert!(heartbeats > 0, "Should have some heartbeats");
        assert_eq!(gen.dropped(), 0);
    }

    #[test]
    fn test_dropped_segments_become_gaps() {
        let decoder = SegmentDecoder::with_defaults();
        let mut tracker = GapTracker::new();
        let mut gen = SyntheticGenerator::with_seed(SyntheticConfig::lossy(0.2), 7).unwrap();

        let mut byte_gaps = 0;
        for datagram in gen.generate_n(300).unwrap() {
            let seg = decoder.decode(&mut tracker, &datagram).unwrap();
            byte_gaps += seg.gap.byte_gap;
        }
        assert!(gen.dropped() > 0);
        assert!(byte_gaps > 0);
    }

    #[test]
    fn test_invalid_symbols_skipped() {
        let config = SyntheticConfig {
            symbols: vec!["TOOLONGSYMBOL".to_string()],
            ..Default::default()
        };
        let gen = SyntheticGenerator::new(config).unwrap();
        assert_eq!(gen.mids().len(), 1);
    }

    #[test]
    fn test_out_of_range_config_rejected() {
        let cases = [
            SyntheticConfig {
                heartbeat_rate: f64::NAN,
                ..Default::default()
            },
            SyntheticConfig::lossy(1.0),
            SyntheticConfig {
                avg_quantity: u32::MAX / 2 + 1,
                ..Default::default()
            },
            SyntheticConfig {
                volatility: f64::INFINITY,
                ..Default::default()
            },
            SyntheticConfig {
                tick_size: 0,
                ..Default::default()
            },
            SyntheticConfig {
                max_quotes_per_segment: u16::MAX,
                ..Default::default()
            },
            SyntheticConfig {
                avg_event_interval_ns: i64::MAX,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(
                    SyntheticGenerator::new(config.clone()),
                    Err(FeedError::InvalidConfig(_))
                ),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_extreme_prices_saturate() {
        let config = SyntheticConfig {
            initial_mid: i64::MAX - 1,
            tick_size: i64::MAX / 4,
            spread_ticks: u32::MAX,
            volatility: 1e12,
            avg_quantity: u32::MAX / 2,
            ..Default::default()
        };
        let mut gen = SyntheticGenerator::new(config).unwrap();
        for _ in 0..100 {
            let q = gen.next_quote();
            assert!(q.bid_price <= q.ask_price);
        }
        assert_eq!(gen.generate_n(20).unwrap().len(), 20);
    }
}
