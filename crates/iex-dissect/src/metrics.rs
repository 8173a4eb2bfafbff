//! Prometheus counters for a decoding run.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

use iex_feed::error::{Anomaly, Severity};
use iex_feed::messages::{DecodedSegment, MessageBody};

/// Metrics registry for the dissector
#[derive(Debug)]
pub struct MetricsRegistry {
    registry: Registry,
    /// Datagrams read
    pub datagrams_total: Counter,
    /// Segments decoded
    pub segments_total: Counter,
    /// Heartbeat segments
    pub heartbeats_total: Counter,
    /// Embedded messages walked
    pub messages_total: Counter,
    /// Quotes decoded
    pub quotes_total: Counter,
    /// Datagrams that failed to decode
    pub decode_errors_total: Counter,
    /// Segments cut short by a truncated message
    pub truncated_segments_total: Counter,
    /// Messages a decoder rejected
    pub rejected_messages_total: Counter,
    /// Stream bytes reported missing
    pub gap_bytes_total: Counter,
    /// Messages reported missing
    pub gap_messages_total: Counter,
    /// Anomalies at warning severity or above
    pub warnings_total: Counter,
    /// Datagram sizes in bytes
    pub datagram_bytes: Histogram,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a new metrics registry
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let mut counter = |name: &str, help: &str| {
            let c = Counter::default();
            registry.register(name, help, c.clone());
            c
        };

        let datagrams_total = counter("iex_datagrams", "Datagrams read");
        let segments_total = counter("iex_segments", "Segments decoded");
        let heartbeats_total = counter("iex_heartbeats", "Heartbeat segments");
        let messages_total = counter("iex_messages", "Embedded messages walked");
        let quotes_total = counter("iex_quotes", "Quote messages decoded");
        let decode_errors_total = counter("iex_decode_errors", "Datagrams that failed to decode");
        let truncated_segments_total =
            counter("iex_truncated_segments", "Segments cut short by a truncated message");
        let rejected_messages_total =
            counter("iex_rejected_messages", "Messages rejected by their decoder");
        let gap_bytes_total = counter("iex_gap_bytes", "Stream bytes reported missing");
        let gap_messages_total = counter("iex_gap_messages", "Messages reported missing");
        let warnings_total = counter("iex_warnings", "Anomalies at warning severity or above");

        // 64 bytes to 32 KiB
        let datagram_bytes = Histogram::new(exponential_buckets(64.0, 2.0, 10));
        registry.register(
            "iex_datagram_bytes",
            "Datagram size in bytes",
            datagram_bytes.clone(),
        );

        Self {
            registry,
            datagrams_total,
            segments_total,
            heartbeats_total,
            messages_total,
            quotes_total,
            decode_errors_total,
            truncated_segments_total,
            rejected_messages_total,
            gap_bytes_total,
            gap_messages_total,
            warnings_total,
            datagram_bytes,
        }
    }

    /// Record a datagram as read
    pub fn record_datagram(&self, len: usize) {
        self.datagrams_total.inc();
        #[allow(clippy::cast_precision_loss)]
        let len = len as f64;
        self.datagram_bytes.observe(len);
    }

    /// Record a decoded segment
    pub fn record_segment(&self, segment: &DecodedSegment) {
        self.segments_total.inc();
        if segment.is_heartbeat() {
            self.heartbeats_total.inc();
        }
        if !segment.is_complete() {
            self.truncated_segments_total.inc();
        }
        self.messages_total.inc_by(segment.messages.len() as u64);
        self.quotes_total.inc_by(segment.quotes().count() as u64);
        let rejected = segment
            .messages
            .iter()
            .filter(|m| matches!(m.body, MessageBody::Failed(_)))
            .count();
        self.rejected_messages_total.inc_by(rejected as u64);

        for anomaly in &segment.anomalies {
            match anomaly {
                Anomaly::ByteGapDetected { bytes } => {
                    self.gap_bytes_total.inc_by(*bytes);
                }
                Anomaly::MessageGapDetected { messages } => {
                    self.gap_messages_total.inc_by(*messages);
                }
                _ => {}
            }
            if anomaly.severity() >= Severity::Warning {
                self.warnings_total.inc();
            }
        }
    }

    /// Record a datagram that failed to decode
    pub fn record_error(&self) {
        self.decode_errors_total.inc();
    }

    /// Encode metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }

    /// Get registry reference
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iex_feed::builder::SegmentBuilder;
    use iex_feed::gap::GapTracker;
    use iex_feed::parser::SegmentDecoder;

    #[test]
    fn test_record_segments() {
        let metrics = MetricsRegistry::new();
        let decoder = SegmentDecoder::with_defaults();
        let mut tracker = GapTracker::new();

        for datagram in [
            SegmentBuilder::new(9, 1, 1).message(vec![1; 8]).build().unwrap(),
            SegmentBuilder::heartbeat(9, 1, 1, 50, 4).build().unwrap(),
        ] {
            metrics.record_datagram(datagram.len());
            let seg = decoder.decode(&mut tracker, &datagram).unwrap();
            metrics.record_segment(&seg);
        }
        metrics.record_error();

        assert_eq!(metrics.datagrams_total.get(), 2);
        assert_eq!(metrics.segments_total.get(), 2);
        assert_eq!(metrics.heartbeats_total.get(), 1);
        assert_eq!(metrics.messages_total.get(), 1);
        assert_eq!(metrics.gap_bytes_total.get(), 40);
        assert_eq!(metrics.gap_messages_total.get(), 2);
        assert_eq!(metrics.decode_errors_total.get(), 1);

        let output = metrics.encode().unwrap();
        assert!(output.contains("iex_segments_total 2"));
        assert!(output.contains("iex_datagram_bytes_bucket"));
    }
}
