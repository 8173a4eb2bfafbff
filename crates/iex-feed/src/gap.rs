//! Per-conversation continuity tracking.
//!
//! A conversation is one (channel, session) pair. For each conversation the
//! tracker remembers where the previous segment ended, in stream bytes and in
//! message sequence numbers, and reports how much is missing before the
//! current one. Overlaps and retransmissions are not gaps.

use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Anomaly;
use crate::messages::SegmentHeader;

/// Identity of one independent message stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    /// Channel id
    pub channel: u32,
    /// Session id
    pub session: u32,
}

impl ConversationKey {
    /// Create a key
    #[inline]
    #[must_use]
    pub const fn new(channel: u32, session: u32) -> Self {
        Self { channel, session }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.session)
    }
}

/// What was seen last for a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Stream offset of the previous segment
    pub last_offset: i64,
    /// Payload length of the previous segment
    pub last_length: u16,
    /// First sequence number of the previous segment
    pub last_first_seq: i64,
    /// Last sequence number of the previous segment (`first + count - 1`)
    pub last_last_seq: i64,
}

impl ConversationState {
    /// State after observing `header`
    #[must_use]
    pub const fn from_header(header: &SegmentHeader) -> Self {
        Self {
            last_offset: header.offset,
            last_length: header.length,
            last_first_seq: header.first_seq,
            last_last_seq: header.last_seq(),
        }
    }

    /// Offset the next segment is expected at
    #[inline]
    #[must_use]
    pub const fn expected_offset(&self) -> i64 {
        self.last_offset.saturating_add(self.last_length as i64)
    }

    /// Sequence number the next segment is expected to start at
    #[inline]
    #[must_use]
    pub const fn expected_seq(&self) -> i64 {
        self.last_last_seq.saturating_add(1)
    }

    /// Gaps between this (previous) state and `next`
    #[must_use]
    pub fn gap_to(&self, next: &Self) -> GapReport {
        GapReport {
            byte_gap: positive(next.last_offset.saturating_sub(self.expected_offset())),
            message_gap: positive(next.last_first_seq.saturating_sub(self.expected_seq())),
            first_observation: false,
        }
    }
}

fn positive(delta: i64) -> u64 {
    u64::try_from(delta).unwrap_or(0)
}

/// Continuity of one segment relative to its predecessor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    /// Stream bytes missing before this segment
    pub byte_gap: u64,
    /// Messages missing before this segment
    pub message_gap: u64,
    /// First segment seen for the conversation
    pub first_observation: bool,
}

impl GapReport {
    /// Report for the first segment of a conversation
    #[must_use]
    pub const fn first() -> Self {
        Self {
            byte_gap: 0,
            message_gap: 0,
            first_observation: true,
        }
    }

    /// Whether anything is missing
    #[inline]
    #[must_use]
    pub const fn has_gap(&self) -> bool {
        self.byte_gap > 0 || self.message_gap > 0
    }

    /// Gap anomalies, bytes first
    #[must_use]
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut out = Vec::new();
        if self.byte_gap > 0 {
            out.push(Anomaly::ByteGapDetected {
                bytes: self.byte_gap,
            });
        }
        if self.message_gap > 0 {
            out.push(Anomaly::MessageGapDetected {
                messages: self.message_gap,
            });
        }
        out
    }
}

fn report(previous: Option<ConversationState>, current: &ConversationState) -> GapReport {
    previous.map_or_else(GapReport::first, |prev| prev.gap_to(current))
}

/// Single-owner gap tracker.
///
/// Holds one entry per conversation for the lifetime of the tracker.
#[derive(Debug, Default, Clone)]
pub struct GapTracker {
    states: HashMap<ConversationKey, ConversationState>,
}

impl GapTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a segment and report its gaps against the previous one
    pub fn observe(
        &mut self,
        key: ConversationKey,
        offset: i64,
        length: u16,
        first_seq: i64,
        last_seq: i64,
    ) -> GapReport {
        let current = ConversationState {
            last_offset: offset,
            last_length: length,
            last_first_seq: first_seq,
            last_last_seq: last_seq,
        };
        report(self.states.insert(key, current), &current)
    }

    /// Record a segment header
    pub fn observe_header(&mut self, header: &SegmentHeader) -> GapReport {
        let current = ConversationState::from_header(header);
        report(self.states.insert(header.key(), current), &current)
    }

    /// Last state recorded for `key`
    #[must_use]
    pub fn state(&self, key: ConversationKey) -> Option<ConversationState> {
        self.states.get(&key).copied()
    }

    /// Number of conversations seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no conversation has been seen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget all conversations
    pub fn reset(&mut self) {
        self.states.clear();
    }
}

/// Gap tracker that can be shared between decoding threads.
///
/// The swap of a conversation's state happens under its shard lock, so two
/// threads observing the same key never both see the same predecessor.
#[derive(Debug, Default)]
pub struct ConcurrentGapTracker {
    states: DashMap<ConversationKey, ConversationState>,
}

impl ConcurrentGapTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a segment header
    pub fn observe_header(&self, header: &SegmentHeader) -> GapReport {
        let current = ConversationState::from_header(header);
        report(self.states.insert(header.key(), current), &current)
    }

    /// Last state recorded for `key`
    #[must_use]
    pub fn state(&self, key: ConversationKey) -> Option<ConversationState> {
        self.states.get(&key).map(|entry| *entry.value())
    }

    /// Number of conversations seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no conversation has been seen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget all conversations
    pub fn reset(&self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const KEY: ConversationKey = ConversationKey::new(1, 42);

    #[test]
    fn test_first_observation_reports_nothing() {
        let mut tracker = GapTracker::new();
        let r = tracker.observe(KEY, 5_000, 100, 900, 904);
        assert!(r.first_observation);
        assert!(!r.has_gap());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_contiguous_segments() {
        let mut tracker = GapTracker::new();
        tracker.observe(KEY, 0, 100, 1, 3);
        let r = tracker.observe(KEY, 100, 50, 4, 5);
        assert_eq!(r, GapReport::default());
        assert!(r.anomalies().is_empty());
    }

    #[test]
    fn test_byte_gap_is_exact() {
        for k in [1i64, 7, 4096] {
            let mut tracker = GapTracker::new();
            tracker.observe(KEY, 0, 100, 1, 3);
            let r = tracker.observe(KEY, 100 + k, 50, 4, 5);
            assert_eq!(r.byte_gap, k as u64);
            assert_eq!(r.message_gap, 0);
        }
    }

    #[test]
    fn test_message_gap() {
        let mut tracker = GapTracker::new();
        tracker.observe(KEY, 0, 100, 1, 3);
        let r = tracker.observe(KEY, 100, 50, 10, 12);
        assert_eq!(r.message_gap, 6);
        assert_eq!(
            r.anomalies(),
            vec![Anomaly::MessageGapDetected { messages: 6 }]
        );
    }

    #[test]
    fn test_overlap_is_not_a_gap() {
        let mut tracker = GapTracker::new();
        tracker.observe(KEY, 1_000, 100, 50, 60);
        let r = tracker.observe(KEY, 900, 100, 40, 49);
        assert!(!r.has_gap());
        assert_eq!(tracker.state(KEY).map(|s| s.last_offset), Some(900));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = GapTracker::new();
        tracker.observe(KEY, 0, 10, 1, 1);
        let r = tracker.observe(ConversationKey::new(1, 43), 500, 10, 99, 99);
        assert!(r.first_observation);
        assert_eq!(tracker.len(), 2);
        tracker.reset();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_heartbeat_keeps_expectations() {
        let mut tracker = GapTracker::new();
        tracker.observe(KEY, 0, 100, 1, 3);
        // heartbeat: no payload, last = first - 1
        let r = tracker.observe(KEY, 100, 0, 4, 3);
        assert!(!r.has_gap());
        let r = tracker.observe(KEY, 100, 20, 4, 4);
        assert!(!r.has_gap());
    }

    #[test]
    fn test_concurrent_tracker_keeps_keys_apart() {
        let tracker = Arc::new(ConcurrentGapTracker::new());
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let mut gaps = 0;
                    for i in 0..250i64 {
                        let header = SegmentHeader {
                            version: 1,
                            protocol: 0x8001,
                            channel: 1,
                            session: t,
                            length: 10,
                            count: 1,
                            offset: i * 10,
                            first_seq: i + 1,
                            send_time: iex_core::Timestamp::EPOCH,
                        };
                        if tracker.observe_header(&header).has_gap() {
                            gaps += 1;
                        }
                    }
                    gaps
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 0);
        }
        assert_eq!(tracker.len(), 4);
        let last = tracker.state(ConversationKey::new(1, 0)).unwrap();
        assert_eq!(last.expected_offset(), 2_500);
        assert_eq!(last.expected_seq(), 251);
    }

    #[test]
    fn test_concurrent_tracker_serialises_same_key() {
        let tracker = Arc::new(ConcurrentGapTracker::new());
        let handles: Vec<_> = (0..8i64)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let mut first = 0;
                    for i in 0..500i64 {
                        let n = t * 500 + i;
                        let header = SegmentHeader {
                            version: 1,
                            protocol: 0x8001,
                            channel: KEY.channel,
                            session: KEY.session,
                            length: 10,
                            count: 1,
                            offset: n * 10,
                            first_seq: n + 1,
                            send_time: iex_core::Timestamp::EPOCH,
                        };
                        if tracker.observe_header(&header).first_observation {
                            first += 1;
                        }
                    }
                    first
                })
            })
            .collect();

        let first: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(first, 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.state(KEY).is_some());
    }
}
