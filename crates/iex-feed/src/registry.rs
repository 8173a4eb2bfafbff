//! Protocol-id to decoder mapping for embedded messages.
//!
//! The segment parser knows nothing about application formats; it looks the
//! segment's protocol id up here and hands each message payload to whatever
//! decoder was registered. New formats plug in by registering a
//! [`MessageDecoder`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use iex_core::constants::QUOTE_PROTOCOL_ID;
use serde::{Deserialize, Serialize};

use crate::error::{Anomaly, FeedError, FeedResult};
use crate::quote::{QuoteDecoder, QuoteMessage};

/// Application message produced by a registered decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedMessage {
    /// TOPS quote update
    Quote(QuoteMessage),
    /// Any other format, as named fields
    Record(Record),
}

impl DecodedMessage {
    /// Advisory findings for the decoded message
    #[must_use]
    pub fn anomalies(&self, validate_fields: bool) -> Vec<Anomaly> {
        match self {
            DecodedMessage::Quote(q) => q.anomalies(validate_fields),
            DecodedMessage::Record(r) if validate_fields => r.anomalies.clone(),
            DecodedMessage::Record(_) => Vec::new(),
        }
    }

    /// The quote, if this is one
    #[must_use]
    pub fn as_quote(&self) -> Option<&QuoteMessage> {
        match self {
            DecodedMessage::Quote(q) => Some(q),
            DecodedMessage::Record(_) => None,
        }
    }

    /// The generic record, if this is one
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            DecodedMessage::Record(r) => Some(r),
            DecodedMessage::Quote(_) => None,
        }
    }
}

/// Decoded message of a format without a dedicated type.
///
/// Decoders for additional protocols return one of these, so a new format
/// needs a [`MessageDecoder`] implementation and nothing else. Fields keep
/// wire order; anomalies are the decoder's own field checks and are only
/// surfaced when field validation is on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Message kind, e.g. `SystemEvent`
    pub kind: String,
    /// Field names and rendered values
    pub fields: Vec<(String, String)>,
    /// Findings from the decoder's field checks
    pub anomalies: Vec<Anomaly>,
}

impl Record {
    /// Empty record of the given kind
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Append a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    /// Attach an anomaly
    #[must_use]
    pub fn anomaly(mut self, anomaly: Anomaly) -> Self {
        self.anomalies.push(anomaly);
        self
    }

    /// Value of the first field called `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

/// Decoder for the payload of one embedded message
pub trait MessageDecoder: Send + Sync + fmt::Debug {
    /// Short protocol name for summaries and logs
    fn name(&self) -> &'static str;

    /// Decode one message payload (length prefix already stripped)
    fn decode(&self, payload: &[u8]) -> FeedResult<DecodedMessage>;
}

/// Registry of message decoders keyed by 16-bit protocol id.
///
/// Built once by the embedding application, then shared read-only (usually
/// behind an `Arc`). Registering an id twice fails with
/// [`FeedError::DuplicateRegistration`] and keeps the first decoder.
#[derive(Debug, Default, Clone)]
pub struct SubProtocolRegistry {
    decoders: HashMap<u16, Arc<dyn MessageDecoder>>,
}

impl SubProtocolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the quote decoder under its standard protocol id
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .decoders
            .insert(QUOTE_PROTOCOL_ID, Arc::new(QuoteDecoder));
        registry
    }

    /// Register a decoder for `protocol`
    pub fn register<D>(&mut self, protocol: u16, decoder: D) -> FeedResult<()>
    where
        D: MessageDecoder + 'static,
    {
        self.register_shared(protocol, Arc::new(decoder))
    }

    /// Register an already shared decoder for `protocol`
    pub fn register_shared(
        &mut self,
        protocol: u16,
        decoder: Arc<dyn MessageDecoder>,
    ) -> FeedResult<()> {
        use std::collections::hash_map::Entry;

        match self.decoders.entry(protocol) {
            Entry::Occupied(_) => Err(FeedError::DuplicateRegistration(protocol)),
            Entry::Vacant(slot) => {
                tracing::debug!(protocol, name = decoder.name(), "registered decoder");
                slot.insert(decoder);
                Ok(())
            }
        }
    }

    /// Decoder for `protocol`, if one is registered
    #[must_use]
    pub fn lookup(&self, protocol: u16) -> Option<&dyn MessageDecoder> {
        self.decoders.get(&protocol).map(|decoder| decoder.as_ref())
    }

    /// Short name of the decoder for `protocol`
    #[must_use]
    pub fn protocol_name(&self, protocol: u16) -> Option<&'static str> {
        self.lookup(protocol).map(MessageDecoder::name)
    }

    /// Whether `protocol` has a decoder
    #[must_use]
    pub fn contains(&self, protocol: u16) -> bool {
        self.decoders.contains_key(&protocol)
    }

    /// Registered protocol ids in ascending order
    #[must_use]
    pub fn protocols(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.decoders.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered decoders
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no decoders are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}
