//! Decoder configuration.

use serde::{Deserialize, Serialize};

/// Segment decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Check quote flags, timestamp and sides and report inconsistencies
    pub validate_quotes: bool,
    /// Attach gap anomalies to decoded segments
    pub report_gaps: bool,
    /// Reject datagrams the sniffer does not recognise
    pub require_sniff: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            validate_quotes: true,
            report_gaps: true,
            require_sniff: false,
        }
    }
}

impl DecoderConfig {
    /// Decode unconditionally and report only unknown types and gaps
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            validate_quotes: false,
            ..Default::default()
        }
    }

    /// Require the sniffer to accept every datagram
    #[must_use]
    pub fn strict() -> Self {
        Self {
            require_sniff: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert!(config.validate_quotes);
        assert!(config.report_gaps);
        assert!(!config.require_sniff);
        assert!(!DecoderConfig::permissive().validate_quotes);
        assert!(DecoderConfig::strict().require_sniff);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DecoderConfig = serde_json::from_str(r#"{"report_gaps": false}"#).unwrap();
        assert!(!config.report_gaps);
        assert!(config.validate_quotes);
    }
}
