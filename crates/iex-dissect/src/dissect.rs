//! Decode loop shared by file, stdin and synthetic input.

use std::io::Write;
use std::sync::Arc;

use iex_feed::gap::GapTracker;
use iex_feed::parser::SegmentDecoder;
use iex_feed::registry::SubProtocolRegistry;
use serde::Serialize;

use crate::config::AppConfig;
use crate::metrics::MetricsRegistry;
use crate::render;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One summary line per segment
    Summary,
    /// Summary plus one line per message and anomaly
    Detail,
    /// One JSON object per segment
    Json,
}

impl OutputFormat {
    /// Format selected by the configuration
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        if config.json {
            OutputFormat::Json
        } else if config.detail {
            OutputFormat::Detail
        } else {
            OutputFormat::Summary
        }
    }
}

#[derive(Serialize)]
struct DecodeFailure<'a> {
    line: usize,
    error: &'a str,
}

/// Decodes a stream of datagrams and writes one record per datagram
pub struct Dissector<W> {
    decoder: SegmentDecoder,
    tracker: GapTracker,
    metrics: MetricsRegistry,
    format: OutputFormat,
    out: W,
}

impl<W: Write> Dissector<W> {
    /// Create a dissector writing to `out`
    pub fn new(config: &AppConfig, out: W) -> Self {
        let decoder = SegmentDecoder::new(
            Arc::new(SubProtocolRegistry::with_defaults()),
            config.decoder,
        );
        Self {
            decoder,
            tracker: GapTracker::new(),
            metrics: MetricsRegistry::new(),
            format: OutputFormat::from_config(config),
            out,
        }
    }

    /// Decode one datagram; `line` identifies it in error reports
    pub fn process(&mut self, line: usize, datagram: &[u8]) -> anyhow::Result<()> {
        self.metrics.record_datagram(datagram.len());

        let segment = match self.decoder.decode(&mut self.tracker, datagram) {
            Ok(segment) => segment,
            Err(err) => {
                self.metrics.record_error();
                tracing::warn!(line, error = %err, "datagram not decoded");
                let message = err.to_string();
                match self.format {
                    OutputFormat::Json => {
                        let failure = DecodeFailure {
                            line,
                            error: &message,
                        };
                        writeln!(self.out, "{}", serde_json::to_string(&failure)?)?;
                    }
                    _ => writeln!(self.out, "line {line}: {message}")?,
                }
                return Ok(());
            }
        };

        self.metrics.record_segment(&segment);
        match self.format {
            OutputFormat::Summary => writeln!(self.out, "{}", render::summary_line(&segment))?,
            OutputFormat::Detail => {
                for l in render::detail_lines(&segment) {
                    writeln!(self.out, "{l}")?;
                }
            }
            OutputFormat::Json => writeln!(self.out, "{}", render::json_line(&segment)?)?,
        }
        Ok(())
    }

    /// Run metrics
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Conversations seen so far
    pub fn conversations(&self) -> usize {
        self.tracker.len()
    }

    /// Flush and return the writer
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
