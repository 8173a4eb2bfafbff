//! Hex-encoded datagram input, one datagram per line.
//!
//! Blank lines and lines starting with `#` are skipped. Whitespace and `:`
//! separators inside a line are ignored, as is a leading `0x`.

use std::io::BufRead;

use anyhow::Context;

/// A datagram read from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// One-based input line number
    pub line: usize,
    /// Decoded bytes
    pub bytes: Vec<u8>,
}

/// Decode one input line; `Ok(None)` for blank and comment lines
pub fn parse_hex_line(line: &str) -> anyhow::Result<Option<Vec<u8>>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let bytes = hex::decode(&digits).context("invalid hex datagram")?;
    Ok(Some(bytes))
}

/// Iterator over the datagrams of a line-oriented hex input
pub struct HexLines<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> HexLines<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for HexLines<R> {
    type Item = anyhow::Result<Datagram>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(err) => return Some(Err(err.into())),
            }
            match parse_hex_line(&self.buf) {
                Ok(Some(bytes)) => {
                    return Some(Ok(Datagram {
                        line: self.line,
                        bytes,
                    }))
                }
                Ok(None) => continue,
                Err(err) => return Some(Err(err.context(format!("line {}", self.line)))),
            }
        }
    }
}
