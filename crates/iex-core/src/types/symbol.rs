//! Fixed-width, space-padded ticker symbol.

use std::fmt;
use std::str::FromStr;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::SYMBOL_LEN;
use crate::error::{Error, Result};

/// Eight raw bytes of the symbol field, exactly as captured.
///
/// Padding is part of the value. Use [`Symbol::trimmed`] when a display form
/// is wanted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct Symbol([u8; SYMBOL_LEN]);

impl Symbol {
    /// Wrap raw field bytes without any validation
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SYMBOL_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a symbol from text, right-padding with spaces
    pub fn new(text: &str) -> Result<Self> {
        if text.len() > SYMBOL_LEN {
            return Err(Error::InvalidSymbol(format!(
                "{text:?} is longer than {SYMBOL_LEN} bytes"
            )));
        }
        if !text.is_ascii() {
            return Err(Error::InvalidSymbol(format!("{text:?} is not ASCII")));
        }
        let mut bytes = [b' '; SYMBOL_LEN];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        Ok(Self(bytes))
    }

    /// The raw eight bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SYMBOL_LEN] {
        &self.0
    }

    /// The field as text, if every byte is ASCII
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if self.0.is_ascii() {
            std::str::from_utf8(&self.0).ok()
        } else {
            None
        }
    }

    /// Text with trailing padding (spaces and NULs) removed
    #[must_use]
    pub fn trimmed(&self) -> String {
        String::from_utf8_lossy(&self.0)
            .trim_end_matches([' ', '\0'])
            .to_string()
    }

    /// Check that every byte is printable ASCII or a space
    #[must_use]
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self([b' '; SYMBOL_LEN])
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_preserved() {
        let sym = Symbol::from_bytes(*b"AAPL    ");
        assert_eq!(sym.as_bytes(), b"AAPL    ");
        assert_eq!(sym.as_str(), Some("AAPL    "));
        assert_eq!(sym.trimmed(), "AAPL");
    }

    #[test]
    fn test_new_pads() {
        let sym = Symbol::new("IBM").unwrap();
        assert_eq!(sym.as_bytes(), b"IBM     ");
        assert_eq!(sym, "IBM".parse().unwrap());
    }

    #[test]
    fn test_new_rejects() {
        assert!(Symbol::new("TOOLONGSYM").is_err());
        assert!(Symbol::new("ÄPFEL").is_err());
    }

    #[test]
    fn test_non_ascii_bytes() {
        let sym = Symbol::from_bytes([0xff, b'A', b' ', b' ', b' ', b' ', b' ', b' ']);
        assert_eq!(sym.as_str(), None);
        assert!(!sym.is_printable());
        assert!(Symbol::default().is_printable());
    }

    #[test]
    fn test_serde_keeps_raw_bytes() {
        let sym = Symbol::from_bytes(*b"ZIEXT\0\0\0");
        let json = serde_json::to_string(&sym).unwrap();
        assert_eq!(json, "[90,73,69,88,84,0,0,0]");
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sym);
    }
}
