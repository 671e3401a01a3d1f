//! Splitting a complete logical record into fields
//!
//! A record is split into tokens, each followed by one delimiter (the end of
//! the record counts as a final delimiter). A token is either
//!
//! - an *enclosed* token: enclosure, any text where every enclosure is preceded
//!   by the escape character, closing enclosure; or
//! - a *bare* token: everything up to the next delimiter.
//!
//! The enclosed form wins whenever some closing enclosure is directly followed
//! by a delimiter. Tokens that start and end with the enclosure lose that outer
//! pair, and every escape + enclosure pair collapses into a single enclosure.
//! An enclosure that never closes is kept as a literal character.

use super::needle::Needle;
use crate::options::ParserConfig;
use std::ops::Range;

/// Per-field scanning state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// At the first byte of a field
    Start,
    /// Inside an enclosure, looking for the closing one
    QuotedOpen,
    /// Bare text running to the next delimiter
    Unquoted,
    /// Closing enclosure found, delimiter follows at `end`
    FieldEnd { end: usize },
}

/// Splits logical records into fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    delimiter: Needle,
    enclosure: Needle,
    escape: Needle,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::with_chars(',', '"', '"')
    }
}

impl Tokenizer {
    /// Create a tokenizer for the configuration's delimiter, enclosure and escape
    pub fn new(config: &ParserConfig) -> Self {
        Self::with_chars(config.delimiter(), config.enclosure(), config.escape())
    }

    /// Create a tokenizer from explicit characters
    pub fn with_chars(delimiter: char, enclosure: char, escape: char) -> Self {
        Self {
            delimiter: Needle::new(delimiter),
            enclosure: Needle::new(enclosure),
            escape: Needle::new(escape),
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter.as_char()
    }

    pub fn enclosure(&self) -> char {
        self.enclosure.as_char()
    }

    pub fn escape(&self) -> char {
        self.escape.as_char()
    }

    /// Split a UTF-8 record into fields
    ///
    /// Returns `None` when the record is empty once one trailing line
    /// terminator is removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::default();
    /// assert_eq!(
    ///     tokenizer.tokenize("1,\"Tanaka,\"\r\n"),
    ///     Some(vec!["1".to_string(), "Tanaka,".to_string()])
    /// );
    /// assert_eq!(tokenizer.tokenize("\r\n"), None);
    /// ```
    pub fn tokenize(&self, record: &str) -> Option<Vec<String>> {
        let spans = self.split(record.as_bytes())?;
        // every span starts and ends next to a whole character, so slicing
        // stays on char boundaries
        let pair = self.escaped_enclosure();
        let enclosure = self.enclosure.as_char().to_string();
        Some(
            spans
                .into_iter()
                .map(|span| record[span].replace(&pair, &enclosure))
                .collect(),
        )
    }

    /// Split a record in any ASCII-compatible encoding into raw byte fields
    pub fn tokenize_bytes(&self, record: &[u8]) -> Option<Vec<Vec<u8>>> {
        let spans = self.split(record)?;
        Some(
            spans
                .into_iter()
                .map(|span| self.unescape(&record[span]))
                .collect(),
        )
    }

    /// Tokenize many drained records in parallel
    #[cfg(feature = "parallel")]
    pub fn tokenize_all<S>(&self, records: &[S]) -> Vec<Option<Vec<String>>>
    where
        S: AsRef<str> + Sync,
    {
        use rayon::prelude::*;

        records
            .par_iter()
            .map(|record| self.tokenize(record.as_ref()))
            .collect()
    }

    fn escaped_enclosure(&self) -> String {
        let mut pair = String::with_capacity(8);
        pair.push(self.escape.as_char());
        pair.push(self.enclosure.as_char());
        pair
    }

    fn unescape(&self, field: &[u8]) -> Vec<u8> {
        let escape = self.escape.as_bytes();
        let enclosure = self.enclosure.as_bytes();
        let mut out = Vec::with_capacity(field.len());
        let mut pos = 0;
        while pos < field.len() {
            if self.escape.is_at(field, pos) && self.enclosure.is_at(field, pos + escape.len()) {
                out.extend_from_slice(enclosure);
                pos += escape.len() + enclosure.len();
            } else {
                out.push(field[pos]);
                pos += 1;
            }
        }
        out
    }

    /// Byte ranges of each field's content, outer enclosures already removed
    fn split(&self, record: &[u8]) -> Option<Vec<Range<usize>>> {
        let record = strip_terminator(record);
        if record.is_empty() {
            return None;
        }

        let mut spans = Vec::new();
        let mut pos = 0;
        loop {
            let (token, end) = self.next_token(record, pos);
            spans.push(self.trim_enclosure(record, token));
            if end >= record.len() {
                break;
            }
            pos = end + self.delimiter.len();
        }
        Some(spans)
    }

    /// Scan one token starting at `start`; returns its range and the offset of
    /// the delimiter (or end of record) following it
    fn next_token(&self, record: &[u8], start: usize) -> (Range<usize>, usize) {
        let mut state = FieldState::Start;
        loop {
            match state {
                FieldState::Start => {
                    state = if self.enclosure.is_at(record, start) {
                        FieldState::QuotedOpen
                    } else {
                        FieldState::Unquoted
                    };
                }
                FieldState::QuotedOpen => match self.closing_enclosure(record, start) {
                    Some(close) => {
                        state = FieldState::FieldEnd {
                            end: close + self.enclosure.len(),
                        };
                    }
                    // never closed: the enclosure is an ordinary character
                    None => state = FieldState::Unquoted,
                },
                FieldState::Unquoted => {
                    let end = self.delimiter.find(record, start).unwrap_or(record.len());
                    return (start..end, end);
                }
                FieldState::FieldEnd { end } => return (start..end, end),
            }
        }
    }

    fn delimiter_or_end(&self, record: &[u8], pos: usize) -> bool {
        pos == record.len() || self.delimiter.is_at(record, pos)
    }

    /// Find the enclosure closing the one at `open`
    ///
    /// Candidates are the enclosures inside the token that are not part of an
    /// escape pair; the chosen one must be followed by a delimiter.
    fn closing_enclosure(&self, record: &[u8], open: usize) -> Option<usize> {
        let enclosure_len = self.enclosure.len();
        let mut run_start = open + enclosure_len;

        if self.escape == self.enclosure {
            // doubled enclosures: follow the chain of pairs, then prefer the
            // furthest single enclosure that a delimiter follows
            let mut candidates = Vec::new();
            let mut close = self.enclosure.find(record, run_start)?;
            loop {
                candidates.push(close);
                if !self.enclosure.is_at(record, close + enclosure_len) {
                    break;
                }
                run_start = close + 2 * enclosure_len;
                match self.enclosure.find(record, run_start) {
                    Some(next) => close = next,
                    None => break,
                }
            }
            return candidates
                .into_iter()
                .rev()
                .find(|&close| self.delimiter_or_end(record, close + enclosure_len));
        }

        // distinct escape: the nearest enclosure that a delimiter follows wins,
        // an escaped one lets the scan continue past it
        let escape_len = self.escape.len();
        loop {
            let close = self.enclosure.find(record, run_start)?;
            if self.delimiter_or_end(record, close + enclosure_len) {
                return Some(close);
            }
            let escaped = close >= run_start + escape_len
                && self.escape.is_at(record, close - escape_len);
            if !escaped {
                return None;
            }
            run_start = close + enclosure_len;
        }
    }

    /// Drop the outer enclosure pair of a token that starts and ends with one
    fn trim_enclosure(&self, record: &[u8], token: Range<usize>) -> Range<usize> {
        let len = self.enclosure.len();
        let slice = &record[token.clone()];
        if slice.len() >= 2 * len
            && slice.starts_with(self.enclosure.as_bytes())
            && slice.ends_with(self.enclosure.as_bytes())
        {
            token.start + len..token.end - len
        } else {
            token
        }
    }
}

/// Remove one trailing CRLF, CR or LF
fn strip_terminator(record: &[u8]) -> &[u8] {
    record
        .strip_suffix(b"\r\n")
        .or_else(|| record.strip_suffix(b"\n"))
        .or_else(|| record.strip_suffix(b"\r"))
        .unwrap_or(record)
}
