//! Parser owning configuration, accumulator and tokenizer together

use super::accumulator::LineAccumulator;
use super::tokenizer::Tokenizer;
use crate::config::Value;
use crate::encoding::Transcoder;
use crate::error::{CsvError, Result};
use crate::options::{ParserConfig, ParserOptions};

/// Name of the computed, read-only property exposing the buffered record
const BUFFER_PROPERTY: &str = "buffer";

/// CSV parser for reading CSV data one physical line at a time
///
/// # Examples
///
/// ```
/// use csvstream::CsvParser;
///
/// let mut parser = CsvParser::new();
/// let mut rows = Vec::new();
///
/// for line in ["1,Tanaka\r\n", "2,\"Yamada\r\n", "\"\r\n", "\r\n"] {
///     if !parser.parse(line).unwrap() {
///         continue;
///     }
///     let record = parser.take_buffer();
///     if let Some(row) = parser.convert_bytes(&record) {
///         rows.push(row);
///     }
/// }
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1][1], b"Yamada\r\n");
/// ```
#[derive(Debug, Clone)]
pub struct CsvParser {
    config: ParserConfig,
    accumulator: LineAccumulator,
    tokenizer: Tokenizer,
}

impl Default for CsvParser {
    fn default() -> Self {
        let config = ParserConfig::default();
        Self {
            tokenizer: Tokenizer::new(&config),
            accumulator: LineAccumulator::from_defaults(&config),
            config,
        }
    }
}

impl CsvParser {
    /// Create a parser with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from defaults overridden by `(name, value)` pairs
    pub fn with_config<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self::from_config(ParserConfig::from_pairs(pairs)?)
    }

    /// Create a parser from a validated configuration
    pub fn from_config(config: ParserConfig) -> Result<Self> {
        Self::with_transcoder(config, Transcoder::default())
    }

    /// Create a parser from plain options
    pub fn from_options(options: ParserOptions) -> Result<Self> {
        Self::from_config(ParserConfig::try_from(options)?)
    }

    /// Create a parser using a custom transcoder
    pub fn with_transcoder(config: ParserConfig, transcoder: Transcoder) -> Result<Self> {
        Ok(Self {
            accumulator: LineAccumulator::with_transcoder(&config, transcoder)?,
            tokenizer: Tokenizer::new(&config),
            config,
        })
    }

    /// Reset every option to its default, apply `pairs` and empty the buffer
    ///
    /// Nothing changes when one of the pairs is rejected.
    pub fn initialize<I, K, V>(&mut self, pairs: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let config = ParserConfig::from_pairs(pairs)?;
        self.apply(config)?;
        self.accumulator.clear();
        Ok(self)
    }

    /// The active configuration
    pub fn configuration(&self) -> &ParserConfig {
        &self.config
    }

    /// The accumulator stage
    pub fn accumulator(&self) -> &LineAccumulator {
        &self.accumulator
    }

    /// The tokenizer stage
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Read an option by name
    pub fn config(&self, name: &str) -> Result<Value> {
        self.config.get(name)
    }

    /// Validate and write an option by name
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::CsvParser;
    ///
    /// let mut parser = CsvParser::new();
    /// parser.set_config("delimiter", "\t").unwrap().set_config("escape", "\\").unwrap();
    /// assert_eq!(
    ///     parser.convert("1\t\"a\\\"b\""),
    ///     Some(vec!["1".to_string(), "a\"b".to_string()])
    /// );
    /// assert!(parser.set_config("delimiter", ";;").is_err());
    /// ```
    pub fn set_config(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let mut config = self.config.clone();
        config.set(name, value)?;
        self.apply(config)?;
        Ok(self)
    }

    /// Change the delimiter
    pub fn set_delimiter(&mut self, delimiter: char) -> &mut Self {
        self.config.set_delimiter(delimiter);
        self.tokenizer = Tokenizer::new(&self.config);
        self
    }

    /// Change the enclosure; the buffered content is kept
    pub fn set_enclosure(&mut self, enclosure: char) -> &mut Self {
        self.config.set_enclosure(enclosure);
        self.accumulator.set_enclosure(enclosure);
        self.tokenizer = Tokenizer::new(&self.config);
        self
    }

    /// Change the escape character
    pub fn set_escape(&mut self, escape: char) -> &mut Self {
        self.config.set_escape(escape);
        self.tokenizer = Tokenizer::new(&self.config);
        self
    }

    /// Read an option or the computed `buffer` property
    ///
    /// Reading `buffer` does not drain it.
    pub fn property(&self, name: &str) -> Result<Value> {
        if name == BUFFER_PROPERTY {
            return Ok(Value::Bytes(self.accumulator.buffer().to_vec()));
        }
        self.config.get(name)
    }

    /// Whether the property exists and holds a value
    pub fn has_property(&self, name: &str) -> bool {
        name == BUFFER_PROPERTY || self.config.has(name)
    }

    /// Write an option through the property interface
    ///
    /// The computed `buffer` property is read only.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        if name == BUFFER_PROPERTY {
            return Err(CsvError::ReadOnly(name.to_string()));
        }
        self.set_config(name, value)
    }

    /// Feed one physical line; `true` means a complete record is buffered
    pub fn parse(&mut self, line: impl AsRef<[u8]>) -> Result<bool> {
        self.accumulator.accumulate(line)
    }

    /// Return the buffered record and empty the buffer
    pub fn take_buffer(&mut self) -> Vec<u8> {
        self.accumulator.drain()
    }

    /// Return the buffered record as text and empty the buffer
    pub fn take_buffer_utf8(&mut self) -> Result<String> {
        self.accumulator.drain_utf8()
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.accumulator.clear();
    }

    /// Split a record into fields; `None` for a blank record
    pub fn convert(&self, record: &str) -> Option<Vec<String>> {
        self.tokenizer.tokenize(record)
    }

    /// Split a record in a non-UTF-8 output encoding into byte fields
    pub fn convert_bytes(&self, record: &[u8]) -> Option<Vec<Vec<u8>>> {
        self.tokenizer.tokenize_bytes(record)
    }

    fn apply(&mut self, config: ParserConfig) -> Result<()> {
        self.accumulator.reconfigure(&config)?;
        self.tokenizer = Tokenizer::new(&config);
        self.config = config;
        Ok(())
    }
}
