//! Reassembling logical records from physical lines

use super::needle::Needle;
use crate::encoding::{self, SourceEncoding, Transcoder};
use crate::error::{CsvError, Result};
use crate::options::ParserConfig;
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use tracing::{debug, trace};

/// What happens to a line between sanitizing and buffering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    None,
    Transcode {
        source: SourceEncoding,
        target: &'static Encoding,
    },
}

/// Buffers physical lines until the enclosures in them balance
///
/// # Examples
///
/// ```
/// use csvstream::{LineAccumulator, ParserConfig, Tokenizer};
///
/// let config = ParserConfig::default();
/// let mut accumulator = LineAccumulator::new(&config).unwrap();
/// let tokenizer = Tokenizer::new(&config);
///
/// assert!(!accumulator.accumulate("1,\"Tanaka\r\n").unwrap());
/// assert!(accumulator.accumulate("\"\r\n").unwrap());
///
/// let record = accumulator.drain_utf8().unwrap();
/// assert_eq!(
///     tokenizer.tokenize(&record),
///     Some(vec!["1".to_string(), "Tanaka\r\n".to_string()])
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LineAccumulator {
    buffer: Vec<u8>,
    enclosure: Needle,
    sanitizing: bool,
    boms: &'static [&'static [u8]],
    conversion: Conversion,
    transcoder: Transcoder,
}

impl LineAccumulator {
    /// Create an accumulator for `config` with the default transcoder
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Self::with_transcoder(config, Transcoder::default())
    }

    /// Create an accumulator using a custom transcoder (e.g. another detector)
    pub fn with_transcoder(config: &ParserConfig, transcoder: Transcoder) -> Result<Self> {
        let mut accumulator = Self {
            buffer: Vec::with_capacity(1024),
            enclosure: Needle::new(config.enclosure()),
            sanitizing: false,
            boms: &[],
            conversion: Conversion::None,
            transcoder,
        };
        accumulator.reconfigure(config)?;
        Ok(accumulator)
    }

    /// Accumulator for a configuration without transcoding or BOM erasure
    pub(crate) fn from_defaults(config: &ParserConfig) -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
            enclosure: Needle::new(config.enclosure()),
            sanitizing: config.sanitizing(),
            boms: &[],
            conversion: Conversion::None,
            transcoder: Transcoder::default(),
        }
    }

    /// Re-derive settings from `config`, keeping the buffered content
    pub fn reconfigure(&mut self, config: &ParserConfig) -> Result<()> {
        let conversion = match (config.input_encoding(), config.output_encoding()) {
            (None, None) => Conversion::None,
            (Some(input), None) => {
                // the buffer must stay byte-scannable, so such input lands as UTF-8
                let source = encoding::lookup(input)?;
                if encoding::is_byte_scannable(source) {
                    Conversion::None
                } else {
                    Conversion::Transcode {
                        source: SourceEncoding::Explicit(source),
                        target: UTF_8,
                    }
                }
            }
            (None, Some(output)) => Conversion::Transcode {
                source: SourceEncoding::Auto,
                target: encoding::lookup(output)?,
            },
            (Some(input), Some(output)) if input == output => Conversion::None,
            (Some(input), Some(output)) => Conversion::Transcode {
                source: SourceEncoding::Explicit(encoding::lookup(input)?),
                target: encoding::lookup(output)?,
            },
        };
        let boms: &'static [&'static [u8]] = match config.input_encoding() {
            Some(label) if config.erase_bom() => encoding::boms_for(label),
            _ => &[],
        };

        self.enclosure = Needle::new(config.enclosure());
        self.sanitizing = config.sanitizing();
        self.boms = boms;
        self.conversion = conversion;
        Ok(())
    }

    /// Switch the character counted for balance
    pub(crate) fn set_enclosure(&mut self, enclosure: char) {
        self.enclosure = Needle::new(enclosure);
    }

    /// Append one physical line; returns `true` once the record is complete
    ///
    /// On a transcoding error the buffer is left as it was. With `erase_bom`,
    /// any UTF-16 input label strips either byte-order-mark, whatever its
    /// declared endianness.
    pub fn accumulate(&mut self, line: impl AsRef<[u8]>) -> Result<bool> {
        let mut line = Cow::Borrowed(line.as_ref());

        if self.sanitizing && line.iter().any(|&b| is_control(b) || b == 0xC2) {
            line = Cow::Owned(sanitize(&line));
        }

        if self.buffer.is_empty() {
            if let Some(bom) = self.boms.iter().find(|bom| line.starts_with(bom)) {
                debug!(len = bom.len(), "erased byte-order-mark");
                line = match line {
                    Cow::Borrowed(bytes) => Cow::Borrowed(&bytes[bom.len()..]),
                    Cow::Owned(mut bytes) => {
                        bytes.drain(..bom.len());
                        Cow::Owned(bytes)
                    }
                };
            }
        }

        if let Conversion::Transcode { source, target } = self.conversion {
            trace!(encoding = target.name(), "transcoding line");
            line = Cow::Owned(self.transcoder.transcode(&line, source, target)?);
        }

        self.buffer.extend_from_slice(&line);
        Ok(self.is_balanced())
    }

    /// Whether the buffered text holds an even number of enclosures
    pub fn is_balanced(&self) -> bool {
        self.enclosure.count(&self.buffer) % 2 == 0
    }

    /// Take the buffered record, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Take the buffered record as text
    ///
    /// Fails without touching the buffer when it is not valid UTF-8 (for
    /// example when the output encoding is not UTF-8).
    pub fn drain_utf8(&mut self) -> Result<String> {
        String::from_utf8(self.drain()).map_err(|e| {
            self.buffer = e.into_bytes();
            CsvError::MalformedInput {
                encoding: "UTF-8".to_string(),
            }
        })
    }

    /// Discard the buffered content
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// The buffered content, without draining it
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// C0 controls other than HT, LF and CR, plus DEL
fn is_control(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x7F)
}

/// Remove control codes; C1 controls are matched in their UTF-8 form
fn sanitize(line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    let mut pos = 0;
    while pos < line.len() {
        let byte = line[pos];
        if byte == 0xC2 && matches!(line.get(pos + 1), Some(0x80..=0x9F)) {
            pos += 2;
            continue;
        }
        if !is_control(byte) {
            out.push(byte);
        }
        pos += 1;
    }
    out
}
