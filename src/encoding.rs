//! Encoding lookup, byte-order-marks and transcoding
//!
//! Labels are resolved with `encoding_rs` (WHATWG labels, case-insensitive)
//! plus a handful of vendor names commonly found in Japanese CSV exports such
//! as `SJIS-win` and `eucJP-win`. `utf-16` without an endianness suffix means
//! big-endian here, the way most CSV producers write it.

use crate::error::{CsvError, Result};
use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// UTF-8 byte-order-mark
pub const BOM_UTF8: &[u8] = b"\xEF\xBB\xBF";
/// UTF-16 little-endian byte-order-mark
pub const BOM_UTF16LE: &[u8] = b"\xFF\xFE";
/// UTF-16 big-endian byte-order-mark
pub const BOM_UTF16BE: &[u8] = b"\xFE\xFF";

/// Vendor labels missing from the WHATWG label table
const ALIASES: &[(&str, &Encoding)] = &[
    ("utf-16", UTF_16BE),
    ("sjis-win", SHIFT_JIS),
    ("sjis-open", SHIFT_JIS),
    ("cp932", SHIFT_JIS),
    ("eucjp-win", EUC_JP),
    ("eucjp-ms", EUC_JP),
    ("cp51932", EUC_JP),
    ("jis", ISO_2022_JP),
];

/// Resolve an encoding label
pub fn lookup(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase();
    if let Some((_, encoding)) = ALIASES.iter().find(|(alias, _)| *alias == normalized) {
        return Ok(*encoding);
    }
    match Encoding::for_label_no_replacement(normalized.as_bytes()) {
        Some(encoding) => Ok(encoding),
        None => Err(CsvError::UnknownEncoding(label.to_string())),
    }
}

/// Byte-order-marks that may lead a line declared in `label`
///
/// UTF-16 labels accept either byte order since files in the wild often carry
/// a mark that disagrees with the declared endianness.
pub fn boms_for(label: &str) -> &'static [&'static [u8]] {
    match lookup(label) {
        Ok(encoding) if encoding == UTF_8 => &[BOM_UTF8],
        Ok(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => &[BOM_UTF16LE, BOM_UTF16BE],
        _ => &[],
    }
}

/// Whether records in `encoding` can be scanned byte-wise for ASCII
/// delimiters, enclosures and line breaks
///
/// False for UTF-16 and ISO-2022-JP, whose code units or escape-shifted
/// sequences contain bytes that look like ASCII punctuation.
pub fn is_byte_scannable(encoding: &'static Encoding) -> bool {
    encoding.is_ascii_compatible()
}

/// Two-byte line feed of a UTF-16 encoding, in stream byte order
pub fn utf16_newline(encoding: &'static Encoding) -> Option<[u8; 2]> {
    if encoding == UTF_16LE {
        Some([b'\n', 0])
    } else if encoding == UTF_16BE {
        Some([0, b'\n'])
    } else {
        None
    }
}

/// Strategy guessing the encoding of a line when none is declared
pub trait EncodingDetector: fmt::Debug + Send + Sync {
    /// Return the encoding `bytes` are most likely in, if any
    fn detect(&self, bytes: &[u8]) -> Option<&'static Encoding>;

    /// Encodings this detector may return, in preference order
    fn candidates(&self) -> &[&'static Encoding];
}

/// Detector that picks the first candidate decoding the input without errors
#[derive(Debug, Clone)]
pub struct CandidateDetector {
    candidates: Vec<&'static Encoding>,
}

impl Default for CandidateDetector {
    fn default() -> Self {
        Self {
            candidates: vec![ISO_2022_JP, UTF_8, EUC_JP, SHIFT_JIS],
        }
    }
}

impl CandidateDetector {
    /// Create a detector with an explicit candidate list
    pub fn new(candidates: Vec<&'static Encoding>) -> Self {
        Self { candidates }
    }

    /// Create a detector from encoding labels
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let candidates = labels
            .iter()
            .map(|label| lookup(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { candidates })
    }
}

impl EncodingDetector for CandidateDetector {
    fn detect(&self, bytes: &[u8]) -> Option<&'static Encoding> {
        self.candidates.iter().copied().find(|encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .is_some()
        })
    }

    fn candidates(&self) -> &[&'static Encoding] {
        &self.candidates
    }
}

/// Where the transcoder takes the source encoding from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Declared encoding
    Explicit(&'static Encoding),
    /// Ask the detector
    Auto,
}

/// Converts byte strings between encodings
#[derive(Debug, Clone)]
pub struct Transcoder {
    detector: Arc<dyn EncodingDetector>,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new(CandidateDetector::default())
    }
}

impl Transcoder {
    /// Create a transcoder using `detector` for [`SourceEncoding::Auto`]
    pub fn new(detector: impl EncodingDetector + 'static) -> Self {
        Self {
            detector: Arc::new(detector),
        }
    }

    /// The auto-detection strategy
    pub fn detector(&self) -> &dyn EncodingDetector {
        self.detector.as_ref()
    }

    /// Decode `bytes` from `source` and encode the text into `target`
    pub fn transcode(
        &self,
        bytes: &[u8],
        source: SourceEncoding,
        target: &'static Encoding,
    ) -> Result<Vec<u8>> {
        let source = match source {
            SourceEncoding::Explicit(encoding) => encoding,
            SourceEncoding::Auto => {
                let detected = self.detector.detect(bytes).ok_or_else(|| {
                    CsvError::Undetectable {
                        tried: self
                            .detector
                            .candidates()
                            .iter()
                            .map(|e| e.name())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }
                })?;
                trace!(encoding = detected.name(), "detected line encoding");
                detected
            }
        };
        let text = decode(bytes, source)?;
        encode(text, target)
    }
}

fn decode<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Result<Cow<'a, str>> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| CsvError::MalformedInput {
            encoding: encoding.name().to_string(),
        })
}

fn encode(text: Cow<'_, str>, encoding: &'static Encoding) -> Result<Vec<u8>> {
    // encoding_rs substitutes UTF-8 for encodings it cannot produce
    if encoding.output_encoding() != encoding {
        return Err(CsvError::UnsupportedOutput {
            encoding: encoding.name().to_string(),
        });
    }
    if encoding == UTF_8 {
        return Ok(text.into_owned().into_bytes());
    }
    let (bytes, _, unmappable) = encoding.encode(&text);
    if unmappable {
        return Err(CsvError::Unmappable {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(bytes.into_owned())
}
