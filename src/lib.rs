//! # csvstream
//!
//! Streaming, encoding-aware CSV parsing.
//!
//! Input arrives one physical line at a time. A [`LineAccumulator`] buffers
//! lines until the enclosure characters balance, optionally stripping control
//! characters, erasing a byte order mark and transcoding between character
//! encodings. A [`Tokenizer`] then splits the completed record into fields
//! using a configurable delimiter, enclosure and escape character.
//!
//! ## Features
//!
//! - Records spanning several physical lines
//! - Any single character as delimiter, enclosure or escape, multibyte included
//! - Input encoding auto-detection via [`encoding_rs`]
//! - Control character sanitizing and BOM erasure
//! - Validated, name-addressable configuration
//!
//! ## Quick Start
//!
//! ```
//! use csvstream::CsvParser;
//!
//! let mut parser = CsvParser::new();
//! assert!(!parser.parse("1,\"Tanaka\r\n").unwrap());
//! assert!(parser.parse("Taro\",30\r\n").unwrap());
//!
//! let record = parser.take_buffer_utf8().unwrap();
//! assert_eq!(
//!     parser.convert(&record),
//!     Some(vec!["1".to_string(), "Tanaka\r\nTaro".to_string(), "30".to_string()])
//! );
//! ```
//!
//! ## Reading files
//!
//! ```no_run
//! use csvstream::{CsvReader, ParserConfig};
//!
//! let mut config = ParserConfig::default();
//! config.set_input_encoding(Some("SJIS")).unwrap();
//! config.set_output_encoding(Some("UTF-8")).unwrap();
//!
//! let mut reader = CsvReader::open("users.csv").unwrap().with_config(config).unwrap();
//! for record in reader.records() {
//!     println!("{:?}", record.unwrap());
//! }
//! ```

pub mod config;
pub mod csv;
pub mod csv_reader;
pub mod encoding;
pub mod error;
pub mod options;

pub use config::{Configuration, Value};
pub use csv::{CsvEncoder, CsvParser, LineAccumulator, Tokenizer};
pub use csv_reader::CsvReader;
pub use encoding::{CandidateDetector, EncodingDetector, SourceEncoding, Transcoder};
pub use error::{CsvError, Result};
pub use options::{ParserConfig, ParserOption, ParserOptions};
