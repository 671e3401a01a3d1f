//! Error types for csvstream

use thiserror::Error;

/// Result type alias for csvstream operations
pub type Result<T> = std::result::Result<T, CsvError>;

/// Errors raised by the configuration store, the parser options, the
/// accumulator's transcoding step and the record reader
#[derive(Error, Debug)]
pub enum CsvError {
    /// The option name is not part of the recognized option set
    #[error("The config parameter \"{0}\" is not defined")]
    UnknownOption(String),

    /// The value is of the wrong type or violates the option's rule
    #[error("The config parameter \"{name}\" {reason}")]
    InvalidOption { name: String, reason: String },

    /// The attribute was already defined in the configuration store
    #[error("The attribute \"{0}\" already exists")]
    AlreadyDefined(String),

    /// The attribute name collides with a method of the configuration store
    #[error("The attribute \"{0}\" is already defined as a method")]
    ReservedName(String),

    /// The attribute is not defined in the configuration store
    #[error("The attribute \"{0}\" does not exist")]
    Undefined(String),

    /// Attempt to write a computed property
    #[error("The property \"{0}\" is read only")]
    ReadOnly(String),

    /// The encoding label is not recognized
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// The input is not a valid byte sequence for the source encoding
    #[error("Malformed {encoding} byte sequence")]
    MalformedInput { encoding: String },

    /// The decoded text holds characters the target encoding cannot represent
    #[error("Text cannot be represented in {encoding}")]
    Unmappable { encoding: String },

    /// The encoding cannot be produced by the transcoder
    #[error("Cannot encode text into {encoding}")]
    UnsupportedOutput { encoding: String },

    /// No candidate encoding decoded the input cleanly
    #[error("Could not detect the encoding of the input (tried {tried})")]
    Undetectable { tried: String },

    /// I/O failure while reading lines
    #[error("Failed to read line: {0}")]
    Io(#[from] std::io::Error),
}

impl CsvError {
    pub(crate) fn invalid(name: &str, reason: &str) -> Self {
        CsvError::InvalidOption {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from configuration validation
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CsvError::UnknownOption(_)
                | CsvError::InvalidOption { .. }
                | CsvError::AlreadyDefined(_)
                | CsvError::ReservedName(_)
                | CsvError::Undefined(_)
        )
    }

    /// Whether this error came from the transcoding step
    pub fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            CsvError::UnknownEncoding(_)
                | CsvError::MalformedInput { .. }
                | CsvError::Unmappable { .. }
                | CsvError::UnsupportedOutput { .. }
                | CsvError::Undetectable { .. }
        )
    }
}
