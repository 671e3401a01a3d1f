//! Parser options and their validation

use crate::config::{Configuration, Value};
use crate::encoding;
use crate::error::{CsvError, Result};
use std::fmt;
use std::str::FromStr;

/// The recognized parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserOption {
    /// Field separator, one character
    Delimiter,
    /// Quoting character, one character
    Enclosure,
    /// Character escaping an enclosure inside a quoted field, one character
    Escape,
    /// Encoding of the source lines
    InputEncoding,
    /// Encoding the buffered record is converted into
    OutputEncoding,
    /// Strip control codes other than CR, LF, HT and space
    Sanitizing,
    /// Strip a byte-order-mark from the first line of a record
    EraseBom,
}

impl ParserOption {
    /// Every option, in definition order
    pub const ALL: [ParserOption; 7] = [
        ParserOption::Delimiter,
        ParserOption::Enclosure,
        ParserOption::Escape,
        ParserOption::InputEncoding,
        ParserOption::OutputEncoding,
        ParserOption::Sanitizing,
        ParserOption::EraseBom,
    ];

    /// Canonical option name
    pub fn name(&self) -> &'static str {
        match self {
            ParserOption::Delimiter => "delimiter",
            ParserOption::Enclosure => "enclosure",
            ParserOption::Escape => "escape",
            ParserOption::InputEncoding => "input_encoding",
            ParserOption::OutputEncoding => "output_encoding",
            ParserOption::Sanitizing => "sanitizing",
            ParserOption::EraseBom => "erase_bom",
        }
    }

    fn default_value(&self) -> Value {
        match self {
            ParserOption::Delimiter => Value::Char(','),
            ParserOption::Enclosure | ParserOption::Escape => Value::Char('"'),
            ParserOption::InputEncoding | ParserOption::OutputEncoding => Value::Null,
            ParserOption::Sanitizing | ParserOption::EraseBom => Value::Bool(false),
        }
    }

    /// Check `value` against this option's rule and normalize it
    ///
    /// Characters come back as `Value::Char`, encodings as `Value::Str` or
    /// `Value::Null`, flags as `Value::Bool`.
    pub fn validate(&self, value: Value) -> Result<Value> {
        let name = self.name();
        match self {
            ParserOption::Delimiter | ParserOption::Enclosure | ParserOption::Escape => {
                match value {
                    Value::Char(c) => Ok(Value::Char(c)),
                    Value::Str(ref s) => value
                        .as_char()
                        .map(Value::Char)
                        .ok_or_else(|| {
                            CsvError::invalid(name, &format!("accepts one character, got {:?}", s))
                        }),
                    _ => Err(CsvError::invalid(name, "only accepts string")),
                }
            }
            ParserOption::InputEncoding | ParserOption::OutputEncoding => match value {
                Value::Null => Ok(Value::Null),
                Value::Str(label) => match encoding::lookup(&label) {
                    Ok(found)
                        if *self == ParserOption::OutputEncoding
                            && !encoding::is_byte_scannable(found) =>
                    {
                        Err(CsvError::invalid(
                            name,
                            &format!("names {:?}, which records cannot be split in", label),
                        ))
                    }
                    Ok(_) => Ok(Value::Str(label)),
                    Err(_) => Err(CsvError::invalid(
                        name,
                        &format!("names an unknown encoding {:?}", label),
                    )),
                },
                _ => Err(CsvError::invalid(name, "only accepts string")),
            },
            ParserOption::Sanitizing | ParserOption::EraseBom => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                Value::Int(i) => Ok(Value::Bool(i != 0)),
                Value::Str(ref s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                    Ok(Value::Bool(s.bytes().any(|b| b != b'0')))
                }
                _ => Err(CsvError::invalid(name, "only accepts bool")),
            },
        }
    }
}

impl fmt::Display for ParserOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParserOption {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "delimiter" => Ok(ParserOption::Delimiter),
            "enclosure" => Ok(ParserOption::Enclosure),
            "escape" => Ok(ParserOption::Escape),
            "input_encoding" | "inputEncoding" => Ok(ParserOption::InputEncoding),
            "output_encoding" | "outputEncoding" => Ok(ParserOption::OutputEncoding),
            "sanitizing" => Ok(ParserOption::Sanitizing),
            "erase_bom" | "eraseBom" => Ok(ParserOption::EraseBom),
            _ => Err(CsvError::UnknownOption(s.to_string())),
        }
    }
}

/// Validated parser configuration
///
/// Always holds all seven options; every write goes through
/// [`ParserOption::validate`] so a rejected value leaves the configuration
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    store: Configuration,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            store: Configuration::from_trusted(
                ParserOption::ALL
                    .iter()
                    .map(|option| (option.name(), option.default_value())),
            ),
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from defaults overridden by `(name, value)` pairs
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::ParserConfig;
    ///
    /// let config = ParserConfig::from_pairs([("delimiter", "\t"), ("escape", "\\")]).unwrap();
    /// assert_eq!(config.delimiter(), '\t');
    /// assert_eq!(config.escape(), '\\');
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut config = Self::default();
        for (name, value) in pairs {
            config.set(name.as_ref(), value)?;
        }
        Ok(config)
    }

    /// Read an option by name
    pub fn get(&self, name: &str) -> Result<Value> {
        let option: ParserOption = name.parse()?;
        Ok(self.value(option).clone())
    }

    /// Validate and write an option by name
    ///
    /// `Value::Null` unsets an encoding and is rejected for the other options.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let option: ParserOption = name.parse()?;
        self.set_option(option, value)
    }

    /// Validate and write a typed option
    pub fn set_option(&mut self, option: ParserOption, value: impl Into<Value>) -> Result<()> {
        let value = option.validate(value.into())?;
        self.store.set(option.name(), value)
    }

    /// Whether the named option holds a value (encodings may be unset)
    pub fn has(&self, name: &str) -> bool {
        name.parse::<ParserOption>()
            .map(|option| self.store.has(option.name()))
            .unwrap_or(false)
    }

    /// The underlying store, for enumeration
    pub fn store(&self) -> &Configuration {
        &self.store
    }

    /// `(name, value)` pairs in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.store.iter()
    }

    fn value(&self, option: ParserOption) -> &Value {
        // populated for every option at construction
        self.store.get(option.name()).unwrap_or(&Value::Null)
    }

    fn char_option(&self, option: ParserOption) -> char {
        match self.value(option) {
            Value::Char(c) => *c,
            _ => match option.default_value() {
                Value::Char(c) => c,
                _ => ',',
            },
        }
    }

    fn flag_option(&self, option: ParserOption) -> bool {
        matches!(self.value(option), Value::Bool(true))
    }

    fn encoding_option(&self, option: ParserOption) -> Option<&str> {
        self.value(option).as_str()
    }

    pub fn delimiter(&self) -> char {
        self.char_option(ParserOption::Delimiter)
    }

    pub fn enclosure(&self) -> char {
        self.char_option(ParserOption::Enclosure)
    }

    pub fn escape(&self) -> char {
        self.char_option(ParserOption::Escape)
    }

    pub fn input_encoding(&self) -> Option<&str> {
        self.encoding_option(ParserOption::InputEncoding)
    }

    pub fn output_encoding(&self) -> Option<&str> {
        self.encoding_option(ParserOption::OutputEncoding)
    }

    pub fn sanitizing(&self) -> bool {
        self.flag_option(ParserOption::Sanitizing)
    }

    pub fn erase_bom(&self) -> bool {
        self.flag_option(ParserOption::EraseBom)
    }

    pub fn set_delimiter(&mut self, delimiter: char) -> &mut Self {
        self.set_trusted(ParserOption::Delimiter, Value::Char(delimiter))
    }

    pub fn set_enclosure(&mut self, enclosure: char) -> &mut Self {
        self.set_trusted(ParserOption::Enclosure, Value::Char(enclosure))
    }

    pub fn set_escape(&mut self, escape: char) -> &mut Self {
        self.set_trusted(ParserOption::Escape, Value::Char(escape))
    }

    pub fn set_sanitizing(&mut self, sanitizing: bool) -> &mut Self {
        self.set_trusted(ParserOption::Sanitizing, Value::Bool(sanitizing))
    }

    pub fn set_erase_bom(&mut self, erase_bom: bool) -> &mut Self {
        self.set_trusted(ParserOption::EraseBom, Value::Bool(erase_bom))
    }

    /// Declare the encoding of the source lines; fails for unknown labels
    pub fn set_input_encoding(&mut self, label: Option<&str>) -> Result<&mut Self> {
        self.set_option(ParserOption::InputEncoding, label)?;
        Ok(self)
    }

    /// Declare the encoding records are converted into; fails for unknown labels
    pub fn set_output_encoding(&mut self, label: Option<&str>) -> Result<&mut Self> {
        self.set_option(ParserOption::OutputEncoding, label)?;
        Ok(self)
    }

    fn set_trusted(&mut self, option: ParserOption, value: Value) -> &mut Self {
        self.store.overwrite(option.name(), value);
        self
    }
}

/// Plain-data form of [`ParserConfig`], convenient for loading from files
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserOptions {
    pub delimiter: char,
    pub enclosure: char,
    pub escape: char,
    #[cfg_attr(feature = "serde", serde(alias = "inputEncoding"))]
    pub input_encoding: Option<String>,
    #[cfg_attr(feature = "serde", serde(alias = "outputEncoding"))]
    pub output_encoding: Option<String>,
    pub sanitizing: bool,
    #[cfg_attr(feature = "serde", serde(alias = "eraseBom"))]
    pub erase_bom: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            enclosure: '"',
            escape: '"',
            input_encoding: None,
            output_encoding: None,
            sanitizing: false,
            erase_bom: false,
        }
    }
}

impl TryFrom<ParserOptions> for ParserConfig {
    type Error = CsvError;

    fn try_from(options: ParserOptions) -> Result<Self> {
        let mut config = ParserConfig::default();
        config
            .set_delimiter(options.delimiter)
            .set_enclosure(options.enclosure)
            .set_escape(options.escape)
            .set_sanitizing(options.sanitizing)
            .set_erase_bom(options.erase_bom);
        config.set_input_encoding(options.input_encoding.as_deref())?;
        config.set_output_encoding(options.output_encoding.as_deref())?;
        Ok(config)
    }
}

impl From<&ParserConfig> for ParserOptions {
    fn from(config: &ParserConfig) -> Self {
        Self {
            delimiter: config.delimiter(),
            enclosure: config.enclosure(),
            escape: config.escape(),
            input_encoding: config.input_encoding().map(str::to_string),
            output_encoding: config.output_encoding().map(str::to_string),
            sanitizing: config.sanitizing(),
            erase_bom: config.erase_bom(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::new();
        assert_eq!(config.delimiter(), ',');
        assert_eq!(config.enclosure(), '"');
        assert_eq!(config.escape(), '"');
        assert_eq!(config.input_encoding(), None);
        assert_eq!(config.output_encoding(), None);
        assert!(!config.sanitizing());
        assert!(!config.erase_bom());
        assert_eq!(config.store().len(), 7);
    }

    #[test]
    fn test_from_pairs() {
        let config = ParserConfig::from_pairs([
            ("delimiter", Value::from("\t")),
            ("enclosure", Value::from("'")),
            ("escape", Value::from("\\")),
            ("inputEncoding", Value::from("SJIS-win")),
            ("outputEncoding", Value::from("EUC-JP")),
            ("sanitizing", Value::from(true)),
            ("eraseBom", Value::from(true)),
        ])
        .unwrap();
        assert_eq!(config.delimiter(), '\t');
        assert_eq!(config.enclosure(), '\'');
        assert_eq!(config.escape(), '\\');
        assert_eq!(config.input_encoding(), Some("SJIS-win"));
        assert_eq!(config.output_encoding(), Some("EUC-JP"));
        assert!(config.sanitizing());
        assert!(config.erase_bom());
    }

    #[test]
    fn test_get_by_name() {
        let config = ParserConfig::new();
        assert_eq!(config.get("delimiter").unwrap(), Value::Char(','));
        assert_eq!(config.get("input_encoding").unwrap(), Value::Null);
        assert_eq!(config.get("eraseBom").unwrap(), Value::Bool(false));
        assert!(matches!(config.get("buffer"), Err(CsvError::UnknownOption(_))));
    }

    #[test]
    fn test_multi_character_rejected() {
        let mut config = ParserConfig::new();
        let err = config.set("delimiter", ",,").unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(config.delimiter(), ',');
        assert!(config.set("enclosure", "").is_err());
        assert!(config.set("escape", true).is_err());
    }

    #[test]
    fn test_non_ascii_character_accepted() {
        let mut config = ParserConfig::new();
        config.set("delimiter", "、").unwrap();
        assert_eq!(config.delimiter(), '、');
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut config = ParserConfig::new();
        assert!(matches!(config.set("quote", "'"), Err(CsvError::UnknownOption(n)) if n == "quote"));
    }

    #[test]
    fn test_encoding_validation() {
        let mut config = ParserConfig::new();
        assert!(config.set_input_encoding(Some("no-such-encoding")).is_err());
        assert_eq!(config.input_encoding(), None);
        assert!(config.set("output_encoding", 5i64).is_err());
        config.set_input_encoding(Some("SJIS")).unwrap();
        assert_eq!(config.input_encoding(), Some("SJIS"));
        config.set("input_encoding", Value::Null).unwrap();
        assert_eq!(config.input_encoding(), None);
    }

    #[test]
    fn test_output_encoding_must_be_byte_scannable() {
        let mut config = ParserConfig::new();
        for label in ["UTF-16LE", "utf-16be", "utf-16", "ISO-2022-JP"] {
            let err = config.set_output_encoding(Some(label)).unwrap_err();
            assert!(err.is_config_error(), "label {}", label);
            assert_eq!(config.output_encoding(), None);
        }
        // still fine as a source
        config.set_input_encoding(Some("UTF-16LE")).unwrap();
        config.set_output_encoding(Some("Shift_JIS")).unwrap();
        assert_eq!(config.output_encoding(), Some("Shift_JIS"));
    }

    #[test]
    fn test_typed_setters_keep_option_order() {
        let mut config = ParserConfig::new();
        config.set_erase_bom(true).set_delimiter(';').set_sanitizing(true);
        assert_eq!(config.delimiter(), ';');
        assert!(config.erase_bom());
        assert!(config.sanitizing());
        let names: Vec<_> = config.iter().map(|(name, _)| name).collect();
        assert_eq!(names[0], "delimiter");
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_flag_coercion() {
        let mut config = ParserConfig::new();
        config.set("sanitizing", 1i64).unwrap();
        assert!(config.sanitizing());
        config.set("sanitizing", "0").unwrap();
        assert!(!config.sanitizing());
        config.set("erase_bom", "1").unwrap();
        assert!(config.erase_bom());
        assert!(config.set("erase_bom", "yes").is_err());
        assert!(config.set("erase_bom", Value::Null).is_err());
        assert!(config.erase_bom());
    }

    #[test]
    fn test_has() {
        let mut config = ParserConfig::new();
        assert!(config.has("delimiter"));
        assert!(!config.has("input_encoding"));
        assert!(!config.has("unknown"));
        config.set_input_encoding(Some("UTF-8")).unwrap();
        assert!(config.has("inputEncoding"));
    }

    #[test]
    fn test_options_round_trip() {
        let options = ParserOptions {
            delimiter: ';',
            input_encoding: Some("SJIS".to_string()),
            output_encoding: Some("UTF-8".to_string()),
            ..ParserOptions::default()
        };
        let config = ParserConfig::try_from(options.clone()).unwrap();
        assert_eq!(config.delimiter(), ';');
        assert_eq!(ParserOptions::from(&config), options);
    }

    #[test]
    fn test_options_bad_encoding() {
        let options = ParserOptions {
            output_encoding: Some("martian".to_string()),
            ..ParserOptions::default()
        };
        assert!(ParserConfig::try_from(options).is_err());
    }

    #[test]
    fn test_option_names_in_order() {
        let config = ParserConfig::new();
        let names: Vec<_> = config.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "delimiter",
                "enclosure",
                "escape",
                "input_encoding",
                "output_encoding",
                "sanitizing",
                "erase_bom"
            ]
        );
    }
}
