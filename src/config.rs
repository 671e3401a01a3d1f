//! Named-attribute configuration store
//!
//! [`Configuration`] is a small insertion-ordered slot store: attributes are
//! declared once with [`Configuration::define`] and afterwards can only be read
//! or overwritten, never added implicitly. [`ParserConfig`](crate::ParserConfig)
//! layers option-specific validation on top of it.

use crate::error::{CsvError, Result};
use indexmap::IndexMap;
use std::fmt;

/// Names that clash with the store's own methods and therefore cannot be used
/// as attribute names
const RESERVED_NAMES: &[&str] = &[
    "define", "get", "set", "has", "unset", "keys", "values", "iter", "len", "is_empty",
];

/// Value held by a configuration slot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Unset slot
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Single character
    Char(char),
    /// Text value
    Str(String),
    /// Raw bytes (used for the computed `buffer` property)
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Character view: a `Char`, or a `Str` made of exactly one character
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Text view of a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view of a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Byte view of a `Bytes` or `Str`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Str(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Char(c) => write!(f, "'{}'", c.escape_default()),
            Value::Str(s) => write!(f, "'{}'", s.escape_default()),
            Value::Bytes(b) => write!(f, "'{}'", b.escape_ascii()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Insertion-ordered store of named attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    attributes: IndexMap<String, Value>,
}

impl Configuration {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store and define every `(name, value)` pair in order
    pub fn with_attributes<I, K, V>(attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut config = Self::new();
        for (name, value) in attributes {
            config.define(name, value)?;
        }
        Ok(config)
    }

    /// Build a store from pairs whose names are known to be unique and unreserved
    pub(crate) fn from_trusted<I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// Declare an attribute with its initial value
    ///
    /// Fails when the name is already defined or is one of the store's method
    /// names.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        let name = name.into();
        if self.attributes.contains_key(&name) {
            return Err(CsvError::AlreadyDefined(name));
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(CsvError::ReservedName(name));
        }
        self.attributes.insert(name, value.into());
        Ok(self)
    }

    /// Read a defined attribute
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.attributes
            .get(name)
            .ok_or_else(|| CsvError::Undefined(name.to_string()))
    }

    /// Overwrite a defined attribute
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.attributes.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(CsvError::Undefined(name.to_string())),
        }
    }

    /// Write a slot whose name is known to the caller, defining it if needed
    pub(crate) fn overwrite(&mut self, name: &'static str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Whether the attribute is defined and holds a non-null value
    pub fn has(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|v| !v.is_null())
    }

    /// Whether the attribute is defined, regardless of its value
    pub fn is_defined(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Reset a defined attribute to [`Value::Null`]; unknown names are ignored
    pub fn unset(&mut self, name: &str) {
        if let Some(slot) = self.attributes.get_mut(name) {
            *slot = Value::Null;
        }
    }

    /// Attribute names in definition order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Attribute values in definition order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.attributes.values()
    }

    /// `(name, value)` pairs in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of defined attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for (name, value) in self.iter() {
            writeln!(f, "  '{}' => {},", name, value)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut config = Configuration::new();
        config.define("delimiter", ',').unwrap();
        assert_eq!(config.get("delimiter").unwrap(), &Value::Char(','));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_define_twice_fails() {
        let mut config = Configuration::new();
        config.define("name", "a").unwrap();
        assert!(matches!(
            config.define("name", "b"),
            Err(CsvError::AlreadyDefined(n)) if n == "name"
        ));
        assert_eq!(config.get("name").unwrap(), &Value::from("a"));
    }

    #[test]
    fn test_define_reserved_name_fails() {
        let mut config = Configuration::new();
        assert!(matches!(config.define("keys", 1i64), Err(CsvError::ReservedName(_))));
        assert!(config.is_empty());
    }

    #[test]
    fn test_get_and_set_undefined_fail() {
        let mut config = Configuration::new();
        assert!(matches!(config.get("missing"), Err(CsvError::Undefined(_))));
        assert!(matches!(config.set("missing", true), Err(CsvError::Undefined(_))));
    }

    #[test]
    fn test_has_treats_null_as_missing() {
        let mut config = Configuration::with_attributes([("encoding", Value::Null)]).unwrap();
        assert!(!config.has("encoding"));
        assert!(config.is_defined("encoding"));
        config.set("encoding", "UTF-8").unwrap();
        assert!(config.has("encoding"));
        config.unset("encoding");
        assert!(!config.has("encoding"));
        assert!(config.is_defined("encoding"));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut config =
            Configuration::with_attributes([("a", Value::from(1i64)), ("b", Value::from(2i64))])
                .unwrap();
        config.overwrite("a", Value::from(3i64));
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(config.get("a").unwrap(), &Value::Int(3));
    }

    #[test]
    fn test_insertion_order() {
        let config = Configuration::with_attributes([
            ("b", Value::from(1i64)),
            ("a", Value::from(2i64)),
            ("c", Value::from(3i64)),
        ])
        .unwrap();
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(
            config.values().cloned().collect::<Vec<_>>(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_display() {
        let config =
            Configuration::with_attributes([("delimiter", Value::Char(',')), ("flag", Value::Bool(true))])
                .unwrap();
        assert_eq!(config.to_string(), "[\n  'delimiter' => ',',\n  'flag' => true,\n]");
    }

    #[test]
    fn test_value_as_char() {
        assert_eq!(Value::from("\t").as_char(), Some('\t'));
        assert_eq!(Value::from("ab").as_char(), None);
        assert_eq!(Value::from("").as_char(), None);
        assert_eq!(Value::Char('"').as_char(), Some('"'));
        assert_eq!(Value::Bool(true).as_char(), None);
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("SJIS")), Value::Str("SJIS".to_string()));
    }
}
