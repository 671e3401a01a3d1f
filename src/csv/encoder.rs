//! Writing records in the tokenizer's dialect

use crate::options::ParserConfig;

/// Encodes fields so that [`Tokenizer`](super::Tokenizer) reads them back
/// unchanged
pub struct CsvEncoder {
    delimiter: char,
    enclosure: char,
    escape: char,
}

impl Default for CsvEncoder {
    fn default() -> Self {
        Self::new(',', '"', '"')
    }
}

impl CsvEncoder {
    /// Create a new CSV encoder with custom delimiter, enclosure and escape character
    pub fn new(delimiter: char, enclosure: char, escape: char) -> Self {
        Self {
            delimiter,
            enclosure,
            escape,
        }
    }

    /// Create an encoder matching a parser configuration
    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(config.delimiter(), config.enclosure(), config.escape())
    }

    /// Encode entire row into buffer
    pub fn encode_row<S: AsRef<str>>(&self, fields: &[S], buffer: &mut String) {
        // a lone empty field would otherwise read back as a blank record
        if let [only] = fields {
            if only.as_ref().is_empty() {
                buffer.push(self.enclosure);
                buffer.push(self.enclosure);
                return;
            }
        }
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                buffer.push(self.delimiter);
            }
            self.encode_field(field.as_ref(), buffer);
        }
    }

    /// Encode a row followed by CRLF
    pub fn encode_line<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let mut line = String::new();
        self.encode_row(fields, &mut line);
        line.push_str("\r\n");
        line
    }

    /// Encode single field with proper quoting/escaping
    fn encode_field(&self, field: &str, buffer: &mut String) {
        if self.needs_quoting(field) {
            buffer.push(self.enclosure);
            for ch in field.chars() {
                if ch == self.enclosure {
                    buffer.push(self.escape);
                }
                buffer.push(ch);
            }
            buffer.push(self.enclosure);
        } else {
            buffer.push_str(field);
        }
    }

    /// Check if field requires quoting
    fn needs_quoting(&self, field: &str) -> bool {
        field.chars().any(|c| {
            c == self.delimiter || c == self.enclosure || c == self.escape || c == '\n' || c == '\r'
        })
    }
}
