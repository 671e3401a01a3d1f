//! CSV reading from any buffered source, one logical record at a time

use crate::csv::CsvParser;
use crate::encoding;
use crate::error::{CsvError, Result};
use crate::options::ParserConfig;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

/// CSV reader driving a [`CsvParser`] from a [`BufRead`] source
///
/// Physical lines are split on `\n` (on the two-byte line feed when the input
/// encoding is UTF-16), so records whose quoted fields contain line breaks are
/// reassembled before tokenizing. Blank records are skipped.
/// Memory usage is bounded by the longest record.
///
/// # Examples
///
/// ```
/// use csvstream::CsvReader;
/// use std::io::Cursor;
///
/// let data = "id,note\r\n1,\"multi\r\nline\"\r\n\r\n2,plain\r\n";
/// let mut reader = CsvReader::new(Cursor::new(data)).has_header(true);
///
/// let rows: Vec<Vec<String>> = reader.records().collect::<Result<_, _>>().unwrap();
/// assert_eq!(reader.headers(), Some(&["id".to_string(), "note".to_string()][..]));
/// assert_eq!(rows, vec![vec!["1", "multi\r\nline"], vec!["2", "plain"]]);
/// ```
pub struct CsvReader<R> {
    source: R,
    parser: CsvParser,

    // Read state
    line_buffer: Vec<u8>,
    line_number: u64,
    row_count: u64,
    finished: bool,

    // Header handling
    has_header: bool,
    header_read: bool,
    headers: Vec<String>,
}

impl CsvReader<BufReader<File>> {
    /// Open a CSV file with default parser options
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::CsvReader;
    ///
    /// let mut reader = CsvReader::open("data.csv").unwrap();
    /// while let Some(record) = reader.read_record().unwrap() {
    ///     println!("{:?}", record);
    /// }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened CSV file");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> CsvReader<R> {
    /// Wrap a buffered source using default parser options
    pub fn new(source: R) -> Self {
        Self::with_parser(source, CsvParser::new())
    }

    /// Wrap a buffered source using an existing parser
    ///
    /// Anything already buffered in the parser becomes the start of the first
    /// record.
    pub fn with_parser(source: R, parser: CsvParser) -> Self {
        Self {
            source,
            parser,
            line_buffer: Vec::with_capacity(1024),
            line_number: 0,
            row_count: 0,
            finished: false,
            has_header: false,
            header_read: false,
            headers: Vec::new(),
        }
    }

    /// Replace the parser options (builder pattern)
    pub fn with_config(mut self, config: ParserConfig) -> Result<Self> {
        self.parser = CsvParser::from_config(config)?;
        Ok(self)
    }

    /// Set custom delimiter (builder pattern)
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::CsvReader;
    /// use std::io::Cursor;
    ///
    /// let mut reader = CsvReader::new(Cursor::new("a;b\n")).delimiter(';');
    /// assert_eq!(reader.read_record().unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
    /// ```
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.parser.set_delimiter(delimiter);
        self
    }

    /// Set custom enclosure character (builder pattern)
    pub fn enclosure(mut self, enclosure: char) -> Self {
        self.parser.set_enclosure(enclosure);
        self
    }

    /// Set custom escape character (builder pattern)
    pub fn escape(mut self, escape: char) -> Self {
        self.parser.set_escape(escape);
        self
    }

    /// Indicate that the first record contains headers (builder pattern)
    ///
    /// When set to `true`, the first non-blank record is stored and accessible
    /// via `headers()` instead of being returned.
    pub fn has_header(mut self, has: bool) -> Self {
        self.has_header = has;
        self
    }

    /// Get header record if one has been read
    pub fn headers(&self) -> Option<&[String]> {
        if self.headers.is_empty() {
            None
        } else {
            Some(&self.headers)
        }
    }

    /// The underlying parser
    pub fn parser(&self) -> &CsvParser {
        &self.parser
    }

    /// Mutable access to the underlying parser, for changing options mid-stream
    pub fn parser_mut(&mut self) -> &mut CsvParser {
        &mut self.parser
    }

    /// Read the next record as text
    ///
    /// Returns `Ok(None)` at end of input. Input ending inside an open
    /// enclosure yields whatever was buffered as a final record. Fails when
    /// the output encoding does not produce UTF-8; use
    /// [`read_record_bytes`](Self::read_record_bytes) then.
    pub fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            let Some(record) = self.next_record()? else {
                return Ok(None);
            };
            let text = String::from_utf8(record).map_err(|_| CsvError::MalformedInput {
                encoding: "UTF-8".to_string(),
            })?;
            let Some(fields) = self.parser.convert(&text) else {
                trace!(line = self.line_number, "skipped blank record");
                continue;
            };

            if self.has_header && !self.header_read {
                self.header_read = true;
                self.headers = fields;
                continue;
            }

            self.row_count += 1;
            return Ok(Some(fields));
        }
    }

    /// Read the next record as raw bytes in the output encoding
    ///
    /// Header handling does not apply; every non-blank record is returned.
    pub fn read_record_bytes(&mut self) -> Result<Option<Vec<Vec<u8>>>> {
        loop {
            let Some(record) = self.next_record()? else {
                return Ok(None);
            };
            if let Some(fields) = self.parser.convert_bytes(&record) {
                self.row_count += 1;
                return Ok(Some(fields));
            }
        }
    }

    /// Get iterator over records
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::CsvReader;
    ///
    /// let mut reader = CsvReader::open("data.csv").unwrap();
    /// for record in reader.records() {
    ///     println!("{:?}", record.unwrap());
    /// }
    /// ```
    pub fn records(&mut self) -> CsvRecordIterator<'_, R> {
        CsvRecordIterator { reader: self }
    }

    /// Number of data records returned so far
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Number of physical lines consumed so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Feed physical lines until the parser holds a complete record
    fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }
        let newline = match self.parser.configuration().input_encoding() {
            Some(label) => encoding::utf16_newline(encoding::lookup(label)?),
            None => None,
        };
        loop {
            self.line_buffer.clear();
            let read = match newline {
                Some(unit) => read_utf16_line(&mut self.source, &mut self.line_buffer, unit),
                None => self.source.read_until(b'\n', &mut self.line_buffer),
            };
            let read = match read {
                Ok(read) => read,
                Err(e) => {
                    self.finished = true;
                    return Err(e.into());
                }
            };

            if read == 0 {
                self.finished = true;
                if self.parser.accumulator().is_empty() {
                    return Ok(None);
                }
                debug!(
                    bytes = self.parser.accumulator().len(),
                    "input ended inside an open enclosure"
                );
                return Ok(Some(self.parser.take_buffer()));
            }

            self.line_number += 1;
            if self.parser.parse(&self.line_buffer)? {
                return Ok(Some(self.parser.take_buffer()));
            }
        }
    }
}

/// Read through the next line feed code unit of a UTF-16 stream
///
/// Units are aligned to the start of the line, so a `0x0A` byte inside
/// another character never ends it. A dangling odd byte at the end of input is
/// kept and left for the decoder to reject.
fn read_utf16_line<R: BufRead>(
    source: &mut R,
    line: &mut Vec<u8>,
    newline: [u8; 2],
) -> std::io::Result<usize> {
    let start = line.len();
    loop {
        let available = source.fill_buf()?;
        if available.is_empty() {
            break;
        }
        let mut taken = 0;
        let mut found = false;
        for &byte in available {
            line.push(byte);
            taken += 1;
            let len = line.len() - start;
            if len % 2 == 0 && line[line.len() - 2..] == newline {
                found = true;
                break;
            }
        }
        source.consume(taken);
        if found {
            break;
        }
    }
    Ok(line.len() - start)
}

/// Iterator over CSV records
pub struct CsvRecordIterator<'a, R> {
    reader: &'a mut CsvReader<R>,
}

impl<R: BufRead> Iterator for CsvRecordIterator<'_, R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::lookup;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn collect<R: BufRead>(reader: &mut CsvReader<R>) -> Vec<Vec<String>> {
        reader.records().collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_read_plain_csv() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "Name,Age,City\r\nAlice,30,NYC\r\nBob,25,SF\r\n")?;

        let mut reader = CsvReader::open(file.path())?;
        let rows = collect(&mut reader);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Name", "Age", "City"]);
        assert_eq!(rows[1], vec!["Alice", "30", "NYC"]);
        assert_eq!(reader.row_count(), 3);
        Ok(())
    }

    #[test]
    fn test_read_with_headers() {
        let mut reader = CsvReader::new(Cursor::new("ID,Name\n1,Alice\n2,Bob\n")).has_header(true);
        assert_eq!(reader.headers(), None);

        let rows = collect(&mut reader);

        assert_eq!(
            reader.headers(),
            Some(&["ID".to_string(), "Name".to_string()][..])
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "Alice"]);
        assert_eq!(reader.row_count(), 2);
    }

    #[test]
    fn test_multiline_records() {
        let data = "1,\"Tanaka\r\nTaro\"\r\n2,\"a\"\"b\r\n\r\nc\"\r\n";
        let mut reader = CsvReader::new(Cursor::new(data));
        let rows = collect(&mut reader);

        assert_eq!(rows[0], vec!["1", "Tanaka\r\nTaro"]);
        assert_eq!(rows[1], vec!["2", "a\"b\r\n\r\nc"]);
        assert_eq!(reader.line_number(), 5);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut reader = CsvReader::new(Cursor::new("\r\na\r\n\n\r\nb\r\n\r\n"));
        assert_eq!(collect(&mut reader), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_unterminated_last_line() {
        let mut reader = CsvReader::new(Cursor::new("a,b\r\nc,d"));
        assert_eq!(collect(&mut reader), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_open_enclosure_at_eof() {
        let mut reader = CsvReader::new(Cursor::new("1,\"never\r\nclosed\r\n"));
        assert_eq!(
            reader.read_record().unwrap(),
            Some(vec!["1".to_string(), "\"never\r\nclosed".to_string()])
        );
        assert_eq!(reader.read_record().unwrap(), None);
        assert_eq!(reader.read_record().unwrap(), None);
    }

    #[test]
    fn test_custom_dialect() {
        let data = "1\t'O\\'Neil'\r\n";
        let mut reader = CsvReader::new(Cursor::new(data))
            .delimiter('\t')
            .enclosure('\'')
            .escape('\\');
        assert_eq!(collect(&mut reader), vec![vec!["1", "O'Neil"]]);
    }

    #[test]
    fn test_sjis_file_to_utf8() -> Result<()> {
        let text = "1,田中\r\n2,山田\r\n3,\"鈴木\r\n\"\r\n";
        let (sjis, _, _) = lookup("SJIS")?.encode(text);

        let mut file = NamedTempFile::new()?;
        file.write_all(&sjis)?;

        let mut config = ParserConfig::default();
        config.set_input_encoding(Some("SJIS"))?;
        config.set_output_encoding(Some("UTF-8"))?;

        let mut reader = CsvReader::open(file.path())?.with_config(config)?;
        let rows = collect(&mut reader);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["1", "田中"]);
        assert_eq!(rows[1], vec!["2", "山田"]);
        assert_eq!(rows[2], vec!["3", "鈴木\r\n"]);
        Ok(())
    }

    fn utf16(text: &str, big_endian: bool) -> Vec<u8> {
        text.encode_utf16()
            .flat_map(|unit| {
                if big_endian {
                    unit.to_be_bytes()
                } else {
                    unit.to_le_bytes()
                }
            })
            .collect()
    }

    #[test]
    fn test_utf16le_with_bom() -> Result<()> {
        let mut data = crate::encoding::BOM_UTF16LE.to_vec();
        data.extend(utf16("1,a\r\n2,b\r\n", false));

        let mut config = ParserConfig::default();
        config.set_input_encoding(Some("UTF-16LE"))?;
        config.set_output_encoding(Some("UTF-8"))?;
        config.set_erase_bom(true);

        let mut reader = CsvReader::new(Cursor::new(data)).with_config(config)?;
        assert_eq!(collect(&mut reader), vec![vec!["1", "a"], vec!["2", "b"]]);
        assert_eq!(reader.line_number(), 2);
        Ok(())
    }

    #[test]
    fn test_utf16be_multiline_record() -> Result<()> {
        // U+010A ends in a 0x0A byte, U+2200 starts with 0x22
        let data = utf16("1,\"x\u{010A}\r\ny\u{2200}\"\r\n2,z\r\n", true);

        let mut config = ParserConfig::default();
        config.set_input_encoding(Some("UTF-16BE"))?;

        let mut reader = CsvReader::new(Cursor::new(data)).with_config(config)?;
        assert_eq!(
            collect(&mut reader),
            vec![vec!["1", "x\u{010A}\r\ny\u{2200}"], vec!["2", "z"]]
        );
        assert_eq!(reader.line_number(), 3);
        Ok(())
    }

    #[test]
    fn test_utf16_line_split_across_buffer_refills() -> Result<()> {
        let data = utf16("ab,cd\r\nef\r\n", false);
        let source = BufReader::with_capacity(3, Cursor::new(data));

        let mut config = ParserConfig::default();
        config.set_input_encoding(Some("UTF-16LE"))?;

        let mut reader = CsvReader::new(source).with_config(config)?;
        assert_eq!(collect(&mut reader), vec![vec!["ab", "cd"], vec!["ef"]]);
        Ok(())
    }

    #[test]
    fn test_sjis_output_needs_bytes() -> Result<()> {
        let mut config = ParserConfig::default();
        config.set_input_encoding(Some("UTF-8"))?;
        config.set_output_encoding(Some("SJIS"))?;

        let source = Cursor::new("1,田中\r\n".as_bytes().to_vec());
        let mut reader = CsvReader::new(source).with_config(config)?;
        let fields = reader.read_record_bytes()?.unwrap();

        let (expected, _, _) = lookup("SJIS")?.encode("田中");
        assert_eq!(fields, vec![b"1".to_vec(), expected.into_owned()]);
        assert_eq!(reader.read_record_bytes()?, None);
        Ok(())
    }

    #[test]
    fn test_non_utf8_record_as_text_fails() -> Result<()> {
        let mut config = ParserConfig::default();
        config.set_input_encoding(Some("UTF-8"))?;
        config.set_output_encoding(Some("SJIS"))?;

        let mut reader = CsvReader::new(Cursor::new("田中\r\n")).with_config(config)?;
        assert!(matches!(
            reader.read_record(),
            Err(CsvError::MalformedInput { .. })
        ));
        Ok(())
    }
}
