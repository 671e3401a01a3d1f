//! Literal character search over raw record bytes

/// A single configured character, held in its UTF-8 encoding
///
/// Matching is byte-wise, so records in any ASCII-compatible encoding work as
/// long as the character itself is ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Needle {
    ch: char,
    bytes: [u8; 4],
    len: usize,
}

impl Needle {
    pub(crate) fn new(ch: char) -> Self {
        let mut bytes = [0u8; 4];
        let len = ch.encode_utf8(&mut bytes).len();
        Self { ch, bytes, len }
    }

    pub(crate) fn as_char(&self) -> char {
        self.ch
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Whether the needle occurs at byte offset `pos`
    pub(crate) fn is_at(&self, haystack: &[u8], pos: usize) -> bool {
        haystack
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(self.as_bytes()))
    }

    /// Offset of the first occurrence at or after `from`
    pub(crate) fn find(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let rest = haystack.get(from..)?;
        let found = if self.len == 1 {
            rest.iter().position(|&b| b == self.bytes[0])
        } else {
            rest.windows(self.len).position(|w| w == self.as_bytes())
        };
        found.map(|i| i + from)
    }

    /// Number of non-overlapping occurrences
    pub(crate) fn count(&self, haystack: &[u8]) -> usize {
        if self.len == 1 {
            return haystack.iter().filter(|&&b| b == self.bytes[0]).count();
        }
        let mut count = 0;
        let mut pos = 0;
        while let Some(found) = self.find(haystack, pos) {
            count += 1;
            pos = found + self.len;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        let quote = Needle::new('"');
        assert_eq!(quote.len(), 1);
        assert_eq!(quote.find(br#"ab"c"#, 0), Some(2));
        assert_eq!(quote.find(br#"ab"c"#, 3), None);
        assert_eq!(quote.find(b"ab", 5), None);
        assert_eq!(quote.count(br#""a""b""#), 4);
        assert!(quote.is_at(br#"a""#, 1));
        assert!(!quote.is_at(br#"a""#, 2));
    }

    #[test]
    fn test_multibyte() {
        let mark = Needle::new('、');
        assert_eq!(mark.len(), 3);
        let hay = "田、中、".as_bytes();
        assert_eq!(mark.find(hay, 0), Some(3));
        assert_eq!(mark.find(hay, 4), Some(9));
        assert_eq!(mark.count(hay), 2);
        assert_eq!(mark.as_char(), '、');
    }
}
