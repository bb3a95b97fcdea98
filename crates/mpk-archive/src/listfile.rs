//! Known-name lists for recovering file names
//!
//! Hash tables store digests, never names. A listfile supplies candidate names
//! so that a file opened by block index can get its name back, which is needed
//! to derive the seed of an encrypted file.

use crate::error::Result;
use std::collections::BTreeSet;
use std::io::Read;

/// Set of candidate file names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listfile {
    names: BTreeSet<String>,
}

impl Listfile {
    /// Create an empty listfile
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse listfile text
    ///
    /// One name per line; blank lines and lines starting with `;` are
    /// skipped. `\n`, `\r\n` and `;`-separated names are accepted.
    pub fn parse(text: &str) -> Self {
        text.lines()
            .filter(|line| !line.trim_start().starts_with(';'))
            .flat_map(|line| line.split(';'))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Read and parse a listfile
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::parse(&String::from_utf8_lossy(&data)))
    }

    /// Add a name
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Add every name from another listfile
    pub fn extend(&mut self, other: Self) {
        self.names.extend(other.names);
    }

    /// Check if a name is known
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the listfile has no names
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Listfile {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_lines() {
        let listfile = Listfile::parse("a.txt\r\nunits\\b.mdx\n\n; comment\nc.wav");
        assert_eq!(listfile.len(), 3);
        assert!(listfile.contains("a.txt"));
        assert!(listfile.contains("units\\b.mdx"));
        assert!(listfile.contains("c.wav"));
    }

    #[test]
    fn test_parse_semicolon_separated() {
        let listfile = Listfile::parse("a.txt;b.txt");
        assert_eq!(listfile.iter().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_from_reader_lossy() {
        let listfile = Listfile::from_reader(Cursor::new(b"ok.txt\n\xFFbad.txt\n")).unwrap();
        assert_eq!(listfile.len(), 2);
        assert!(listfile.contains("ok.txt"));
    }

    #[test]
    fn test_insert_and_extend() {
        let mut listfile = Listfile::new();
        assert!(listfile.is_empty());
        assert!(listfile.insert("a"));
        assert!(!listfile.insert("a"));

        listfile.extend(["b", "c"].into_iter().collect());
        assert_eq!(listfile.len(), 3);
    }
}
