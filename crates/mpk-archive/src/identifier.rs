//! File identifiers and search scopes

use crate::error::{MpkError, Result};
use std::fmt;

/// Names a file either by block table slot or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentifier {
    /// Block table index; bypasses the hash lookup
    ById(u32),
    /// Archive path, e.g. `units\human\footman.mdx`
    ByName(String),
}

impl FileIdentifier {
    /// Identifier for a name
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::ByName(name.into())
    }

    /// The name, if this identifier carries one
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::ByName(name) => Some(name),
            Self::ById(_) => None,
        }
    }

    /// Reject identifiers that can never resolve
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ByName(name) if name.is_empty() => {
                Err(MpkError::InvalidParameter("empty file name"))
            }
            _ => Ok(()),
        }
    }
}

impl From<u32> for FileIdentifier {
    fn from(index: u32) -> Self {
        Self::ById(index)
    }
}

impl From<&str> for FileIdentifier {
    fn from(name: &str) -> Self {
        Self::ByName(name.to_owned())
    }
}

impl From<String> for FileIdentifier {
    fn from(name: String) -> Self {
        Self::ByName(name)
    }
}

impl From<&FileIdentifier> for FileIdentifier {
    fn from(id: &FileIdentifier) -> Self {
        id.clone()
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(index) => write!(f, "#{index}"),
            Self::ByName(name) => f.write_str(name),
        }
    }
}

/// Where an open looks for the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Inside the archive
    #[default]
    FromArchive,
    /// On the host filesystem; the name is a path
    LocalFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(FileIdentifier::from(3), FileIdentifier::ById(3));
        assert_eq!(
            FileIdentifier::from("a.txt"),
            FileIdentifier::ByName("a.txt".to_string())
        );
        assert_eq!(FileIdentifier::by_name("a.txt").name(), Some("a.txt"));
        assert_eq!(FileIdentifier::ById(1).name(), None);
    }

    #[test]
    fn test_empty_name_is_invalid() {
        assert!(matches!(
            FileIdentifier::from("").validate(),
            Err(MpkError::InvalidParameter(_))
        ));
        assert!(FileIdentifier::ById(0).validate().is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(FileIdentifier::ById(12).to_string(), "#12");
        assert_eq!(FileIdentifier::from("x\\y.txt").to_string(), "x\\y.txt");
    }
}
