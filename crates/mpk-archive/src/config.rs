//! Configuration for opening archives

use crate::locale::Locale;
use serde::{Deserialize, Serialize};

/// Configuration applied when an archive is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Preferred locale for has-file checks and opens by name
    pub locale: Locale,

    /// How many bytes into the containing file to search for the header
    ///
    /// `None` searches the whole file.
    pub header_search_limit: Option<u64>,

    /// Reject hash tables whose size is not a non-zero power of two
    pub strict_hash_table_size: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            locale: Locale::NEUTRAL,
            header_search_limit: None,
            strict_hash_table_size: true,
        }
    }
}

impl ArchiveConfig {
    /// Create a configuration with the given preferred locale
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    /// Set the preferred locale
    #[must_use]
    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Limit the header search to the first `limit` bytes
    #[must_use]
    pub const fn with_header_search_limit(mut self, limit: u64) -> Self {
        self.header_search_limit = Some(limit);
        self
    }

    /// Enable or disable the power-of-two hash table check
    #[must_use]
    pub const fn with_strict_hash_table_size(mut self, strict: bool) -> Self {
        self.strict_hash_table_size = strict;
        self
    }
}
