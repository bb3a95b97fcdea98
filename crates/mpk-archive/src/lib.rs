//! Read access to MPK archives
//!
//! An MPK archive stores many logical files behind two encrypted tables:
//!
//! - a **hash table**, open-addressed, mapping two digests of a file name
//!   plus a locale tag to a block index
//! - a **block table** describing where each file lives, how large it is and
//!   whether it is compressed or encrypted
//!
//! This crate loads those tables and implements the lookup, locale
//! enumeration and open/close lifecycle on top of them. Decompression and
//! decryption of file data are left to the caller; an [`MpkFile`] carries the
//! block layout and seed that path needs.
//!
//! # Examples
//!
//! ```no_run
//! use mpk_archive::{ArchiveConfig, Locale, MpkArchive};
//!
//! # fn main() -> mpk_archive::Result<()> {
//! let archive = MpkArchive::open("war3.mpk", ArchiveConfig::new(Locale::EN_US))?;
//!
//! if archive.has_file("units\\human\\footman.mdx")? {
//!     let file = archive.open_file("units\\human\\footman.mdx")?;
//!     println!("{} spans {} unit(s)", file.name(), file.block_count());
//!     file.close()?;
//! }
//!
//! for locale in archive.locales("war3.w3m")? {
//!     println!("stored for {locale}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod block_table;
pub mod config;
pub mod error;
pub mod file;
pub mod hash_table;
pub mod header;
pub mod identifier;
pub mod listfile;
pub mod locale;
pub mod port;

#[cfg(test)]
mod test_utils;

pub use archive::MpkArchive;
pub use block_table::{BlockEntry, BlockFlags};
pub use config::ArchiveConfig;
pub use error::{MpkError, Result};
pub use file::{FileId, MpkFile, file_seed, open_file_ex, validate_block};
pub use hash_table::{HashEntry, HashSlot, HashTable};
pub use header::MpkHeader;
pub use identifier::{FileIdentifier, SearchScope};
pub use listfile::Listfile;
pub use locale::Locale;
pub use port::{ErrorCode, NativeFile, OpenMode};

/// Re-exported hashing primitives
pub use mpk_crypto::{HashType, NameHash};
