//! File handles and the open/close lifecycle
//!
//! Opening validates the block, prepares the block-position table for
//! compressed files and derives the decryption seed for encrypted ones.
//! Reading the data itself happens elsewhere; a handle only carries what
//! that path needs.

use crate::archive::MpkArchive;
use crate::block_table::BlockEntry;
use crate::error::{MpkError, Result};
use crate::hash_table::HashEntry;
use crate::header::MpkHeader;
use crate::identifier::{FileIdentifier, SearchScope};
use crate::locale::Locale;
use crate::port::{NativeFile, OpenMode};
use mpk_crypto::{HashType, NameHash, hash_string};
use std::fmt;
use tracing::{debug, trace, warn};

/// Per-archive identity of an open file handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u64);

impl FileId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw id value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// An open file
///
/// Borrows the archive it was opened from. Dropping the handle has the same
/// effect as [`MpkFile::close`].
#[derive(Debug)]
pub struct MpkFile<'a> {
    name: String,
    kind: FileKind<'a>,
}

#[derive(Debug)]
enum FileKind<'a> {
    Archived(ArchivedFile<'a>),
    Local(NativeFile),
}

#[derive(Debug)]
struct ArchivedFile<'a> {
    archive: &'a MpkArchive,
    file_id: FileId,
    hash_index: usize,
    hash_entry: &'a HashEntry,
    block_index: u32,
    block: &'a BlockEntry,
    block_count: u32,
    seed: u32,
    /// `block_count + 1` offsets, filled lazily by the data path
    block_positions: Option<Vec<u32>>,
}

/// Open a file from an archive or from the host filesystem
///
/// With [`SearchScope::LocalFile`] a name is opened as a host path and the
/// archive is not consulted. Otherwise `archive` is required and the
/// identifier is resolved through its tables.
///
/// # Errors
///
/// - `InvalidParameter` for an empty name, or a missing archive when the
///   archive must be searched
/// - `FileNotFound` if nothing matches, the block index is past the block
///   table, or the block's exists flag is clear
/// - `NotSupported` if the block has unknown flag bits
/// - `FileCorrupt` if the block lies outside the archive
/// - `NotEnoughMemory` if the block-position table cannot be allocated
/// - `NameUnavailable` for an encrypted file opened by index whose name is
///   not in the attached listfile
/// - I/O errors from opening a local file
pub fn open_file_ex(
    archive: Option<&MpkArchive>,
    id: impl Into<FileIdentifier>,
    scope: SearchScope,
) -> Result<MpkFile<'_>> {
    let id = id.into();
    id.validate()?;

    if scope == SearchScope::LocalFile
        && let FileIdentifier::ByName(path) = &id
    {
        return MpkFile::open_local(path);
    }

    let archive = archive.ok_or(MpkError::InvalidParameter("no archive to search"))?;
    open_archived(archive, &id)
}

fn open_archived<'a>(archive: &'a MpkArchive, id: &FileIdentifier) -> Result<MpkFile<'a>> {
    let (hash_index, hash_entry) = match id {
        FileIdentifier::ById(block_index) => {
            if *block_index as usize >= archive.block_table().len() {
                return Err(MpkError::FileNotFound);
            }
            archive
                .hash_table()
                .find_by_block_index(*block_index)
                .ok_or(MpkError::FileNotFound)?
        }
        FileIdentifier::ByName(name) => archive
            .hash_table()
            .lookup_with_fallback(&NameHash::of(name), archive.locale())
            .ok_or(MpkError::FileNotFound)?,
    };

    let block_index = hash_entry.block_index;
    let block = archive
        .block_table()
        .get(block_index as usize)
        .ok_or(MpkError::FileNotFound)?;
    validate_block(archive.header(), block_index, block)?;

    let block_count = block.block_count(archive.block_size());
    let block_positions = if block.flags.is_compressed() {
        Some(allocate_block_positions(block_count)?)
    } else {
        None
    };

    let name = match id {
        FileIdentifier::ByName(name) => name.clone(),
        FileIdentifier::ById(index) => archive.recover_name(*index)?,
    };
    let seed = if block.flags.is_encrypted() {
        file_seed(&name, block)
    } else {
        0
    };

    let file_id = archive.register_open();
    debug!(
        "Opened {} as {}: hash slot {}, block {}, {} unit(s), flags {}",
        name, file_id, hash_index, block_index, block_count, block.flags
    );

    Ok(MpkFile {
        name,
        kind: FileKind::Archived(ArchivedFile {
            archive,
            file_id,
            hash_index,
            hash_entry,
            block_index,
            block,
            block_count,
            seed,
            block_positions,
        }),
    })
}

/// Check a block against the archive bounds and the known flag set
///
/// Unknown flags are reported first, then a cleared exists flag, then
/// out-of-bounds placement.
///
/// # Errors
///
/// `NotSupported`, `FileNotFound` or `FileCorrupt` as described above.
pub fn validate_block(header: &MpkHeader, block_index: u32, block: &BlockEntry) -> Result<()> {
    let unknown = block.flags.unknown_bits();
    if unknown != 0 {
        return Err(MpkError::NotSupported { flags: unknown });
    }

    if !block.flags.exists() {
        return Err(MpkError::FileNotFound);
    }

    if block.file_pos > header.archive_size || block.compressed_size > header.archive_size {
        warn!(
            "Block {} at {:#x} ({} bytes) lies outside the {}-byte archive",
            block_index, block.file_pos, block.compressed_size, header.archive_size
        );
        return Err(MpkError::FileCorrupt(format!(
            "block {block_index} lies outside the archive"
        )));
    }

    Ok(())
}

/// Decryption seed for a file
///
/// Only the part of `name` after the last backslash contributes. Blocks
/// with the fix-seed flag mix in their position and size.
pub fn file_seed(name: &str, block: &BlockEntry) -> u32 {
    let file_name = name.rsplit_once('\\').map_or(name, |(_, file_name)| file_name);
    let seed = hash_string(file_name, HashType::FileKey);

    if block.flags.has_fix_seed() {
        seed.wrapping_add(block.file_pos) ^ block.full_size
    } else {
        seed
    }
}

fn allocate_block_positions(block_count: u32) -> Result<Vec<u32>> {
    let len = block_count as usize + 1;
    let mut positions = Vec::new();
    positions
        .try_reserve_exact(len)
        .map_err(|_| MpkError::NotEnoughMemory)?;
    positions.resize(len, 0);
    Ok(positions)
}

impl<'a> MpkFile<'a> {
    fn open_local(path: &str) -> Result<Self> {
        let file = NativeFile::open(path, OpenMode::OpenExisting)?;
        debug!("Opened local file {}", path);
        Ok(Self {
            name: path.to_owned(),
            kind: FileKind::Local(file),
        })
    }

    /// Close the handle
    ///
    /// Clears the archive's last-opened-file cache if it points at this
    /// handle.
    ///
    /// # Errors
    ///
    /// Closing does not currently fail; the `Result` keeps the signature
    /// aligned with the other lifecycle operations.
    pub fn close(self) -> Result<()> {
        trace!("Closing {}", self.name);
        drop(self);
        Ok(())
    }

    /// Name the file was opened with, or the recovered name for opens by index
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this handle is a host file rather than an archived one
    pub const fn is_local(&self) -> bool {
        matches!(self.kind, FileKind::Local(_))
    }

    const fn archived(&self) -> Option<&ArchivedFile<'a>> {
        match &self.kind {
            FileKind::Archived(file) => Some(file),
            FileKind::Local(_) => None,
        }
    }

    /// Archive the file was opened from
    pub fn archive(&self) -> Option<&'a MpkArchive> {
        self.archived().map(|file| file.archive)
    }

    /// Handle id within the archive
    pub fn file_id(&self) -> Option<FileId> {
        self.archived().map(|file| file.file_id)
    }

    /// Hash table slot the file was resolved through
    pub fn hash_index(&self) -> Option<usize> {
        self.archived().map(|file| file.hash_index)
    }

    /// Hash entry the file was resolved through
    pub fn hash_entry(&self) -> Option<&'a HashEntry> {
        self.archived().map(|file| file.hash_entry)
    }

    /// Locale of the resolved hash entry
    pub fn locale(&self) -> Option<Locale> {
        self.hash_entry().map(|entry| entry.locale)
    }

    /// Block table index
    pub fn block_index(&self) -> Option<u32> {
        self.archived().map(|file| file.block_index)
    }

    /// Block table entry
    pub fn block(&self) -> Option<&'a BlockEntry> {
        self.archived().map(|file| file.block)
    }

    /// Number of compression/decryption units; 0 for local files
    pub fn block_count(&self) -> u32 {
        self.archived().map_or(0, |file| file.block_count)
    }

    /// Decryption seed; 0 unless the block is encrypted
    pub fn seed(&self) -> u32 {
        self.archived().map_or(0, |file| file.seed)
    }

    /// Block-position table, present only for compressed files
    pub fn block_positions(&self) -> Option<&[u32]> {
        self.archived()
            .and_then(|file| file.block_positions.as_deref())
    }

    /// Mutable block-position table for filling on first read
    pub fn block_positions_mut(&mut self) -> Option<&mut [u32]> {
        match &mut self.kind {
            FileKind::Archived(file) => file.block_positions.as_deref_mut(),
            FileKind::Local(_) => None,
        }
    }

    /// Absolute offset of the file data within the containing file
    pub fn raw_position(&self) -> Option<u64> {
        self.archived()
            .map(|file| file.archive.base_position() + u64::from(file.block.file_pos))
    }

    /// Host file behind a local handle
    pub const fn local_file_mut(&mut self) -> Option<&mut NativeFile> {
        match &mut self.kind {
            FileKind::Local(file) => Some(file),
            FileKind::Archived(_) => None,
        }
    }
}

impl Drop for MpkFile<'_> {
    fn drop(&mut self) {
        if let FileKind::Archived(file) = &self.kind {
            file.archive.release(file.file_id);
        }
    }
}
