//! Loaded archive: header, tables and per-archive state
//!
//! Tables are read once, decrypted and parsed into owned vectors. After
//! loading they are never modified, so lookups take `&self` and need no
//! locking. The only mutable state is the preferred locale, the attached
//! listfile and the last-opened-file cache.

use crate::block_table::BlockEntry;
use crate::config::ArchiveConfig;
use crate::error::{MpkError, Result};
use crate::file::{self, FileId, MpkFile};
use crate::hash_table::{HashEntry, HashSlot, HashTable};
use crate::header::{MpkHeader, TABLE_ENTRY_SIZE};
use crate::identifier::{FileIdentifier, SearchScope};
use crate::listfile::Listfile;
use crate::locale::Locale;
use crate::port::{NativeFile, OpenMode};
use binrw::BinRead;
use binrw::io::Cursor;
use mpk_crypto::{NameHash, decrypt_table, table_key};
use parking_lot::{Mutex, RwLock};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Key name of the encrypted hash table
const HASH_TABLE_KEY: &str = "(hash table)";

/// Key name of the encrypted block table
const BLOCK_TABLE_KEY: &str = "(block table)";

/// An open MPK archive
#[derive(Debug)]
pub struct MpkArchive {
    header: MpkHeader,
    base_position: u64,
    block_size: u32,
    hash_table: HashTable,
    block_table: Vec<BlockEntry>,
    config: ArchiveConfig,
    locale: AtomicU16,
    listfile: RwLock<Listfile>,
    last_file: Mutex<Option<FileId>>,
    next_file_id: AtomicU64,
}

impl MpkArchive {
    /// Open an archive file from disk
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened, and otherwise any
    /// error from [`MpkArchive::from_reader`].
    pub fn open(path: impl AsRef<Path>, config: ArchiveConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening archive {}", path.display());
        let file = NativeFile::open(path, OpenMode::OpenExisting)?;
        Self::from_reader(BufReader::new(file), config)
    }

    /// Load an archive from any seekable source
    ///
    /// The header may sit at any 512-byte boundary within the source; its
    /// offset becomes the base position for every table and block offset.
    ///
    /// # Errors
    ///
    /// - `BadFormat` if no header is found or its block size is out of range
    /// - `FileCorrupt` if a table extends past the end of the source or the
    ///   hash table size is rejected by the configuration
    /// - `NotEnoughMemory` if a table cannot be allocated
    pub fn from_reader<R: Read + Seek>(mut reader: R, config: ArchiveConfig) -> Result<Self> {
        let (base_position, header) = MpkHeader::find(&mut reader, config.header_search_limit)?;
        header.validate(config.strict_hash_table_size)?;

        let source_len = reader.seek(SeekFrom::End(0))?;
        if base_position + u64::from(header.archive_size) > source_len {
            warn!(
                "Archive claims {} bytes at {:#x} but the source holds {}",
                header.archive_size, base_position, source_len
            );
        }

        let hash_entries: Vec<HashEntry> = read_table(
            &mut reader,
            base_position + u64::from(header.hash_table_pos),
            header.hash_table_size,
            HASH_TABLE_KEY,
            source_len,
        )?;
        let block_table: Vec<BlockEntry> = read_table(
            &mut reader,
            base_position + u64::from(header.block_table_pos),
            header.block_table_size,
            BLOCK_TABLE_KEY,
            source_len,
        )?;

        let slots = hash_entries.into_iter().map(HashSlot::from_entry).collect();
        Self::from_tables(header, base_position, slots, block_table, config)
    }

    /// Build an archive from already-decoded tables
    ///
    /// # Errors
    ///
    /// Returns `FileCorrupt` if the table lengths disagree with the header,
    /// and any error from [`MpkHeader::validate`].
    pub fn from_tables(
        header: MpkHeader,
        base_position: u64,
        hash_slots: Vec<HashSlot>,
        block_table: Vec<BlockEntry>,
        config: ArchiveConfig,
    ) -> Result<Self> {
        header.validate(config.strict_hash_table_size)?;

        if hash_slots.len() != header.hash_table_size as usize {
            return Err(MpkError::FileCorrupt(format!(
                "hash table has {} slots, header declares {}",
                hash_slots.len(),
                header.hash_table_size
            )));
        }
        if block_table.len() != header.block_table_size as usize {
            return Err(MpkError::FileCorrupt(format!(
                "block table has {} entries, header declares {}",
                block_table.len(),
                header.block_table_size
            )));
        }

        debug!(
            "Loaded archive at {:#x}: {} hash slots, {} blocks of {} bytes",
            base_position,
            hash_slots.len(),
            block_table.len(),
            header.block_size()
        );

        Ok(Self {
            block_size: header.block_size(),
            locale: AtomicU16::new(config.locale.value()),
            header,
            base_position,
            hash_table: HashTable::new(hash_slots),
            block_table,
            config,
            listfile: RwLock::new(Listfile::new()),
            last_file: Mutex::new(None),
            next_file_id: AtomicU64::new(1),
        })
    }

    /// Archive header
    pub const fn header(&self) -> &MpkHeader {
        &self.header
    }

    /// Offset of the archive header within its containing file
    pub const fn base_position(&self) -> u64 {
        self.base_position
    }

    /// Size in bytes of one compression/decryption unit
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Decoded hash table
    pub const fn hash_table(&self) -> &HashTable {
        &self.hash_table
    }

    /// Decoded block table
    pub fn block_table(&self) -> &[BlockEntry] {
        &self.block_table
    }

    /// Configuration the archive was loaded with
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Preferred locale for has-file checks and opens by name
    pub fn locale(&self) -> Locale {
        Locale::new(self.locale.load(Ordering::Relaxed))
    }

    /// Change the preferred locale
    pub fn set_locale(&self, locale: Locale) {
        debug!("Archive locale set to {}", locale);
        self.locale.store(locale.value(), Ordering::Relaxed);
    }

    /// Hash entry for `name`, preferring `locale` and falling back to neutral
    pub fn lookup(&self, name: &str, locale: Locale) -> Option<&HashEntry> {
        self.hash_table
            .lookup_with_fallback(&NameHash::of(name), locale)
            .map(|(_, entry)| entry)
    }

    /// Hash entry for `name` with exactly `locale`
    pub fn lookup_exact(&self, name: &str, locale: Locale) -> Option<&HashEntry> {
        self.hash_table
            .lookup_exact(&NameHash::of(name), locale)
            .map(|(_, entry)| entry)
    }

    /// Check if `name` exists in the archive's preferred locale or neutral
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name.
    pub fn has_file(&self, name: &str) -> Result<bool> {
        self.has_file_with_locale(name, self.locale())
    }

    /// Check if `name` exists in `locale` or neutral
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name.
    pub fn has_file_with_locale(&self, name: &str, locale: Locale) -> Result<bool> {
        if name.is_empty() {
            return Err(MpkError::InvalidParameter("empty file name"));
        }
        Ok(self.lookup(name, locale).is_some())
    }

    /// Locales stored for a file, in probe order
    ///
    /// An identifier by block index always yields exactly one locale.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for an empty name or a block index past the table
    /// - `FileNotFound` if no hash entry matches
    pub fn locales(&self, id: impl Into<FileIdentifier>) -> Result<Vec<Locale>> {
        let id = id.into();
        id.validate()?;

        match &id {
            FileIdentifier::ById(block_index) => {
                if *block_index as usize >= self.block_table.len() {
                    return Err(MpkError::InvalidParameter("block index out of range"));
                }
                let (_, entry) = self
                    .hash_table
                    .find_by_block_index(*block_index)
                    .ok_or(MpkError::FileNotFound)?;
                Ok(vec![entry.locale])
            }
            FileIdentifier::ByName(name) => {
                let (start, _) = self
                    .hash_table
                    .find_first(&NameHash::of(name))
                    .ok_or(MpkError::FileNotFound)?;
                let locales: Vec<Locale> = self
                    .hash_table
                    .locale_run(start)
                    .into_iter()
                    .map(|(_, entry)| entry.locale)
                    .collect();
                trace!("{} has {} locale(s)", name, locales.len());
                Ok(locales)
            }
        }
    }

    /// Fill `out` with the locales stored for a file
    ///
    /// Returns the number written. Callers that do not know the count can
    /// pass an empty slice first and retry with the `required` size.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBuffer { required }` when `out` is too small,
    /// plus every error of [`MpkArchive::locales`].
    pub fn enum_locales(&self, id: impl Into<FileIdentifier>, out: &mut [Locale]) -> Result<usize> {
        let locales = self.locales(id)?;
        if locales.len() > out.len() {
            return Err(MpkError::InsufficientBuffer {
                required: locales.len(),
            });
        }
        out[..locales.len()].copy_from_slice(&locales);
        Ok(locales.len())
    }

    /// Add names used to recover file names from block indices
    pub fn attach_listfile(&self, listfile: Listfile) {
        let mut current = self.listfile.write();
        current.extend(listfile);
        debug!("Listfile now holds {} names", current.len());
    }

    /// Recover the stored name of a block
    ///
    /// Searches the attached listfile for a name whose hash entry points at
    /// `block_index`. Unencrypted blocks without a known name get a
    /// `FileNNNNNNNN.xxx` placeholder.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if `block_index` is past the block table
    /// - `NameUnavailable` if the block is encrypted and no name matches
    pub fn recover_name(&self, block_index: u32) -> Result<String> {
        let block = self
            .block_table
            .get(block_index as usize)
            .ok_or(MpkError::FileNotFound)?;

        let known = self.listfile.read().iter().find_map(|name| {
            let hash = NameHash::of(name);
            self.hash_table
                .matches(&hash)
                .any(|(_, entry)| entry.block_index == block_index)
                .then(|| name.to_owned())
        });

        match known {
            Some(name) => Ok(name),
            None if block.flags.is_encrypted() => Err(MpkError::NameUnavailable { block_index }),
            None => Ok(format!("File{block_index:08}.xxx")),
        }
    }

    /// Open a file inside this archive
    ///
    /// # Errors
    ///
    /// See [`open_file_ex`](crate::open_file_ex).
    pub fn open_file(&self, id: impl Into<FileIdentifier>) -> Result<MpkFile<'_>> {
        file::open_file_ex(Some(self), id, SearchScope::FromArchive)
    }

    /// Close a file opened from this archive
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the handle belongs to another archive or
    /// is a local file. The handle is released either way.
    pub fn close_file(&self, file: MpkFile<'_>) -> Result<()> {
        match file.archive() {
            Some(owner) if std::ptr::eq(owner, self) => file.close(),
            _ => Err(MpkError::InvalidParameter(
                "file handle was not opened from this archive",
            )),
        }
    }

    /// Id of the most recently opened file that is still open
    pub fn last_opened_file(&self) -> Option<FileId> {
        *self.last_file.lock()
    }

    /// Allocate an id for a new handle and make it the last-opened file
    pub(crate) fn register_open(&self) -> FileId {
        let id = FileId::new(self.next_file_id.fetch_add(1, Ordering::Relaxed));
        *self.last_file.lock() = Some(id);
        id
    }

    /// Forget `id` if it is the cached last-opened file
    pub(crate) fn release(&self, id: FileId) {
        let mut last = self.last_file.lock();
        if *last == Some(id) {
            trace!("Clearing last-opened file {}", id);
            *last = None;
        }
    }
}

/// Read, decrypt and parse one table of 16-byte records
fn read_table<R, T>(
    reader: &mut R,
    offset: u64,
    count: u32,
    key_name: &str,
    source_len: u64,
) -> Result<Vec<T>>
where
    R: Read + Seek,
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let byte_len = u64::from(count) * TABLE_ENTRY_SIZE;
    let end = offset.saturating_add(byte_len);
    if end > source_len {
        warn!("{} ends at {:#x}, past the source end {:#x}", key_name, end, source_len);
        return Err(MpkError::FileCorrupt(format!(
            "{key_name} ends at {end:#x}, past the end of the file"
        )));
    }

    let byte_len = usize::try_from(byte_len).map_err(|_| MpkError::NotEnoughMemory)?;
    let mut data = Vec::new();
    data.try_reserve_exact(byte_len)
        .map_err(|_| MpkError::NotEnoughMemory)?;
    data.resize(byte_len, 0);

    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut data)?;
    decrypt_table(&mut data, table_key(key_name))
        .map_err(|e| MpkError::FileCorrupt(e.to_string()))?;

    let mut records = Vec::new();
    records
        .try_reserve_exact(count as usize)
        .map_err(|_| MpkError::NotEnoughMemory)?;

    let mut cursor = Cursor::new(data);
    for _ in 0..count {
        records.push(T::read_le_args(&mut cursor, ())?);
    }

    trace!("Read {} records of {} at {:#x}", count, key_name, offset);
    Ok(records)
}
