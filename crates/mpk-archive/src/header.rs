//! Archive header and header search
//!
//! The header is 32 bytes, little-endian:
//!
//! ```text
//! 0x00  magic             "MPK\x1A"
//! 0x04  header_size       u32
//! 0x08  archive_size      u32
//! 0x0C  format_version    u16
//! 0x0E  block_size_shift  u16   block size = 512 << shift
//! 0x10  hash_table_pos    u32   relative to the header
//! 0x14  block_table_pos   u32   relative to the header
//! 0x18  hash_table_size   u32   entries
//! 0x1C  block_table_size  u32   entries
//! ```
//!
//! Archives may be embedded in a larger file. The header is searched at every
//! 512-byte boundary and its offset becomes the archive's base position.

use crate::error::{MpkError, Result};
use binrw::{BinRead, BinWrite};
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace};

/// Header signature
pub const MPK_MAGIC: [u8; 4] = *b"MPK\x1A";

/// Size of the header in bytes
pub const HEADER_SIZE: u32 = 32;

/// Alignment at which embedded headers are searched
pub const HEADER_ALIGNMENT: u64 = 0x200;

/// Largest supported `block_size_shift` (2 GiB blocks would overflow `u32`)
pub const MAX_BLOCK_SIZE_SHIFT: u16 = 22;

/// Size of a hash or block table record in bytes
pub const TABLE_ENTRY_SIZE: u64 = 16;

/// Archive header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"MPK\x1A")]
pub struct MpkHeader {
    /// Size of the header in bytes
    pub header_size: u32,
    /// Size of the archive, counted from the header
    pub archive_size: u32,
    /// Format version (0 for the original layout)
    pub format_version: u16,
    /// Block size as a power of two times 512
    pub block_size_shift: u16,
    /// Hash table offset relative to the header
    pub hash_table_pos: u32,
    /// Block table offset relative to the header
    pub block_table_pos: u32,
    /// Number of hash table entries
    pub hash_table_size: u32,
    /// Number of block table entries
    pub block_table_size: u32,
}

impl MpkHeader {
    /// Create a header with tables placed directly after it
    ///
    /// Uses 4 KiB blocks; the archive size covers the header and both tables.
    pub fn new(hash_table_size: u32, block_table_size: u32) -> Self {
        let hash_table_pos = HEADER_SIZE;
        let block_table_pos = hash_table_pos + hash_table_size * TABLE_ENTRY_SIZE as u32;
        Self {
            header_size: HEADER_SIZE,
            archive_size: block_table_pos + block_table_size * TABLE_ENTRY_SIZE as u32,
            format_version: 0,
            block_size_shift: 3,
            hash_table_pos,
            block_table_pos,
            hash_table_size,
            block_table_size,
        }
    }

    /// Size in bytes of one compression/decryption unit
    pub const fn block_size(&self) -> u32 {
        0x200 << self.block_size_shift
    }

    /// Check the header fields that the lookup code relies on
    pub fn validate(&self, strict_hash_table_size: bool) -> Result<()> {
        if self.block_size_shift > MAX_BLOCK_SIZE_SHIFT {
            return Err(MpkError::BadFormat(format!(
                "block size shift {} out of range",
                self.block_size_shift
            )));
        }

        if strict_hash_table_size && !self.hash_table_size.is_power_of_two() {
            return Err(MpkError::FileCorrupt(format!(
                "hash table size {} is not a power of two",
                self.hash_table_size
            )));
        }

        Ok(())
    }

    /// Locate and parse the header
    ///
    /// Returns the header's absolute offset (the archive base position) and
    /// the parsed header. `limit` caps how far into the file the search runs.
    pub fn find<R: Read + Seek>(reader: &mut R, limit: Option<u64>) -> Result<(u64, Self)> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        let end = limit.map_or(file_len, |limit| limit.min(file_len));

        let mut offset = 0u64;
        while offset.saturating_add(u64::from(HEADER_SIZE)) <= end {
            reader.seek(SeekFrom::Start(offset))?;
            let mut magic = [0u8; 4];
            reader.read_exact(&mut magic)?;

            if magic == MPK_MAGIC {
                trace!("Found header magic at {:#x}", offset);
                reader.seek(SeekFrom::Start(offset))?;
                let header = Self::read(reader)?;
                debug!(
                    "Archive header at {:#x}: {} hash entries, {} blocks, {} bytes",
                    offset, header.hash_table_size, header.block_table_size, header.archive_size
                );
                return Ok((offset, header));
            }

            offset += HEADER_ALIGNMENT;
        }

        Err(MpkError::BadFormat(format!(
            "no archive header in the first {end} bytes"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    fn header_bytes(header: &MpkHeader) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        header.write(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_header_layout() {
        let header = MpkHeader::new(4, 2);
        let bytes = header_bytes(&header);

        assert_eq!(bytes.len(), HEADER_SIZE as usize);
        assert_eq!(&bytes[..4], b"MPK\x1A");
        assert_eq!(&bytes[0x18..0x1C], &4u32.to_le_bytes());
        assert_eq!(&bytes[0x1C..0x20], &2u32.to_le_bytes());
        assert_eq!(header.hash_table_pos, 32);
        assert_eq!(header.block_table_pos, 32 + 4 * 16);
        assert_eq!(header.archive_size, 32 + 6 * 16);
    }

    #[test]
    fn test_block_size() {
        let mut header = MpkHeader::new(4, 1);
        assert_eq!(header.block_size(), 4096);
        header.block_size_shift = 0;
        assert_eq!(header.block_size(), 512);
    }

    #[test]
    fn test_find_at_start() {
        let header = MpkHeader::new(8, 1);
        let mut cursor = Cursor::new(header_bytes(&header));
        let (base, found) = MpkHeader::find(&mut cursor, None).unwrap();
        assert_eq!(base, 0);
        assert_eq!(found, header);
    }

    #[test]
    fn test_find_embedded() {
        let header = MpkHeader::new(8, 1);
        let mut data = vec![0xCCu8; 0x400];
        data.extend(header_bytes(&header));
        let mut cursor = Cursor::new(data);

        let (base, found) = MpkHeader::find(&mut cursor, None).unwrap();
        assert_eq!(base, 0x400);
        assert_eq!(found, header);
    }

    #[test]
    fn test_find_respects_limit() {
        let mut data = vec![0u8; 0x400];
        data.extend(header_bytes(&MpkHeader::new(8, 1)));
        let mut cursor = Cursor::new(data);

        let err = MpkHeader::find(&mut cursor, Some(0x200)).unwrap_err();
        assert!(matches!(err, MpkError::BadFormat(_)));
    }

    #[test]
    fn test_find_ignores_unaligned_magic() {
        let mut data = vec![0u8; 0x10];
        data.extend(header_bytes(&MpkHeader::new(8, 1)));
        let mut cursor = Cursor::new(data);
        assert!(MpkHeader::find(&mut cursor, None).is_err());
    }

    #[test]
    fn test_validate() {
        let header = MpkHeader::new(6, 1);
        assert!(matches!(
            header.validate(true),
            Err(MpkError::FileCorrupt(_))
        ));
        assert!(header.validate(false).is_ok());

        let mut header = MpkHeader::new(8, 1);
        header.block_size_shift = 23;
        assert!(matches!(header.validate(true), Err(MpkError::BadFormat(_))));
    }
}
