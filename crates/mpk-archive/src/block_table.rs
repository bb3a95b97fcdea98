//! Block table records and flags

use binrw::{BinRead, BinWrite};
use std::fmt;

/// Block flags bitmask
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[brw(little)]
pub struct BlockFlags(pub u32);

impl BlockFlags {
    /// Compressed with the PKWARE implode codec
    pub const IMPLODE: u32 = 0x0000_0100;

    /// Compressed with one or more codecs
    pub const COMPRESS: u32 = 0x0000_0200;

    /// Any compression
    pub const COMPRESSED: u32 = Self::IMPLODE | Self::COMPRESS;

    /// Encrypted with a name-derived seed
    pub const ENCRYPTED: u32 = 0x0001_0000;

    /// Seed is adjusted by the block position and size
    pub const FIX_SEED: u32 = 0x0002_0000;

    /// Stored as one unit instead of fixed-size blocks
    pub const SINGLE_UNIT: u32 = 0x0100_0000;

    /// Marks a deleted file in patch archives
    pub const DELETE_MARKER: u32 = 0x0200_0000;

    /// Each block is followed by a checksum
    pub const SECTOR_CRC: u32 = 0x0400_0000;

    /// The slot holds a file
    pub const EXISTS: u32 = 0x8000_0000;

    /// Every flag bit this reader understands
    pub const VALID_FLAGS: u32 = Self::COMPRESSED
        | Self::ENCRYPTED
        | Self::FIX_SEED
        | Self::SINGLE_UNIT
        | Self::DELETE_MARKER
        | Self::SECTOR_CRC
        | Self::EXISTS;

    /// Create flags from a raw value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Check if any bit of `flag` is set
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Bits outside [`Self::VALID_FLAGS`]
    pub const fn unknown_bits(self) -> u32 {
        self.0 & !Self::VALID_FLAGS
    }

    /// Check if the slot holds a file
    pub const fn exists(self) -> bool {
        self.has(Self::EXISTS)
    }

    /// Check if the file is compressed
    pub const fn is_compressed(self) -> bool {
        self.has(Self::COMPRESSED)
    }

    /// Check if the file is encrypted
    pub const fn is_encrypted(self) -> bool {
        self.has(Self::ENCRYPTED)
    }

    /// Check if the seed is position-adjusted
    pub const fn has_fix_seed(self) -> bool {
        self.has(Self::FIX_SEED)
    }

    /// Check if the file is a single unit
    pub const fn is_single_unit(self) -> bool {
        self.has(Self::SINGLE_UNIT)
    }
}

impl fmt::Display for BlockFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<u32> for BlockFlags {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Block table entry (16 bytes)
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[brw(little)]
pub struct BlockEntry {
    /// Offset of the file data, relative to the archive base position
    pub file_pos: u32,
    /// Stored size
    pub compressed_size: u32,
    /// Uncompressed size
    pub full_size: u32,
    /// Flags
    pub flags: BlockFlags,
}

impl BlockEntry {
    /// Create a block entry
    pub const fn new(file_pos: u32, compressed_size: u32, full_size: u32, flags: u32) -> Self {
        Self {
            file_pos,
            compressed_size,
            full_size,
            flags: BlockFlags::new(flags),
        }
    }

    /// Number of `block_size` units covering the uncompressed data
    ///
    /// `block_size` must be non-zero.
    pub const fn block_count(&self, block_size: u32) -> u32 {
        self.full_size.div_ceil(block_size)
    }
}
