//! Table-driven name hash for MPK hash tables
//!
//! A single 32-bit hash function is parameterized by a [`HashType`]. Each type
//! selects a different 256-entry slice of the shared crypt table, so the four
//! digests of a name are independent of each other. Names are uppercased byte
//! by byte (ASCII only) before hashing, which makes lookups case-insensitive.

use std::fmt;

/// Seed for generating the crypt table
const CRYPT_TABLE_SEED: u32 = 0x0010_0001;

/// Initial value of the first hash accumulator
const HASH_SEED_A: u32 = 0x7FED_7FED;

/// Initial value of the second hash accumulator
pub(crate) const HASH_SEED_B: u32 = 0xEEEE_EEEE;

/// Digest classes produced by [`hash_string`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HashType {
    /// Home slot of a name in the hash table
    TableIndex = 0,
    /// First name digest stored in a hash entry
    NameA = 1,
    /// Second name digest stored in a hash entry
    NameB = 2,
    /// Encryption key for a file or table
    FileKey = 3,
}

impl HashType {
    /// Offset of this hash type's slice in [`CRYPT_TABLE`]
    pub const fn table_offset(self) -> usize {
        (self as usize) << 8
    }
}

const fn generate_crypt_table() -> [u32; 0x500] {
    let mut table = [0u32; 0x500];
    let mut seed = CRYPT_TABLE_SEED;

    let mut index_a = 0;
    while index_a < 0x100 {
        let mut index_b = index_a;
        let mut i = 0;
        while i < 5 {
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let high = (seed & 0xFFFF) << 16;
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let low = seed & 0xFFFF;

            table[index_b] = high | low;

            i += 1;
            index_b += 0x100;
        }
        index_a += 1;
    }

    table
}

/// Shared crypt table
///
/// Slots `0x000..0x400` feed [`hash_string`] (one 256-entry slice per
/// [`HashType`]); slots `0x400..0x500` feed the block cipher.
pub static CRYPT_TABLE: [u32; 0x500] = generate_crypt_table();

/// Hash a name with the given digest class
///
/// # Examples
///
/// ```
/// use mpk_crypto::{HashType, hash_string};
///
/// assert_eq!(hash_string("arr\\units.dat", HashType::TableIndex), 0xF4E6_C69D);
/// assert_eq!(
///     hash_string("arr\\units.dat", HashType::NameA),
///     hash_string("ARR\\Units.DAT", HashType::NameA),
/// );
/// ```
pub fn hash_string(name: &str, hash_type: HashType) -> u32 {
    let offset = hash_type.table_offset();
    let mut seed_a = HASH_SEED_A;
    let mut seed_b = HASH_SEED_B;

    for byte in name.bytes() {
        let upper = byte.to_ascii_uppercase();
        seed_a = CRYPT_TABLE[offset + usize::from(upper)] ^ seed_a.wrapping_add(seed_b);
        seed_b = u32::from(upper)
            .wrapping_add(seed_a)
            .wrapping_add(seed_b)
            .wrapping_add(seed_b << 5)
            .wrapping_add(3);
    }

    seed_a
}

/// The three digests that place a name in the hash table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameHash {
    /// Unmasked home slot
    pub table_index: u32,
    /// First name digest
    pub name_a: u32,
    /// Second name digest
    pub name_b: u32,
}

impl NameHash {
    /// Compute all three lookup digests for a name
    pub fn of(name: &str) -> Self {
        Self {
            table_index: hash_string(name, HashType::TableIndex),
            name_a: hash_string(name, HashType::NameA),
            name_b: hash_string(name, HashType::NameB),
        }
    }

    /// Home slot in a table of `table_size` entries
    ///
    /// `table_size` must be non-zero.
    pub fn home_slot(&self, table_size: usize) -> usize {
        self.table_index as usize % table_size
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}:{:08x}:{:08x}",
            self.table_index, self.name_a, self.name_b
        )
    }
}
