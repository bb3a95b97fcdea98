//! Fixture helpers for building tables in tests

use crate::block_table::BlockEntry;
use crate::hash_table::{HashEntry, HashSlot};
use crate::header::MpkHeader;
use crate::locale::Locale;
use mpk_crypto::NameHash;

/// Place a name into the first free slot of its probe sequence
///
/// Returns the slot index. Panics if the table is full.
pub fn place(slots: &mut [HashSlot], name: &str, locale: Locale, block_index: u32) -> usize {
    let hash = NameHash::of(name);
    let len = slots.len();
    let home = hash.home_slot(len);

    let index = (0..len)
        .map(|step| (home + step) % len)
        .find(|&index| !matches!(slots[index], HashSlot::Occupied(_)))
        .unwrap_or_else(|| panic!("hash table full while placing {name}"));

    slots[index] = HashSlot::Occupied(HashEntry::from_hash(&hash, locale, block_index));
    index
}

/// Header sized for the given tables
///
/// The archive size leaves room for `data_size` bytes of file data.
pub fn header_for(hash_table_size: u32, block_table_size: u32, data_size: u32) -> MpkHeader {
    let mut header = MpkHeader::new(hash_table_size, block_table_size);
    header.archive_size += data_size;
    header
}

/// A plain stored block of `size` bytes at `file_pos`
pub fn stored_block(file_pos: u32, size: u32, flags: u32) -> BlockEntry {
    BlockEntry::new(file_pos, size, size, flags)
}
