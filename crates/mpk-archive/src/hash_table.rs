//! Hash table records and open-addressed lookup
//!
//! The hash table maps a name's two digests plus a locale to a block index.
//! A name's home slot is its table-index digest modulo the table size;
//! collisions go to the next slot, wrapping at the end. A probe ends at the
//! first never-used slot or after visiting every slot once. Freed slots do
//! not end a probe, so names placed behind them stay reachable.
//!
//! On disk the slot state is encoded in `block_index` (`0xFFFFFFFF` never
//! used, `0xFFFFFFFE` freed). In memory it is the explicit [`HashSlot`] tag.

use crate::locale::Locale;
use binrw::{BinRead, BinWrite};
use mpk_crypto::NameHash;
use tracing::trace;

/// Hash table entry (16 bytes)
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct HashEntry {
    /// First name digest
    pub name_a: u32,
    /// Second name digest
    pub name_b: u32,
    /// Locale of this variant
    pub locale: Locale,
    /// Platform (always 0 in practice)
    pub platform: u16,
    /// Index into the block table
    pub block_index: u32,
}

impl HashEntry {
    /// On-disk `block_index` of a slot that was never used
    pub const BLOCK_INDEX_EMPTY: u32 = 0xFFFF_FFFF;

    /// On-disk `block_index` of a slot that was freed
    pub const BLOCK_INDEX_TOMBSTONE: u32 = 0xFFFF_FFFE;

    /// Create an entry for a name
    pub fn new(name: &str, locale: Locale, block_index: u32) -> Self {
        Self::from_hash(&NameHash::of(name), locale, block_index)
    }

    /// Create an entry from precomputed digests
    pub const fn from_hash(hash: &NameHash, locale: Locale, block_index: u32) -> Self {
        Self {
            name_a: hash.name_a,
            name_b: hash.name_b,
            locale,
            platform: 0,
            block_index,
        }
    }

    /// Check if the entry carries the given name digests
    pub const fn matches(&self, hash: &NameHash) -> bool {
        self.name_a == hash.name_a && self.name_b == hash.name_b
    }

    /// Check if two entries carry the same name digests
    pub const fn same_name(&self, other: &Self) -> bool {
        self.name_a == other.name_a && self.name_b == other.name_b
    }
}

/// State of one hash table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashSlot {
    /// Never used; ends a probe
    Empty,
    /// Used, then freed; a probe continues past it
    Tombstone,
    /// Holds a file entry
    Occupied(HashEntry),
}

impl HashSlot {
    /// Decode a raw record
    pub const fn from_entry(entry: HashEntry) -> Self {
        match entry.block_index {
            HashEntry::BLOCK_INDEX_EMPTY => Self::Empty,
            HashEntry::BLOCK_INDEX_TOMBSTONE => Self::Tombstone,
            _ => Self::Occupied(entry),
        }
    }

    /// Encode as a raw record
    pub const fn to_entry(&self) -> HashEntry {
        match self {
            Self::Occupied(entry) => *entry,
            Self::Empty | Self::Tombstone => HashEntry {
                name_a: u32::MAX,
                name_b: u32::MAX,
                locale: Locale(u16::MAX),
                platform: u16::MAX,
                block_index: if matches!(self, Self::Empty) {
                    HashEntry::BLOCK_INDEX_EMPTY
                } else {
                    HashEntry::BLOCK_INDEX_TOMBSTONE
                },
            },
        }
    }

    /// The entry, if the slot is occupied
    pub const fn entry(&self) -> Option<&HashEntry> {
        match self {
            Self::Occupied(entry) => Some(entry),
            Self::Empty | Self::Tombstone => None,
        }
    }
}

impl From<HashEntry> for HashSlot {
    fn from(entry: HashEntry) -> Self {
        Self::from_entry(entry)
    }
}

/// Fixed-size open-addressed hash table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTable {
    slots: Vec<HashSlot>,
}

impl HashTable {
    /// Wrap decoded slots
    pub fn new(slots: Vec<HashSlot>) -> Self {
        Self { slots }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the table has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots in storage order
    pub fn slots(&self) -> &[HashSlot] {
        &self.slots
    }

    /// Slot at `index`
    pub fn get(&self, index: usize) -> Option<&HashSlot> {
        self.slots.get(index)
    }

    /// Occupied entry at `index`
    pub fn entry(&self, index: usize) -> Option<&HashEntry> {
        self.slots.get(index).and_then(HashSlot::entry)
    }

    /// Visit slots in probe order starting at `start`
    ///
    /// Yields every slot at most once, wrapping at the end of the table.
    fn probe_order(&self, start: usize) -> impl Iterator<Item = (usize, &HashSlot)> {
        let len = self.slots.len();
        (0..len).map(move |step| {
            let index = (start + step) % len;
            (index, &self.slots[index])
        })
    }

    /// Occupied entries carrying the name's digests, in probe order
    ///
    /// Stops at the first never-used slot.
    pub fn matches<'a>(
        &'a self,
        hash: &NameHash,
    ) -> impl Iterator<Item = (usize, &'a HashEntry)> + use<'a> {
        let hash = *hash;
        let start = if self.slots.is_empty() {
            0
        } else {
            hash.home_slot(self.slots.len())
        };

        self.probe_order(start)
            .take_while(|(_, slot)| !matches!(slot, HashSlot::Empty))
            .filter_map(move |(index, slot)| {
                let entry = slot.entry()?;
                trace!("Probe slot {} ({:?})", index, entry.locale);
                entry.matches(&hash).then_some((index, entry))
            })
    }

    /// First entry for the name in probe order, whatever its locale
    pub fn find_first(&self, hash: &NameHash) -> Option<(usize, &HashEntry)> {
        self.matches(hash).next()
    }

    /// Entry for the name with exactly the given locale
    pub fn lookup_exact(&self, hash: &NameHash, locale: Locale) -> Option<(usize, &HashEntry)> {
        self.matches(hash).find(|(_, entry)| entry.locale == locale)
    }

    /// Entry for the name, preferring `locale` and falling back to neutral
    ///
    /// Returns `None` when neither the requested nor the neutral locale is
    /// present, even if other locale variants exist.
    pub fn lookup_with_fallback(
        &self,
        hash: &NameHash,
        locale: Locale,
    ) -> Option<(usize, &HashEntry)> {
        let mut neutral = None;

        for (index, entry) in self.matches(hash) {
            if entry.locale == locale {
                return Some((index, entry));
            }
            if entry.locale.is_neutral() && neutral.is_none() {
                neutral = Some((index, entry));
            }
        }

        neutral
    }

    /// Run of entries sharing the digests of the entry at `start`
    ///
    /// Walks forward in probe order from `start` until a slot that is not an
    /// occupied entry with the same digests. The walk wraps past the last
    /// slot so a run split across the table end is reported whole.
    pub fn locale_run(&self, start: usize) -> Vec<(usize, &HashEntry)> {
        let Some(first) = self.entry(start) else {
            return Vec::new();
        };

        self.probe_order(start)
            .map_while(|(index, slot)| {
                slot.entry()
                    .filter(|entry| entry.same_name(first))
                    .map(|entry| (index, entry))
            })
            .collect()
    }

    /// First occupied entry pointing at `block_index`, in storage order
    pub fn find_by_block_index(&self, block_index: u32) -> Option<(usize, &HashEntry)> {
        self.slots
            .iter()
            .enumerate()
            .find_map(|(index, slot)| {
                slot.entry()
                    .filter(|entry| entry.block_index == block_index)
                    .map(|entry| (index, entry))
            })
    }
}
