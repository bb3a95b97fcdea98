//! End-to-end tests against archives written to disk
#![allow(clippy::expect_used, clippy::unwrap_used)]

use binrw::BinWrite;
use binrw::io::Cursor;
use mpk_archive::{
    ArchiveConfig, BlockEntry, BlockFlags, ErrorCode, FileIdentifier, HashEntry, HashSlot,
    HashType, Listfile, Locale, MpkArchive, MpkError, MpkHeader, NameHash, SearchScope,
    open_file_ex,
};
use mpk_crypto::{encrypt_bytes, hash_string, table_key};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const PREFIX_LEN: usize = 0x200;
const HASH_TABLE_SIZE: u32 = 8;

struct Fixture {
    name: &'static str,
    locale: Locale,
    flags: u32,
    data: &'static [u8],
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "readme.txt",
        locale: Locale::NEUTRAL,
        flags: BlockFlags::EXISTS,
        data: b"hello mpk",
    },
    Fixture {
        name: "readme.txt",
        locale: Locale::DE_DE,
        flags: BlockFlags::EXISTS,
        data: b"hallo mpk",
    },
    Fixture {
        name: "scripts\\war3map.j",
        locale: Locale::NEUTRAL,
        flags: BlockFlags::EXISTS | BlockFlags::ENCRYPTED | BlockFlags::FIX_SEED,
        data: b"function main takes nothing",
    },
    Fixture {
        name: "units\\old.mdx",
        locale: Locale::NEUTRAL,
        flags: 0,
        data: b"",
    },
];

fn place(slots: &mut [HashSlot], name: &str, locale: Locale, block_index: u32) {
    let hash = NameHash::of(name);
    let home = hash.home_slot(slots.len());
    let index = (0..slots.len())
        .map(|step| (home + step) % slots.len())
        .find(|&index| !matches!(slots[index], HashSlot::Occupied(_)))
        .unwrap();
    slots[index] = HashSlot::Occupied(HashEntry::from_hash(&hash, locale, block_index));
}

fn encrypted_table<T: for<'a> BinWrite<Args<'a> = ()>>(records: &[T], key_name: &str) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    for record in records {
        record.write_le(&mut cursor).unwrap();
    }
    let mut bytes = cursor.into_inner();
    encrypt_bytes(&mut bytes, table_key(key_name));
    bytes
}

/// Build an archive behind a 512-byte prefix and return its bytes
fn build_archive() -> (Vec<u8>, Vec<BlockEntry>) {
    let mut header = MpkHeader::new(HASH_TABLE_SIZE, FIXTURES.len() as u32);
    let data_start = header.archive_size;

    let mut slots = vec![HashSlot::Empty; HASH_TABLE_SIZE as usize];
    let mut blocks = Vec::new();
    let mut data = Vec::new();
    for (index, fixture) in FIXTURES.iter().enumerate() {
        place(&mut slots, fixture.name, fixture.locale, index as u32);
        let size = fixture.data.len() as u32;
        blocks.push(BlockEntry::new(
            data_start + data.len() as u32,
            size,
            size,
            fixture.flags,
        ));
        data.extend_from_slice(fixture.data);
    }
    header.archive_size += data.len() as u32;

    let entries: Vec<HashEntry> = slots.iter().map(HashSlot::to_entry).collect();

    let mut bytes = vec![0xA5; PREFIX_LEN];
    let mut cursor = Cursor::new(Vec::new());
    header.write(&mut cursor).unwrap();
    bytes.extend(cursor.into_inner());
    bytes.extend(encrypted_table(&entries, "(hash table)"));
    bytes.extend(encrypted_table(&blocks, "(block table)"));
    bytes.extend(data);

    (bytes, blocks)
}

fn write_archive() -> (NamedTempFile, Vec<BlockEntry>) {
    let (bytes, blocks) = build_archive();
    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(&bytes).unwrap();
    temp.flush().unwrap();
    (temp, blocks)
}

#[test]
fn test_load_embedded_archive() {
    let (temp, blocks) = write_archive();
    let archive = MpkArchive::open(temp.path(), ArchiveConfig::default()).unwrap();

    assert_eq!(archive.base_position(), PREFIX_LEN as u64);
    assert_eq!(archive.hash_table().len(), HASH_TABLE_SIZE as usize);
    assert_eq!(archive.block_table(), blocks.as_slice());
    assert_eq!(archive.block_size(), 0x1000);
}

#[test]
fn test_lookup_and_locales() {
    let (temp, _) = write_archive();
    let archive = MpkArchive::open(temp.path(), ArchiveConfig::new(Locale::DE_DE)).unwrap();

    assert!(archive.has_file("README.TXT").unwrap());
    assert!(archive.has_file("scripts\\war3map.j").unwrap());
    assert!(!archive.has_file("scripts\\missing.j").unwrap());

    assert_eq!(archive.lookup("readme.txt", Locale::DE_DE).unwrap().block_index, 1);
    assert_eq!(archive.lookup("readme.txt", Locale::FR_FR).unwrap().block_index, 0);

    let locales = archive.locales("readme.txt").unwrap();
    assert_eq!(locales.len(), 2);
    assert!(locales.contains(&Locale::NEUTRAL));
    assert!(locales.contains(&Locale::DE_DE));

    let mut out = [Locale::NEUTRAL; 1];
    assert!(matches!(
        archive.enum_locales("readme.txt", &mut out),
        Err(MpkError::InsufficientBuffer { required: 2 })
    ));
}

#[test]
fn test_open_files() {
    let (temp, blocks) = write_archive();
    let archive = MpkArchive::open(temp.path(), ArchiveConfig::new(Locale::DE_DE)).unwrap();

    let readme = archive.open_file("readme.txt").unwrap();
    assert_eq!(readme.block_index(), Some(1));
    assert_eq!(
        readme.raw_position(),
        Some(PREFIX_LEN as u64 + u64::from(blocks[1].file_pos))
    );
    readme.close().unwrap();

    let script = archive.open_file("scripts\\war3map.j").unwrap();
    let block = &blocks[2];
    let expected = hash_string("war3map.j", HashType::FileKey).wrapping_add(block.file_pos)
        ^ block.full_size;
    assert_eq!(script.seed(), expected);
    archive.close_file(script).unwrap();

    let deleted = archive.open_file("units\\old.mdx").unwrap_err();
    assert!(matches!(deleted, MpkError::FileNotFound));
    assert_eq!(deleted.code(), ErrorCode::FileNotFound);

    assert!(matches!(
        archive.open_file(FileIdentifier::ById(FIXTURES.len() as u32)),
        Err(MpkError::FileNotFound)
    ));
}

#[test]
fn test_open_encrypted_by_index_with_listfile() {
    let (temp, _) = write_archive();
    let archive = MpkArchive::open(temp.path(), ArchiveConfig::default()).unwrap();

    assert!(matches!(
        archive.open_file(2u32),
        Err(MpkError::NameUnavailable { block_index: 2 })
    ));

    let listfile = Listfile::from_reader(&b"readme.txt\r\nscripts\\war3map.j\r\n"[..]).unwrap();
    archive.attach_listfile(listfile);

    let by_index = archive.open_file(2u32).unwrap();
    let by_name = archive.open_file("scripts\\war3map.j").unwrap();
    assert_eq!(by_index.name(), "scripts\\war3map.j");
    assert_eq!(by_index.seed(), by_name.seed());
}

#[test]
fn test_open_file_ex_scopes() {
    let (temp, _) = write_archive();
    let archive = MpkArchive::open(temp.path(), ArchiveConfig::default()).unwrap();

    let archived = open_file_ex(Some(&archive), "readme.txt", SearchScope::FromArchive).unwrap();
    assert!(!archived.is_local());

    let path = temp.path().to_str().unwrap();
    let mut local = open_file_ex(Some(&archive), path, SearchScope::LocalFile).unwrap();
    assert!(local.is_local());
    assert_eq!(
        local.local_file_mut().unwrap().size().unwrap(),
        std::fs::metadata(temp.path()).unwrap().len()
    );
}

#[test]
fn test_header_search_limit() {
    let (temp, _) = write_archive();
    let config = ArchiveConfig::default().with_header_search_limit(0x100);
    let err = MpkArchive::open(temp.path(), config).unwrap_err();
    assert!(matches!(err, MpkError::BadFormat(_)));
}

#[test]
fn test_truncated_tables_are_corrupt() {
    let (mut bytes, _) = build_archive();
    bytes.truncate(PREFIX_LEN + 0x40);

    let err = MpkArchive::from_reader(Cursor::new(bytes), ArchiveConfig::default()).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_concurrent_opens_share_archive() {
    let (temp, _) = write_archive();
    let archive = MpkArchive::open(temp.path(), ArchiveConfig::default()).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    let file = archive.open_file("readme.txt").unwrap();
                    assert_eq!(file.block_index(), Some(0));
                    assert!(archive.has_file("scripts\\war3map.j").unwrap());
                    file.close().unwrap();
                }
            });
        }
    });

    assert_eq!(archive.last_opened_file(), None);
}
