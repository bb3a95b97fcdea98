//! Name hashing and block cipher for MPK archives
//!
//! This crate provides the two primitives every MPK reader depends on:
//!
//! - **Hashing**: the table-driven string hash that yields the hash-table
//!   index, the two name digests, and the file encryption key of a name
//! - **Encryption**: the word-oriented stream cipher used for the archive
//!   tables and for encrypted file blocks
//!
//! Both share a single 1280-entry crypt table that is built at compile time.
//!
//! # Examples
//!
//! ## Name Digests
//!
//! ```
//! use mpk_crypto::{HashType, NameHash, hash_string};
//!
//! let digests = NameHash::of("arr\\units.dat");
//! assert_eq!(digests.table_index, 0xF4E6_C69D);
//! assert_eq!(digests.name_a, hash_string("ARR\\UNITS.DAT", HashType::NameA));
//! ```
//!
//! ## Table Decryption
//!
//! ```
//! use mpk_crypto::{decrypt_block, encrypt_block, table_key};
//!
//! let key = table_key("(hash table)");
//! let mut words = [0x1234_5678_u32, 0x9ABC_DEF0];
//! encrypt_block(&mut words, key);
//! decrypt_block(&mut words, key);
//! assert_eq!(words, [0x1234_5678, 0x9ABC_DEF0]);
//! ```

#![warn(missing_docs)]

pub mod cipher;
pub mod error;
pub mod hash;

pub use error::CryptoError;

// Re-export commonly used types
pub use cipher::{
    decrypt_block, decrypt_bytes, decrypt_table, encrypt_block, encrypt_bytes, table_key,
};
pub use hash::{CRYPT_TABLE, HashType, NameHash, hash_string};
