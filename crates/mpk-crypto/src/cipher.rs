//! Word-oriented stream cipher for MPK tables and file blocks
//!
//! The cipher works on little-endian 32-bit words. The key evolves after every
//! word, and a second accumulator is fed with the plaintext word, so
//! encryption and decryption are not the same operation.
//!
//! ## Usage
//!
//! ```rust
//! use mpk_crypto::cipher::{decrypt_bytes, encrypt_bytes, table_key};
//!
//! let key = table_key("(block table)");
//! let mut data = *b"sixteen byte msg";
//! encrypt_bytes(&mut data, key);
//! assert_ne!(&data, b"sixteen byte msg");
//! decrypt_bytes(&mut data, key);
//! assert_eq!(&data, b"sixteen byte msg");
//! ```

use crate::error::CryptoError;
use crate::hash::{CRYPT_TABLE, HASH_SEED_B, HashType, hash_string};

/// Start of the cipher's slice of the crypt table
const CIPHER_TABLE_OFFSET: usize = 0x400;

/// Encryption key for a named table or file
///
/// The archive tables use the keys of `"(hash table)"` and `"(block table)"`.
pub fn table_key(name: &str) -> u32 {
    hash_string(name, HashType::FileKey)
}

#[inline]
fn next_key(key: u32) -> u32 {
    ((!key) << 0x15).wrapping_add(0x1111_1111) | (key >> 0x0B)
}

#[inline]
fn mix_seed(seed: u32, key: u32) -> u32 {
    seed.wrapping_add(CRYPT_TABLE[CIPHER_TABLE_OFFSET + (key & 0xFF) as usize])
}

/// Decrypt a run of words in place
pub fn decrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed = HASH_SEED_B;

    for word in data.iter_mut() {
        seed = mix_seed(seed, key);
        let plain = *word ^ key.wrapping_add(seed);
        key = next_key(key);
        seed = plain
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
        *word = plain;
    }
}

/// Encrypt a run of words in place
pub fn encrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed = HASH_SEED_B;

    for word in data.iter_mut() {
        seed = mix_seed(seed, key);
        let plain = *word;
        *word = plain ^ key.wrapping_add(seed);
        key = next_key(key);
        seed = plain
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

fn transform_bytes(data: &mut [u8], key: u32, transform: fn(&mut [u32], u32)) {
    let mut words: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    transform(&mut words, key);

    for (chunk, word) in data.chunks_exact_mut(4).zip(&words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// Decrypt a byte buffer in place
///
/// Only whole words are transformed; a trailing partial word is left as is.
pub fn decrypt_bytes(data: &mut [u8], key: u32) {
    transform_bytes(data, key, decrypt_block);
}

/// Encrypt a byte buffer in place
///
/// Only whole words are transformed; a trailing partial word is left as is.
pub fn encrypt_bytes(data: &mut [u8], key: u32) {
    transform_bytes(data, key, encrypt_block);
}

/// Decrypt a table image in place
///
/// # Errors
///
/// Returns `CryptoError::UnalignedBuffer` if the buffer is not a whole number
/// of words; table records are always word-aligned.
pub fn decrypt_table(data: &mut [u8], key: u32) -> Result<(), CryptoError> {
    if data.len() % 4 != 0 {
        return Err(CryptoError::UnalignedBuffer(data.len()));
    }
    decrypt_bytes(data, key);
    Ok(())
}
