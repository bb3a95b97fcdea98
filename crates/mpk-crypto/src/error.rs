//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Buffer length is not a whole number of 32-bit words
    #[error("Buffer length {0} is not a multiple of 4")]
    UnalignedBuffer(usize),
}
