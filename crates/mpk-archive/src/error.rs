//! Error types for MPK archive operations

use crate::port::ErrorCode;
use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, MpkError>;

/// Errors that can occur while loading an archive or opening its files.
///
/// Every variant maps onto the normalized [`ErrorCode`] set via
/// [`MpkError::code`].
#[derive(Debug, Error)]
pub enum MpkError {
    /// A caller-supplied argument was rejected.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// No hash entry or block matches the requested file.
    #[error("File not found")]
    FileNotFound,

    /// The caller's buffer cannot hold the result.
    #[error("Buffer too small: {required} entries required")]
    InsufficientBuffer {
        /// Number of entries the full result needs
        required: usize,
    },

    /// An allocation could not be satisfied.
    #[error("Not enough memory")]
    NotEnoughMemory,

    /// A structural invariant of the archive is violated.
    #[error("File corrupt: {0}")]
    FileCorrupt(String),

    /// A block carries flag bits this reader does not understand.
    #[error("Unsupported block flags: {flags:#010x}")]
    NotSupported {
        /// The unknown flag bits
        flags: u32,
    },

    /// The data is not an MPK archive.
    #[error("Bad format: {0}")]
    BadFormat(String),

    /// The name of an encrypted block cannot be recovered, so its seed is unknown.
    #[error("Cannot recover the name of encrypted block {block_index}")]
    NameUnavailable {
        /// Block table index of the file
        block_index: u32,
    },

    /// I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary record parsing error.
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl MpkError {
    /// Normalized error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParameter(_) => ErrorCode::InvalidParameter,
            Self::FileNotFound => ErrorCode::FileNotFound,
            Self::InsufficientBuffer { .. } => ErrorCode::InsufficientBuffer,
            Self::NotEnoughMemory => ErrorCode::NotEnoughMemory,
            Self::FileCorrupt(_) => ErrorCode::FileCorrupt,
            Self::NotSupported { .. } => ErrorCode::NotSupported,
            Self::BadFormat(_) => ErrorCode::BadFormat,
            Self::NameUnavailable { .. } => ErrorCode::CanNotComplete,
            Self::Io(err) => ErrorCode::from_io(err),
            Self::BinRw(binrw::Error::Io(err)) => ErrorCode::from_io(err),
            Self::BinRw(_) => ErrorCode::BadFormat,
        }
    }

    /// Check if this error describes a damaged archive rather than a caller mistake
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::FileCorrupt(_) | Self::BadFormat(_) | Self::BinRw(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MpkError::InvalidParameter("x").code(),
            ErrorCode::InvalidParameter
        );
        assert_eq!(MpkError::FileNotFound.code(), ErrorCode::FileNotFound);
        assert_eq!(
            MpkError::InsufficientBuffer { required: 3 }.code(),
            ErrorCode::InsufficientBuffer
        );
        assert_eq!(
            MpkError::NotSupported { flags: 0x10 }.code(),
            ErrorCode::NotSupported
        );
        assert_eq!(
            MpkError::NameUnavailable { block_index: 1 }.code(),
            ErrorCode::CanNotComplete
        );
    }

    #[test]
    fn test_io_errors_are_normalized() {
        let err = MpkError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code(), ErrorCode::AccessDenied);

        let err = MpkError::from(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code(), ErrorCode::FileNotFound);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MpkError::InsufficientBuffer { required: 2 }.to_string(),
            "Buffer too small: 2 entries required"
        );
        assert_eq!(
            MpkError::NotSupported { flags: 0x40 }.to_string(),
            "Unsupported block flags: 0x00000040"
        );
    }

    #[test]
    fn test_corruption_classification() {
        assert!(MpkError::FileCorrupt("bad".into()).is_corruption());
        assert!(!MpkError::FileNotFound.is_corruption());
    }
}
