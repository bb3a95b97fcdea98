//! Native file access and normalized error codes
//!
//! Archive loading and local-file opens go through [`NativeFile`], a thin
//! wrapper over [`std::fs::File`] with the open dispositions and operations
//! the archive layer needs. OS errors are folded into the small
//! [`ErrorCode`] set so callers can match on them without caring about the
//! platform.

use crate::error::Result;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Normalized error codes
///
/// Discriminants are the legacy numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Operation not implemented
    InvalidFunction = 1,
    /// File not found
    FileNotFound = 2,
    /// Access denied
    AccessDenied = 5,
    /// Allocation failure
    NotEnoughMemory = 8,
    /// Data has the wrong format
    BadFormat = 11,
    /// Enumeration exhausted
    NoMoreFiles = 18,
    /// Access beyond end of file
    HandleEof = 38,
    /// No space left while writing through a handle
    HandleDiskFull = 39,
    /// Operation not supported
    NotSupported = 50,
    /// Invalid parameter
    InvalidParameter = 87,
    /// No space left on device
    DiskFull = 112,
    /// Caller buffer too small
    InsufficientBuffer = 122,
    /// File already exists
    AlreadyExists = 183,
    /// Operation cannot be completed
    CanNotComplete = 1003,
    /// Structural corruption
    FileCorrupt = 1392,
    /// Anything not covered above
    Unknown = u32::MAX,
}

impl ErrorCode {
    /// Map an OS error onto the normalized set
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound,
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::InvalidInput => Self::InvalidParameter,
            io::ErrorKind::InvalidData => Self::BadFormat,
            io::ErrorKind::UnexpectedEof => Self::HandleEof,
            io::ErrorKind::StorageFull => Self::DiskFull,
            io::ErrorKind::OutOfMemory => Self::NotEnoughMemory,
            io::ErrorKind::Unsupported => Self::InvalidFunction,
            _ => Self::Unknown,
        }
    }

    /// Human-readable description
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidFunction => "function not implemented",
            Self::FileNotFound => "file not found",
            Self::AccessDenied => "access denied",
            Self::NotEnoughMemory => "not enough memory",
            Self::BadFormat => "bad format",
            Self::NoMoreFiles => "no more files",
            Self::HandleEof => "access beyond EOF",
            Self::HandleDiskFull | Self::DiskFull => "no space left on device",
            Self::NotSupported => "not supported",
            Self::InvalidParameter => "invalid parameter",
            Self::InsufficientBuffer => "insufficient buffer",
            Self::AlreadyExists => "file exists",
            Self::CanNotComplete => "operation cannot be completed",
            Self::FileCorrupt => "file corrupt",
            Self::Unknown => "unknown error",
        }
    }

    /// Legacy numeric value
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Open disposition for [`NativeFile::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read-only; the file must exist
    #[default]
    OpenExisting,
    /// Read-write; create the file if missing
    OpenAlways,
    /// Read-write; create the file, truncating any existing content
    CreateNew,
}

/// A file on the host filesystem
#[derive(Debug)]
pub struct NativeFile {
    file: File,
    path: PathBuf,
}

impl NativeFile {
    /// Open a file with the given disposition
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::OpenExisting => options.read(true),
            OpenMode::OpenAlways => options.read(true).write(true).create(true),
            OpenMode::CreateNew => options.read(true).write(true).create(true).truncate(true),
        };

        let file = options.open(path)?;
        debug!("Opened {} ({:?})", path.display(), mode);

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path the file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read into `buf`, returning the number of bytes read
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file.read(buf)?)
    }

    /// Write all of `buf`, returning its length
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    /// Move the file pointer
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.file.seek(pos)?)
    }

    /// Current file size in bytes
    pub fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Truncate (or extend) the file at the current file pointer
    pub fn set_end_of_file(&mut self) -> Result<()> {
        let position = self.file.stream_position()?;
        self.file.set_len(position)?;
        Ok(())
    }
}

impl Read for NativeFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for NativeFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for NativeFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}
