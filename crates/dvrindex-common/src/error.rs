//! Common error types used throughout dvrindex.
//!
//! The same taxonomy is returned by the time index store and the segment
//! list, so the playback side can match on a single enum regardless of which
//! layer failed.

use std::io;
use std::path::Path;

/// Common error type for dvrindex.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing matched: an empty store or list, a missing file, or a target
    /// time earlier than the first known entry.
    #[error("Not found: {0}")]
    NotFound(String),

    /// On-disk data violates the index invariants.
    #[error("Corrupt index data: {0}")]
    Corrupt(String),

    /// A write was attempted on a playback or closed handle.
    #[error("Not writable: {0}")]
    NotWritable(String),

    /// A write carried a timestamp earlier than the last written one.
    #[error("Timestamp {timestamp} precedes last written timestamp {last}")]
    TimestampRegression { timestamp: u64, last: u64 },

    /// A segment path does not fit the bounded path field.
    #[error("Segment path is {len} bytes, maximum is {max}")]
    PathTooLong { len: usize, max: usize },

    /// The handle has already been closed.
    #[error("Index handle is closed")]
    Closed,

    /// Access to the backing file was refused.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Corrupt error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create a new NotWritable error.
    pub fn not_writable<S: Into<String>>(msg: S) -> Self {
        Self::NotWritable(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Classify an I/O error raised while opening `path`.
    ///
    /// Missing files and refused access get their own variants so callers
    /// can tell them apart from genuine storage failures.
    pub fn from_open(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.display().to_string()),
            _ => Self::Io(err),
        }
    }

    /// Whether this error means "no data at that position".
    ///
    /// Playback treats these as a request to seek to the nearest known
    /// position rather than a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error rejects a write without touching the store.
    pub fn is_write_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotWritable(_) | Self::TimestampRegression { .. } | Self::Closed
        )
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
