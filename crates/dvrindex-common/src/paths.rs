//! Segment path handling.
//!
//! Recordings address their segment files through a bounded path field. The
//! bound is checked when the path is built, so an over-long path is an error
//! instead of a silently clipped file name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Maximum length, in bytes, of a segment path.
pub const MAX_SEGMENT_PATH_LEN: usize = 256;

/// Length-checked path of one segment file.
///
/// # Examples
///
/// ```
/// use dvrindex_common::{Error, SegmentPath};
///
/// let path = SegmentPath::new("seg-0001.ts").unwrap();
/// assert_eq!(path.as_path().extension().unwrap(), "ts");
///
/// let too_long = "a".repeat(300);
/// assert!(matches!(
///     SegmentPath::new(too_long),
///     Err(Error::PathTooLong { len: 300, max: 256 })
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentPath(String);

impl SegmentPath {
    /// Build a segment path, rejecting empty or over-long values.
    pub fn new<S: Into<String>>(path: S) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::invalid_input("segment path is empty"));
        }
        if path.len() > MAX_SEGMENT_PATH_LEN {
            return Err(Error::PathTooLong {
                len: path.len(),
                max: MAX_SEGMENT_PATH_LEN,
            });
        }
        Ok(Self(path))
    }

    /// Build a segment path from a filesystem path.
    ///
    /// Non UTF-8 paths are rejected since the manifest stores text.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = path
            .to_str()
            .ok_or_else(|| Error::invalid_input(format!("non UTF-8 path: {}", path.display())))?;
        Self::new(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl TryFrom<String> for SegmentPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SegmentPath> for String {
    fn from(value: SegmentPath) -> Self {
        value.0
    }
}

impl AsRef<Path> for SegmentPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl fmt::Display for SegmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of the index file that belongs to a segment file.
///
/// The index sits next to the segment and carries the segment's full file
/// name plus `extension`, so `seg-0001.ts` is indexed by `seg-0001.ts.idx`.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use dvrindex_common::index_path_for;
///
/// assert_eq!(
///     index_path_for(Path::new("/rec/seg-0001.ts"), "idx"),
///     PathBuf::from("/rec/seg-0001.ts.idx")
/// );
/// ```
pub fn index_path_for(segment: &Path, extension: &str) -> PathBuf {
    let mut name = segment.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_path_bounds() {
        let exact = "x".repeat(MAX_SEGMENT_PATH_LEN);
        assert!(SegmentPath::new(exact).is_ok());

        let over = "x".repeat(MAX_SEGMENT_PATH_LEN + 1);
        assert!(matches!(
            SegmentPath::new(over),
            Err(Error::PathTooLong { len: 257, max: 256 })
        ));

        assert!(matches!(
            SegmentPath::new(""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_segment_path_counts_bytes_not_chars() {
        // 128 two-byte characters fill the field exactly.
        let wide = "é".repeat(128);
        assert!(SegmentPath::new(wide).is_ok());

        let wider = "é".repeat(129);
        assert!(matches!(
            SegmentPath::new(wider),
            Err(Error::PathTooLong { len: 258, .. })
        ));
    }

    #[test]
    fn test_segment_path_serde_validates() {
        let path = SegmentPath::new("a/b.ts").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a/b.ts\"");

        let back: SegmentPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);

        let long = format!("\"{}\"", "y".repeat(400));
        assert!(serde_json::from_str::<SegmentPath>(&long).is_err());
    }

    #[test]
    fn test_index_path_for_relative() {
        assert_eq!(
            index_path_for(Path::new("seg.ts"), "tidx"),
            PathBuf::from("seg.ts.tidx")
        );
    }
}
