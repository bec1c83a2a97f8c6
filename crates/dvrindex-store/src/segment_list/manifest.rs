//! On-disk manifest of a segment list.
//!
//! The manifest is a small JSON document listing the segments of one
//! recording in order. Index contents are not embedded; each segment's index
//! file is reopened from disk when it is needed.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use dvrindex_common::{Error, Result, SegmentPath};
use serde::{Deserialize, Serialize};

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// Extension appended to segment file names to locate their index.
    pub index_extension: String,
    /// Set once recording has finished.
    #[serde(default)]
    pub finished: bool,
    pub segments: Vec<ManifestSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSegment {
    pub path: SegmentPath,
    pub start_time: u64,
    pub end_time: u64,
}

impl Manifest {
    /// Read and validate a manifest.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::from_open(path, e))?;
        let manifest: Manifest = serde_json::from_str(&contents)
            .map_err(|e| Error::corrupt(format!("{}: {e}", path.display())))?;
        manifest.validate(path)?;
        Ok(manifest)
    }

    /// Write the manifest atomically: temp file, sync, then rename.
    pub fn write(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::invalid_input(format!("manifest serialization: {e}")))?;

        let mut file = File::create(&tmp_path).map_err(|e| Error::from_open(&tmp_path, e))?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(Error::corrupt(format!(
                "{}: unsupported manifest version {}",
                path.display(),
                self.version
            )));
        }
        if self.index_extension.is_empty() {
            return Err(Error::corrupt(format!(
                "{}: empty index extension",
                path.display()
            )));
        }

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.end_time < segment.start_time {
                return Err(Error::corrupt(format!(
                    "{}: segment {} ends ({}) before it starts ({})",
                    path.display(),
                    i,
                    segment.end_time,
                    segment.start_time
                )));
            }
            if i > 0 && segment.start_time < self.segments[i - 1].start_time {
                return Err(Error::corrupt(format!(
                    "{}: segment {} starts before segment {}",
                    path.display(),
                    i,
                    i - 1
                )));
            }
            if self.segments[..i].iter().any(|s| s.path == segment.path) {
                return Err(Error::corrupt(format!(
                    "{}: segment path {} listed twice",
                    path.display(),
                    segment.path
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn segment(path: &str, start_time: u64, end_time: u64) -> ManifestSegment {
        ManifestSegment {
            path: SegmentPath::new(path).unwrap(),
            start_time,
            end_time,
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recording.json");
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            index_extension: "idx".into(),
            finished: true,
            segments: vec![segment("a.ts", 0, 99), segment("b.ts", 100, 180)],
        };

        manifest.write(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
    }

    #[test]
    fn test_read_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recording.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(Manifest::read(&path), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_read_rejects_overlong_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recording.json");
        let json = serde_json::json!({
            "version": 1,
            "index_extension": "idx",
            "segments": [{ "path": "p".repeat(300), "start_time": 0, "end_time": 0 }],
        });
        fs::write(&path, json.to_string()).unwrap();
        assert!(matches!(Manifest::read(&path), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_validate_ordering() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recording.json");

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            index_extension: "idx".into(),
            finished: false,
            segments: vec![segment("a.ts", 100, 150), segment("b.ts", 50, 60)],
        };
        manifest.write(&path).unwrap();
        assert!(matches!(Manifest::read(&path), Err(Error::Corrupt(_))));

        let manifest = Manifest {
            segments: vec![segment("a.ts", 100, 90)],
            ..manifest
        };
        manifest.write(&path).unwrap();
        assert!(matches!(Manifest::read(&path), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_read_missing() {
        let dir = tempdir().unwrap();
        let err = Manifest::read(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.is_not_found());
    }
}
