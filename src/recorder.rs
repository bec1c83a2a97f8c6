//! Recording driver for the capture pipeline.
//!
//! The capture pipeline writes transport-stream data into the file returned
//! by [`Recorder::start_segment`] and reports `(timestamp, offset)` samples
//! through [`Recorder::sample`]. The recorder indexes every sample, tells
//! the pipeline when the configured rotation threshold is reached, and keeps
//! the manifest on disk current after every rotation.

use std::path::{Path, PathBuf};

use dvrindex_common::{Error, Result, SegmentPath};
use dvrindex_store::SegmentList;

use crate::config::RecordingConfig;

/// Drives one recording directory.
#[derive(Debug)]
pub struct Recorder {
    dir: PathBuf,
    manifest_path: PathBuf,
    config: RecordingConfig,
    list: SegmentList,
}

impl Recorder {
    /// Open a recording directory, resuming an unfinished recording whose
    /// manifest is already there.
    pub fn open(dir: &Path, config: RecordingConfig) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let manifest_path = dir.join(&config.manifest_name);

        let list = if manifest_path.exists() {
            let list = SegmentList::load(&manifest_path)?;
            if list.is_finished() {
                return Err(Error::not_writable(format!(
                    "recording in {} is finished",
                    dir.display()
                )));
            }
            tracing::info!(
                "Resuming recording in {} after {} segments",
                dir.display(),
                list.len()
            );
            list
        } else {
            tracing::info!("Starting recording in {}", dir.display());
            SegmentList::new(config.index_extension.clone()).with_base_dir(dir)
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest_path,
            config,
            list,
        })
    }

    /// Open the next segment and return the path the pipeline should write
    /// stream data to.
    pub fn start_segment(&mut self, start_time: u64) -> Result<PathBuf> {
        let name = format!(
            "{}-{:05}.{}",
            self.config.segment_prefix,
            self.list.len(),
            self.config.segment_extension
        );
        let segment = self.list.append_segment(SegmentPath::new(name)?, start_time)?;
        let file_path = segment.file_path().to_path_buf();

        self.list.store(&self.manifest_path)?;
        Ok(file_path)
    }

    /// Index one sample of the current segment.
    ///
    /// `offset` is the byte position inside the current segment file.
    /// Returns `true` once the segment has reached a rotation threshold; the
    /// pipeline should then call [`start_segment`](Self::start_segment).
    pub fn sample(&mut self, timestamp: u64, offset: u64) -> Result<bool> {
        self.list.record(timestamp, offset)?;
        Ok(self.rotation_due(timestamp, offset))
    }

    fn rotation_due(&self, timestamp: u64, offset: u64) -> bool {
        let Some(segment) = self.list.segments().last() else {
            return false;
        };

        let max_bytes = self.config.max_segment_bytes;
        if max_bytes > 0 && offset >= max_bytes {
            tracing::debug!("Segment {} reached {} bytes", segment.path(), offset);
            return true;
        }

        let max_duration = self.config.max_segment_duration;
        if max_duration > 0 && timestamp.saturating_sub(segment.start_time()) >= max_duration {
            tracing::debug!(
                "Segment {} spans {} time units",
                segment.path(),
                timestamp - segment.start_time()
            );
            return true;
        }

        false
    }

    /// Finish the recording and persist the final manifest.
    pub fn finish(mut self) -> Result<SegmentList> {
        self.list.finish()?;
        self.list.store(&self.manifest_path)?;
        tracing::info!("Recording in {} finished", self.dir.display());
        Ok(self.list)
    }

    pub fn segments(&self) -> &SegmentList {
        &self.list
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(max_bytes: u64, max_duration: u64) -> RecordingConfig {
        RecordingConfig {
            max_segment_bytes: max_bytes,
            max_segment_duration: max_duration,
            ..RecordingConfig::default()
        }
    }

    #[test]
    fn test_segment_naming() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::open(dir.path(), config(0, 0)).unwrap();

        let first = recorder.start_segment(0).unwrap();
        assert_eq!(first, dir.path().join("seg-00000.ts"));
        let second = recorder.start_segment(10).unwrap();
        assert_eq!(second, dir.path().join("seg-00001.ts"));
        assert!(dir.path().join("seg-00001.ts.idx").exists());
        assert!(recorder.manifest_path().exists());
    }

    #[test]
    fn test_rotation_by_bytes() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::open(dir.path(), config(1000, 0)).unwrap();
        recorder.start_segment(0).unwrap();

        assert!(!recorder.sample(0, 0).unwrap());
        assert!(!recorder.sample(1, 999).unwrap());
        assert!(recorder.sample(2, 1000).unwrap());
    }

    #[test]
    fn test_rotation_by_duration() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::open(dir.path(), config(0, 100)).unwrap();
        recorder.start_segment(500).unwrap();

        assert!(!recorder.sample(500, 0).unwrap());
        assert!(!recorder.sample(599, 10).unwrap());
        assert!(recorder.sample(600, 20).unwrap());
    }

    #[test]
    fn test_sample_without_segment() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::open(dir.path(), config(0, 0)).unwrap();
        assert!(matches!(recorder.sample(0, 0), Err(Error::NotWritable(_))));
    }

    #[test]
    fn test_finished_recording_cannot_resume() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::open(dir.path(), config(0, 0)).unwrap();
        recorder.start_segment(0).unwrap();
        recorder.sample(0, 0).unwrap();
        recorder.finish().unwrap();

        assert!(matches!(
            Recorder::open(dir.path(), config(0, 0)),
            Err(Error::NotWritable(_))
        ));
    }
}
