//! Ordered segment list for one recording.
//!
//! - `manifest` - JSON persistence of the list.
//!
//! A [`SegmentList`] owns every [`Segment`] of a recording, and every segment
//! owns its time index. While recording, the last segment holds a
//! record-mode index that receives samples; all other segments open a
//! playback index lazily, the first time a seek lands on them.

pub mod manifest;

use std::path::{Path, PathBuf};

use dvrindex_common::{index_path_for, Error, Result, SegmentPath};
use parking_lot::Mutex;

use crate::index::{IndexEntry, IndexStore, OpenMode};
use manifest::{Manifest, ManifestSegment, MANIFEST_VERSION};

/// One physical capture file and its time index.
#[derive(Debug)]
pub struct Segment {
    path: SegmentPath,
    /// `path` resolved against the recording directory.
    file_path: PathBuf,
    index_path: PathBuf,
    start_time: u64,
    end_time: u64,
    /// Record-mode index while this is the segment being captured.
    writer: Option<IndexStore>,
    /// Playback index, opened on first use.
    reader: Mutex<Option<IndexStore>>,
}

impl Segment {
    /// Path as recorded in the manifest.
    pub fn path(&self) -> &SegmentPath {
        &self.path
    }

    /// Path of the segment file on disk.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    /// Whether the capture pipeline is still writing this segment.
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Byte offset inside this segment for `target_time`.
    pub fn lookup_by_time(&self, target_time: u64) -> Result<u64> {
        self.with_index(|index| index.lookup_by_time(target_time))
    }

    /// All index entries of this segment.
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        self.with_index(IndexStore::entries)
    }

    /// First index entry of this segment, if any.
    pub fn first_entry(&self) -> Result<Option<IndexEntry>> {
        self.with_index(IndexStore::first)
    }

    fn with_index<T>(&self, f: impl FnOnce(&IndexStore) -> Result<T>) -> Result<T> {
        if let Some(writer) = &self.writer {
            return f(writer);
        }

        let mut slot = self.reader.lock();
        let index = match slot.take() {
            Some(index) => index,
            None => IndexStore::open(&self.index_path, OpenMode::Playback)?,
        };
        let result = f(&index);
        *slot = Some(index);
        result
    }

    /// Stop recording into this segment and fix its end time to the last
    /// indexed timestamp.
    fn seal(&mut self) {
        let last = match self.writer.take() {
            Some(mut writer) => {
                let last = writer.last_written();
                if let Err(e) = writer.close() {
                    tracing::warn!("Failed to close index {}: {}", self.index_path.display(), e);
                }
                last
            }
            None => self.with_index(IndexStore::last).ok().flatten(),
        };

        if let Some(entry) = last {
            self.end_time = entry.timestamp.max(self.start_time);
        }
    }
}

/// Ordered list of the segments making up one recording.
#[derive(Debug)]
pub struct SegmentList {
    segments: Vec<Segment>,
    index_extension: String,
    /// Directory relative segment paths are resolved against.
    base_dir: Option<PathBuf>,
    finished: bool,
}

impl SegmentList {
    /// Create an empty list whose index files use `index_extension`.
    pub fn new(index_extension: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            index_extension: index_extension.into(),
            base_dir: None,
            finished: false,
        }
    }

    /// Resolve relative segment paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Start a new segment, sealing the previous one.
    ///
    /// The previous segment's end time becomes the timestamp of its last
    /// index entry. The new segment's index is created (or resumed) in
    /// record mode and becomes the target of [`record`](Self::record).
    pub fn append_segment(&mut self, path: SegmentPath, start_time: u64) -> Result<&Segment> {
        if self.finished {
            return Err(Error::not_writable("recording is finished"));
        }
        if let Some(prev) = self.segments.last() {
            if start_time < prev.start_time {
                return Err(Error::invalid_input(format!(
                    "segment {} starts at {} before previous segment start {}",
                    path, start_time, prev.start_time
                )));
            }
        }
        if self.segments.iter().any(|s| s.path == path) {
            return Err(Error::invalid_input(format!(
                "segment {} is already in the list",
                path
            )));
        }

        let file_path = self.resolve(&path);
        let index_path = index_path_for(&file_path, &self.index_extension);
        let writer = IndexStore::open(&index_path, OpenMode::Record)?;

        if let Some(prev) = self.segments.last_mut() {
            prev.seal();
            tracing::info!(
                "Sealed segment {} [{}, {}]",
                prev.path,
                prev.start_time,
                prev.end_time
            );
        }

        tracing::info!("Recording segment {} from {}", path, start_time);
        self.segments.push(Segment {
            path,
            file_path,
            index_path,
            start_time,
            end_time: start_time,
            writer: Some(writer),
            reader: Mutex::new(None),
        });

        Ok(&self.segments[self.segments.len() - 1])
    }

    /// Index a sample of the segment being recorded.
    pub fn record(&mut self, timestamp: u64, offset: u64) -> Result<()> {
        let segment = self
            .segments
            .last_mut()
            .ok_or_else(|| Error::not_writable("no segment is being recorded"))?;
        let writer = segment.writer.as_mut().ok_or_else(|| {
            Error::not_writable(format!("segment {} is not being recorded", segment.path))
        })?;

        writer.write(timestamp, offset)?;
        segment.end_time = segment.end_time.max(timestamp);
        Ok(())
    }

    /// Seal the last segment and mark the recording finished.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if let Some(last) = self.segments.last_mut() {
            last.seal();
        }
        self.finished = true;
        tracing::info!("Recording finished with {} segments", self.segments.len());
        Ok(())
    }

    /// Segment holding `target_time`.
    ///
    /// The segment with the greatest start time not after `target_time` is
    /// chosen, so a boundary time belongs to the later segment, a time in a
    /// gap belongs to the segment before it, and the last segment extends
    /// without bound.
    pub fn segment_for_time(&self, target_time: u64) -> Option<&Segment> {
        let after = self
            .segments
            .partition_point(|s| s.start_time <= target_time);
        after.checked_sub(1).map(|i| &self.segments[i])
    }

    /// Resolve `target_time` to a segment and a byte offset inside it.
    ///
    /// Fails with [`Error::NotFound`] when the list is empty or the target
    /// precedes the first segment. Index failures are only reported for the
    /// segment the target resolves to.
    pub fn lookup_by_time(&self, target_time: u64) -> Result<(&Segment, u64)> {
        let segment = self.segment_for_time(target_time).ok_or_else(|| {
            match self.segments.first() {
                Some(first) => Error::not_found(format!(
                    "time {} precedes recording start {}",
                    target_time, first.start_time
                )),
                None => Error::not_found("recording has no segments"),
            }
        })?;

        let offset = segment.lookup_by_time(target_time)?;
        Ok((segment, offset))
    }

    /// Persist the list as a manifest at `path`.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            index_extension: self.index_extension.clone(),
            finished: self.finished,
            segments: self
                .segments
                .iter()
                .map(|s| ManifestSegment {
                    path: s.path.clone(),
                    start_time: s.start_time,
                    end_time: s.end_time,
                })
                .collect(),
        };
        manifest.write(path)?;
        tracing::debug!(
            "Stored manifest {} ({} segments)",
            path.display(),
            self.segments.len()
        );
        Ok(())
    }

    /// Rebuild a list from a manifest.
    ///
    /// Relative segment paths are resolved against the manifest's directory.
    /// Index files are not touched until a lookup needs them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let manifest = Manifest::read(path)?;

        let mut list = Self::new(manifest.index_extension);
        list.finished = manifest.finished;
        list.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);

        for entry in manifest.segments {
            let file_path = list.resolve(&entry.path);
            let index_path = index_path_for(&file_path, &list.index_extension);
            list.segments.push(Segment {
                path: entry.path,
                file_path,
                index_path,
                start_time: entry.start_time,
                end_time: entry.end_time,
                writer: None,
                reader: Mutex::new(None),
            });
        }

        tracing::debug!(
            "Loaded manifest {} ({} segments)",
            path.display(),
            list.segments.len()
        );
        Ok(list)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment start and last segment end.
    pub fn time_range(&self) -> Option<(u64, u64)> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some((first.start_time, last.end_time))
    }

    /// Whether a segment is currently receiving samples.
    pub fn is_recording(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_active)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn index_extension(&self) -> &str {
        &self.index_extension
    }

    fn resolve(&self, path: &SegmentPath) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.as_path().is_relative() => dir.join(path.as_path()),
            _ => path.as_path().to_path_buf(),
        }
    }
}
