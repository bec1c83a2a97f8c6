//! Seek resolution for playback.
//!
//! [`SeekResolver`] turns a target time into the segment file and byte
//! offset to start reading from. With `clamp_to_nearest` enabled, a target
//! before any known data resolves to the start of the recording (or of the
//! resolved segment) instead of failing, so a player can always seek.

use std::path::{Path, PathBuf};

use dvrindex_common::Result;
use dvrindex_store::SegmentList;
use serde::Serialize;

use crate::config::PlaybackConfig;

/// Where playback should start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeekTarget {
    /// Segment file to open.
    pub path: PathBuf,
    /// Byte offset inside that file.
    pub offset: u64,
    /// True when the target time was outside the known range and the
    /// nearest position was used instead.
    pub clamped: bool,
}

#[derive(Debug)]
pub struct SeekResolver {
    list: SegmentList,
    clamp_to_nearest: bool,
}

impl SeekResolver {
    pub fn new(list: SegmentList, config: &PlaybackConfig) -> Self {
        Self {
            list,
            clamp_to_nearest: config.clamp_to_nearest,
        }
    }

    /// Load the recording manifest at `manifest`.
    pub fn open(manifest: &Path, config: &PlaybackConfig) -> Result<Self> {
        Ok(Self::new(SegmentList::load(manifest)?, config))
    }

    pub fn seek(&self, target_time: u64) -> Result<SeekTarget> {
        match self.list.lookup_by_time(target_time) {
            Ok((segment, offset)) => Ok(SeekTarget {
                path: segment.file_path().to_path_buf(),
                offset,
                clamped: false,
            }),
            Err(err) if err.is_not_found() && self.clamp_to_nearest => {
                // Before the first segment, or before the first entry of the
                // segment the target falls in.
                let Some(segment) = self
                    .list
                    .segment_for_time(target_time)
                    .or_else(|| self.list.segments().first())
                else {
                    return Err(err);
                };

                let offset = segment.first_entry()?.map_or(0, |e| e.offset);
                tracing::debug!(
                    "Clamped seek to {} -> {} @ {}",
                    target_time,
                    segment.path(),
                    offset
                );
                Ok(SeekTarget {
                    path: segment.file_path().to_path_buf(),
                    offset,
                    clamped: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn segments(&self) -> &SegmentList {
        &self.list
    }
}
