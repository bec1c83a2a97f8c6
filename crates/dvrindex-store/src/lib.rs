//! Dvrindex-Store: time indexes and segment manifests for DVR recordings
//!
//! A recording is captured as one or more transport-stream segment files.
//! Next to every segment the capture pipeline keeps a time index: a dense
//! array of `(timestamp, offset)` records that lets playback jump to a byte
//! position for a given presentation time without scanning the stream.
//!
//! # Modules
//!
//! - `index` - The per-segment time index file (record and playback modes)
//! - `segment_list` - The ordered list of segments forming one recording,
//!   persisted as a manifest
//!
//! # Architecture
//!
//! Seeking is resolved top-down:
//!
//! 1. The [`SegmentList`] picks the segment whose time range holds the target
//! 2. That segment's [`IndexStore`] binary-searches its records for the
//!    greatest timestamp not after the target
//! 3. The caller opens the segment file and seeks to the returned offset
//!
//! Index files are read record by record during the search, so lookups stay
//! cheap on recordings with millions of entries and tolerate a writer
//! appending to the same file concurrently.

pub mod index;
pub mod segment_list;

pub use dvrindex_common::{Error, Result, SegmentPath};
pub use index::{IndexEntry, IndexStore, OpenMode, VerifyReport, ENTRY_SIZE};
pub use segment_list::{Segment, SegmentList};
