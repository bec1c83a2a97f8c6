//! Time index file handle.
//!
//! An [`IndexStore`] is opened either for recording (append-only writer) or
//! for playback (read-only, time to offset lookup). A handle never changes
//! mode; switching requires closing and reopening the file.
//!
//! Durability: `write` returns only after the record has been synced to
//! storage. A torn trailing record left by a crash is cut off the next time
//! the file is opened for recording, and ignored by playback handles.
//!
//! Opening two record handles on the same path at once is undefined: both
//! would append, interleaving records and breaking timestamp order. Callers
//! must keep a single writer per index file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use dvrindex_common::{Error, Result};
use parking_lot::Mutex;
use serde::Serialize;

use super::entry::{IndexEntry, ENTRY_SIZE};

/// How an index file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Append-only writer used by the capture pipeline.
    Record,
    /// Read-only handle used to resolve seeks.
    Playback,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Playback => write!(f, "playback"),
        }
    }
}

/// Integrity report for an index file, produced without modifying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Number of complete records.
    pub entries: u64,
    /// Bytes after the last complete record (a torn write).
    pub trailing_bytes: u64,
    /// Index of the first record whose timestamp is lower than its predecessor.
    pub first_regression: Option<u64>,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
}

impl VerifyReport {
    /// True when every complete record keeps timestamp order.
    pub fn is_monotonic(&self) -> bool {
        self.first_regression.is_none()
    }
}

/// Handle on one segment's time index file.
#[derive(Debug)]
pub struct IndexStore {
    path: PathBuf,
    mode: OpenMode,
    /// `None` once closed. Lookups lock it; `write` goes through `get_mut`.
    file: Mutex<Option<File>>,
    /// Last record in the file as seen by the writer.
    tail: Option<IndexEntry>,
    /// Complete records in the file as seen by the writer.
    written: u64,
    /// Bytes of torn trailing data dropped when the file was opened.
    recovered_bytes: u64,
}

impl IndexStore {
    /// Open an index file.
    ///
    /// In [`OpenMode::Record`] the file is created when missing, and a
    /// partial trailing record is truncated away. In [`OpenMode::Playback`]
    /// the file must exist; a partial trailing record is ignored. Both modes
    /// validate timestamp order and fail with [`Error::Corrupt`] when a
    /// record is older than its predecessor.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        match mode {
            OpenMode::Record => Self::open_record(path),
            OpenMode::Playback => Self::open_playback(path),
        }
    }

    fn open_record(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| Error::from_open(path, e))?;

        let scan = scan_records(&file)?;
        ensure_monotonic(path, &scan)?;

        if scan.trailing_bytes > 0 {
            tracing::warn!(
                "Truncating {} bytes of partial record from {} ({} complete entries kept)",
                scan.trailing_bytes,
                path.display(),
                scan.records
            );
            file.set_len(scan.records * ENTRY_SIZE)?;
            file.sync_all()?;
        }

        tracing::info!(
            "Opened index {} for recording ({} entries)",
            path.display(),
            scan.records
        );

        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Record,
            file: Mutex::new(Some(file)),
            tail: scan.last,
            written: scan.records,
            recovered_bytes: scan.trailing_bytes,
        })
    }

    fn open_playback(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_open(path, e))?;

        let scan = scan_records(&file)?;
        ensure_monotonic(path, &scan)?;

        if scan.trailing_bytes > 0 {
            tracing::debug!(
                "Ignoring {} bytes of partial record at end of {}",
                scan.trailing_bytes,
                path.display()
            );
        }

        tracing::debug!(
            "Opened index {} for playback ({} entries)",
            path.display(),
            scan.records
        );

        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Playback,
            file: Mutex::new(Some(file)),
            tail: scan.last,
            written: scan.records,
            recovered_bytes: 0,
        })
    }

    /// Check an index file without opening it for either mode.
    pub fn verify(path: impl AsRef<Path>) -> Result<VerifyReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_open(path, e))?;
        let scan = scan_records(&file)?;

        Ok(VerifyReport {
            entries: scan.records,
            trailing_bytes: scan.trailing_bytes,
            first_regression: scan.first_regression,
            first_timestamp: scan.first.map(|e| e.timestamp),
            last_timestamp: scan.last.map(|e| e.timestamp),
        })
    }

    /// Append one record and sync it to storage.
    ///
    /// Fails with [`Error::NotWritable`] on playback or closed handles and
    /// with [`Error::TimestampRegression`] when `timestamp` is lower than the
    /// last written one; neither case touches the file.
    pub fn write(&mut self, timestamp: u64, offset: u64) -> Result<()> {
        if self.mode == OpenMode::Playback {
            return Err(Error::not_writable(format!(
                "{} is open for playback",
                self.path.display()
            )));
        }

        let Some(file) = self.file.get_mut().as_mut() else {
            return Err(Error::not_writable(format!(
                "{} is closed",
                self.path.display()
            )));
        };

        if let Some(last) = self.tail {
            if timestamp < last.timestamp {
                return Err(Error::TimestampRegression {
                    timestamp,
                    last: last.timestamp,
                });
            }
        }

        let entry = IndexEntry::new(timestamp, offset);
        if let Err(err) = file.write_all(&entry.encode()).and_then(|()| file.sync_data()) {
            // Cut any partial record so a later load never sees it.
            if let Err(trunc_err) = file.set_len(self.written * ENTRY_SIZE) {
                tracing::warn!(
                    "Failed to roll back partial record in {}: {}",
                    self.path.display(),
                    trunc_err
                );
            }
            return Err(err.into());
        }

        self.tail = Some(entry);
        self.written += 1;
        tracing::trace!(
            "Indexed {} -> {} in {}",
            timestamp,
            offset,
            self.path.display()
        );
        Ok(())
    }

    /// Byte offset to start playback from for `target_time`.
    ///
    /// Picks the greatest timestamp not after `target_time`; when several
    /// records share it, the first (lowest offset) wins. A target past the
    /// last record resolves to the last timestamp. Fails with
    /// [`Error::NotFound`] on an empty index or a target before the first
    /// record.
    ///
    /// The record count is taken from the current file length, so records
    /// appended by a concurrent writer become visible and a torn trailing
    /// record is skipped.
    pub fn lookup_by_time(&self, target_time: u64) -> Result<u64> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(Error::Closed)?;

        let count = visible_records(file)?;
        if count == 0 {
            return Err(Error::not_found(format!(
                "{} has no entries",
                self.path.display()
            )));
        }

        let first = read_entry(file, 0)?;
        if target_time < first.timestamp {
            return Err(Error::not_found(format!(
                "time {} precedes first entry {} in {}",
                target_time,
                first.timestamp,
                self.path.display()
            )));
        }

        // Records [0, upper) have timestamp <= target_time; upper >= 1 here.
        let upper = partition_point(file, 0, count, |e| e.timestamp <= target_time)?;
        let found = read_entry(file, upper - 1)?.timestamp;
        let first_of_tie = partition_point(file, 0, upper - 1, |e| e.timestamp < found)?;
        let entry = read_entry(file, first_of_tie)?;

        tracing::debug!(
            "Lookup {} in {} -> record {} ({} @ {})",
            target_time,
            self.path.display(),
            first_of_tie,
            entry.timestamp,
            entry.offset
        );
        Ok(entry.offset)
    }

    /// All visible records in file order.
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(Error::Closed)?;

        let count = visible_records(file)?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(0))?;

        let mut entries = Vec::with_capacity(count as usize);
        let mut buf = [0u8; ENTRY_SIZE as usize];
        for _ in 0..count {
            reader.read_exact(&mut buf)?;
            entries.push(IndexEntry::decode(&buf));
        }
        Ok(entries)
    }

    /// Number of visible records.
    pub fn len(&self) -> Result<u64> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(Error::Closed)?;
        visible_records(file)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn first(&self) -> Result<Option<IndexEntry>> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(Error::Closed)?;
        if visible_records(file)? == 0 {
            return Ok(None);
        }
        read_entry(file, 0).map(Some)
    }

    pub fn last(&self) -> Result<Option<IndexEntry>> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(Error::Closed)?;
        match visible_records(file)? {
            0 => Ok(None),
            count => read_entry(file, count - 1).map(Some),
        }
    }

    /// Timestamps of the first and last visible records.
    pub fn range(&self) -> Result<Option<(u64, u64)>> {
        let first = self.first()?;
        let last = self.last()?;
        Ok(first.zip(last).map(|(f, l)| (f.timestamp, l.timestamp)))
    }

    /// Last record written through this handle (or found when it was opened).
    pub fn last_written(&self) -> Option<IndexEntry> {
        self.tail
    }

    /// Bytes of partial trailing record dropped by a record-mode open.
    pub fn recovered_bytes(&self) -> u64 {
        self.recovered_bytes
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }

    /// Sync and release the file. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.get_mut().take() else {
            return Ok(());
        };

        if self.mode == OpenMode::Record {
            file.sync_all()?;
        }
        tracing::debug!("Closed {} index {}", self.mode, self.path.display());
        Ok(())
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close index {}: {}", self.path.display(), e);
        }
    }
}

struct Scan {
    records: u64,
    trailing_bytes: u64,
    first: Option<IndexEntry>,
    last: Option<IndexEntry>,
    first_regression: Option<u64>,
}

/// Read every complete record once, tracking order violations.
fn scan_records(file: &File) -> Result<Scan> {
    let file_len = file.metadata()?.len();
    let records = file_len / ENTRY_SIZE;

    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(0))?;

    let mut scan = Scan {
        records,
        trailing_bytes: file_len % ENTRY_SIZE,
        first: None,
        last: None,
        first_regression: None,
    };

    let mut buf = [0u8; ENTRY_SIZE as usize];
    for i in 0..records {
        reader.read_exact(&mut buf)?;
        let entry = IndexEntry::decode(&buf);

        if let Some(prev) = scan.last {
            if entry.timestamp < prev.timestamp && scan.first_regression.is_none() {
                scan.first_regression = Some(i);
            }
        }
        if scan.first.is_none() {
            scan.first = Some(entry);
        }
        scan.last = Some(entry);
    }

    Ok(scan)
}

fn ensure_monotonic(path: &Path, scan: &Scan) -> Result<()> {
    match scan.first_regression {
        Some(at) => Err(Error::corrupt(format!(
            "{}: timestamp decreases at record {}",
            path.display(),
            at
        ))),
        None => Ok(()),
    }
}

fn visible_records(file: &File) -> Result<u64> {
    Ok(file.metadata()?.len() / ENTRY_SIZE)
}

fn read_entry(file: &File, index: u64) -> Result<IndexEntry> {
    let mut reader = file;
    reader.seek(SeekFrom::Start(index * ENTRY_SIZE))?;
    let mut buf = [0u8; ENTRY_SIZE as usize];
    reader.read_exact(&mut buf)?;
    Ok(IndexEntry::decode(&buf))
}

/// First record index in `[lo, hi)` for which `pred` is false.
///
/// `pred` must hold for a prefix of the range and fail for the rest.
fn partition_point(
    file: &File,
    mut lo: u64,
    mut hi: u64,
    pred: impl Fn(&IndexEntry) -> bool,
) -> Result<u64> {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(&read_entry(file, mid)?) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}
