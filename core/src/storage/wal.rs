//! The write-ahead log engine.
//!
//! Wraps the segment store with serialized appends, pre-append rotation,
//! offset-addressed reads, startup recovery, and the time-based retention
//! cleaner. One mutex covers the active file handle and its cached size;
//! appends, reads, rotation, and retention deletion all serialize on it.
//!
//! A record is framed as a 4-byte little-endian length followed by the
//! payload. The offset returned by [`Wal::append`] is the global byte
//! position of the record's length prefix: segment start plus position
//! within the file. Offsets are dense, so `offset + 4 + len` is the next
//! record.

use crate::storage::segment::{self, SegmentFile};
use crate::{Result, SilomqError};
use bytes::{BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Bytes occupied by the length prefix of every record.
pub const LEN_PREFIX_SIZE: u64 = 4;

/// Configuration for the write-ahead log of one topic.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Topic directory holding the segment files.
    pub dir: PathBuf,
    /// Rotation threshold: a new segment is opened before an append once
    /// the active segment has reached this size.
    pub max_segment_size: u64,
    /// Age past which non-active segments are deleted by the cleaner.
    pub retention: Duration,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            max_segment_size: 1024 * 1024 * 1024, // 1GB
            retention: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

#[derive(Debug)]
struct ActiveSegment {
    /// `None` once the log has been closed.
    file: Option<File>,
    start: u64,
    size: u64,
}

/// The write-ahead log for a single topic.
///
/// All operations are thread-safe; the engine behaves correctly under true
/// parallelism.
#[derive(Debug)]
pub struct Wal {
    dir: PathBuf,
    max_segment_size: u64,
    retention: Duration,
    active: Mutex<ActiveSegment>,
}

impl Wal {
    /// Open the log, recovering the active segment from disk.
    ///
    /// Creates the topic directory and `0.log` if nothing exists yet;
    /// otherwise reopens the segment with the greatest start in append
    /// mode and caches its size from a stat. Record contents are not
    /// scanned; a torn tail from a prior crash is detected on read.
    pub fn open(config: WalConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.dir)?;

        let segments = segment::list_segments(&config.dir)?;
        let start = segment::active_segment(&segments)
            .map(|s| s.start)
            .unwrap_or(0);
        let (file, size) = open_segment(&config.dir, start)?;

        info!(
            dir = %config.dir.display(),
            start,
            size,
            "opened write-ahead log"
        );

        Ok(Self {
            dir: config.dir,
            max_segment_size: config.max_segment_size,
            retention: config.retention,
            active: Mutex::new(ActiveSegment {
                file: Some(file),
                start,
                size,
            }),
        })
    }

    /// Append a payload and return the global offset of its record.
    ///
    /// The length prefix and payload are written as one `write_all` and
    /// synced to disk before this returns. On a write or sync failure the
    /// segment is truncated back to its pre-append length and the cached
    /// size is left untouched, so a partial frame never becomes readable.
    pub fn append(&self, payload: &[u8]) -> Result<u64> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            SilomqError::Storage(io::Error::new(
                io::ErrorKind::InvalidInput,
                "payload exceeds u32::MAX bytes",
            ))
        })?;

        let mut active = self.active.lock();
        if active.size >= self.max_segment_size {
            self.rotate(&mut active)?;
        }

        let offset = active.start + active.size;
        let pre_append_size = active.size;

        let mut frame = BytesMut::with_capacity(LEN_PREFIX_SIZE as usize + payload.len());
        frame.put_u32_le(len);
        frame.put_slice(payload);

        let file = active.file.as_mut().ok_or_else(closed_error)?;
        if let Err(e) = file.write_all(&frame).and_then(|()| file.sync_all()) {
            if let Err(trunc) = file.set_len(pre_append_size) {
                warn!(offset, "failed to truncate partial append: {}", trunc);
            }
            return Err(e.into());
        }

        active.size += frame.len() as u64;
        Ok(offset)
    }

    /// Read the record whose length prefix starts at `offset`.
    ///
    /// Fails with [`SilomqError::OffsetNotFound`] when no segment covers
    /// the offset (before the first segment, or reclaimed by retention)
    /// and with [`SilomqError::Truncated`] when the segment ends before a
    /// full record is available.
    pub fn read(&self, offset: u64) -> Result<Bytes> {
        // Reads serialize with appends, rotation, and retention deletion.
        let _active = self.active.lock();

        let segments = segment::list_segments(&self.dir)?;
        let seg = segment::locate(&segments, offset).ok_or(SilomqError::OffsetNotFound(offset))?;

        read_record(seg, offset)
    }

    /// The offset the next append will return.
    pub fn next_offset(&self) -> u64 {
        let active = self.active.lock();
        active.start + active.size
    }

    /// Flush and close the active segment handle. Idempotent; subsequent
    /// appends fail with a storage error.
    pub fn close(&self) -> Result<()> {
        let mut active = self.active.lock();
        if let Some(file) = active.file.take() {
            file.sync_all()?;
            debug!(start = active.start, "closed write-ahead log");
        }
        Ok(())
    }

    /// Delete non-active segments older than the retention threshold.
    ///
    /// The active segment is never deleted, and a sole remaining segment
    /// is never deleted regardless of age. Returns the starts of the
    /// removed segments. Offsets inside removed segments become
    /// permanently unreadable.
    pub fn clean_expired(&self) -> Result<Vec<u64>> {
        let active = self.active.lock();

        let segments = segment::list_segments(&self.dir)?;
        if segments.len() <= 1 {
            return Ok(Vec::new());
        }

        let mut removed = Vec::new();
        for seg in &segments {
            if seg.start == active.start {
                continue;
            }
            let modified = std::fs::metadata(&seg.path)?.modified()?;
            let age = modified.elapsed().unwrap_or_default();
            if age > self.retention {
                std::fs::remove_file(&seg.path)?;
                info!(start = seg.start, "retention: deleted expired segment");
                removed.push(seg.start);
            }
        }
        Ok(removed)
    }

    /// Close the current active segment and open a fresh one at the
    /// current end offset. A crash between the close and the open leaves
    /// the old segment complete; the next startup reopens it as active
    /// and the next append re-triggers rotation.
    fn rotate(&self, active: &mut ActiveSegment) -> Result<()> {
        let new_start = active.start + active.size;

        if let Some(file) = active.file.take() {
            file.sync_all()?;
        }

        // Size is non-zero here only when recovering a rotation that a
        // previous process started but did not finish writing to.
        let (file, size) = open_segment(&self.dir, new_start)?;
        info!(old_start = active.start, new_start, "rotating segment");

        active.file = Some(file);
        active.start = new_start;
        active.size = size;
        Ok(())
    }
}

fn open_segment(dir: &Path, start: u64) -> Result<(File, u64)> {
    let path = segment::segment_path(dir, start);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

fn read_record(seg: &SegmentFile, offset: u64) -> Result<Bytes> {
    let mut file = File::open(&seg.path)?;
    let file_len = file.metadata()?.len();
    let local = offset - seg.start;

    if local.saturating_add(LEN_PREFIX_SIZE) > file_len {
        return Err(SilomqError::Truncated(offset));
    }
    file.seek(SeekFrom::Start(local))?;

    let mut len_buf = [0u8; LEN_PREFIX_SIZE as usize];
    file.read_exact(&mut len_buf)
        .map_err(|e| map_eof(e, offset))?;
    let len = u64::from(u32::from_le_bytes(len_buf));

    // A length that cannot fit in the file is either a torn tail from a
    // crash or a misaligned offset; fail before allocating garbage.
    let remaining = file_len - local - LEN_PREFIX_SIZE;
    if len > remaining {
        return Err(SilomqError::Truncated(offset));
    }

    let mut payload = vec![0u8; len as usize];
    file.read_exact(&mut payload)
        .map_err(|e| map_eof(e, offset))?;
    Ok(Bytes::from(payload))
}

fn map_eof(e: io::Error, offset: u64) -> SilomqError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SilomqError::Truncated(offset)
    } else {
        e.into()
    }
}

fn closed_error() -> SilomqError {
    SilomqError::Storage(io::Error::new(
        io::ErrorKind::Other,
        "write-ahead log is closed",
    ))
}

/// Run the retention cleaner at a fixed cadence until shutdown.
///
/// Cleaner errors are logged and swallowed; they never take the broker
/// down.
pub fn spawn_cleaner(
    wal: Arc<Wal>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match wal.clean_expired() {
                        Ok(removed) if !removed.is_empty() => {
                            debug!(count = removed.len(), "retention pass removed segments");
                        }
                        Ok(_) => {}
                        Err(e) => warn!("retention pass failed: {}", e),
                    }
                }
                _ = shutdown.recv() => {
                    debug!("retention cleaner shutting down");
                    break;
                }
            }
        }
    })
}
