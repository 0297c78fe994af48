//! Segment file enumeration and lookup.
//!
//! A segment is named `<start>.log` where `<start>` is the decimal global
//! offset of its first byte, with no zero padding. The segment with the
//! greatest start is the active one; a global offset lives in the segment
//! with the greatest start that does not exceed it.

use crate::Result;
use std::path::{Path, PathBuf};

const SEGMENT_SUFFIX: &str = ".log";

/// A segment file on disk, identified by its global start offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    pub start: u64,
    pub path: PathBuf,
}

/// Canonical path of the segment starting at `start`.
pub fn segment_path(dir: &Path, start: u64) -> PathBuf {
    dir.join(format!("{}{}", start, SEGMENT_SUFFIX))
}

/// Enumerate the segments under `dir`, ascending by start offset.
///
/// Entries whose name is not `<decimal>.log` are ignored.
pub fn list_segments(dir: &Path) -> Result<Vec<SegmentFile>> {
    let mut segments = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(SEGMENT_SUFFIX) else {
            continue;
        };
        if let Ok(start) = stem.parse::<u64>() {
            segments.push(SegmentFile { start, path });
        }
    }
    segments.sort_by_key(|s| s.start);
    Ok(segments)
}

/// The segment currently accepting appends: the one with the greatest start.
pub fn active_segment(segments: &[SegmentFile]) -> Option<&SegmentFile> {
    segments.last()
}

/// The segment containing `offset`: greatest start satisfying
/// `start <= offset`. `None` if the list is empty or every start exceeds
/// `offset` (the segment was reclaimed by retention).
pub fn locate(segments: &[SegmentFile], offset: u64) -> Option<&SegmentFile> {
    segments.iter().rev().find(|s| s.start <= offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_list_orders_by_start() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "1024.log");
        touch(dir.path(), "0.log");
        touch(dir.path(), "96.log");

        let segments = list_segments(dir.path()).unwrap();
        let starts: Vec<u64> = segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 96, 1024]);
    }

    #[test]
    fn test_list_ignores_foreign_entries() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0.log");
        touch(dir.path(), "offsets.json");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "abc.log");
        std::fs::create_dir(dir.path().join("42.log.d")).unwrap();

        let segments = list_segments(dir.path()).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 0);
    }

    #[test]
    fn test_list_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(list_segments(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_active_is_greatest_start() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0.log");
        touch(dir.path(), "512.log");
        touch(dir.path(), "128.log");

        let segments = list_segments(dir.path()).unwrap();
        assert_eq!(active_segment(&segments).unwrap().start, 512);
        assert!(active_segment(&[]).is_none());
    }

    #[test]
    fn test_locate_picks_covering_segment() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0.log");
        touch(dir.path(), "100.log");
        touch(dir.path(), "250.log");

        let segments = list_segments(dir.path()).unwrap();
        assert_eq!(locate(&segments, 0).unwrap().start, 0);
        assert_eq!(locate(&segments, 99).unwrap().start, 0);
        assert_eq!(locate(&segments, 100).unwrap().start, 100);
        assert_eq!(locate(&segments, 101).unwrap().start, 100);
        assert_eq!(locate(&segments, 9999).unwrap().start, 250);
    }

    #[test]
    fn test_locate_before_first_segment() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "100.log");

        let segments = list_segments(dir.path()).unwrap();
        assert!(locate(&segments, 50).is_none());
        assert!(locate(&[], 0).is_none());
    }

    #[test]
    fn test_segment_path_is_plain_decimal() {
        let path = segment_path(Path::new("/data/events"), 1024);
        assert_eq!(path, PathBuf::from("/data/events/1024.log"));
        assert_eq!(
            segment_path(Path::new("/data/events"), 0),
            PathBuf::from("/data/events/0.log")
        );
    }
}
