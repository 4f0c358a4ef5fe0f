//! Tests for log replay
//!
//! These tests verify:
//! - Replay of an empty and a clean log
//! - Last record for a key wins
//! - Tombstones remove keys during replay
//! - Strict mode rejects truncated headers, keys and values
//! - TruncateTail mode keeps the valid prefix and cuts the file
//! - Verify mode (stats only, file untouched)

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use filekv::config::RecoveryMode;
use filekv::log::{record, LogReplay, HEADER_SIZE};
use filekv::FileKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.db");
    (temp_dir, log_path)
}

/// Write pre-encoded records back to back
fn write_raw(path: &PathBuf, records: &[Vec<u8>]) {
    let mut file = File::create(path).unwrap();
    for bytes in records {
        file.write_all(bytes).unwrap();
    }
    file.sync_all().unwrap();
}

fn append_raw(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}

fn put(ts: u32, key: &str, value: &str) -> Vec<u8> {
    record::encode(ts, key.as_bytes(), value.as_bytes()).unwrap()
}

// =============================================================================
// Clean Log Tests
// =============================================================================

#[test]
fn test_replay_empty_file() {
    let (_temp, log_path) = setup_temp_log();
    File::create(&log_path).unwrap();

    let (index, result) = LogReplay::replay(&log_path, RecoveryMode::Strict).unwrap();

    assert!(index.is_empty());
    assert_eq!(result.records_replayed, 0);
    assert_eq!(result.valid_len, 0);
    assert!(result.is_clean());
    assert!(!result.was_truncated);
}

#[test]
fn test_replay_missing_file_is_io_error() {
    let (_temp, log_path) = setup_temp_log();

    let result = LogReplay::replay(&log_path, RecoveryMode::Strict);
    assert!(matches!(result, Err(FileKvError::Io(_))));
}

#[test]
fn test_replay_records_positions() {
    let (_temp, log_path) = setup_temp_log();
    let a = put(10, "a", "1");
    let b = put(11, "bb", "22");
    write_raw(&log_path, &[a.clone(), b.clone()]);

    let (index, result) = LogReplay::replay(&log_path, RecoveryMode::Strict).unwrap();

    let info_a = index.get(b"a").unwrap();
    assert_eq!(info_a.timestamp, 10);
    assert_eq!(info_a.position, 0);
    assert_eq!(info_a.total_size, a.len() as u64);

    let info_b = index.get(b"bb").unwrap();
    assert_eq!(info_b.timestamp, 11);
    assert_eq!(info_b.position, a.len() as u64);
    assert_eq!(info_b.total_size, (HEADER_SIZE + 4) as u64);

    assert_eq!(result.records_replayed, 2);
    assert_eq!(result.live_keys, 2);
    assert_eq!(result.valid_len, (a.len() + b.len()) as u64);
}

#[test]
fn test_replay_last_write_wins() {
    let (_temp, log_path) = setup_temp_log();
    let first = put(5, "k", "old");
    let other = put(5, "x", "y");
    let second = put(5, "k", "newer");
    write_raw(&log_path, &[first.clone(), other.clone(), second.clone()]);

    let (index, result) = LogReplay::replay(&log_path, RecoveryMode::Strict).unwrap();

    let info = index.get(b"k").unwrap();
    assert_eq!(info.position, (first.len() + other.len()) as u64);
    assert_eq!(info.total_size, second.len() as u64);
    assert_eq!(result.records_replayed, 3);
    assert_eq!(result.live_keys, 2);
}

#[test]
fn test_replay_tombstone_removes_key() {
    let (_temp, log_path) = setup_temp_log();
    write_raw(
        &log_path,
        &[
            put(1, "k", "v"),
            record::encode_tombstone(2, b"k").unwrap(),
            put(3, "other", "v"),
        ],
    );

    let (index, result) = LogReplay::replay(&log_path, RecoveryMode::Strict).unwrap();

    assert!(!index.contains_key(b"k"));
    assert!(index.contains_key(b"other"));
    assert_eq!(result.tombstones_replayed, 1);
    assert_eq!(result.records_replayed, 3);
}

#[test]
fn test_replay_set_after_tombstone() {
    let (_temp, log_path) = setup_temp_log();
    let live = put(1, "k", "v");
    let tomb = record::encode_tombstone(2, b"k").unwrap();
    let again = put(3, "k", "back");
    write_raw(&log_path, &[live.clone(), tomb.clone(), again]);

    let (index, _) = LogReplay::replay(&log_path, RecoveryMode::Strict).unwrap();

    let info = index.get(b"k").unwrap();
    assert_eq!(info.position, (live.len() + tomb.len()) as u64);
}

// =============================================================================
// Strict Mode Tests
// =============================================================================

#[test]
fn test_strict_truncated_header() {
    let (_temp, log_path) = setup_temp_log();
    let good = put(1, "a", "1");
    write_raw(&log_path, &[good.clone()]);
    append_raw(&log_path, &[0u8; 5]);

    let result = LogReplay::replay(&log_path, RecoveryMode::Strict);

    match result {
        Err(FileKvError::CorruptRecord { offset, reason }) => {
            assert_eq!(offset, good.len() as u64);
            assert!(reason.contains("header"));
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
    // Strict mode never modifies the file
    assert_eq!(fs::metadata(&log_path).unwrap().len(), good.len() as u64 + 5);
}

#[test]
fn test_strict_truncated_key() {
    let (_temp, log_path) = setup_temp_log();
    let bad = put(1, "long-key", "value");
    write_raw(&log_path, &[bad[..HEADER_SIZE + 3].to_vec()]);

    let result = LogReplay::replay(&log_path, RecoveryMode::Strict);

    match result {
        Err(FileKvError::CorruptRecord { offset, reason }) => {
            assert_eq!(offset, 0);
            assert!(reason.contains("key"));
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
}

#[test]
fn test_strict_truncated_value() {
    let (_temp, log_path) = setup_temp_log();
    let good = put(1, "a", "1");
    let bad = put(2, "b", "a longer value");
    write_raw(&log_path, &[good.clone(), bad[..bad.len() - 2].to_vec()]);

    let result = LogReplay::replay(&log_path, RecoveryMode::Strict);

    match result {
        Err(FileKvError::CorruptRecord { offset, reason }) => {
            assert_eq!(offset, good.len() as u64);
            assert!(reason.contains("value"));
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
}

#[test]
fn test_strict_garbage_length_does_not_allocate() {
    let (_temp, log_path) = setup_temp_log();
    // Header claiming ~4 GiB of key and value with nothing behind it
    let mut garbage = Vec::new();
    garbage.extend_from_slice(&1u32.to_le_bytes());
    garbage.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
    garbage.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
    write_raw(&log_path, &[garbage]);

    let result = LogReplay::replay(&log_path, RecoveryMode::Strict);
    assert!(matches!(result, Err(FileKvError::CorruptRecord { offset: 0, .. })));
}

// =============================================================================
// TruncateTail Mode Tests
// =============================================================================

#[test]
fn test_truncate_tail_keeps_prefix() {
    let (_temp, log_path) = setup_temp_log();
    let a = put(1, "a", "1");
    let b = put(2, "b", "2");
    let c = put(3, "c", "3");
    write_raw(&log_path, &[a.clone(), b.clone(), c[..c.len() - 1].to_vec()]);

    let (index, result) = LogReplay::replay(&log_path, RecoveryMode::TruncateTail).unwrap();

    let valid = (a.len() + b.len()) as u64;
    assert!(index.contains_key(b"a"));
    assert!(index.contains_key(b"b"));
    assert!(!index.contains_key(b"c"));
    assert_eq!(result.valid_len, valid);
    assert_eq!(result.damaged_bytes, (c.len() - 1) as u64);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&log_path).unwrap().len(), valid);
}

#[test]
fn test_truncate_tail_then_clean() {
    let (_temp, log_path) = setup_temp_log();
    write_raw(&log_path, &[put(1, "a", "1")]);
    append_raw(&log_path, &[9u8; 3]);

    LogReplay::replay(&log_path, RecoveryMode::TruncateTail).unwrap();
    let (_, result) = LogReplay::replay(&log_path, RecoveryMode::Strict).unwrap();

    assert!(result.is_clean());
    assert!(!result.was_truncated);
    assert_eq!(result.live_keys, 1);
}

// =============================================================================
// Verify Tests
// =============================================================================

#[test]
fn test_verify_reports_damage_without_truncating() {
    let (_temp, log_path) = setup_temp_log();
    let a = put(1, "a", "1");
    write_raw(&log_path, &[a.clone()]);
    append_raw(&log_path, &[1u8; 7]);

    let result = LogReplay::verify(&log_path).unwrap();

    assert_eq!(result.records_replayed, 1);
    assert_eq!(result.valid_len, a.len() as u64);
    assert_eq!(result.damaged_bytes, 7);
    assert!(!result.is_clean());
    assert!(!result.was_truncated);
    assert_eq!(fs::metadata(&log_path).unwrap().len(), a.len() as u64 + 7);
}
