//! Log Replay
//!
//! Rebuilds the key index by scanning the log from the first byte.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{debug, trace, warn};

use super::record::{Record, RecordHeader, HEADER_SIZE};
use crate::config::RecoveryMode;
use crate::error::{FileKvError, Result};
use crate::index::{KeyIndex, KeyInfo};

/// Replays a log file into a [`KeyIndex`]
pub struct LogReplay;

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of complete records scanned, tombstones included
    pub records_replayed: u64,

    /// Number of tombstones among them
    pub tombstones_replayed: u64,

    /// Keys left in the index after replay
    pub live_keys: usize,

    /// Offset just past the last complete record
    pub valid_len: u64,

    /// Bytes after `valid_len` that did not form a complete record
    pub damaged_bytes: u64,

    /// Whether the damaged tail was cut off the file
    pub was_truncated: bool,
}

impl RecoveryResult {
    pub fn is_clean(&self) -> bool {
        self.damaged_bytes == 0
    }
}

/// Outcome of reading one record during the scan
enum Scan {
    Record(Record, u64),
    End,
    Incomplete(String),
}

impl LogReplay {
    /// Replay the log at `path`.
    ///
    /// Records are applied in file order, so the last record for a key wins.
    /// On an incomplete record, [`RecoveryMode::Strict`] fails with
    /// `CorruptRecord` and leaves the file alone; [`RecoveryMode::TruncateTail`]
    /// keeps what was read and truncates the file at the damaged record.
    pub fn replay(path: &Path, mode: RecoveryMode) -> Result<(KeyIndex, RecoveryResult)> {
        let (index, mut result, damage) = Self::scan(path)?;

        if let Some(reason) = damage {
            match mode {
                RecoveryMode::Strict => {
                    return Err(FileKvError::corrupt(result.valid_len, reason));
                }
                RecoveryMode::TruncateTail => {
                    let file = OpenOptions::new().write(true).open(path)?;
                    file.set_len(result.valid_len)?;
                    file.sync_all()?;
                    result.was_truncated = true;
                    warn!(
                        path = %path.display(),
                        offset = result.valid_len,
                        discarded = result.damaged_bytes,
                        "truncated damaged log tail: {}",
                        reason
                    );
                }
            }
        }

        Ok((index, result))
    }

    /// Scan the log at `path` without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(KeyIndex, RecoveryResult, Option<String>)> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut index = KeyIndex::new();
        let mut result = RecoveryResult::default();
        let mut offset = 0u64;

        let damage = loop {
            match Self::next_record(&mut reader, offset, file_len)? {
                Scan::End => break None,
                Scan::Incomplete(reason) => break Some(reason),
                Scan::Record(record, size) => {
                    trace!(offset, size, tombstone = record.is_tombstone(), "replayed record");
                    if record.is_tombstone() {
                        index.remove(&record.key);
                        result.tombstones_replayed += 1;
                    } else {
                        index.insert(record.key, KeyInfo::new(record.timestamp, offset, size));
                    }
                    result.records_replayed += 1;
                    offset += size;
                }
            }
        };

        result.valid_len = offset;
        result.damaged_bytes = file_len.saturating_sub(offset);
        result.live_keys = index.len();

        debug!(
            path = %path.display(),
            records = result.records_replayed,
            live_keys = result.live_keys,
            damaged_bytes = result.damaged_bytes,
            "log scan finished"
        );

        Ok((index, result, damage))
    }

    fn next_record<R: Read>(reader: &mut R, offset: u64, file_len: u64) -> Result<Scan> {
        let mut head = [0u8; HEADER_SIZE];
        let n = read_full(reader, &mut head)?;
        if n == 0 {
            return Ok(Scan::End);
        }
        if n < HEADER_SIZE {
            return Ok(Scan::Incomplete(format!(
                "truncated header: {} of {} bytes",
                n, HEADER_SIZE
            )));
        }

        let header = RecordHeader::from_bytes(head);
        let size = header.record_size();

        // Checked before allocating: a garbage length must not size the buffer.
        let key_end = offset + HEADER_SIZE as u64 + header.key_len as u64;
        if key_end > file_len {
            return Ok(Scan::Incomplete(format!(
                "truncated key: record needs {} bytes, {} left in file",
                size,
                file_len - offset
            )));
        }
        if offset + size > file_len {
            return Ok(Scan::Incomplete(format!(
                "truncated value: record needs {} bytes, {} left in file",
                size,
                file_len - offset
            )));
        }

        let mut body = vec![0u8; header.body_len() as usize];
        let n = read_full(reader, &mut body)?;
        if n < body.len() {
            return Ok(Scan::Incomplete(format!(
                "truncated body: {} of {} bytes",
                n,
                body.len()
            )));
        }

        Ok(Scan::Record(Record::from_parts(header, body), size))
    }
}

/// Like `read_exact`, but reports how many bytes were read before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
