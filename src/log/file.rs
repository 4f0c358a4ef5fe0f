//! Log File
//!
//! Handles appending records to, and reading records back from, the log.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::config::SyncStrategy;
use crate::error::{FileKvError, Result};

/// Append-only handle on the log file
///
/// The file is opened with `O_APPEND`, so every write lands at end-of-file.
/// `len` is taken from the file's metadata at open and checked against it
/// after every write.
#[derive(Debug)]
pub struct LogFile {
    file: File,
    path: PathBuf,
    len: u64,
    sync_strategy: SyncStrategy,
    unsynced: usize,
}

impl LogFile {
    /// Open or create the log file
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let len = file.metadata()?.len();
        debug!(path = %path.display(), len, "opened log file");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an encoded record and return the offset it starts at.
    ///
    /// Under [`SyncStrategy::EveryWrite`] the record is on stable storage
    /// when this returns `Ok`. If another writer changed the file length,
    /// the append fails with [`FileKvError::LogDesync`] and the returned
    /// offset would have been wrong; the length is not advanced, so every
    /// later append fails the same way.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let position = self.len;
        self.file.write_all(bytes)?;

        let expected = position + bytes.len() as u64;
        let actual = self.file.metadata()?.len();
        if actual != expected {
            return Err(FileKvError::LogDesync { expected, actual });
        }
        self.len = expected;
        self.unsynced += 1;

        match self.sync_strategy {
            SyncStrategy::EveryWrite => self.sync()?,
            SyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync()?,
            SyncStrategy::EveryNEntries { .. } => {}
        }

        trace!(position, size = bytes.len(), "appended record");
        Ok(position)
    }

    /// Read exactly `len` bytes starting at `position`
    pub fn read_at(&mut self, position: u64, len: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(position))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Sync and release the file handle
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    /// Length of the log in bytes, i.e. the offset of the next append
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends written since the last sync
    pub fn unsynced_count(&self) -> usize {
        self.unsynced
    }
}
