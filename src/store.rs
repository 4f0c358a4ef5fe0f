//! Store Module
//!
//! The disk store that coordinates the log and the key index.
//!
//! ## Responsibilities
//! - Rebuild the index from the log on open
//! - Append on set (and on delete, with tombstones enabled)
//! - Serve reads by seeking to the indexed offset
//! - Release the file on close

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::config::{Config, DeleteMode};
use crate::error::{FileKvError, Result};
use crate::index::{KeyIndex, KeyInfo};
use crate::log::{record, LogFile, LogReplay, RecoveryResult};

/// A key-value store backed by one append-only log file
///
/// ## Lifecycle
///
/// - [`DiskStore::open`] replays the log (if any) and opens it for appends.
///   There is no uninitialized store.
/// - [`DiskStore::close`] syncs and releases the file. Every call after that,
///   including a second `close`, fails with [`FileKvError::InvalidState`].
///
/// ## Ownership
///
/// The store exclusively owns its file handle and index. Reads move the file
/// cursor, so `get` takes `&mut self` like the writes do; nothing is shared
/// and no locks are taken. Callers that need to share a store across threads
/// must wrap it themselves.
///
/// ## Deletes
///
/// With the default [`DeleteMode::Unpersisted`], `delete` only drops the index
/// entry. The key's last record is still in the log, so the key comes back
/// with its last value the next time the file is opened.
#[derive(Debug)]
pub struct DiskStore {
    /// Store configuration
    config: Config,

    /// The log; `None` once closed
    log: Option<LogFile>,

    /// Live keys and where their records are
    index: KeyIndex,

    /// What the replay on open found
    recovery: RecoveryResult,
}

/// Space usage of an open store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub live_keys: usize,

    /// Size of the log file
    pub log_bytes: u64,

    /// Bytes of the records the index points at
    pub live_bytes: u64,

    /// Overwritten, deleted and tombstone records
    pub dead_bytes: u64,
}

impl DiskStore {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Replay the existing log into the index
    /// 2. Open/create the log for appends
    /// 3. Check the file did not change in between
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Rebuild the index
        let (index, recovery) = if config.path.exists() {
            LogReplay::replay(&config.path, config.recovery_mode)?
        } else {
            (KeyIndex::new(), RecoveryResult::default())
        };

        // Step 2: Appends continue from the file's real length
        let log = LogFile::open(&config.path, config.sync_strategy)?;

        // Step 3: Anything past the replayed prefix was written by someone else
        if log.len() != recovery.valid_len {
            return Err(FileKvError::LogDesync {
                expected: recovery.valid_len,
                actual: log.len(),
            });
        }

        info!(
            path = %config.path.display(),
            keys = index.len(),
            records = recovery.records_replayed,
            log_bytes = log.len(),
            "store opened"
        );

        Ok(Self {
            config,
            log: Some(log),
            index,
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().path(path.as_ref()).build())
    }

    /// Get the current value of a key
    ///
    /// Absent keys fail with `KeyNotFound` without touching the file.
    pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let log = Self::open_log(&mut self.log)?;
        let info = self.index.get(key).ok_or(FileKvError::KeyNotFound)?;

        let bytes = log.read_at(info.position, info.total_size)?;
        let record = record::decode_at(&bytes, info.position)?;

        if record.key != key {
            return Err(FileKvError::corrupt(
                info.position,
                "record key does not match the indexed key",
            ));
        }
        record.value.ok_or_else(|| {
            FileKvError::corrupt(info.position, "indexed record is a tombstone")
        })
    }

    /// Set a key to a value
    ///
    /// Steps:
    /// 1. Encode the record
    /// 2. Append and flush it
    /// 3. Point the index at it
    ///
    /// If step 2 fails the index is left as it was.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let log = Self::open_log(&mut self.log)?;

        let timestamp = unix_timestamp();
        let bytes = record::encode(timestamp, key, value)?;
        let position = log.append(&bytes)?;

        let size = bytes.len() as u64;
        self.index
            .insert(key.to_vec(), KeyInfo::new(timestamp, position, size));

        debug!(position, size, "set key");
        Ok(())
    }

    /// Set a key that must already exist
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Self::open_log(&mut self.log)?;
        if !self.index.contains_key(key) {
            return Err(FileKvError::KeyNotFound);
        }
        self.set(key, value)
    }

    /// Delete a key
    ///
    /// See the type-level docs for how the configured [`DeleteMode`] affects
    /// what happens on the next open.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        let log = Self::open_log(&mut self.log)?;
        if !self.index.contains_key(key) {
            return Err(FileKvError::KeyNotFound);
        }

        if self.config.delete_mode == DeleteMode::Tombstone {
            let bytes = record::encode_tombstone(unix_timestamp(), key)?;
            let position = log.append(&bytes)?;
            debug!(position, "wrote tombstone");
        }

        self.index.remove(key);
        debug!("deleted key");
        Ok(())
    }

    /// Live keys in byte order
    pub fn list(&self) -> Result<Vec<Vec<u8>>> {
        self.ensure_open()?;
        let mut keys: Vec<Vec<u8>> = self.index.keys().map(<[u8]>::to_vec).collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Force a durable flush of everything appended so far
    pub fn sync(&mut self) -> Result<()> {
        Self::open_log(&mut self.log)?.sync()
    }

    /// Space usage of the log
    pub fn stats(&self) -> Result<StoreStats> {
        let log = self.log.as_ref().ok_or_else(closed)?;
        let live_bytes = self.index.live_bytes();
        Ok(StoreStats {
            live_keys: self.index.len(),
            log_bytes: log.len(),
            live_bytes,
            dead_bytes: log.len().saturating_sub(live_bytes),
        })
    }

    /// Sync and release the log file
    ///
    /// The store is closed even if the final sync fails.
    pub fn close(&mut self) -> Result<()> {
        let log = self.log.take().ok_or_else(closed)?;
        log.close()?;
        info!(path = %self.config.path.display(), "store closed");
        Ok(())
    }

    fn open_log(log: &mut Option<LogFile>) -> Result<&mut LogFile> {
        log.as_mut().ok_or_else(closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.log.is_some() {
            Ok(())
        } else {
            Err(closed())
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Where the key's current record is, if it is live
    pub fn key_info(&self, key: &[u8]) -> Option<KeyInfo> {
        self.index.get(key)
    }

    pub fn is_open(&self) -> bool {
        self.log.is_some()
    }

    /// What the replay on open found
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }
}

impl Drop for DiskStore {
    fn drop(&mut self) {
        if let Some(mut log) = self.log.take() {
            if let Err(e) = log.sync() {
                warn!(path = %self.config.path.display(), "sync on drop failed: {}", e);
            }
        }
    }
}

fn closed() -> FileKvError {
    FileKvError::InvalidState("store is closed".to_string())
}

/// Current time in whole seconds since the Unix epoch
fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
