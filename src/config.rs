//! Configuration for filekv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{FileKvError, Result};

/// Main configuration for a filekv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only log file. Created if it does not exist.
    pub path: PathBuf,

    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Recovery Configuration
    // -------------------------------------------------------------------------
    /// What to do when replay hits an incomplete record
    pub recovery_mode: RecoveryMode,

    // -------------------------------------------------------------------------
    // Delete Configuration
    // -------------------------------------------------------------------------
    /// Whether deletes are written to the log
    pub delete_mode: DeleteMode,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append (a returned write is durable)
    EveryWrite,

    /// fsync after every N appends; `DiskStore::sync` and `close` flush the rest
    EveryNEntries { count: usize },
}

/// Policy for an incomplete record found while replaying the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Fail the open with `CorruptRecord`; the file is left untouched
    Strict,

    /// Keep every record before the damage and truncate the file there
    TruncateTail,
}

/// How `DiskStore::delete` is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Drop the index entry only. Nothing is written, so the key's last
    /// record is found again on the next open and the key reappears.
    Unpersisted,

    /// Append a tombstone record so the delete survives a restart
    Tombstone,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./filekv.db"),
            sync_strategy: SyncStrategy::EveryWrite,
            recovery_mode: RecoveryMode::Strict,
            delete_mode: DeleteMode::Unpersisted,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration before a store is opened with it
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(FileKvError::Config("log path is empty".to_string()));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(FileKvError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the recovery mode
    pub fn recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.config.recovery_mode = mode;
        self
    }

    /// Set the delete mode
    pub fn delete_mode(mut self, mode: DeleteMode) -> Self {
        self.config.delete_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
