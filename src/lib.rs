//! # filekv
//!
//! An embedded, single-process key-value store with:
//! - One append-only log file, fsynced on every write
//! - An in-memory index for O(1) lookups
//! - Crash recovery by replaying the log on open
//! - Optional persisted tombstones for deletes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         DiskStore                           │
//! │            (get / set / delete / close, one owner)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   LogFile   │          │  KeyIndex   │
//!   │  (Append)   │          │  (HashMap)  │
//!   └──────┬──────┘          └──────▲──────┘
//!          │                        │
//!          ▼                        │
//!   ┌─────────────┐          ┌──────┴──────┐
//!   │ RecordCodec │─────────▶│  LogReplay  │
//!   │  (12B hdr)  │          │  (on open)  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use filekv::DiskStore;
//!
//! let mut store = DiskStore::open_path("t.db")?;
//! store.set(b"hello", b"world")?;
//! assert_eq!(store.get(b"hello")?, b"world");
//! store.delete(b"hello")?;
//! store.close()?;
//! # Ok::<(), filekv::FileKvError>(())
//! ```
//!
//! ## Limitations
//!
//! Not implemented: compaction of stale records, checksums, file locking
//! and multi-writer access. The file only ever grows.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod index;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FileKvError, Result};
pub use config::{Config, DeleteMode, RecoveryMode, SyncStrategy};
pub use index::{KeyIndex, KeyInfo};
pub use store::{DiskStore, StoreStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of filekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
