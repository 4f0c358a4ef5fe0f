//! Key Index Module
//!
//! In-memory directory of where each live key's latest record sits in the log.
//!
//! ## Responsibilities
//! - O(1) lookup of a key's record location
//! - Repoint a key to its newest record on overwrite
//! - Forget a key on delete
//!
//! ## Data Structure Choice
//! A plain `HashMap` owned by the store:
//! - No ordering needed for point lookups
//! - Single owner, so no internal locking

mod keydir;

pub use keydir::KeyIndex;

/// Location of a key's latest record in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    /// Timestamp stored in the record header (whole seconds)
    pub timestamp: u32,

    /// Byte offset of the record's first header byte
    pub position: u64,

    /// Header + key + value size in bytes
    pub total_size: u64,
}

impl KeyInfo {
    pub fn new(timestamp: u32, position: u64, total_size: u64) -> Self {
        Self {
            timestamp,
            position,
            total_size,
        }
    }
}
