//! Append-Only Log Module
//!
//! The single data file behind a store.
//!
//! ## Responsibilities
//! - Encode and decode individual records
//! - Append records with a forced flush before acknowledging
//! - Random-access reads of a record by offset and size
//! - Replay the whole file to rebuild the key index
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ Record 1                                              │
//! │ ┌──────────┬──────────┬──────────┬───────┬─────────┐  │
//! │ │ Ts (4)   │KeyLen (4)│ValLen (4)│  Key  │  Value  │  │
//! │ └──────────┴──────────┴──────────┴───────┴─────────┘  │
//! ├───────────────────────────────────────────────────────┤
//! │ Record 2                                              │
//! │ ┌──────────┬──────────┬──────────┬───────┬─────────┐  │
//! │ │ Ts (4)   │KeyLen (4)│ValLen (4)│  Key  │  Value  │  │
//! │ └──────────┴──────────┴──────────┴───────┴─────────┘  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. There is no file header, padding or
//! checksum; record boundaries are known only from the length fields.
//! A value length of `0xFFFF_FFFF` marks a tombstone with no value bytes.

mod file;
mod recovery;
pub mod record;

pub use file::LogFile;
pub use record::{Record, RecordHeader, HEADER_SIZE, TOMBSTONE_MARKER};
pub use recovery::{LogReplay, RecoveryResult};
