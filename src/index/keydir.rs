//! KeyIndex implementation
//!
//! HashMap from raw key bytes to [`KeyInfo`].

use std::collections::HashMap;

use super::KeyInfo;

/// In-memory index of live keys
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: HashMap<Vec<u8>, KeyInfo>,
}

impl KeyIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<KeyInfo> {
        self.entries.get(key).copied()
    }

    /// Insert or overwrite, returning the previous location
    pub fn insert(&mut self, key: Vec<u8>, info: KeyInfo) -> Option<KeyInfo> {
        self.entries.insert(key, info)
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over live keys in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(Vec::as_slice)
    }

    /// Total size of the records the index points at
    pub fn live_bytes(&self) -> u64 {
        self.entries.values().map(|info| info.total_size).sum()
    }
}
