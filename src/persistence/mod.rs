//! Save/load persistence
//!
//! Features:
//! - Pluggable key-value store (memory, JSON file, browser LocalStorage)
//! - Fixed key set, one JSON value per key
//! - Per-key corruption recovery: a bad entry loads as empty, the rest loads
//! - List keys recover per element: one bad coin or cache drops only itself
//! - Whole-snapshot writes after every mutating command

pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local_storage;
pub mod memory;

pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;
pub use memory::MemoryStore;

use glam::DVec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::grid::Cell;
use crate::sim::{CacheLedger, Coin, GameState};

/// Storage keys
pub mod keys {
    pub const POSITION: &str = "observer_position";
    pub const CELL: &str = "observer_cell";
    pub const COINS: &str = "observer_coins";
    pub const PATH: &str = "observer_path";
    pub const CACHES: &str = "caches";

    pub const ALL: [&str; 5] = [POSITION, CELL, COINS, PATH, CACHES];
}

/// Durable string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write several keys. Backends that can do this in one step should.
    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove every game key
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// One entry of the `caches` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub i: i32,
    pub j: i32,
    /// Serialized `CacheLedger`. Missing loads as a corrupt (empty) ledger.
    #[serde(default)]
    pub ledger: String,
}

impl CacheEntry {
    pub fn cell(&self) -> Cell {
        Cell::new(self.i, self.j)
    }
}

/// Everything that is written to / read from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedGameState {
    pub position: Option<DVec2>,
    pub cell: Option<Cell>,
    pub coins: Vec<Coin>,
    pub path: Vec<DVec2>,
    pub caches: Vec<CacheEntry>,
}

impl PersistedGameState {
    /// Snapshot the durable parts of `state`
    pub fn capture(state: &GameState) -> Result<Self, StorageError> {
        let caches = state
            .caches()
            .map(|ledger| {
                let cell = ledger.cell();
                Ok(CacheEntry {
                    i: cell.i,
                    j: cell.j,
                    ledger: ledger.serialize()?,
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(Self {
            position: Some(state.observer.position),
            cell: Some(state.observer.cell),
            coins: state.observer.coins.clone(),
            path: state.observer.path.clone(),
            caches,
        })
    }

    /// Read every key. Missing, unreadable or corrupt keys load as empty;
    /// inside a list key only the malformed elements are dropped.
    pub fn read(store: &impl KeyValueStore) -> Self {
        Self {
            position: read_key(store, keys::POSITION),
            cell: read_key(store, keys::CELL),
            coins: read_list(store, keys::COINS),
            path: read_list(store, keys::PATH),
            caches: read_list(store, keys::CACHES),
        }
    }

    /// Write the whole snapshot
    pub fn write(&self, store: &mut impl KeyValueStore) -> Result<(), StorageError> {
        let mut entries = Vec::with_capacity(keys::ALL.len());
        if let Some(position) = self.position {
            entries.push((keys::POSITION, serde_json::to_string(&position)?));
        }
        if let Some(cell) = self.cell {
            entries.push((keys::CELL, serde_json::to_string(&cell)?));
        }
        entries.push((keys::COINS, serde_json::to_string(&self.coins)?));
        entries.push((keys::PATH, serde_json::to_string(&self.path)?));
        entries.push((keys::CACHES, serde_json::to_string(&self.caches)?));
        store.set_all(&entries)
    }

    /// Decode the cache entries into ledgers
    ///
    /// A ledger that fails to decode comes back empty (its key still exists,
    /// so it is never regenerated). Duplicate cells keep the first entry.
    pub fn ledgers(&self) -> Vec<CacheLedger> {
        let mut seen = std::collections::HashSet::new();
        let mut ledgers = Vec::with_capacity(self.caches.len());
        for entry in &self.caches {
            let cell = entry.cell();
            if !seen.insert(cell) {
                log::warn!("Duplicate saved cache {}, keeping first", cell);
                continue;
            }
            match CacheLedger::from_serialized(cell, &entry.ledger) {
                Ok(ledger) => ledgers.push(ledger),
                Err(e) => {
                    log::warn!("{}; treating cache as empty", e);
                    ledgers.push(CacheLedger::new(cell));
                }
            }
        }
        ledgers
    }
}

fn read_key<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            log::error!("Failed to read `{}`: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Corrupt saved `{}` ({}), ignoring", key, e);
            None
        }
    }
}

/// Read a JSON array key element by element, skipping the ones that don't
/// decode as `T`
fn read_list<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Vec<T> {
    let Some(values) = read_key::<Vec<serde_json::Value>>(store, key) else {
        return Vec::new();
    };
    let total = values.len();
    let items: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Corrupt element {} of `{}` ({}), skipping", index, key, e);
                None
            }
        })
        .collect();
    if items.len() < total {
        log::warn!("Loaded {}/{} elements of `{}`", items.len(), total, key);
    }
    items
}
