//! Cache ledgers and coins
//!
//! A ledger is the FIFO queue of coins sitting in one cache. Coins are only
//! ever created by `CacheLedger::generate`; after that they move between
//! ledgers and the observer's inventory but are never copied or dropped.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, StorageError};
use crate::grid::Cell;

/// A coin, identified by the cell it was minted in and a per-cell serial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coin {
    pub i: i32,
    pub j: i32,
    pub serial: u32,
}

impl Coin {
    pub fn new(home: Cell, serial: u32) -> Self {
        Self {
            i: home.i,
            j: home.j,
            serial,
        }
    }

    pub fn home(&self) -> Cell {
        Cell::new(self.i, self.j)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.i, self.j, self.serial)
    }
}

/// Persisted form of a ledger
///
/// Unknown fields are ignored and a missing `coins` list reads as empty, so
/// older and newer saves stay loadable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(default)]
    pub coins: Vec<Coin>,
}

/// Coins resident in one cache, front = next to be collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLedger {
    cell: Cell,
    coins: VecDeque<Coin>,
}

impl CacheLedger {
    pub fn new(cell: Cell) -> Self {
        Self {
            cell,
            coins: VecDeque::new(),
        }
    }

    /// Mint `count` coins homed at `cell`, serials ascending from zero
    pub fn generate(cell: Cell, count: u32) -> Self {
        Self {
            cell,
            coins: (0..count).map(|serial| Coin::new(cell, serial)).collect(),
        }
    }

    /// Rebuild a ledger from its serialized form
    pub fn from_serialized(cell: Cell, encoded: &str) -> Result<Self, GameError> {
        let mut ledger = Self::new(cell);
        ledger.restore(encoded)?;
        Ok(ledger)
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn coins(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    /// Copy of the current contents, in collection order
    pub fn snapshot(&self) -> Vec<Coin> {
        self.coins.iter().copied().collect()
    }

    /// Take the foremost coin
    pub fn collect_one(&mut self) -> Result<Coin, GameError> {
        self.coins
            .pop_front()
            .ok_or(GameError::EmptyLedger(self.cell))
    }

    /// Append a coin; any home cell is accepted
    pub fn deposit_one(&mut self, coin: Coin) {
        self.coins.push_back(coin);
    }

    pub fn to_record(&self) -> LedgerRecord {
        LedgerRecord {
            coins: self.snapshot(),
        }
    }

    pub fn serialize(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Replace contents with a decoded ledger
    ///
    /// On failure the ledger is left as it was.
    pub fn restore(&mut self, encoded: &str) -> Result<(), GameError> {
        let record: LedgerRecord = serde_json::from_str(encoded).map_err(|e| {
            GameError::CorruptState(format!("ledger for cache {}: {e}", self.cell))
        })?;
        self.coins = record.coins.into();
        Ok(())
    }
}
