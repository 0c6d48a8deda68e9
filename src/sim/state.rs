//! Game state
//!
//! Everything that survives a reload lives here: the observer and every
//! cache ledger ever materialized. Spawn decisions that came up empty are
//! memoized in memory only; they are reproducible from `luck` so they never
//! need to be saved.

use std::collections::{BTreeMap, HashSet};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ledger::{CacheLedger, Coin};
use crate::error::GameError;
use crate::grid::Cell;
use crate::luck;

/// Outcome of considering a cell for a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// Cell was decided before (cache or not); nothing happened
    AlreadyDecided,
    /// Luck says no cache here
    Absent,
    /// A new cache was minted with this many coins
    Spawned(u32),
}

/// Parameters for the spawn decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRules {
    pub spawn_probability: f64,
    pub max_initial_coins: u32,
}

/// The observer: where they are, what they hold, where they've been
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverState {
    pub position: DVec2,
    pub cell: Cell,
    /// Held coins, most recently collected last
    pub coins: Vec<Coin>,
    /// Visited positions, oldest first
    pub path: Vec<DVec2>,
}

impl ObserverState {
    pub fn new(position: DVec2, cell: Cell) -> Self {
        Self {
            position,
            cell,
            coins: Vec::new(),
            path: vec![position],
        }
    }

    /// Record a move
    pub fn move_to(&mut self, position: DVec2, cell: Cell) {
        self.position = position;
        self.cell = cell;
        self.path.push(position);
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub observer: ObserverState,
    /// Materialized caches, sorted by cell for stable iteration
    caches: BTreeMap<Cell, CacheLedger>,
    /// Cells whose spawn decision has been made this session
    decided: HashSet<Cell>,
}

impl GameState {
    pub fn new(observer: ObserverState) -> Self {
        Self {
            observer,
            caches: BTreeMap::new(),
            decided: HashSet::new(),
        }
    }

    /// Adopt a ledger loaded from storage. Its cell counts as decided.
    pub fn insert_cache(&mut self, ledger: CacheLedger) {
        let cell = ledger.cell();
        self.decided.insert(cell);
        self.caches.insert(cell, ledger);
    }

    /// Run the spawn decision for `cell` once. Later calls are no-ops.
    pub fn consider_cell(&mut self, cell: Cell, rules: SpawnRules) -> SpawnOutcome {
        if self.caches.contains_key(&cell) || !self.decided.insert(cell) {
            return SpawnOutcome::AlreadyDecided;
        }
        if !luck::spawns_cache(cell, rules.spawn_probability) {
            return SpawnOutcome::Absent;
        }
        let count = luck::initial_coin_count(cell, rules.max_initial_coins);
        log::debug!("Spawned cache at {} with {} coins", cell, count);
        self.caches.insert(cell, CacheLedger::generate(cell, count));
        SpawnOutcome::Spawned(count)
    }

    pub fn is_decided(&self, cell: Cell) -> bool {
        self.decided.contains(&cell)
    }

    pub fn cache(&self, cell: Cell) -> Option<&CacheLedger> {
        self.caches.get(&cell)
    }

    pub fn has_cache(&self, cell: Cell) -> bool {
        self.caches.contains_key(&cell)
    }

    pub fn caches(&self) -> impl Iterator<Item = &CacheLedger> {
        self.caches.values()
    }

    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }

    /// Move the front coin of `cell`'s cache into the inventory
    pub fn collect(&mut self, cell: Cell) -> Result<Coin, GameError> {
        let ledger = self
            .caches
            .get_mut(&cell)
            .ok_or(GameError::NoCache(cell))?;
        let coin = ledger.collect_one()?;
        self.observer.coins.push(coin);
        Ok(coin)
    }

    /// Move the most recently collected coin into `cell`'s cache
    pub fn deposit(&mut self, cell: Cell) -> Result<Coin, GameError> {
        let ledger = self
            .caches
            .get_mut(&cell)
            .ok_or(GameError::NoCache(cell))?;
        let coin = self.observer.coins.pop().ok_or(GameError::EmptyInventory)?;
        ledger.deposit_one(coin);
        Ok(coin)
    }

    /// Coins across every ledger plus the inventory
    pub fn total_coins(&self) -> usize {
        self.caches.values().map(CacheLedger::len).sum::<usize>() + self.observer.coins.len()
    }
}
