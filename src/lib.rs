//! Geocoin - coin caches scattered over an endless lat/lng grid
//!
//! Core modules:
//! - `grid`: Cell addressing and interning
//! - `luck`: Deterministic per-cell randomness (spawn + initial contents)
//! - `sim`: Ledgers, observer state, visibility window and command dispatch
//! - `persistence`: Key-value stores and the persisted snapshot schema
//! - `settings`: World configuration

pub mod error;
pub mod grid;
pub mod luck;
pub mod persistence;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{GameError, StorageError};
pub use grid::{Board, Cell, CellBounds};
pub use settings::WorldConfig;
pub use sim::{CacheLedger, Coin, Command, Controller, Direction, GameState, View};

/// World configuration defaults
pub mod consts {
    /// Edge length of one grid cell, in degrees
    pub const TILE_DEGREES: f64 = 1e-4;
    /// Visibility window radius in cells (square window, Chebyshev distance)
    pub const NEIGHBORHOOD_SIZE: u32 = 8;
    /// Largest accepted window radius; a refresh scans (2r + 1)^2 cells
    pub const MAX_VISIBILITY_RADIUS: u32 = 64;
    /// Chance that any given cell holds a cache
    pub const CACHE_SPAWN_PROBABILITY: f64 = 0.05;
    /// Upper bound (exclusive) on coins generated into a fresh cache
    pub const MAX_INITIAL_COINS: u32 = 10;
    /// How close (in cells) the observer must be to touch a cache
    pub const INTERACTION_RADIUS: u32 = 1;

    /// Default observer start (Oakes College classroom)
    pub const START_LAT: f64 = 36.98949379578401;
    pub const START_LNG: f64 = -122.06277128548504;
}
