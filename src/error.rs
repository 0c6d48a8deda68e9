//! Error types
//!
//! Everything a command can fail with. None of these are fatal: the
//! controller checks before it mutates, so a rejected command leaves state
//! untouched. `Storage` is the exception, it is reported after the in-memory
//! change has already been applied.

use thiserror::Error;

use crate::grid::Cell;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no coins left to collect at cache {0}")]
    EmptyLedger(Cell),
    #[error("no coins in inventory to deposit")]
    EmptyInventory,
    #[error("there is no cache at {0}")]
    NoCache(Cell),
    #[error("cache {0} is too far away to interact with")]
    OutOfReach(Cell),
    #[error("corrupt saved state: {0}")]
    CorruptState(String),
    #[error("position unavailable, tracking disabled")]
    PositionUnavailable,
    #[error("position tracking is off")]
    TrackingDisabled,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("storage rejected write of `{0}` (quota exceeded?)")]
    WriteRejected(String),
}

impl GameError {
    /// Errors that are an ordinary "no" to the player rather than a fault
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::Storage(_) | GameError::CorruptState(_))
    }
}
