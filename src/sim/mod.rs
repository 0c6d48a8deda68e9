//! Game core
//!
//! Everything here is deterministic and single-threaded:
//! - Cache contents come from `luck`, never from a session RNG
//! - Commands are applied one at a time, each runs to completion
//! - Caches iterate in cell order
//! - No rendering or platform dependencies

pub mod command;
pub mod controller;
pub mod ledger;
pub mod state;
pub mod view;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{Command, Direction};
pub use controller::Controller;
pub use ledger::{CacheLedger, Coin, LedgerRecord};
pub use state::{GameState, ObserverState, SpawnOutcome, SpawnRules};
pub use view::{CacheView, View};
pub use window::{VisibilityWindow, WindowUpdate};
