//! View model handed to the renderer after each command

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ledger::Coin;
use super::window::WindowUpdate;
use crate::grid::{Cell, CellBounds};

/// One materialized cache as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheView {
    pub cell: Cell,
    pub bounds: CellBounds,
    pub center: DVec2,
    pub coins: Vec<Coin>,
    pub visible: bool,
    /// Close enough to collect/deposit
    pub in_reach: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub position: DVec2,
    pub cell: Cell,
    pub inventory: Vec<Coin>,
    pub path: Vec<DVec2>,
    pub tracking: bool,
    pub caches: Vec<CacheView>,
    /// Visibility changes since the previous view
    pub changes: WindowUpdate,
    /// Last storage failure, cleared by the next successful write
    pub storage_fault: Option<String>,
}

impl View {
    pub fn visible_caches(&self) -> impl Iterator<Item = &CacheView> {
        self.caches.iter().filter(|c| c.visible)
    }

    pub fn cache(&self, cell: Cell) -> Option<&CacheView> {
        self.caches.iter().find(|c| c.cell == cell)
    }

    /// One-line status, e.g. for a HUD
    pub fn status_line(&self) -> String {
        format!(
            "Player coins: {} | cell {} | {} caches in view",
            self.inventory.len(),
            self.cell,
            self.visible_caches().count()
        )
    }
}
