//! Visibility window
//!
//! Keeps the shown caches equal to (square window around the observer) ∩
//! (cells holding a cache). Entering cells get their spawn decision made
//! lazily; caches leaving the window are hidden, never dropped.

use std::collections::HashSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::{GameState, SpawnOutcome, SpawnRules};
use crate::grid::{Board, Cell};

/// What changed during one window refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUpdate {
    /// Every previously shown cache is gone (game reset); start from scratch
    #[serde(default)]
    pub cleared: bool,
    /// Caches minted during this refresh
    pub spawned: Vec<Cell>,
    /// Caches that became visible
    pub shown: Vec<Cell>,
    /// Caches that became hidden
    pub hidden: Vec<Cell>,
}

impl WindowUpdate {
    pub fn is_empty(&self) -> bool {
        !self.cleared && self.spawned.is_empty() && self.shown.is_empty() && self.hidden.is_empty()
    }

    /// Fold a later update into this one
    pub fn merge(&mut self, later: WindowUpdate) {
        if later.cleared {
            *self = later;
            return;
        }
        self.spawned.extend(later.spawned);
        for cell in later.shown {
            if let Some(pos) = self.hidden.iter().position(|c| *c == cell) {
                self.hidden.remove(pos);
            } else {
                self.shown.push(cell);
            }
        }
        for cell in later.hidden {
            if let Some(pos) = self.shown.iter().position(|c| *c == cell) {
                self.shown.remove(pos);
            } else {
                self.hidden.push(cell);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityWindow {
    radius: u32,
    visible: HashSet<Cell>,
}

impl VisibilityWindow {
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            visible: HashSet::new(),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn is_visible(&self, cell: Cell) -> bool {
        self.visible.contains(&cell)
    }

    /// Visible cache cells, sorted
    pub fn visible_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.visible.iter().copied().collect();
        cells.sort();
        cells
    }

    /// Forget everything shown (used on reset)
    pub fn clear(&mut self) {
        self.visible.clear();
    }

    /// Recompute the window around `position`
    pub fn refresh(
        &mut self,
        board: &mut Board,
        state: &mut GameState,
        rules: SpawnRules,
        position: DVec2,
    ) -> WindowUpdate {
        let nearby = board.cells_within_radius(position, self.radius);

        let mut update = WindowUpdate::default();
        let mut now_visible = HashSet::with_capacity(self.visible.len());
        for cell in &nearby {
            let cell = **cell;
            if let SpawnOutcome::Spawned(_) = state.consider_cell(cell, rules) {
                update.spawned.push(cell);
            }
            if state.has_cache(cell) {
                now_visible.insert(cell);
            }
        }

        update.shown = now_visible.difference(&self.visible).copied().collect();
        update.hidden = self.visible.difference(&now_visible).copied().collect();
        update.shown.sort();
        update.hidden.sort();
        self.visible = now_visible;

        if !update.spawned.is_empty() {
            log::debug!(
                "Window at {}: {} spawned, {} shown, {} hidden",
                board.locate(position),
                update.spawned.len(),
                update.shown.len(),
                update.hidden.len()
            );
        }
        update
    }
}
