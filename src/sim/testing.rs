//! Shared test helpers

use crate::grid::Cell;
use crate::luck;

/// Cache cells a window of `radius` around `origin` should show, sorted
pub(crate) fn expected_visible(origin: Cell, radius: u32, spawn_probability: f64) -> Vec<Cell> {
    let r = radius as i32;
    let mut cells = Vec::new();
    for di in -r..=r {
        for dj in -r..=r {
            let cell = origin.offset(di, dj);
            if luck::spawns_cache(cell, spawn_probability) {
                cells.push(cell);
            }
        }
    }
    cells.sort();
    cells
}
