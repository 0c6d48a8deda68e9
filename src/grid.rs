//! Grid addressing
//!
//! Positions are `DVec2` with `x` = latitude (axis 1) and `y` = longitude
//! (axis 2). The world is cut into square cells of `tile_size` degrees; cell
//! `(i, j)` covers `[i*t, (i+1)*t) x [j*t, (j+1)*t)`.
//!
//! The `Board` interns cells: every `(i, j)` pair resolves to one shared
//! `Rc<Cell>` for the life of the board, so callers may compare cells by
//! pointer as well as by value.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub i: i32,
    pub j: i32,
}

impl Cell {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Chebyshev distance in cells
    pub fn distance(self, other: Cell) -> u32 {
        let di = (i64::from(self.i) - i64::from(other.i)).unsigned_abs();
        let dj = (i64::from(self.j) - i64::from(other.j)).unsigned_abs();
        u32::try_from(di.max(dj)).unwrap_or(u32::MAX)
    }

    /// Cell shifted by a (di, dj) offset, saturating at the i32 edges
    pub fn offset(self, di: i32, dj: i32) -> Cell {
        Cell::new(self.i.saturating_add(di), self.j.saturating_add(dj))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Axis-aligned extent of a cell (min inclusive, max exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl CellBounds {
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, position: DVec2) -> bool {
        position.x >= self.min.x
            && position.x < self.max.x
            && position.y >= self.min.y
            && position.y < self.max.y
    }
}

/// Cell addressing and interning
#[derive(Debug)]
pub struct Board {
    tile_size: f64,
    known: HashMap<(i32, i32), Rc<Cell>>,
}

impl Board {
    pub fn new(tile_size: f64) -> Self {
        debug_assert!(tile_size > 0.0, "tile size must be positive");
        Self {
            tile_size,
            known: HashMap::new(),
        }
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Number of distinct cells interned so far
    pub fn known_cells(&self) -> usize {
        self.known.len()
    }

    /// The one interned cell for `cell`'s coordinates
    pub fn canonicalize(&mut self, cell: Cell) -> Rc<Cell> {
        Rc::clone(
            self.known
                .entry((cell.i, cell.j))
                .or_insert_with(|| Rc::new(cell)),
        )
    }

    /// Cell coordinates containing `position` (floor, not truncation)
    pub fn locate(&self, position: DVec2) -> Cell {
        let i = (position.x / self.tile_size).floor() as i32;
        let j = (position.y / self.tile_size).floor() as i32;
        Cell::new(i, j)
    }

    pub fn cell_for_position(&mut self, position: DVec2) -> Rc<Cell> {
        let cell = self.locate(position);
        self.canonicalize(cell)
    }

    pub fn bounds_of(&self, cell: Cell) -> CellBounds {
        let t = self.tile_size;
        CellBounds {
            min: DVec2::new(f64::from(cell.i) * t, f64::from(cell.j) * t),
            max: DVec2::new((f64::from(cell.i) + 1.0) * t, (f64::from(cell.j) + 1.0) * t),
        }
    }

    /// Every cell within Chebyshev `radius` of the cell holding `position`,
    /// in row-major order (i outer, j inner).
    pub fn cells_within_radius(&mut self, position: DVec2, radius: u32) -> Vec<Rc<Cell>> {
        let origin = self.locate(position);
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let side = 2 * radius as usize + 1;
        let mut cells = Vec::with_capacity(side * side);
        for di in -r..=r {
            for dj in -r..=r {
                cells.push(self.canonicalize(origin.offset(di, dj)));
            }
        }
        cells
    }
}
