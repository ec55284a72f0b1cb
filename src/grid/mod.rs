//! Row-major character grid: the shared data model for both generation and
//! solving (spec §3 `Grid`).

mod slot;
mod intersect;

pub use slot::{enumerate_slots, Direction, Slot};
pub use intersect::{Intersection, IntersectionGraph};

use log::debug;
use ndarray::Array2;
use std::fmt;

/// Sentinel for an unassigned cell. Externally rendered as `'.'`.
pub const EMPTY: char = '.';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub x: usize,
    pub y: usize,
}

impl Location {
    pub fn new(x: usize, y: usize) -> Self {
        Location { x, y }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangular array of cells, each either `EMPTY` or an uppercase letter.
///
/// Dimensions are fixed for the lifetime of a grid. Backed by `ndarray::Array2`
/// so density/adjacency computations can lean on vectorised row/column ops
/// rather than hand-rolled nested loops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Array2<char>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            cells: Array2::from_elem((height, width), EMPTY),
        }
    }

    /// Builds a grid from rows of characters; space and `.` both normalize
    /// to `EMPTY` per spec §6 (solving input contract).
    pub fn from_rows(rows: &[Vec<char>]) -> Self {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cells = Array2::from_elem((height, width), EMPTY);
        for (y, row) in rows.iter().enumerate() {
            for (x, &c) in row.iter().enumerate() {
                cells[[y, x]] = normalize_cell(c);
            }
        }
        Grid { cells }
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    pub fn get(&self, x: usize, y: usize) -> char {
        self.cells[[y, x]]
    }

    /// Returns `EMPTY` for any out-of-bounds coordinate rather than panicking;
    /// every fit-test and constraint check in generator/solver treats
    /// out-of-bounds as a boundary, never a mismatch.
    pub fn get_signed(&self, x: isize, y: isize) -> char {
        if self.in_bounds(x, y) {
            self.cells[[y as usize, x as usize]]
        } else {
            EMPTY
        }
    }

    pub fn set(&mut self, x: usize, y: usize, c: char) {
        self.cells[[y, x]] = c;
    }

    pub fn is_empty_cell(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == EMPTY
    }

    pub fn non_empty_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }

    pub fn density(&self) -> f64 {
        let total = self.width() * self.height();
        if total == 0 {
            0.0
        } else {
            self.non_empty_count() as f64 / total as f64
        }
    }

    /// Writes `word` along `direction` starting at `(x, y)`, returning the
    /// positions that were previously `EMPTY` (spec §4.4 step 5: place/remove).
    pub fn place_word(&mut self, x: usize, y: usize, direction: Direction, word: &str) -> Vec<Location> {
        let mut written = Vec::new();
        for (i, ch) in word.chars().enumerate() {
            let (cx, cy) = direction.advance(x, y, i);
            if self.is_empty_cell(cx, cy) {
                written.push(Location::new(cx, cy));
            }
            self.set(cx, cy, ch);
        }
        written
    }

    /// Resets exactly the given positions back to `EMPTY`, leaving any
    /// pre-existing letters untouched (spec P4).
    pub fn remove_positions(&mut self, positions: &[Location]) {
        for loc in positions {
            self.set(loc.x, loc.y, EMPTY);
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<char>> {
        self.cells
            .genrows()
            .into_iter()
            .map(|r| r.iter().copied().collect())
            .collect()
    }

    pub fn render(&self) -> String {
        let mut s = String::new();
        for row in self.cells.genrows() {
            for &c in row.iter() {
                s.push(c);
            }
            s.push('\n');
        }
        s
    }

    /// Cheap structural hash used by the A* closed set (spec §4.6).
    pub fn hash_key(&self) -> String {
        self.render()
    }

    pub fn check_valid(&self) {
        debug_assert!(self.width() > 0 && self.height() > 0, "grid must be non-degenerate");
        for c in self.cells.iter() {
            debug_assert!(
                *c == EMPTY || c.is_ascii_uppercase(),
                "cell must be EMPTY or an uppercase letter, found {:?}",
                c
            );
        }
        debug!("grid valid: {}x{}, density {:.3}", self.width(), self.height(), self.density());
    }
}

fn normalize_cell(c: char) -> char {
    match c {
        ' ' | '.' => EMPTY,
        other => other.to_ascii_uppercase(),
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
