//! Slot enumeration and crossword numbering (spec §4.2).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Grid, EMPTY};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// The cell `i` steps along this direction from `(x, y)`.
    pub fn advance(&self, x: usize, y: usize, i: usize) -> (usize, usize) {
        match self {
            Direction::Across => (x + i, y),
            Direction::Down => (x, y + i),
        }
    }

    pub fn advance_signed(&self, x: isize, y: isize, i: isize) -> (isize, isize) {
        match self {
            Direction::Across => (x + i, y),
            Direction::Down => (x, y + i),
        }
    }
}

/// A maximal run of non-`EMPTY` cells of length >= 2 in one direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub number: usize,
    pub direction: Direction,
    pub x: usize,
    pub y: usize,
    pub length: usize,
    pub clue: String,
    pub answer: Option<String>,
}

impl Slot {
    pub fn key(&self) -> (usize, Direction) {
        (self.number, self.direction)
    }

    pub fn cell_at(&self, i: usize) -> (usize, usize) {
        self.direction.advance(self.x, self.y, i)
    }

    /// The slot's contents read off `grid`, with unassigned cells as `.`.
    pub fn pattern(&self, grid: &Grid) -> String {
        (0..self.length)
            .map(|i| {
                let (cx, cy) = self.cell_at(i);
                grid.get(cx, cy)
            })
            .collect()
    }

    pub fn is_filled(&self, grid: &Grid) -> bool {
        (0..self.length).all(|i| {
            let (cx, cy) = self.cell_at(i);
            !grid.is_empty_cell(cx, cy)
        })
    }
}

/// Scans `grid` in row-major order, numbering slot-start cells in
/// first-seen order (an ACROSS and DOWN slot starting at the same cell
/// share a number), and records each run's length (spec §4.2 steps 1-3).
pub fn enumerate_slots(grid: &Grid) -> Vec<Slot> {
    let w = grid.width() as isize;
    let h = grid.height() as isize;
    let mut numbers: HashMap<(usize, usize), usize> = HashMap::new();
    let mut next_number = 1;
    let mut slots = Vec::new();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.is_empty_cell(x, y) {
                continue;
            }
            let xi = x as isize;
            let yi = y as isize;

            let starts_across =
                (x == 0 || grid.get(x - 1, y) == EMPTY) && xi + 1 < w && grid.get(x + 1, y) != EMPTY;
            let starts_down =
                (y == 0 || grid.get(x, y - 1) == EMPTY) && yi + 1 < h && grid.get(x, y + 1) != EMPTY;

            if !starts_across && !starts_down {
                continue;
            }

            let number = *numbers.entry((x, y)).or_insert_with(|| {
                let n = next_number;
                next_number += 1;
                n
            });

            if starts_across {
                let mut length = 0;
                while (x + length) < grid.width() && grid.get(x + length, y) != EMPTY {
                    length += 1;
                }
                slots.push(Slot {
                    number,
                    direction: Direction::Across,
                    x,
                    y,
                    length,
                    clue: String::new(),
                    answer: None,
                });
            }
            if starts_down {
                let mut length = 0;
                while (y + length) < grid.height() && grid.get(x, y + length) != EMPTY {
                    length += 1;
                }
                slots.push(Slot {
                    number,
                    direction: Direction::Down,
                    x,
                    y,
                    length,
                    clue: String::new(),
                    answer: None,
                });
            }
        }
    }

    slots
}
