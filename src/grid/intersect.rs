//! Intersection graph over slots (spec §3 `Intersection Graph`, §4.2).

use std::collections::{HashMap, HashSet};

use super::{Direction, Slot};

/// A cell shared between an ACROSS and a DOWN slot, with the character
/// position within each slot at which they meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intersection {
    pub across_key: (usize, Direction),
    pub across_index: usize,
    pub down_key: (usize, Direction),
    pub down_index: usize,
}

/// Undirected adjacency between slots, keyed by `(number, direction)`, with
/// the shared-cell detail retained for forward-checking and scoring.
#[derive(Clone, Debug, Default)]
pub struct IntersectionGraph {
    adjacency: HashMap<(usize, Direction), HashSet<(usize, Direction)>>,
    intersections: Vec<Intersection>,
}

impl IntersectionGraph {
    /// Builds the graph by scanning every cell for the (at most two) slots
    /// containing it, as spec §4.2 describes.
    pub fn build(slots: &[Slot]) -> Self {
        let mut cell_owners: HashMap<(usize, usize), Vec<(usize, usize, Direction)>> = HashMap::new();
        for (idx, slot) in slots.iter().enumerate() {
            for i in 0..slot.length {
                let cell = slot.cell_at(i);
                cell_owners.entry(cell).or_default().push((idx, i, slot.direction));
            }
        }

        let mut adjacency: HashMap<(usize, Direction), HashSet<(usize, Direction)>> = HashMap::new();
        for slot in slots {
            adjacency.entry(slot.key()).or_default();
        }

        let mut intersections = Vec::new();
        for owners in cell_owners.values() {
            if owners.len() != 2 {
                continue;
            }
            let (a_idx, a_pos, a_dir) = owners[0];
            let (b_idx, b_pos, b_dir) = owners[1];
            if a_dir == b_dir {
                continue;
            }
            let (across_idx, across_pos, down_idx, down_pos) = if a_dir == Direction::Across {
                (a_idx, a_pos, b_idx, b_pos)
            } else {
                (b_idx, b_pos, a_idx, a_pos)
            };
            let across_key = slots[across_idx].key();
            let down_key = slots[down_idx].key();
            adjacency.entry(across_key).or_default().insert(down_key);
            adjacency.entry(down_key).or_default().insert(across_key);
            intersections.push(Intersection {
                across_key,
                across_index: across_pos,
                down_key,
                down_index: down_pos,
            });
        }

        IntersectionGraph { adjacency, intersections }
    }

    pub fn degree(&self, key: &(usize, Direction)) -> usize {
        self.adjacency.get(key).map(|s| s.len()).unwrap_or(0)
    }

    pub fn neighbors(&self, key: &(usize, Direction)) -> impl Iterator<Item = &(usize, Direction)> {
        self.adjacency.get(key).into_iter().flatten()
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }
}
