//! Best-first search over partial assignments (spec §4.6).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

use log::{info, warn};

use crate::dictionary::DictionaryIndex;
use crate::error::CrosswordError;
use crate::grid::Slot;

use super::{priority_of, select_slot, MemorySampler, Metrics, SearchNode, SolveInput, SolveResult, SolverSettings, Substrate};

struct HeapEntry {
    priority: f64,
    sequence: usize,
    node: SearchNode,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse the priority comparison so the
        // lowest f pops first. Ties favor the earliest-inserted entry so
        // exploration order is reproducible under a fixed seed (spec P7).
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

pub fn solve(input: SolveInput, dict: &DictionaryIndex, settings: SolverSettings) -> Result<SolveResult, CrosswordError> {
    let started = Instant::now();
    let mut substrate = Substrate::build(input, dict, settings)?;
    let all_slots: Vec<Slot> = substrate.slots().to_vec();
    let total_slots = all_slots.len();

    let initial_filled: HashSet<_> = all_slots.iter().filter(|s| s.is_filled(&substrate.grid)).map(|s| s.key()).collect();
    let initial_filled_count = initial_filled.len();
    let initial_node = SearchNode {
        grid: substrate.grid.clone(),
        filled: initial_filled,
        g: 0,
    };

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<String> = HashSet::new();
    let mut sequence = 0usize;
    let mut sampler = MemorySampler::default();
    let mut best_seen = initial_node.clone();

    let initial_priority = priority_of(&initial_node, &all_slots, substrate.graph(), substrate.settings());
    open.push(HeapEntry { priority: initial_priority, sequence, node: initial_node });
    sequence += 1;

    info!("astar solve starting over {} slots, budget {}", total_slots, substrate.settings().astar_iteration_budget);

    let mut iterations = 0usize;
    let budget = substrate.settings().astar_iteration_budget;

    while let Some(entry) = open.pop() {
        let node = entry.node;
        let hash = node.grid.hash_key();
        if closed.contains(&hash) {
            continue;
        }
        closed.insert(hash);
        sampler.record(&node.grid, 0);

        if node.filled.len() > best_seen.filled.len() {
            best_seen = node.clone();
        }

        if node.filled.len() == total_slots {
            best_seen = node;
            break;
        }

        iterations += 1;
        if iterations > budget {
            warn!("astar iteration budget ({}) exhausted; returning best state seen", budget);
            break;
        }

        let (slot, candidates) = match select_slot(&mut substrate, &all_slots, &node) {
            Some(v) => v,
            None => continue,
        };
        let slot_key = slot.key();

        for (word, _score) in candidates {
            let mut child_grid = node.grid.clone();
            child_grid.place_word(slot.x, slot.y, slot.direction, &word);
            let child_hash = child_grid.hash_key();
            if closed.contains(&child_hash) {
                continue;
            }
            let mut child_filled = node.filled.clone();
            child_filled.insert(slot_key);
            let child = SearchNode {
                grid: child_grid,
                filled: child_filled,
                g: node.g + 1,
            };
            let priority = priority_of(&child, &all_slots, substrate.graph(), substrate.settings());
            open.push(HeapEntry { priority, sequence, node: child });
            sequence += 1;
        }
    }

    let status = if best_seen.filled.len() == total_slots { "success" } else { "partial" };
    let rows: Vec<String> = best_seen.grid.to_rows().iter().map(|r| r.iter().collect()).collect();

    Ok(SolveResult {
        status: status.to_string(),
        grid: rows,
        words_placed: best_seen.filled.len().saturating_sub(initial_filled_count),
        total_words: total_slots,
        metrics: Metrics {
            execution_time_seconds: started.elapsed().as_secs_f64(),
            peak_memory_kb: sampler.peak(),
            avg_memory_kb: sampler.avg(),
            min_memory_kb: sampler.min(),
            fallback_usage_count: substrate.metrics.fallback_usage_count,
            mode_switches: None,
        },
    })
}
