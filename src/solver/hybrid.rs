//! Bounded-beam A* committing a prefix, followed by guided DFS completion
//! (spec §4.7).

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use log::info;

use crate::dictionary::DictionaryIndex;
use crate::error::CrosswordError;
use crate::grid::{Slot, EMPTY};

use super::{order_slots, priority_of, select_slot, SearchNode, SolveInput, SolveResult, SolverSettings, Substrate};

/// Phase 1: bounded-beam A*. Returns the committed node and whether it was
/// itself a complete solution (mode_switches = 0 in that case).
fn run_beam_phase(substrate: &mut Substrate, all_slots: &[Slot], total_slots: usize) -> (SearchNode, bool) {
    let beam_width = substrate.settings().beam_width.max(1);
    let switch_threshold = substrate.settings().hybrid_switch_threshold;
    let hard_cap = substrate.settings().hybrid_hard_cap(total_slots);

    let initial_filled: HashSet<_> = all_slots.iter().filter(|s| s.is_filled(&substrate.grid)).map(|s| s.key()).collect();
    let initial_node = SearchNode {
        grid: substrate.grid.clone(),
        filled: initial_filled,
        g: 0,
    };

    let mut beam = vec![initial_node.clone()];
    let mut best = initial_node;
    let mut expansions = 0usize;
    let mut closed: HashSet<String> = HashSet::new();

    loop {
        if let Some(solved) = beam.iter().find(|n| n.filled.len() == total_slots) {
            return (solved.clone(), true);
        }

        let best_progress = beam
            .iter()
            .map(|n| n.filled.len() as f64 / total_slots.max(1) as f64)
            .fold(0.0_f64, f64::max);
        if beam.len() == 1 && best_progress > switch_threshold {
            return (beam.into_iter().next().unwrap(), false);
        }
        if expansions >= hard_cap {
            let committed = beam.iter().max_by_key(|n| n.filled.len()).cloned().unwrap_or(best);
            return (committed, false);
        }

        let mut children: Vec<SearchNode> = Vec::new();
        'beam: for node in &beam {
            let hash = node.grid.hash_key();
            if closed.contains(&hash) {
                continue;
            }
            closed.insert(hash);

            let (slot, candidates) = match select_slot(substrate, all_slots, node) {
                Some(v) => v,
                None => continue,
            };
            let slot_key = slot.key();

            for (word, _score) in candidates {
                let mut child_grid = node.grid.clone();
                child_grid.place_word(slot.x, slot.y, slot.direction, &word);
                let mut child_filled = node.filled.clone();
                child_filled.insert(slot_key);
                children.push(SearchNode {
                    grid: child_grid,
                    filled: child_filled,
                    g: node.g + 1,
                });
                expansions += 1;
                if expansions >= hard_cap {
                    break 'beam;
                }
            }
        }

        if children.is_empty() {
            let committed = beam.into_iter().max_by_key(|n| n.filled.len()).unwrap_or(best);
            return (committed, false);
        }

        children.sort_by(|a, b| {
            let pa = priority_of(a, all_slots, substrate.graph(), substrate.settings());
            let pb = priority_of(b, all_slots, substrate.graph(), substrate.settings());
            pa.partial_cmp(&pb).unwrap_or(Ordering::Equal)
        });
        children.truncate(beam_width);

        if let Some(child_best) = children.iter().max_by_key(|n| n.filled.len()) {
            if child_best.filled.len() > best.filled.len() {
                best = child_best.clone();
            }
        }
        beam = children;
    }
}

fn guided_score(word: &str, base_score: i64, pattern: &str, exact: Option<&str>) -> i64 {
    let crossing_bonus = word
        .chars()
        .zip(pattern.chars())
        .filter(|(c, p)| *p != EMPTY && c.to_ascii_uppercase() == p.to_ascii_uppercase())
        .count() as i64
        * 2;
    let exact_bonus = if exact.map(|e| e.eq_ignore_ascii_case(word)).unwrap_or(false) { 5 } else { 0 };
    base_score + crossing_bonus + exact_bonus
}

/// Phase 2: DFS over the remaining slots, re-scoring candidates to prefer
/// already-satisfied crossings and exact-clue matches (spec §4.7 Phase 2).
fn guided_descend(substrate: &mut Substrate, ordered: &[Slot], index: usize) -> bool {
    if index == ordered.len() {
        return true;
    }

    let slot = &ordered[index];
    let key = slot.key();
    let pattern = substrate.pattern(key);
    let exact = substrate.dict().exact_clue_lookup(&slot.clue).map(|e| e.word.clone());

    let mut candidates = substrate.viable_candidates(key);
    candidates.sort_by(|a, b| {
        let score_a = guided_score(&a.0, a.1, &pattern, exact.as_deref());
        let score_b = guided_score(&b.0, b.1, &pattern, exact.as_deref());
        score_b.cmp(&score_a)
    });

    for (word, _score) in candidates {
        let written = substrate.place(key, &word);
        if substrate.forward_check(key) && guided_descend(substrate, ordered, index + 1) {
            return true;
        }
        substrate.remove(&written);
    }

    false
}

pub fn solve(input: SolveInput, dict: &DictionaryIndex, settings: SolverSettings) -> Result<SolveResult, CrosswordError> {
    let started = Instant::now();
    let mut substrate = Substrate::build(input, dict, settings)?;
    let all_slots: Vec<Slot> = substrate.slots().to_vec();
    let total_slots = all_slots.len();

    info!("hybrid solve starting over {} slots, beam width {}", total_slots, substrate.settings().beam_width);

    let (committed, phase1_succeeded) = run_beam_phase(&mut substrate, &all_slots, total_slots);

    let mode_switches = if phase1_succeeded { 0 } else { 1 };

    if !phase1_succeeded {
        let remaining: Vec<Slot> = all_slots.iter().filter(|s| !committed.filled.contains(&s.key())).cloned().collect();
        substrate.grid = committed.grid;
        let ordered = order_slots(&mut substrate, &remaining);
        guided_descend(&mut substrate, &ordered, 0);
    } else {
        substrate.grid = committed.grid;
    }

    Ok(substrate.finish(started, Some(mode_switches)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::test_support::build_dictionary;
    use crate::solver::{ClueInput, ClueInputSet};

    #[test]
    fn solves_unique_cross_with_zero_mode_switches() {
        let dict = build_dictionary(&[("cat", "small feline"), ("cot", "small bed")]);
        let input = SolveInput {
            grid: vec!["...".to_string(), "...".to_string(), "...".to_string()],
            clues: ClueInputSet {
                across: vec![ClueInput { number: 1, x: 0, y: 0, length: 3, clue: "small feline".into(), answer: None }],
                down: vec![ClueInput { number: 1, x: 0, y: 0, length: 3, clue: "small bed".into(), answer: None }],
            },
        };
        let result = solve(input, &dict, SolverSettings::default()).unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.metrics.mode_switches, Some(0));
    }

    #[test]
    fn falls_back_to_guided_dfs_when_beam_does_not_finish() {
        let dict = build_dictionary(&[("cat", "small feline"), ("cot", "small bed"), ("dog", "domestic canine")]);
        let input = SolveInput {
            grid: vec!["...".to_string(), "...".to_string(), "...".to_string()],
            clues: ClueInputSet {
                across: vec![ClueInput { number: 1, x: 0, y: 0, length: 3, clue: "small feline".into(), answer: None }],
                down: vec![ClueInput { number: 1, x: 0, y: 0, length: 3, clue: "small bed".into(), answer: None }],
            },
        };
        let mut settings = SolverSettings::default();
        settings.beam_width = 1;
        let result = solve(input, &dict, settings).unwrap();
        assert_eq!(result.status, "success");
        assert!(result.metrics.mode_switches.is_some());
    }
}
