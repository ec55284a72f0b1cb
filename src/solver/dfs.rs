//! Depth-first search with most-constrained-variable ordering (spec §4.5).

use std::time::Instant;

use log::info;

use crate::dictionary::DictionaryIndex;
use crate::error::CrosswordError;
use crate::grid::Direction;

use super::{order_slots, SolveInput, SolveResult, SolverSettings, Substrate};

pub fn solve(input: SolveInput, dict: &DictionaryIndex, settings: SolverSettings) -> Result<SolveResult, CrosswordError> {
    let started = Instant::now();
    let mut substrate = Substrate::build(input, dict, settings)?;
    let unfilled = substrate.unfilled_slots();
    let ordered = order_slots(&mut substrate, &unfilled);
    let keys: Vec<(usize, Direction)> = ordered.iter().map(|s| s.key()).collect();

    info!("dfs solve starting over {} unfilled slots", keys.len());
    descend(&mut substrate, &keys, 0);

    Ok(substrate.finish(started, None))
}

/// Recursive descent by slot index. Uses the dynamic "affected set"
/// forward-check formulation of §4.5: every slot crossing the just-placed
/// one, rather than a fixed lookahead window.
fn descend(substrate: &mut Substrate, keys: &[(usize, Direction)], index: usize) -> bool {
    if index == keys.len() {
        return true;
    }

    let key = keys[index];
    let candidates = substrate.viable_candidates(key);

    for (word, _score) in candidates {
        let written = substrate.place(key, &word);

        if substrate.forward_check(key) && descend(substrate, keys, index + 1) {
            return true;
        }

        substrate.remove(&written);
    }

    false
}
