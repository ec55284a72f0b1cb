//! Shared constraint-satisfaction substrate for all three search variants
//! (spec §4.4, §2 component 5).

pub mod astar;
pub mod dfs;
pub mod hybrid;
#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dictionary::DictionaryIndex;
use crate::error::CrosswordError;
use crate::grid::{Direction, Grid, IntersectionGraph, Location, Slot, EMPTY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Dfs,
    AStar,
    Hybrid,
}

impl Algorithm {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dfs" => Some(Algorithm::Dfs),
            "astar" | "a-star" => Some(Algorithm::AStar),
            "hybrid" => Some(Algorithm::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Typical M for the initial by-clue query (spec §4.4 step 2.iii).
    pub by_clue_initial_max: usize,
    /// L2 fallback's larger by-clue max.
    pub fallback_max: usize,
    pub astar_iteration_budget: usize,
    pub beam_width: usize,
    pub hybrid_switch_threshold: f64,
    pub c_unfilled: f64,
    pub c_empty: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            by_clue_initial_max: 200,
            fallback_max: 5000,
            astar_iteration_budget: 8000,
            beam_width: 5,
            hybrid_switch_threshold: 0.7,
            c_unfilled: 10.0,
            c_empty: 1.0,
        }
    }
}

impl SolverSettings {
    pub fn from_overrides(overrides: &HashMap<&str, usize>) -> Self {
        let mut settings = SolverSettings::default();
        if let Some(&v) = overrides.get("by_clue_initial_max") {
            settings.by_clue_initial_max = v;
        }
        if let Some(&v) = overrides.get("fallback_max") {
            settings.fallback_max = v;
        }
        if let Some(&v) = overrides.get("astar_iteration_budget") {
            settings.astar_iteration_budget = v;
        }
        if let Some(&v) = overrides.get("beam_width") {
            settings.beam_width = v;
        }
        settings
    }

    /// Spec §4.7's hard expansion cap: `min(1000, #slots * 50)`.
    pub fn hybrid_hard_cap(&self, num_slots: usize) -> usize {
        (num_slots * 50).min(1000)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClueInput {
    pub number: usize,
    pub x: usize,
    pub y: usize,
    pub length: usize,
    pub clue: String,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClueInputSet {
    pub across: Vec<ClueInput>,
    pub down: Vec<ClueInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolveInput {
    pub grid: Vec<String>,
    pub clues: ClueInputSet,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    pub execution_time_seconds: f64,
    pub peak_memory_kb: f64,
    pub avg_memory_kb: f64,
    pub min_memory_kb: f64,
    pub fallback_usage_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_switches: Option<usize>,
}

/// Deterministic proxy for memory sampling: there is no portable, dependency-free
/// way to read RSS, and pulling in an OS-specific crate for one metric would
/// break `SolverSettings`'s parity with the rest of the dependency stack. This
/// samples the size of the live search state instead, which is at least
/// reproducible across runs with the same seed (spec P7).
#[derive(Debug, Default)]
pub(crate) struct MemorySampler {
    samples: Vec<f64>,
}

impl MemorySampler {
    fn record(&mut self, grid: &Grid, live_candidate_entries: usize) {
        let bytes = grid.width() * grid.height() * std::mem::size_of::<char>()
            + live_candidate_entries * std::mem::size_of::<(String, i64)>();
        self.samples.push(bytes as f64 / 1024.0);
    }

    fn peak(&self) -> f64 {
        self.samples.iter().cloned().fold(0.0, f64::max)
    }

    fn avg(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        }
    }

    fn min(&self) -> f64 {
        self.samples.iter().cloned().fold(f64::INFINITY, f64::min).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveResult {
    pub status: String,
    pub grid: Vec<String>,
    pub words_placed: usize,
    pub total_words: usize,
    pub metrics: Metrics,
}

/// Secondary ordering key ahead of raw candidate-count/degree (supplemented
/// feature grounded on `base_solver.py`'s `analyze_certainty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Certainty {
    Unconstrained,
    Unique,
    Constrained,
    Weak,
}

pub fn classify_certainty(candidate_count: usize) -> Certainty {
    match candidate_count {
        0 => Certainty::Unconstrained,
        1 => Certainty::Unique,
        2..=5 => Certainty::Constrained,
        _ => Certainty::Weak,
    }
}

fn certainty_rank(c: Certainty) -> u8 {
    match c {
        Certainty::Unconstrained => 0,
        Certainty::Unique => 1,
        Certainty::Constrained => 2,
        Certainty::Weak => 3,
    }
}

fn matches_pattern(word: &str, pattern: &str) -> bool {
    if word.len() != pattern.len() {
        return false;
    }
    word.chars()
        .zip(pattern.chars())
        .all(|(c, p)| p == EMPTY || p.to_ascii_uppercase() == c.to_ascii_uppercase())
}

/// A node in the best-first/beam search frontier, shared by the A* and
/// hybrid variants (spec §4.6's "immutable grid snapshot" state).
#[derive(Clone)]
pub(crate) struct SearchNode {
    pub grid: Grid,
    pub filled: std::collections::HashSet<(usize, Direction)>,
    pub g: usize,
}

/// The admissible heuristic of spec §4.6: `g + h`, where
/// `h = #unfilled * C_UNFILLED + #empty_cells * C_EMPTY + degree_sum / 2`.
pub(crate) fn priority_of(node: &SearchNode, all_slots: &[Slot], graph: &IntersectionGraph, settings: &SolverSettings) -> f64 {
    let unfilled: Vec<&Slot> = all_slots.iter().filter(|s| !node.filled.contains(&s.key())).collect();
    let unfilled_count = unfilled.len() as f64;
    let empty_cells = (node.grid.width() * node.grid.height() - node.grid.non_empty_count()) as f64;
    let degree_sum: f64 = unfilled.iter().map(|s| graph.degree(&s.key()) as f64).sum();
    node.g as f64 + unfilled_count * settings.c_unfilled + empty_cells * settings.c_empty + degree_sum / 2.0
}

/// Most-constrained-variable selection against `node`'s own grid: fewest
/// current candidates, ties broken by highest constraint degree.
pub(crate) fn select_slot<'s>(substrate: &mut Substrate, all_slots: &'s [Slot], node: &SearchNode) -> Option<(&'s Slot, Vec<(String, i64)>)> {
    let mut best: Option<(&Slot, Vec<(String, i64)>, usize)> = None;

    for slot in all_slots.iter().filter(|s| !node.filled.contains(&s.key())) {
        let candidates = substrate.candidates_against(slot.key(), &node.grid);
        let degree = substrate.graph().degree(&slot.key());

        let better = match &best {
            None => true,
            Some((_, best_candidates, best_degree)) => {
                candidates.len() < best_candidates.len() || (candidates.len() == best_candidates.len() && degree > *best_degree)
            }
        };
        if better {
            best = Some((slot, candidates, degree));
        }
    }

    best.map(|(slot, candidates, _)| (slot, candidates))
}

fn grid_from_rows(rows: &[String]) -> Grid {
    let chars: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
    Grid::from_rows(&chars)
}

fn slots_from_input(input: &SolveInput, grid: &Grid) -> Result<Vec<Slot>, CrosswordError> {
    let mut slots = Vec::new();
    for c in &input.clues.across {
        if c.length < 2 || c.y >= grid.height() || c.x + c.length > grid.width() {
            return Err(CrosswordError::InvalidInput(format!(
                "across clue {} at ({},{}) length {} is inconsistent with a {}x{} grid",
                c.number, c.x, c.y, c.length, grid.width(), grid.height()
            )));
        }
        slots.push(Slot {
            number: c.number,
            direction: Direction::Across,
            x: c.x,
            y: c.y,
            length: c.length,
            clue: c.clue.clone(),
            answer: c.answer.clone(),
        });
    }
    for c in &input.clues.down {
        if c.length < 2 || c.x >= grid.width() || c.y + c.length > grid.height() {
            return Err(CrosswordError::InvalidInput(format!(
                "down clue {} at ({},{}) length {} is inconsistent with a {}x{} grid",
                c.number, c.x, c.y, c.length, grid.width(), grid.height()
            )));
        }
        slots.push(Slot {
            number: c.number,
            direction: Direction::Down,
            x: c.x,
            y: c.y,
            length: c.length,
            clue: c.clue.clone(),
            answer: c.answer.clone(),
        });
    }
    Ok(slots)
}

/// Candidate collection per slot, spec §4.4 step 2, followed by the
/// fallback ladder of §4.4.1 when the primary steps yield nothing.
fn collect_candidates(slot: &Slot, grid: &Grid, dict: &DictionaryIndex, settings: &SolverSettings, metrics: &mut Metrics) -> Vec<(String, i64)> {
    let mut candidates: Vec<(String, i64)> = Vec::new();

    if !slot.clue.is_empty() {
        if let Some(entry) = dict.exact_clue_lookup(&slot.clue) {
            if entry.word.len() == slot.length {
                candidates.push((entry.word.clone(), i64::MAX));
            }
        }
    }

    if let Some(answer) = &slot.answer {
        let answer_upper = answer.to_uppercase();
        if answer_upper.len() == slot.length && !candidates.iter().any(|(w, _)| w == &answer_upper) {
            let clue_matches = dict
                .entry(&answer_upper)
                .map(|e| e.meanings.iter().any(|m| m.def.eq_ignore_ascii_case(&slot.clue)))
                .unwrap_or(false);
            if clue_matches {
                candidates.push((answer_upper, i64::MAX - 1));
            }
        }
    }

    if candidates.is_empty() && !slot.clue.is_empty() {
        let pattern = slot.pattern(grid);
        let by_clue = dict.candidates_by_clue(&slot.clue, settings.by_clue_initial_max, (slot.length, slot.length));
        candidates.extend(by_clue.into_iter().filter(|(w, _)| matches_pattern(w, &pattern)));
    }

    if candidates.is_empty() {
        metrics.fallback_usage_count += 1;
        candidates = run_fallback_ladder(slot, grid, dict, settings);
    }

    candidates
}

fn run_fallback_ladder(slot: &Slot, grid: &Grid, dict: &DictionaryIndex, settings: &SolverSettings) -> Vec<(String, i64)> {
    let pattern = slot.pattern(grid);

    // L1: spelling variants of the supplied answer. This dictionary does not
    // model alternate spellings, so the level always falls through.
    if slot.answer.is_some() {
        debug!("fallback L1 has no spelling-variant source for slot {} {:?}", slot.number, slot.direction);
    }

    // L2: widen the by-clue search.
    if !slot.clue.is_empty() {
        let l2: Vec<(String, i64)> = dict
            .candidates_by_clue(&slot.clue, settings.fallback_max, (slot.length, slot.length))
            .into_iter()
            .filter(|(w, _)| matches_pattern(w, &pattern))
            .collect();
        if !l2.is_empty() {
            return l2;
        }
    }

    // L3: by-pattern with clue tokens.
    let tokens = crate::dictionary::scoring::tokenize_clue(&slot.clue);
    let l3 = dict.candidates_by_pattern(&pattern, Some(&tokens), settings.fallback_max);
    if !l3.is_empty() {
        return l3;
    }

    // L4: heuristic scoring over a large by-length pool, preferring words
    // that already match more of the fixed positions.
    let pool = dict.candidates_by_length(slot.length, settings.fallback_max);
    let mut scored: Vec<(String, i64)> = pool
        .into_iter()
        .map(|(word, score)| {
            let matching_positions = word
                .chars()
                .zip(pattern.chars())
                .filter(|(c, p)| *p != EMPTY && c.to_ascii_uppercase() == p.to_ascii_uppercase())
                .count() as i64;
            (word, score + matching_positions * 10)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if scored.is_empty() {
        warn!("fallback ladder exhausted for slot {} {:?}", slot.number, slot.direction);
    }
    scored
}

/// Owns the grid being filled, the slot/intersection model, and a cache of
/// each slot's clue-derived candidate list (spec §9's "plain operations"
/// substrate: `get_candidates`, `place`, `remove`, `forward_check`, `count_filled`).
pub struct Substrate<'a> {
    pub grid: Grid,
    slots: Vec<Slot>,
    graph: IntersectionGraph,
    dict: &'a DictionaryIndex,
    settings: SolverSettings,
    raw_candidates: HashMap<(usize, Direction), Vec<(String, i64)>>,
    pub metrics: Metrics,
    sampler: MemorySampler,
    /// Slots already filled in the input grid, before any `place` call, so
    /// `finish` can report words the solver actually placed rather than
    /// cells that arrived pre-filled (spec B4).
    initial_filled: usize,
}

impl<'a> Substrate<'a> {
    pub fn build(input: SolveInput, dict: &'a DictionaryIndex, settings: SolverSettings) -> Result<Self, CrosswordError> {
        let grid = grid_from_rows(&input.grid);
        let slots = slots_from_input(&input, &grid)?;
        let graph = IntersectionGraph::build(&slots);
        let initial_filled = slots.iter().filter(|s| s.is_filled(&grid)).count();

        Ok(Substrate {
            grid,
            slots,
            graph,
            dict,
            settings,
            raw_candidates: HashMap::new(),
            metrics: Metrics::default(),
            sampler: MemorySampler::default(),
            initial_filled,
        })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn graph(&self) -> &IntersectionGraph {
        &self.graph
    }

    pub fn dict(&self) -> &DictionaryIndex {
        self.dict
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn slot_by_key(&self, key: (usize, Direction)) -> &Slot {
        self.slots
            .iter()
            .find(|s| s.key() == key)
            .expect("slot key must exist in this substrate")
    }

    /// Slots requiring assignment at the start of the solve (spec §4.4 step 1).
    pub fn unfilled_slots(&self) -> Vec<Slot> {
        self.slots.iter().filter(|s| !s.is_filled(&self.grid)).cloned().collect()
    }

    fn raw_candidates_for(&mut self, key: (usize, Direction)) -> &[(String, i64)] {
        if !self.raw_candidates.contains_key(&key) {
            let slot = self.slot_by_key(key).clone();
            let cands = collect_candidates(&slot, &self.grid, self.dict, &self.settings, &mut self.metrics);
            self.raw_candidates.insert(key, cands);
        }
        &self.raw_candidates[&key]
    }

    /// The slot's candidates still consistent with `grid`'s current pattern.
    pub fn candidates_against(&mut self, key: (usize, Direction), grid: &Grid) -> Vec<(String, i64)> {
        let pattern = self.slot_by_key(key).pattern(grid);
        self.raw_candidates_for(key).iter().filter(|(w, _)| matches_pattern(w, &pattern)).cloned().collect()
    }

    /// Candidates consistent with this substrate's own working grid.
    pub fn viable_candidates(&mut self, key: (usize, Direction)) -> Vec<(String, i64)> {
        let pattern = self.pattern(key);
        self.raw_candidates_for(key).iter().filter(|(w, _)| matches_pattern(w, &pattern)).cloned().collect()
    }

    pub fn pattern(&self, key: (usize, Direction)) -> String {
        self.slot_by_key(key).pattern(&self.grid)
    }

    pub fn place(&mut self, key: (usize, Direction), word: &str) -> Vec<Location> {
        let slot = self.slot_by_key(key).clone();
        let written = self.grid.place_word(slot.x, slot.y, slot.direction, word);
        let live_entries: usize = self.raw_candidates.values().map(|v| v.len()).sum();
        self.sampler.record(&self.grid, live_entries);
        written
    }

    pub fn remove(&mut self, positions: &[Location]) {
        self.grid.remove_positions(positions);
    }

    /// Forward check: every slot crossing `placed_key` still has a
    /// pattern-consistent candidate (spec §4.4 step 6).
    pub fn forward_check(&mut self, placed_key: (usize, Direction)) -> bool {
        let neighbors: Vec<(usize, Direction)> = self.graph.neighbors(&placed_key).copied().collect();
        for neighbor in neighbors {
            if self.slot_by_key(neighbor).is_filled(&self.grid) {
                continue;
            }
            if self.viable_candidates(neighbor).is_empty() {
                return false;
            }
        }
        true
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_filled(&self.grid)).count()
    }

    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn rows(&self) -> Vec<String> {
        self.grid.to_rows().iter().map(|r| r.iter().collect()).collect()
    }

    pub(crate) fn finish(&self, started: Instant, mode_switches: Option<usize>) -> SolveResult {
        let filled = self.filled_count();
        let total_words = self.total_slots();
        let words_placed = filled.saturating_sub(self.initial_filled);
        let status = if filled == total_words { "success" } else { "partial" };

        SolveResult {
            status: status.to_string(),
            grid: self.rows(),
            words_placed,
            total_words,
            metrics: Metrics {
                execution_time_seconds: started.elapsed().as_secs_f64(),
                peak_memory_kb: self.sampler.peak(),
                avg_memory_kb: self.sampler.avg(),
                min_memory_kb: self.sampler.min(),
                fallback_usage_count: self.metrics.fallback_usage_count,
                mode_switches,
            },
        }
    }
}

/// Ordering used by DFS and by the A*/hybrid most-constrained-variable
/// selection: certainty band, then ascending candidate count, then
/// descending constraint degree, then original slot number (spec §4.5).
pub(crate) fn order_slots(substrate: &mut Substrate, slots: &[Slot]) -> Vec<Slot> {
    let mut scored: Vec<(Slot, usize, Certainty, usize)> = slots
        .iter()
        .map(|s| {
            let count = substrate.viable_candidates(s.key()).len();
            let certainty = classify_certainty(count);
            let degree = substrate.graph().degree(&s.key());
            (s.clone(), count, certainty, degree)
        })
        .collect();

    scored.sort_by(|a, b| {
        certainty_rank(a.2)
            .cmp(&certainty_rank(b.2))
            .then(a.1.cmp(&b.1))
            .then(b.3.cmp(&a.3))
            .then(a.0.number.cmp(&b.0.number))
    });

    scored.into_iter().map(|(s, _, _, _)| s).collect()
}

/// Dispatches to the requested search variant (spec §9: "represent the
/// three search algorithms as variants of a single tagged algorithm enum").
pub fn solve(input: SolveInput, dict: &DictionaryIndex, algorithm: Algorithm, settings: SolverSettings) -> Result<SolveResult, CrosswordError> {
    match algorithm {
        Algorithm::Dfs => dfs::solve(input, dict, settings),
        Algorithm::AStar => astar::solve(input, dict, settings),
        Algorithm::Hybrid => hybrid::solve(input, dict, settings),
    }
}
