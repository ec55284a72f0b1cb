//! The constructive generator (spec §4.3, §2 component 4).

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

use crate::dictionary::scoring::rare_letter_bonus;
use crate::dictionary::{DictionaryIndex, MAX_LEN, MIN_LEN};
use crate::error::CrosswordError;
use crate::grid::{enumerate_slots, Direction, Grid, EMPTY};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyBand {
    Easy,
    Medium,
    Hard,
}

impl DifficultyBand {
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            DifficultyBand::Easy => (0.35, 0.50),
            DifficultyBand::Medium => (0.60, 0.69),
            DifficultyBand::Hard => (0.80, 1.00),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyBand::Easy => "easy",
            DifficultyBand::Medium => "medium",
            DifficultyBand::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(DifficultyBand::Easy),
            "medium" => Some(DifficultyBand::Medium),
            "hard" => Some(DifficultyBand::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratorSettings {
    pub pool_size_per_length: usize,
    pub max_pass_iterations: usize,
    pub max_total_iterations: usize,
    pub outer_attempts: usize,
    pub density_retry_cap: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        GeneratorSettings {
            pool_size_per_length: 40,
            max_pass_iterations: 100,
            max_total_iterations: 50,
            outer_attempts: 10,
            density_retry_cap: 15,
        }
    }
}

impl GeneratorSettings {
    /// Builds settings from a sparse override map, matching the teacher
    /// crate's `new_from_hashmap` construction pattern.
    pub fn from_overrides(overrides: &HashMap<&str, usize>) -> Self {
        let mut settings = GeneratorSettings::default();
        if let Some(&v) = overrides.get("pool_size_per_length") {
            settings.pool_size_per_length = v;
        }
        if let Some(&v) = overrides.get("max_pass_iterations") {
            settings.max_pass_iterations = v;
        }
        if let Some(&v) = overrides.get("max_total_iterations") {
            settings.max_total_iterations = v;
        }
        if let Some(&v) = overrides.get("outer_attempts") {
            settings.outer_attempts = v;
        }
        if let Some(&v) = overrides.get("density_retry_cap") {
            settings.density_retry_cap = v;
        }
        settings
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ClueOutput {
    pub number: usize,
    pub x: usize,
    pub y: usize,
    pub length: usize,
    pub clue: String,
    pub answer: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClueSet {
    pub across: Vec<ClueOutput>,
    pub down: Vec<ClueOutput>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationStats {
    pub word_count: usize,
    pub difficulty: String,
    pub size: usize,
    pub density: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationOutput {
    pub success: bool,
    pub grid: Vec<String>,
    pub empty_grid: Vec<Vec<String>>,
    pub clues: ClueSet,
    pub stats: GenerationStats,
    pub fallback: bool,
}

#[derive(Clone, Debug)]
struct Placement {
    x: usize,
    y: usize,
    direction: Direction,
    word: String,
}

#[derive(Clone, Debug)]
struct GenState {
    grid: Grid,
    placements: Vec<Placement>,
}

impl GenState {
    fn new(width: usize, height: usize) -> Self {
        GenState {
            grid: Grid::new(width, height),
            placements: Vec::new(),
        }
    }

    fn placed_letters(&self) -> HashSet<char> {
        self.placements.iter().flat_map(|p| p.word.chars()).collect()
    }
}

/// The five nearby lengths mixed into the candidate pool (spec §4.3 step 1).
fn candidate_lengths(width: usize) -> Vec<usize> {
    let w = width as i64;
    let raw = [
        width as i64,
        (w - 2).max(3),
        (w + 2).min(12),
        ((w as f64 * 0.7).floor() as i64).max(3),
        ((w as f64 * 1.3).floor() as i64).min(12),
    ];
    let mut seen = HashSet::new();
    raw.iter()
        .map(|&l| l as usize)
        .filter(|l| seen.insert(*l))
        .collect()
}

fn build_candidate_pool(
    width: usize,
    dict: &DictionaryIndex,
    settings: &GeneratorSettings,
    rng: &mut impl Rng,
) -> Vec<(String, i64)> {
    let mut pool = Vec::new();
    for length in candidate_lengths(width) {
        if length < MIN_LEN || length > MAX_LEN {
            continue;
        }
        for (word, score) in dict.candidates_by_length(length, settings.pool_size_per_length) {
            let bonus = rare_letter_bonus(&word);
            let jitter = rng.gen_range(0, 3) as i64;
            pool.push((word, score + bonus + jitter));
        }
    }
    pool.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pool
}

fn weighted_choice(weights: &[(char, u32)], rng: &mut impl Rng) -> Option<char> {
    let total: u32 = weights.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut pick = rng.gen_range(0, total);
    for &(c, w) in weights {
        if pick < w {
            return Some(c);
        }
        pick -= w;
    }
    None
}

/// Partitions the pool by first letter, picks a letter among those with at
/// least 3 words by weighted random sampling, then the highest-scoring word
/// of that letter (spec §4.3 step 2).
fn pick_seed(pool: &[(String, i64)], rng: &mut impl Rng) -> Option<(String, i64)> {
    if pool.is_empty() {
        return None;
    }
    let mut by_letter: HashMap<char, Vec<&(String, i64)>> = HashMap::new();
    for entry in pool {
        if let Some(first) = entry.0.chars().next() {
            by_letter.entry(first.to_ascii_lowercase()).or_default().push(entry);
        }
    }

    let eligible: HashSet<char> = by_letter
        .iter()
        .filter(|(_, v)| v.len() >= 3)
        .map(|(k, _)| *k)
        .collect();

    let letter = if eligible.is_empty() {
        pool.first()?.0.chars().next()?.to_ascii_lowercase()
    } else {
        let weights: Vec<(char, u32)> = crate::dictionary::scoring::STARTING_LETTER_WEIGHTS
            .iter()
            .filter(|(c, _)| eligible.contains(c))
            .copied()
            .collect();
        weighted_choice(&weights, rng).unwrap_or_else(|| *eligible.iter().next().unwrap())
    };

    let candidates = by_letter.get(&letter)?;
    candidates.iter().max_by_key(|e| e.1).map(|e| (e.0.clone(), e.1))
}

fn place_seed(word: &str, width: usize, height: usize, direction: Direction) -> Option<GenState> {
    let len = word.len();
    let (x, y) = match direction {
        Direction::Across => {
            if len > width || height == 0 {
                return None;
            }
            ((width - len) / 2, height / 2)
        }
        Direction::Down => {
            if len > height || width == 0 {
                return None;
            }
            (width / 2, (height - len) / 2)
        }
    };

    let mut state = GenState::new(width, height);
    state.grid.place_word(x, y, direction, word);
    state.placements.push(Placement {
        x,
        y,
        direction,
        word: word.to_string(),
    });
    Some(state)
}

fn perpendicular_neighbors(direction: Direction, x: usize, y: usize) -> (isize, isize, isize, isize) {
    let (cx, cy) = (x as isize, y as isize);
    match direction {
        Direction::Across => (cx, cy - 1, cx, cy + 1),
        Direction::Down => (cx - 1, cy, cx + 1, cy),
    }
}

/// The five-condition fit test of spec §4.3.
fn fit_test(grid: &Grid, x: usize, y: usize, direction: Direction, word: &str, has_existing_words: bool) -> bool {
    let chars: Vec<char> = word.chars().collect();
    let len = chars.len();

    let (end_x, end_y) = direction.advance_signed(x as isize, y as isize, (len as isize) - 1);
    if !grid.in_bounds(end_x, end_y) {
        return false;
    }

    let mut any_intersection = false;
    for (i, &ch) in chars.iter().enumerate() {
        let (cx, cy) = direction.advance(x, y, i);
        let current = grid.get(cx, cy);
        if current != EMPTY {
            if current != ch {
                return false;
            }
            any_intersection = true;
        } else {
            let (n1x, n1y, n2x, n2y) = perpendicular_neighbors(direction, cx, cy);
            if grid.get_signed(n1x, n1y) != EMPTY || grid.get_signed(n2x, n2y) != EMPTY {
                return false;
            }
        }
    }

    let (before_x, before_y) = direction.advance_signed(x as isize, y as isize, -1);
    if grid.get_signed(before_x, before_y) != EMPTY {
        return false;
    }
    let (after_x, after_y) = direction.advance_signed(x as isize, y as isize, len as isize);
    if grid.get_signed(after_x, after_y) != EMPTY {
        return false;
    }

    if has_existing_words && !any_intersection {
        return false;
    }

    true
}

/// Spec §4.3 step 4's placement-potential formula.
fn placement_potential(
    grid: &Grid,
    placed_letters: &HashSet<char>,
    x: usize,
    y: usize,
    direction: Direction,
    word: &str,
    score: i64,
) -> f64 {
    let chars: Vec<char> = word.chars().collect();
    let mut adjacency_count: i64 = 0;
    for (i, _) in chars.iter().enumerate() {
        let (cx, cy) = direction.advance(x, y, i);
        let (n1x, n1y, n2x, n2y) = perpendicular_neighbors(direction, cx, cy);
        if grid.get_signed(n1x, n1y) == EMPTY || grid.get_signed(n2x, n2y) == EMPTY {
            adjacency_count += 1;
        }
    }

    let center_x = grid.width() as f64 / 2.0;
    let center_y = grid.height() as f64 / 2.0;
    let manhattan = (x as f64 - center_x).abs() + (y as f64 - center_y).abs();
    let centrality = ((10.0 - manhattan).max(0.0) / 2.0).floor();

    let reuse = chars.iter().filter(|c| placed_letters.contains(c)).count() as i64 * 2;

    (adjacency_count + reuse + score) as f64 + centrality
}

fn best_placement_for(state: &GenState, word: &str, score: i64) -> Option<(usize, usize, Direction)> {
    let grid = &state.grid;
    let placed_letters = state.placed_letters();
    let has_existing = !state.placements.is_empty();
    let len = word.len();

    let mut best: Option<((usize, usize, Direction), f64)> = None;

    for &direction in &[Direction::Across, Direction::Down] {
        let (max_x, max_y) = match direction {
            Direction::Across => {
                if len > grid.width() {
                    continue;
                }
                (grid.width() - len, grid.height().saturating_sub(1))
            }
            Direction::Down => {
                if len > grid.height() {
                    continue;
                }
                (grid.width().saturating_sub(1), grid.height() - len)
            }
        };

        for y in 0..=max_y {
            for x in 0..=max_x {
                if !fit_test(grid, x, y, direction, word, has_existing) {
                    continue;
                }
                let potential = placement_potential(grid, &placed_letters, x, y, direction, word, score);
                let better = best.as_ref().map(|(_, p)| potential > *p).unwrap_or(true);
                if better {
                    best = Some(((x, y, direction), potential));
                }
            }
        }
    }

    best.map(|(pos, _)| pos)
}

/// The expansion loop of spec §4.3 step 4: greedy placement with a
/// retry-list swap and per-pass/total iteration caps.
fn expand(mut state: GenState, pool: Vec<(String, i64)>, settings: &GeneratorSettings) -> GenState {
    let mut worklist = pool;
    let mut retry_list: Vec<(String, i64)> = Vec::new();
    let mut total_iterations = 0usize;

    loop {
        if worklist.is_empty() {
            if retry_list.is_empty() {
                break;
            }
            worklist = std::mem::take(&mut retry_list);
        }

        let mut pass_iterations = 0usize;
        let mut placed_in_pass = false;
        let mut next_worklist = Vec::new();

        for (word, score) in worklist.drain(..) {
            if total_iterations >= settings.max_total_iterations {
                break;
            }
            if pass_iterations >= settings.max_pass_iterations {
                next_worklist.push((word, score));
                continue;
            }
            pass_iterations += 1;
            total_iterations += 1;

            match best_placement_for(&state, &word, score) {
                Some((bx, by, bdir)) => {
                    state.grid.place_word(bx, by, bdir, &word);
                    state.placements.push(Placement {
                        x: bx,
                        y: by,
                        direction: bdir,
                        word: word.clone(),
                    });
                    placed_in_pass = true;
                }
                None => retry_list.push((word, score)),
            }
        }

        worklist = next_worklist;

        if total_iterations >= settings.max_total_iterations {
            break;
        }
        if worklist.is_empty() && (retry_list.is_empty() || !placed_in_pass) {
            break;
        }
    }

    state
}

/// Steps 2-5: seed selection, placement in both orientations, expansion, and
/// the outer attempt loop that varies the seed.
fn run_one_generation_attempt(
    width: usize,
    height: usize,
    pool: &[(String, i64)],
    dict: &DictionaryIndex,
    settings: &GeneratorSettings,
    rng: &mut impl Rng,
) -> Option<GenState> {
    let mut best: Option<GenState> = None;
    let mut seed_candidate = pick_seed(pool, rng);

    for outer in 0..settings.outer_attempts {
        let seed_word = match &seed_candidate {
            Some((w, _)) => w.clone(),
            None => break,
        };

        for &direction in &[Direction::Across, Direction::Down] {
            if let Some(seeded) = place_seed(&seed_word, width, height, direction) {
                let expanded = expand(seeded, pool.to_vec(), settings);
                let better = best
                    .as_ref()
                    .map(|b| expanded.placements.len() > b.placements.len())
                    .unwrap_or(true);
                if better {
                    best = Some(expanded);
                }
            }
        }

        debug!(
            "outer attempt {} seed {} best placed {}",
            outer,
            seed_word,
            best.as_ref().map(|b| b.placements.len()).unwrap_or(0)
        );

        seed_candidate = dict.best_seed_candidate(seed_word.len(), settings.pool_size_per_length);
    }

    best
}

fn build_output(width: usize, height: usize, state: GenState, dict: &DictionaryIndex, band: DifficultyBand, fallback: bool) -> GenerationOutput {
    let slots = enumerate_slots(&state.grid);

    let mut across = Vec::new();
    let mut down = Vec::new();
    let mut number_at: HashMap<(usize, usize), usize> = HashMap::new();

    for slot in &slots {
        number_at.insert((slot.x, slot.y), slot.number);
        let answer = slot.pattern(&state.grid);
        let clue = dict.clue_for_word(&answer);
        let out = ClueOutput {
            number: slot.number,
            x: slot.x,
            y: slot.y,
            length: slot.length,
            clue,
            answer,
        };
        match slot.direction {
            Direction::Across => across.push(out),
            Direction::Down => down.push(out),
        }
    }
    across.sort_by_key(|c| c.number);
    down.sort_by_key(|c| c.number);

    let grid_rows: Vec<String> = state.grid.to_rows().iter().map(|r| r.iter().collect()).collect();

    let mut empty_grid = Vec::with_capacity(height);
    for y in 0..height {
        let mut row = Vec::with_capacity(width);
        for x in 0..width {
            match number_at.get(&(x, y)) {
                Some(n) => row.push(n.to_string()),
                None => row.push(EMPTY.to_string()),
            }
        }
        empty_grid.push(row);
    }

    GenerationOutput {
        success: true,
        grid: grid_rows,
        empty_grid,
        clues: ClueSet { across, down },
        stats: GenerationStats {
            word_count: state.placements.len(),
            difficulty: band.as_str().to_string(),
            size: width,
            density: state.grid.density(),
        },
        fallback,
    }
}

/// Produces a crossword grid from `dict` given `width`/`height` and a
/// difficulty band (spec §4.3).
pub fn generate(
    width: usize,
    height: usize,
    band: DifficultyBand,
    dict: &DictionaryIndex,
    settings: &GeneratorSettings,
    rng: &mut impl Rng,
) -> Result<GenerationOutput, CrosswordError> {
    if width < 3 || height < 3 {
        warn!("grid too small for seed placement: {}x{}", width, height);
        return Err(CrosswordError::NoSeedAvailable);
    }

    info!("generating a {}x{} grid at {} difficulty", width, height, band.as_str());

    let (band_min, band_max) = band.bounds();
    let mut best_attempt: Option<GenState> = None;

    for attempt in 0..settings.density_retry_cap {
        let pool = build_candidate_pool(width, dict, settings, rng);
        if pool.is_empty() {
            continue;
        }

        let attempt_state = match run_one_generation_attempt(width, height, &pool, dict, settings, rng) {
            Some(s) => s,
            None => continue,
        };

        let density = attempt_state.grid.density();
        debug!("generation attempt {} density {:.3}", attempt, density);

        if density >= band_min && density <= band_max {
            return Ok(build_output(width, height, attempt_state, dict, band, false));
        }

        let better = best_attempt
            .as_ref()
            .map(|b| density > b.grid.density())
            .unwrap_or(true);
        if better {
            best_attempt = Some(attempt_state);
        }
    }

    match best_attempt {
        Some(state) => {
            warn!("no attempt matched the {} density band; returning the densest fallback", band.as_str());
            Ok(build_output(width, height, state, dict, band, true))
        }
        None => Err(CrosswordError::NoSeedAvailable),
    }
}
