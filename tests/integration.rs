use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, SeedableRng};

use crossword_engine::dictionary::DictionaryIndex;
use crossword_engine::error::CrosswordError;
use crossword_engine::generator::{self, DifficultyBand, GeneratorSettings};
use crossword_engine::grid::{enumerate_slots, Direction, Grid, EMPTY};
use crossword_engine::solver::{self, Algorithm, ClueInput, ClueInputSet, SolveInput, SolverSettings, Substrate};

/// Writes a tiny dictionary to a throwaway directory and loads it, mirroring
/// the per-letter JSON file layout `DictionaryIndex::load_from_dir` expects.
fn build_dictionary(entries: &[(&str, &str)]) -> DictionaryIndex {
    let mut dir = std::env::temp_dir();
    dir.push(format!("xw-integration-{}-{}", std::process::id(), unique_suffix()));
    fs::create_dir_all(&dir).unwrap();

    let mut by_letter: HashMap<char, String> = HashMap::new();
    for (word, def) in entries {
        let letter = word.chars().next().unwrap().to_ascii_lowercase();
        let body = by_letter.entry(letter).or_insert_with(String::new);
        if !body.is_empty() {
            body.push(',');
        }
        body.push_str(&format!(
            "\"{}\": {{\"word\": \"{}\", \"meanings\": [{{\"def\": \"{}\", \"speech_part\": \"noun\"}}]}}",
            word.to_lowercase(),
            word.to_lowercase(),
            def
        ));
    }

    for (letter, body) in &by_letter {
        let mut f = fs::File::create(dir.join(format!("{}.json", letter))).unwrap();
        f.write_all(format!("{{{}}}", body).as_bytes()).unwrap();
    }

    let index = DictionaryIndex::load_from_dir(&dir);
    let _ = fs::remove_dir_all(&dir);
    index
}

fn unique_suffix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as u64
}

fn clue_input(number: usize, x: usize, y: usize, length: usize, clue: &str) -> ClueInput {
    ClueInput { number, x, y, length, clue: clue.to_string(), answer: None }
}

// S1: a unique 3x3 cross resolves to CAT across / COT down, intersecting on 'C'.
#[test]
fn s1_dfs_places_unique_cross() {
    let dict = build_dictionary(&[("cat", "small feline"), ("dog", "domestic canine"), ("cot", "small bed")]);
    let input = SolveInput {
        grid: vec!["...".into(), "...".into(), "...".into()],
        clues: ClueInputSet {
            across: vec![clue_input(1, 0, 0, 3, "small feline")],
            down: vec![clue_input(1, 0, 0, 3, "small bed")],
        },
    };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    assert_eq!(result.status, "success");
    assert_eq!(result.grid[0], "CAT");
    assert_eq!(result.grid[1], "O..");
    assert_eq!(result.grid[2], "T..");
}

// S2: the generator at medium difficulty hits the target density band (or
// flags a fallback) and places at least three words.
#[test]
fn s2_generator_hits_medium_density_band() {
    let dict = build_dictionary(&[
        ("crane", "a tall lifting machine"),
        ("otter", "a semi-aquatic mammal"),
        ("react", "to respond to a stimulus"),
        ("adept", "highly skilled"),
        ("tense", "strained or stretched"),
        ("eagle", "a bird of prey"),
        ("radar", "a detection system"),
        ("inert", "chemically inactive"),
        ("crest", "the top of a wave"),
        ("extra", "additional"),
    ]);
    let mut rng = StdRng::seed_from_u64(7);
    let output = generator::generate(5, 5, DifficultyBand::Medium, &dict, &GeneratorSettings::default(), &mut rng).unwrap();
    assert!(output.success);
    assert!(output.stats.word_count >= 3);
    if !output.fallback {
        let (lo, hi) = DifficultyBand::Medium.bounds();
        assert!(output.stats.density >= lo && output.stats.density <= hi);
    }
}

// S3: DFS on a unique 3-slot puzzle places all three words.
#[test]
fn s3_dfs_unique_three_slot_puzzle() {
    let dict = build_dictionary(&[("cat", "small feline"), ("cot", "small bed"), ("tap", "a faucet")]);
    let input = SolveInput {
        grid: vec!["...".into(), "...".into(), "...".into()],
        clues: ClueInputSet {
            across: vec![clue_input(1, 0, 0, 3, "small feline")],
            down: vec![clue_input(1, 0, 0, 3, "small bed"), clue_input(2, 2, 0, 3, "a faucet")],
        },
    };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    assert_eq!(result.status, "success");
    assert_eq!(result.words_placed, 3);
}

// S4: A* on the same kind of puzzle succeeds with a positive timing metric.
#[test]
fn s4_astar_solves_with_positive_timing() {
    let dict = build_dictionary(&[("cat", "small feline"), ("cot", "small bed")]);
    let input = SolveInput {
        grid: vec!["...".into(), "...".into(), "...".into()],
        clues: ClueInputSet {
            across: vec![clue_input(1, 0, 0, 3, "small feline")],
            down: vec![clue_input(1, 0, 0, 3, "small bed")],
        },
    };
    let mut settings = SolverSettings::default();
    settings.astar_iteration_budget = 100;
    let result = solver::solve(input, &dict, Algorithm::AStar, settings).unwrap();
    assert_eq!(result.status, "success");
    assert!(result.metrics.execution_time_seconds >= 0.0);
}

// S5: Hybrid reports a mode switch when the beam phase alone cannot finish.
// A ring of four mutually-crossing three-letter words (CAT/COT/TAP/TIP) forces
// the beam phase past its 0.7 progress threshold one slot shy of completion.
#[test]
fn s5_hybrid_reports_mode_switch_on_handoff() {
    let dict = build_dictionary(&[
        ("cat", "small feline"),
        ("cot", "small bed"),
        ("tap", "a faucet"),
        ("tip", "a small reward"),
    ]);
    let input = SolveInput {
        grid: vec!["...".into(), "...".into(), "...".into()],
        clues: ClueInputSet {
            across: vec![clue_input(1, 0, 0, 3, "small feline"), clue_input(3, 0, 2, 3, "a small reward")],
            down: vec![clue_input(2, 0, 0, 3, "small bed"), clue_input(4, 2, 0, 3, "a faucet")],
        },
    };
    let mut settings = SolverSettings::default();
    settings.beam_width = 1;
    let result = solver::solve(input, &dict, Algorithm::Hybrid, settings).unwrap();
    assert_eq!(result.status, "success");
    assert_eq!(result.words_placed, 4);
    assert!(result.metrics.mode_switches.is_some());
}

// S6: a clue whose length has no matching dictionary word falls through the
// whole ladder, leaving that slot unplaced and the run "partial".
#[test]
fn s6_unmatchable_clue_length_yields_partial_with_fallback_count() {
    let dict = build_dictionary(&[("cat", "small feline")]);
    let input = SolveInput {
        grid: vec!["..........".into()],
        clues: ClueInputSet { across: vec![clue_input(1, 0, 0, 10, "nothing of this length exists")], down: vec![] },
    };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    assert_eq!(result.status, "partial");
    assert_eq!(result.words_placed, 0);
    assert!(result.metrics.fallback_usage_count >= 1);
}

// P1: every enumerated slot is length >= 2 with an EMPTY/out-of-bounds cell
// immediately before and after it along its direction.
#[test]
fn p1_enumerated_slots_are_maximal_runs() {
    let grid = Grid::from_rows(&["CATS", ".A..", ".T..", ".S.."].iter().map(|r| r.chars().collect()).collect::<Vec<_>>());
    for slot in enumerate_slots(&grid) {
        assert!(slot.length >= 2);
        let (bx, by) = slot.direction.advance_signed(slot.x as isize, slot.y as isize, -1);
        assert!(!grid.in_bounds(bx, by) || grid.get_signed(bx, by) == EMPTY);
        let (ax, ay) = slot.direction.advance_signed(slot.x as isize, slot.y as isize, slot.length as isize);
        assert!(!grid.in_bounds(ax, ay) || grid.get_signed(ax, ay) == EMPTY);
    }
}

// P2: at every intersection the two crossing slots agree on the shared letter.
#[test]
fn p2_intersections_agree_on_shared_letter() {
    let dict = build_dictionary(&[("cat", "small feline"), ("cot", "small bed")]);
    let input = SolveInput {
        grid: vec!["...".into(), "...".into(), "...".into()],
        clues: ClueInputSet {
            across: vec![clue_input(1, 0, 0, 3, "small feline")],
            down: vec![clue_input(1, 0, 0, 3, "small bed")],
        },
    };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    let rows: Vec<Vec<char>> = result.grid.iter().map(|r| r.chars().collect()).collect();
    let grid = Grid::from_rows(&rows);
    let slots = enumerate_slots(&grid);
    let graph = crossword_engine::grid::IntersectionGraph::build(&slots);
    for intersection in graph.intersections() {
        let across = slots.iter().find(|s| s.key() == intersection.across_key).unwrap();
        let down = slots.iter().find(|s| s.key() == intersection.down_key).unwrap();
        let (ax, ay) = across.cell_at(intersection.across_index);
        let (dx, dy) = down.cell_at(intersection.down_index);
        assert_eq!((ax, ay), (dx, dy));
        assert_ne!(grid.get(ax, ay), EMPTY);
    }
}

// P4 / R1: place followed by remove restores the grid exactly.
#[test]
fn r1_place_then_remove_restores_grid() {
    let dict = build_dictionary(&[("cat", "small feline")]);
    let input = SolveInput {
        grid: vec!["...".into(), "...".into(), "...".into()],
        clues: ClueInputSet { across: vec![clue_input(1, 0, 0, 3, "small feline")], down: vec![] },
    };
    let mut substrate = Substrate::build(input, &dict, SolverSettings::default()).unwrap();
    let before = substrate.rows();
    let written = substrate.place((1, Direction::Across), "CAT");
    assert_ne!(substrate.rows(), before);
    substrate.remove(&written);
    assert_eq!(substrate.rows(), before);
}

// P7: a fixed seed, dictionary, and input produce bit-identical generator output.
#[test]
fn p7_generation_is_deterministic_under_a_fixed_seed() {
    let dict = build_dictionary(&[
        ("crane", "a tall lifting machine"),
        ("otter", "a semi-aquatic mammal"),
        ("react", "to respond to a stimulus"),
        ("adept", "highly skilled"),
        ("tense", "strained or stretched"),
    ]);
    let settings = GeneratorSettings::default();

    let mut rng_a = StdRng::seed_from_u64(42);
    let out_a = generator::generate(5, 5, DifficultyBand::Easy, &dict, &settings, &mut rng_a).unwrap();

    let mut rng_b = StdRng::seed_from_u64(42);
    let out_b = generator::generate(5, 5, DifficultyBand::Easy, &dict, &settings, &mut rng_b).unwrap();

    assert_eq!(out_a.grid, out_b.grid);
    assert_eq!(out_a.stats.word_count, out_b.stats.word_count);
    assert_eq!(out_a.stats.density, out_b.stats.density);
}

// B1: an empty clue list is a trivial success.
#[test]
fn b1_empty_clue_list_succeeds_trivially() {
    let dict = DictionaryIndex::empty();
    let input = SolveInput { grid: vec!["..".into(), "..".into()], clues: ClueInputSet { across: vec![], down: vec![] } };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    assert_eq!(result.status, "success");
    assert_eq!(result.words_placed, 0);
}

// B2: a grid too small to seat a seed word reports NoSeedAvailable.
#[test]
fn b2_tiny_grid_reports_no_seed_available() {
    let dict = build_dictionary(&[("cat", "small feline")]);
    let mut rng = StdRng::seed_from_u64(1);
    let result = generator::generate(2, 2, DifficultyBand::Easy, &dict, &GeneratorSettings::default(), &mut rng);
    assert!(matches!(result, Err(CrosswordError::NoSeedAvailable)));
}

// B3: a clue longer than any dictionary word falls back to zero placements
// for that slot without aborting the whole solve.
#[test]
fn b3_clue_exceeding_longest_dictionary_word_yields_partial() {
    let dict = build_dictionary(&[("cat", "small feline"), ("dog", "domestic canine")]);
    let input = SolveInput {
        grid: vec!["............".into()],
        clues: ClueInputSet { across: vec![clue_input(1, 0, 0, 12, "longer than any known word")], down: vec![] },
    };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    assert_eq!(result.status, "partial");
    assert_eq!(result.words_placed, 0);
}

// B4: a fully pre-filled grid succeeds without placing anything new.
#[test]
fn b4_prefilled_grid_succeeds_with_no_placements() {
    let dict = build_dictionary(&[("cat", "small feline")]);
    let input = SolveInput {
        grid: vec!["CAT".into(), "...".into(), "...".into()],
        clues: ClueInputSet { across: vec![clue_input(1, 0, 0, 3, "small feline")], down: vec![] },
    };
    let result = solver::solve(input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();
    assert_eq!(result.status, "success");
    assert_eq!(result.words_placed, 0);
}

// R2: feeding a generated grid's own clues back into the solver reproduces
// the generator's grid cell-for-cell.
#[test]
fn r2_generator_then_solver_round_trip() {
    let dict = build_dictionary(&[
        ("crane", "a tall lifting machine"),
        ("otter", "a semi-aquatic mammal"),
        ("react", "to respond to a stimulus"),
        ("adept", "highly skilled"),
        ("tense", "strained or stretched"),
        ("eagle", "a bird of prey"),
        ("radar", "a detection system"),
        ("inert", "chemically inactive"),
        ("crest", "the top of a wave"),
        ("extra", "additional"),
    ]);
    let mut rng = StdRng::seed_from_u64(11);
    let generated = generator::generate(5, 5, DifficultyBand::Easy, &dict, &GeneratorSettings::default(), &mut rng).unwrap();

    let blank_rows: Vec<String> = generated.grid.iter().map(|row| ".".repeat(row.len())).collect();
    let across: Vec<ClueInput> = generated
        .clues
        .across
        .iter()
        .map(|c| clue_input(c.number, c.x, c.y, c.length, &c.clue))
        .collect();
    let down: Vec<ClueInput> = generated
        .clues
        .down
        .iter()
        .map(|c| clue_input(c.number, c.x, c.y, c.length, &c.clue))
        .collect();

    let solve_input = SolveInput { grid: blank_rows, clues: ClueInputSet { across, down } };
    let result = solver::solve(solve_input, &dict, Algorithm::Dfs, SolverSettings::default()).unwrap();

    assert_eq!(result.status, "success");
    assert_eq!(result.grid, generated.grid);
}

// R3: enumerating slots on a generated grid recovers exactly the words the
// generator placed, under the correct numbering.
#[test]
fn r3_enumeration_recovers_generated_words() {
    let dict = build_dictionary(&[
        ("crane", "a tall lifting machine"),
        ("otter", "a semi-aquatic mammal"),
        ("react", "to respond to a stimulus"),
        ("adept", "highly skilled"),
        ("tense", "strained or stretched"),
    ]);
    let mut rng = StdRng::seed_from_u64(3);
    let generated = generator::generate(5, 5, DifficultyBand::Easy, &dict, &GeneratorSettings::default(), &mut rng).unwrap();

    let rows: Vec<Vec<char>> = generated.grid.iter().map(|r| r.chars().collect()).collect();
    let grid = Grid::from_rows(&rows);
    let slots = enumerate_slots(&grid);

    for clue in generated.clues.across.iter().chain(generated.clues.down.iter()) {
        let matching = slots
            .iter()
            .find(|s| s.number == clue.number && s.x == clue.x && s.y == clue.y && s.length == clue.length);
        assert!(matching.is_some(), "no enumerated slot for generated clue {}", clue.number);
    }
}
