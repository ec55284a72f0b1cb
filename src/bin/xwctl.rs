use std::collections::HashMap;
use std::fs;

use clap::{App, Arg, SubCommand};
use log::error;
use rand::{rngs::StdRng, SeedableRng};

use crossword_engine::dictionary::DictionaryIndex;
use crossword_engine::generator::{self, DifficultyBand, GeneratorSettings};
use crossword_engine::logging;
use crossword_engine::solver::{self, Algorithm, SolveInput, SolverSettings};

fn main() {
    logging::init_logger(false);

    let matches = App::new("xwctl")
        .about("Generates and solves crossword puzzles from a clue dictionary")
        .subcommand(
            SubCommand::with_name("generate")
                .about("Constructs a new crossword grid")
                .arg(Arg::with_name("dictionary").long("dictionary").takes_value(true).required(true))
                .arg(Arg::with_name("width").long("width").takes_value(true).required(true))
                .arg(Arg::with_name("height").long("height").takes_value(true).required(true))
                .arg(Arg::with_name("difficulty").long("difficulty").takes_value(true).default_value("medium"))
                .arg(Arg::with_name("seed").long("seed").takes_value(true).default_value("0"))
                .arg(Arg::with_name("output").long("output").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("solve")
                .about("Fills in a grid of clues")
                .arg(Arg::with_name("dictionary").long("dictionary").takes_value(true).required(true))
                .arg(Arg::with_name("input").long("input").takes_value(true).required(true))
                .arg(Arg::with_name("algorithm").long("algorithm").takes_value(true).default_value("dfs"))
                .arg(Arg::with_name("output").long("output").takes_value(true)),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("generate", Some(sub)) => run_generate(sub),
        ("solve", Some(sub)) => run_solve(sub),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_generate(sub: &clap::ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let dict_path = sub.value_of("dictionary").unwrap();
    let width: usize = sub.value_of("width").unwrap().parse()?;
    let height: usize = sub.value_of("height").unwrap().parse()?;
    let band = DifficultyBand::parse(sub.value_of("difficulty").unwrap())
        .ok_or_else(|| format!("unknown difficulty band '{}'", sub.value_of("difficulty").unwrap()))?;
    let seed: u64 = sub.value_of("seed").unwrap().parse()?;

    let dict = DictionaryIndex::load_from_dir(dict_path);
    let settings = GeneratorSettings::from_overrides(&HashMap::new());
    let mut rng = StdRng::seed_from_u64(seed);

    let output = generator::generate(width, height, band, &dict, &settings, &mut rng)?;
    let json = serde_json::to_string_pretty(&output)?;
    write_output(sub.value_of("output"), &json)
}

fn run_solve(sub: &clap::ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let dict_path = sub.value_of("dictionary").unwrap();
    let input_path = sub.value_of("input").unwrap();
    let algorithm = Algorithm::parse(sub.value_of("algorithm").unwrap())
        .ok_or_else(|| format!("unknown algorithm '{}'", sub.value_of("algorithm").unwrap()))?;

    let dict = DictionaryIndex::load_from_dir(dict_path);
    let raw = fs::read_to_string(input_path)?;
    let input: SolveInput = serde_json::from_str(&raw)?;
    let settings = SolverSettings::from_overrides(&HashMap::new());

    let result = solver::solve(input, &dict, algorithm, settings)?;
    let json = serde_json::to_string_pretty(&result)?;
    write_output(sub.value_of("output"), &json)
}

fn write_output(path: Option<&str>, json: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => fs::write(p, json)?,
        None => println!("{}", json),
    }
    Ok(())
}
