use thiserror::Error;

use crate::grid::Location;

/// Error taxonomy for the engine. Every fallible public entry point returns
/// one of these rather than panicking; panics remain reserved for
/// `check_valid`-style internal consistency assertions that indicate a bug
/// in the engine itself, not a caller error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrosswordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dictionary file missing for letter '{0}'")]
    DictionaryMissing(char),

    #[error("no seed word available for the requested grid shape")]
    NoSeedAvailable,

    #[error("no candidates available for slot {number} {direction:?} after exhausting the fallback ladder")]
    NoCandidates { number: usize, direction: crate::grid::Direction },

    #[error("budget exhausted after {iterations} iterations")]
    BudgetExhausted { iterations: usize },

    #[error("internal invariant violated at {0:?}: {1}")]
    InternalInvariantViolation(Location, String),
}
