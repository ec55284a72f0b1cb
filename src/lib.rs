pub mod dictionary;
pub mod error;
pub mod generator;
pub mod grid;
pub mod logging;
pub mod solver;
