pub use board::*;
pub use cards::*;
pub use config::*;
pub use errors::*;
pub use evaluator::*;
pub use scoreboard::*;
pub use visualization::*;

#[cfg(test)]
mod arbitrary;
mod board;
mod cards;
mod config;
mod errors;
mod evaluator;
mod scoreboard;
mod visualization;
