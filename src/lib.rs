#![warn(clippy::pedantic)]

pub mod config;
pub mod dice;
pub mod error;
pub mod evaluator;
pub mod montecarlo;
pub mod optimizer;
pub mod results;
pub mod session;
pub mod strategy;
pub mod tournament;

pub use config::{free_bacon, is_swap, Ruleset};
pub use dice::DiceTable;
pub use error::{SessionError, StrategyError, WireError};
pub use evaluator::Evaluator;
pub use results::{Ranking, Results};
pub use session::{Session, SerializationSink};
pub use strategy::Strategy;
