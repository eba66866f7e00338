mod battle;
mod builder;
mod error;
mod path;
mod runner;
mod spec;

pub use battle::Battle;
pub use builder::ScenarioBuilder;
pub use error::SimError;
pub use path::BfsPathFinder;
pub use runner::{MatchReport, play_match};
pub use spec::{ScenarioSpec, UnitSpec};
