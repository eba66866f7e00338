pub mod agent;
pub mod eval;
pub mod game;
pub mod micro;
mod tree;

pub use agent::Agent;
pub use eval::{Evaluation, EvaluationFunction};
pub use game::command::{Direction, Footprint, JointAction, UnitCommand};
pub use game::ids::{PlayerId, UnitId};
pub use game::path::{GreedyPathFinder, PathFinder};
pub use game::snapshot::Snapshot;
pub use game::unit::Unit;
pub use micro::abstract_action::{AbstractAction, CarriedActions, SharedPathFinder};
pub use micro::generator::{GeneratorError, JointActionGenerator};
pub use micro::ledger::DamageLedger;
pub use micro::script::{Portfolio, Script, ScriptKind};
pub use tree::diagnostics::IterationLog;
pub use tree::error::TreeError;
pub use tree::ids::{ActionId, NodeId};
pub use tree::mcts::{
    IterationMetrics, Mcts, MctsVariant, RunError, RunMetrics, SearchConfig, SearchConfigError,
};
pub use tree::node::{NodeKind, SearchNode, TreeParams};
pub use tree::playout::{RandomScriptedPlayer, playout};
pub use tree::reward::{PlayoutOutcome, RewardScheme, RewardShaper, Segmentation, ShapedReward};
pub use tree::search_tree::{Backpropagation, Tree};
pub use tree::selection::{
    ChildView, NodeView, Selection, SelectionPolicy, scaled_exploitation,
};
pub use tree::stats::NodeStats;
pub use tree::summary::{ChildSummary, NodeSummary, TreeSummary};
