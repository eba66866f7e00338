use crate::{
    game::{command::JointAction, ids::PlayerId, snapshot::Snapshot},
    tree::mcts::RunError,
};

/// Anything that can pick a joint action for one side of a live game.
pub trait Agent<S: Snapshot> {
    fn name(&self) -> &str;

    /// Commands for `player`'s idle units in `snapshot`.
    fn decide(&mut self, player: PlayerId, snapshot: &S) -> Result<JointAction, RunError>;

    /// Forget any state carried between decisions of one game.
    fn reset(&mut self);
}
