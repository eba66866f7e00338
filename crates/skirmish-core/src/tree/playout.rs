use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    agent::Agent,
    game::{command::JointAction, ids::PlayerId, snapshot::Snapshot},
    micro::{
        abstract_action::{CarriedActions, resolve_carried},
        generator::JointActionGenerator,
        ledger::DamageLedger,
        script::Portfolio,
    },
    tree::mcts::RunError,
};

/// Default policy for playouts: keeps running carried actions and gives
/// every other idle unit a random portfolio script.
#[derive(Debug, Clone)]
pub struct RandomScriptedPlayer<S: Snapshot> {
    portfolio: Portfolio<S>,
    carried: CarriedActions<S>,
    rng: ChaCha8Rng,
}

impl<S: Snapshot> RandomScriptedPlayer<S> {
    pub fn new(portfolio: Portfolio<S>, seed: u64) -> Self {
        RandomScriptedPlayer {
            portfolio,
            carried: CarriedActions::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Start from copies of abstract actions assigned elsewhere.
    pub fn with_carried(mut self, carried: &CarriedActions<S>) -> Self {
        self.carried
            .extend(carried.iter().map(|(unit, action)| (*unit, action.clone())));
        self
    }

    pub fn carried(&self) -> &CarriedActions<S> {
        &self.carried
    }

    /// Commands for `player`'s idle units.
    pub fn get_action(&mut self, player: PlayerId, snapshot: &S) -> JointAction {
        if !snapshot.can_act(player) {
            return JointAction::new();
        }

        let mut working = snapshot.clone();
        let initial = resolve_carried(&mut self.carried, &working, Some(player));
        working.issue(&initial);
        if !working.can_act(player) {
            return initial;
        }

        let ledger = DamageLedger::from_carried(&self.carried);

        let seed = self.rng.r#gen();
        let mut generator = match JointActionGenerator::new(
            &working,
            self.portfolio.clone(),
            player,
            &ledger,
            seed,
        ) {
            Ok(generator) => generator,
            Err(err) => {
                log::warn!("playout policy could not build a generator: {err}");
                return initial;
            }
        };

        let mut chosen = generator.random_action();
        if let Some(sources) = generator.corresponding_abstract_actions(&chosen) {
            self.carried
                .extend(sources.iter().map(|(unit, action)| (*unit, action.clone())));
        }
        chosen.merge(&initial);
        chosen
    }
}

impl<S: Snapshot> Agent<S> for RandomScriptedPlayer<S> {
    fn name(&self) -> &str {
        "random_scripted"
    }

    fn decide(&mut self, player: PlayerId, snapshot: &S) -> Result<JointAction, RunError> {
        Ok(self.get_action(player, snapshot))
    }

    fn reset(&mut self) {
        self.carried.clear();
    }
}

/// Play `snapshot` forward with two scripted players for at most `lookahead`
/// ticks or until the game ends.
///
/// `on_decision` sees the snapshot right after both sides issued commands.
/// Returns how many decisions were made.
pub fn playout<S, F>(
    snapshot: &mut S,
    max_player: (PlayerId, &mut RandomScriptedPlayer<S>),
    min_player: (PlayerId, &mut RandomScriptedPlayer<S>),
    lookahead: u64,
    mut on_decision: F,
) -> u64
where
    S: Snapshot,
    F: FnMut(&S),
{
    let limit = snapshot.clock().saturating_add(lookahead);
    let (max, max_policy) = max_player;
    let (min, min_policy) = min_player;
    let mut decisions = 0;

    while !snapshot.is_over() && snapshot.winner().is_none() && snapshot.clock() < limit {
        if snapshot.can_act(max) || snapshot.can_act(min) {
            let first = max_policy.get_action(max, snapshot);
            let second = min_policy.get_action(min, snapshot);
            snapshot.issue(&first);
            snapshot.issue(&second);
            decisions += 1;
            on_decision(snapshot);
        }
        if snapshot.tick() {
            break;
        }
    }
    decisions
}
