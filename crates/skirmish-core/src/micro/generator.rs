use std::{collections::HashMap, fmt};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    game::{
        command::{Footprint, JointAction, UnitCommand},
        ids::{PlayerId, UnitId},
        snapshot::Snapshot,
        unit::Unit,
    },
    micro::{
        abstract_action::{AbstractAction, CarriedActions},
        ledger::DamageLedger,
        script::{Portfolio, Script},
    },
};

/// Error type for building a joint action generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// The acting player has no idle unit to assign a script to.
    NoAssignableUnits { player: PlayerId },
    /// `scripts ^ units` does not fit in 64 bits.
    ActionSpaceTooLarge { scripts: usize, units: usize },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::NoAssignableUnits { player } => {
                write!(f, "generator for {player} created with no unit able to act")
            }
            GeneratorError::ActionSpaceTooLarge { scripts, units } => write!(
                f,
                "{scripts} scripts over {units} units exceed the enumerable action space"
            ),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Random permutation of `0..len` drawn one element at a time.
/// Only the displaced slots are stored, so huge ranges cost nothing up front.
#[derive(Debug, Clone)]
struct ChoiceOrder {
    remaining: u64,
    displaced: HashMap<u64, u64>,
}

impl ChoiceOrder {
    fn new(len: u64) -> Self {
        ChoiceOrder {
            remaining: len,
            displaced: HashMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let pick = rng.gen_range(0..self.remaining);
        let last = self.remaining - 1;
        let value = self.displaced.get(&pick).copied().unwrap_or(pick);
        let last_value = self.displaced.remove(&last).unwrap_or(last);
        if pick != last {
            self.displaced.insert(pick, last_value);
        }
        self.remaining = last;
        Some(value)
    }
}

/// Enumerates joint actions built from one portfolio script per idle unit.
///
/// Every joint action handed out is resource-consistent: no two commands
/// reserve the same cell, and none collides with commands already in flight.
#[derive(Debug, Clone)]
pub struct JointActionGenerator<S: Snapshot> {
    snapshot: S,
    portfolio: Portfolio<S>,
    player: PlayerId,
    base_footprint: Footprint,
    assignable: Vec<UnitId>,
    prior: DamageLedger,
    ledger: DamageLedger,
    order: ChoiceOrder,
    action_count: u64,
    generated: Vec<(JointAction, CarriedActions<S>)>,
    rng: ChaCha8Rng,
}

impl<S: Snapshot> JointActionGenerator<S> {
    /// Build a generator for `player`'s idle units in `snapshot`.
    /// `prior` holds damage promised by actions carried over from earlier decisions.
    pub fn new(
        snapshot: &S,
        portfolio: Portfolio<S>,
        player: PlayerId,
        prior: &DamageLedger,
        seed: u64,
    ) -> Result<Self, GeneratorError> {
        let assignable: Vec<UnitId> = snapshot
            .units()
            .iter()
            .filter(|u| u.player == player && !snapshot.is_busy(u.id))
            .map(|u| u.id)
            .collect();
        if assignable.is_empty() {
            return Err(GeneratorError::NoAssignableUnits { player });
        }

        let action_count = u32::try_from(assignable.len())
            .ok()
            .and_then(|units| (portfolio.len() as u64).checked_pow(units))
            .ok_or(GeneratorError::ActionSpaceTooLarge {
                scripts: portfolio.len(),
                units: assignable.len(),
            })?;

        Ok(JointActionGenerator {
            snapshot: snapshot.clone(),
            portfolio,
            player,
            base_footprint: snapshot.in_flight_footprint(),
            assignable,
            prior: prior.clone(),
            ledger: prior.clone(),
            order: ChoiceOrder::new(action_count),
            action_count,
            generated: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn assignable_units(&self) -> &[UnitId] {
        &self.assignable
    }

    /// `|portfolio| ^ |assignable units|`.
    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    /// Whether some script combination has not been tried yet.
    pub fn has_more(&self) -> bool {
        !self.order.is_empty()
    }

    /// How many joint actions have been handed out so far.
    pub fn generated(&self) -> usize {
        self.generated.len()
    }

    /// Ledger after the most recent generation call. `next_action` restarts
    /// from the prior ledger; `random_action` keeps adding to it.
    pub fn ledger(&self) -> &DamageLedger {
        &self.ledger
    }

    /// Next untried, consistent and non-duplicate joint action.
    /// `None` once every script combination has been tried.
    pub fn next_action(&mut self) -> Option<JointAction> {
        let scripts = self.portfolio.len() as u64;

        while let Some(choice) = self.order.draw(&mut self.rng) {
            let mut working = self.snapshot.clone();
            self.ledger = self.prior.clone();
            let mut joint = JointAction::with_footprint(self.base_footprint.clone());
            let mut actions = CarriedActions::new();
            let mut consistent = true;
            let mut digits = choice;

            for unit_id in &self.assignable {
                let script = self.portfolio.get((digits % scripts) as usize);
                digits /= scripts;
                let Some(unit) = working.unit(*unit_id).cloned() else {
                    continue;
                };

                let (command, action) = script_command(script, &unit, &working, &self.ledger);
                if let Some((target, amount)) = action.as_ref().and_then(|a| a.assigned_damage()) {
                    self.ledger.add(target, amount);
                }

                if !try_commit(&mut joint, &mut working, &unit, command) {
                    consistent = false;
                    break;
                }
                if let Some(action) = action {
                    actions.insert(unit.id, action);
                }
            }

            if !consistent || self.is_duplicate(&joint, &actions) {
                continue;
            }
            self.generated.push((joint.clone(), actions));
            return Some(joint);
        }
        None
    }

    /// One consistent joint action sampled without enumeration.
    ///
    /// Each idle unit tries the scripts in random order and keeps the first
    /// one whose command fits, idling when none does. Damage assigned here is
    /// added to the generator's ledger and stays there for later samples.
    pub fn random_action(&mut self) -> JointAction {
        let mut working = self.snapshot.clone();
        let mut joint = JointAction::with_footprint(self.base_footprint.clone());
        let mut actions = CarriedActions::new();

        for unit_id in &self.assignable {
            let Some(unit) = working.unit(*unit_id).cloned() else {
                continue;
            };
            let mut untried: Vec<usize> = (0..self.portfolio.len()).collect();

            loop {
                let (command, action) = if untried.is_empty() {
                    (UnitCommand::none(), None)
                } else {
                    let index = untried.swap_remove(self.rng.gen_range(0..untried.len()));
                    script_command(self.portfolio.get(index), &unit, &working, &self.ledger)
                };

                if !try_commit(&mut joint, &mut working, &unit, command) {
                    continue;
                }
                if let Some(action) = action {
                    if let Some((target, amount)) = action.assigned_damage() {
                        self.ledger.add(target, amount);
                    }
                    actions.insert(unit.id, action);
                }
                break;
            }
        }

        self.generated.push((joint.clone(), actions));
        joint
    }

    /// Abstract actions behind a joint action this generator returned.
    pub fn corresponding_abstract_actions(&self, action: &JointAction) -> Option<&CarriedActions<S>> {
        self.generated
            .iter()
            .rev()
            .find(|(joint, _)| joint == action)
            .map(|(_, actions)| actions)
    }

    fn is_duplicate(&self, joint: &JointAction, actions: &CarriedActions<S>) -> bool {
        self.generated.iter().any(|(seen, seen_actions)| {
            seen == joint
                && actions
                    .iter()
                    .all(|(unit, action)| seen_actions.get(unit) == Some(action))
        })
    }
}

/// Instantiate `script` for `unit` and pull its first command.
/// Falls back to the idle command, without an abstract action, when the script
/// finds no target or is blocked.
fn script_command<S: Snapshot>(
    script: Option<&Script<S>>,
    unit: &Unit,
    snapshot: &S,
    ledger: &DamageLedger,
) -> (UnitCommand, Option<AbstractAction<S>>) {
    let mut action = script.and_then(|script| script.instantiate(unit, snapshot, ledger));
    let command = action.as_mut().and_then(|action| {
        if action.completed(snapshot) {
            None
        } else {
            action.execute(snapshot)
        }
    });
    match command {
        Some(command) => (command, action),
        None => (UnitCommand::none(), None),
    }
}

/// Add `command` to `joint` if its footprint fits, issuing it on `working`.
fn try_commit<S: Snapshot>(
    joint: &mut JointAction,
    working: &mut S,
    unit: &Unit,
    command: UnitCommand,
) -> bool {
    let footprint = working.footprint(unit, &command);
    if !joint.footprint().consistent_with(&footprint) {
        return false;
    }
    joint.footprint_mut().merge(&footprint);
    joint.insert(unit.id, command);

    let mut single = JointAction::new();
    single.insert(unit.id, command);
    working.issue(&single);
    true
}
