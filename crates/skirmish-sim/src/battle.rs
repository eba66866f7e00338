use std::{collections::BTreeMap, path::Path};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{JointAction, PlayerId, Snapshot, Unit, UnitCommand, UnitId};

use crate::{ScenarioSpec, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    command: UnitCommand,
    issued_at: u64,
}

#[derive(Debug, Clone)]
/// Grid combat between two players with seeded damage rolls.
///
/// Commands take effect when they complete: a move lands after the unit's
/// `move_time`, an attack deals `min_damage..=max_damage` to whatever stands on
/// the target cell after `attack_time`. A moving unit reserves its destination
/// while in flight. Clones carry the damage RNG along, so a cloned battle
/// replays the same rolls.
pub struct Battle {
    width: i32,
    height: i32,
    clock: u64,
    time_limit: u64,
    units: Vec<Unit>,
    pending: BTreeMap<UnitId, Pending>,
    rng: ChaCha8Rng,
}

impl Battle {
    /// Empty map; add units with [`Battle::place`] or build from a
    /// [`crate::ScenarioSpec`].
    pub fn new(width: i32, height: i32, time_limit: u64, seed: u64) -> Self {
        Battle {
            width,
            height,
            clock: 0,
            time_limit,
            units: Vec::new(),
            pending: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Load, validate and build the scenario stored at `path`.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        ScenarioSpec::from_yaml_path(path)?.build()
    }

    /// Put a unit on the map. Placement is not validated here.
    pub fn place(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn time_limit(&self) -> u64 {
        self.time_limit
    }

    /// Units still alive for `player`.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.player == player)
    }

    fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    fn resolve(&mut self, id: UnitId, command: UnitCommand) {
        match command {
            UnitCommand::Idle { .. } => {}
            UnitCommand::Move { .. } => {
                let Some(unit) = self.unit(id) else { return };
                let (x, y) = command.destination(unit);
                if self.in_bounds(x, y) && self.unit_at(x, y).is_none() {
                    if let Some(unit) = self.unit_mut(id) {
                        unit.x = x;
                        unit.y = y;
                    }
                }
            }
            UnitCommand::Attack { x, y } => {
                let Some((low, high)) = self.unit(id).map(|u| (u.min_damage, u.max_damage)) else {
                    return;
                };
                let damage = if high > low {
                    self.rng.gen_range(low..=high)
                } else {
                    low
                };
                if let Some(target) = self.units.iter_mut().find(|u| u.x == x && u.y == y) {
                    log::trace!("unit {id} hits unit {} for {damage}", target.id);
                    target.hp -= damage;
                }
            }
        }
    }
}

impl Snapshot for Battle {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn clock(&self) -> u64 {
        self.clock
    }

    fn units(&self) -> &[Unit] {
        &self.units
    }

    fn pending_command(&self, unit: UnitId) -> Option<&UnitCommand> {
        self.pending.get(&unit).map(|pending| &pending.command)
    }

    /// The only side with units left; at the time limit, the side with more
    /// hit points. `None` on a tie or while both sides fight on.
    fn winner(&self) -> Option<PlayerId> {
        match (self.has_units(PlayerId::ZERO), self.has_units(PlayerId::ONE)) {
            (true, false) => Some(PlayerId::ZERO),
            (false, true) => Some(PlayerId::ONE),
            (true, true) if self.clock >= self.time_limit => {
                let (zero, one) = (self.hp_sum(PlayerId::ZERO), self.hp_sum(PlayerId::ONE));
                match zero.cmp(&one) {
                    std::cmp::Ordering::Greater => Some(PlayerId::ZERO),
                    std::cmp::Ordering::Less => Some(PlayerId::ONE),
                    std::cmp::Ordering::Equal => None,
                }
            }
            _ => None,
        }
    }

    fn is_over(&self) -> bool {
        !self.has_units(PlayerId::ZERO)
            || !self.has_units(PlayerId::ONE)
            || self.clock >= self.time_limit
    }

    fn issue(&mut self, action: &JointAction) -> bool {
        let mut accepted = false;
        for (id, command) in action.iter() {
            let Some(unit) = self.unit(id) else { continue };
            if self.is_busy(id) || !self.is_allowed(unit, command) {
                log::trace!("rejected {command} for unit {id} at tick {}", self.clock);
                continue;
            }
            self.pending.insert(
                id,
                Pending {
                    command: *command,
                    issued_at: self.clock,
                },
            );
            accepted = true;
        }
        accepted
    }

    fn tick(&mut self) -> bool {
        self.clock += 1;
        let done: Vec<(UnitId, UnitCommand)> = self
            .pending
            .iter()
            .filter(|(id, pending)| {
                self.unit(**id)
                    .is_none_or(|u| pending.issued_at + pending.command.eta(u) <= self.clock)
            })
            .map(|(id, pending)| (*id, pending.command))
            .collect();

        for (id, command) in done {
            self.pending.remove(&id);
            self.resolve(id, command);
        }

        let dead: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id)
            .collect();
        for id in dead {
            log::trace!("unit {id} died at tick {}", self.clock);
            self.units.retain(|u| u.id != id);
            self.pending.remove(&id);
        }

        self.is_over()
    }

    fn is_allowed(&self, unit: &Unit, command: &UnitCommand) -> bool {
        match command {
            UnitCommand::Idle { duration } => *duration > 0,
            UnitCommand::Move { .. } => {
                let (x, y) = command.destination(unit);
                self.is_free(x, y)
            }
            UnitCommand::Attack { x, y } => self.can_attack(unit, *x, *y),
        }
    }

    fn clear_units(&mut self) {
        self.units.clear();
        self.pending.clear();
    }
}
