//! Deterministic snapshot used by the unit tests: attacks always deal minimum damage.
//!
//! The randomized `Battle` lives in `skirmish-sim`, which depends on this
//! crate; a dev-dependency on it would compile a second copy of these types
//! that the in-crate tests could not mix with their own.

use std::collections::BTreeMap;

use crate::game::{
    command::{JointAction, UnitCommand},
    ids::{PlayerId, UnitId},
    snapshot::Snapshot,
    unit::Unit,
};

#[derive(Debug, Clone)]
pub(crate) struct TestField {
    width: i32,
    height: i32,
    clock: u64,
    units: Vec<Unit>,
    pending: BTreeMap<UnitId, (UnitCommand, u64)>,
}

impl TestField {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        TestField {
            width,
            height,
            clock: 0,
            units: Vec::new(),
            pending: BTreeMap::new(),
        }
    }

    pub(crate) fn with_unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub(crate) fn remove_unit(&mut self, id: UnitId) {
        self.units.retain(|u| u.id != id);
        self.pending.remove(&id);
    }

    fn resolve(&mut self, id: UnitId, command: UnitCommand) {
        let Some(unit) = self.unit(id).cloned() else {
            return;
        };
        match command {
            UnitCommand::Idle { .. } => {}
            UnitCommand::Move { .. } => {
                let (x, y) = command.destination(&unit);
                if self.in_bounds(x, y) && self.unit_at(x, y).is_none() {
                    if let Some(unit) = self.unit_mut(id) {
                        unit.x = x;
                        unit.y = y;
                    }
                }
            }
            UnitCommand::Attack { x, y } => {
                if let Some(target) = self.units.iter_mut().find(|u| u.x == x && u.y == y) {
                    target.hp -= unit.min_damage;
                }
            }
        }
    }
}

/// A melee unit with fixed damage 2 and unit action durations.
pub(crate) fn soldier(id: u64, player: u8, x: i32, y: i32, hp: i32) -> Unit {
    Unit {
        id: UnitId::from(id),
        player: PlayerId::from(player),
        x,
        y,
        hp,
        max_hp: hp,
        min_damage: 2,
        max_damage: 2,
        attack_range: 1,
        attack_time: 1,
        move_time: 1,
    }
}

/// A ranged unit with range 3.
pub(crate) fn archer(id: u64, player: u8, x: i32, y: i32, hp: i32) -> Unit {
    Unit {
        attack_range: 3,
        min_damage: 1,
        max_damage: 2,
        attack_time: 2,
        ..soldier(id, player, x, y, hp)
    }
}

impl Snapshot for TestField {
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
        self.pending.get(&unit).map(|(command, _)| command)
    }

    fn winner(&self) -> Option<PlayerId> {
        match (self.has_units(PlayerId::ZERO), self.has_units(PlayerId::ONE)) {
            (true, false) => Some(PlayerId::ZERO),
            (false, true) => Some(PlayerId::ONE),
            _ => None,
        }
    }

    fn is_over(&self) -> bool {
        !self.has_units(PlayerId::ZERO) || !self.has_units(PlayerId::ONE)
    }

    fn issue(&mut self, action: &JointAction) -> bool {
        let mut accepted = false;
        for (id, command) in action.iter() {
            let Some(unit) = self.unit(id) else { continue };
            if self.is_busy(id) || !self.is_allowed(unit, command) {
                continue;
            }
            self.pending.insert(id, (*command, self.clock));
            accepted = true;
        }
        accepted
    }

    fn tick(&mut self) -> bool {
        self.clock += 1;
        let done: Vec<(UnitId, UnitCommand)> = self
            .pending
            .iter()
            .filter(|(id, (command, issued_at))| {
                self.unit(**id)
                    .is_none_or(|u| issued_at + command.eta(u) <= self.clock)
            })
            .map(|(id, (command, _))| (*id, *command))
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
            self.remove_unit(id);
        }
        self.is_over()
    }

    fn is_allowed(&self, unit: &Unit, command: &UnitCommand) -> bool {
        match command {
            UnitCommand::Idle { .. } => true,
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
