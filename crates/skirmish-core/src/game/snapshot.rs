use std::fmt;

use crate::game::{
    command::{Footprint, JointAction, UnitCommand},
    ids::{PlayerId, UnitId},
    unit::Unit,
};

/// World state the search operates on.
///
/// The engine never resolves combat itself. It clones snapshots, issues joint
/// actions and advances time through this trait, so any resolution engine
/// with stable unit ids can be searched.
pub trait Snapshot: Clone + fmt::Debug {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Current simulation tick.
    fn clock(&self) -> u64;

    /// All live units.
    fn units(&self) -> &[Unit];

    /// The in-flight command of a unit, if it is busy.
    fn pending_command(&self, unit: UnitId) -> Option<&UnitCommand>;

    /// `Some(player)` once a side has won.
    fn winner(&self) -> Option<PlayerId>;

    /// Whether the game has ended, with or without a winner.
    fn is_over(&self) -> bool;

    /// Issue commands for idle units. Returns `false` if nothing was accepted.
    fn issue(&mut self, action: &JointAction) -> bool;

    /// Advance one tick. Returns `true` once the game is over.
    fn tick(&mut self) -> bool;

    /// Whether the engine would accept `command` for `unit` right now.
    fn is_allowed(&self, unit: &Unit, command: &UnitCommand) -> bool;

    /// Drop every unit and pending command, ending the game.
    fn clear_units(&mut self);

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units().iter().find(|u| u.id == id)
    }

    fn unit_at(&self, x: i32, y: i32) -> Option<&Unit> {
        self.units().iter().find(|u| u.x == x && u.y == y)
    }

    fn has_units(&self, player: PlayerId) -> bool {
        self.units().iter().any(|u| u.player == player)
    }

    /// Whether the cell is inside the map and not occupied or reserved.
    fn is_free(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y)
            && self.unit_at(x, y).is_none()
            && !self.in_flight_footprint().contains(x, y)
    }

    /// Whether `unit` could attack the cell: in range and holding an enemy.
    fn can_attack(&self, unit: &Unit, x: i32, y: i32) -> bool {
        unit.squared_distance(x, y) <= unit.attack_range * unit.attack_range
            && self
                .unit_at(x, y)
                .is_some_and(|target| target.player != unit.player)
    }

    fn is_busy(&self, unit: UnitId) -> bool {
        self.pending_command(unit).is_some()
    }

    /// Whether `player` owns at least one idle unit.
    fn can_act(&self, player: PlayerId) -> bool {
        self.units()
            .iter()
            .any(|u| u.player == player && !self.is_busy(u.id))
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }

    /// Cells `command` reserves while it is in flight.
    fn footprint(&self, unit: &Unit, command: &UnitCommand) -> Footprint {
        let mut footprint = Footprint::new();
        if let UnitCommand::Move { .. } = command {
            let (x, y) = command.destination(unit);
            footprint.reserve(x, y);
        }
        footprint
    }

    /// Cells reserved by every in-flight command.
    fn in_flight_footprint(&self) -> Footprint {
        let mut footprint = Footprint::new();
        for unit in self.units() {
            if let Some(command) = self.pending_command(unit.id) {
                footprint.merge(&self.footprint(unit, command));
            }
        }
        footprint
    }

    /// Sum of hit points over a side's units.
    fn hp_sum(&self, player: PlayerId) -> i32 {
        self.units()
            .iter()
            .filter(|u| u.player == player)
            .map(|u| u.hp)
            .sum()
    }

    fn clone_and_apply(&self, action: &JointAction) -> Self {
        let mut next = self.clone();
        if !action.is_empty() && !next.issue(action) {
            log::trace!("no command of {action} accepted at tick {}", next.clock());
        }
        next
    }
}
