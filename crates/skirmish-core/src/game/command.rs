use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::game::{ids::UnitId, snapshot::Snapshot, unit::Unit};

/// Grid directions a unit can step in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Cell offset of one step in this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Direction of a single step from `from` to the neighbouring cell `to`.
    pub fn between(from: (i32, i32), to: (i32, i32)) -> Option<Direction> {
        let delta = (to.0 - from.0, to.1 - from.1);
        Direction::ALL.into_iter().find(|d| d.offset() == delta)
    }
}

/// Atomic per-tick command understood by the resolution engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitCommand {
    /// Do nothing for `duration` ticks.
    Idle { duration: u64 },
    /// Step one cell.
    Move { direction: Direction },
    /// Hit whatever stands on the cell when the attack lands.
    Attack { x: i32, y: i32 },
}

impl UnitCommand {
    /// The filler command issued when a unit has nothing better to do.
    pub fn none() -> Self {
        UnitCommand::Idle { duration: 1 }
    }

    pub fn is_attack(&self) -> bool {
        matches!(self, UnitCommand::Attack { .. })
    }

    /// Ticks until the command completes for `unit`.
    pub fn eta(&self, unit: &Unit) -> u64 {
        match self {
            UnitCommand::Idle { duration } => *duration,
            UnitCommand::Move { .. } => unit.move_time,
            UnitCommand::Attack { .. } => unit.attack_time,
        }
    }

    /// Cell the unit ends up in once the command completes.
    pub fn destination(&self, unit: &Unit) -> (i32, i32) {
        match self {
            UnitCommand::Move { direction } => {
                let (dx, dy) = direction.offset();
                (unit.x + dx, unit.y + dy)
            }
            UnitCommand::Idle { .. } | UnitCommand::Attack { .. } => unit.position(),
        }
    }
}

impl fmt::Display for UnitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitCommand::Idle { duration } => write!(f, "idle({duration})"),
            UnitCommand::Move { direction } => write!(f, "move({direction:?})"),
            UnitCommand::Attack { x, y } => write!(f, "attack({x},{y})"),
        }
    }
}

/// Cells reserved by commands issued in the same tick.
/// Two footprints are consistent when they reserve no common cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    cells: BTreeSet<(i32, i32)>,
}

impl Footprint {
    pub fn new() -> Self {
        Footprint::default()
    }

    pub fn reserve(&mut self, x: i32, y: i32) {
        self.cells.insert((x, y));
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.cells.contains(&(x, y))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn consistent_with(&self, other: &Footprint) -> bool {
        self.cells.is_disjoint(&other.cells)
    }

    pub fn merge(&mut self, other: &Footprint) {
        self.cells.extend(other.cells.iter().copied());
    }
}

/// One atomic command per unit, plus the cells those commands reserve.
///
/// Equality only looks at the commands: two joint actions built on different
/// base reservations still issue the same orders.
#[derive(Debug, Clone, Default)]
pub struct JointAction {
    commands: BTreeMap<UnitId, UnitCommand>,
    footprint: Footprint,
}

impl JointAction {
    /// The empty joint action.
    pub fn new() -> Self {
        JointAction::default()
    }

    /// Start a joint action on top of cells already reserved elsewhere.
    pub fn with_footprint(footprint: Footprint) -> Self {
        JointAction {
            commands: BTreeMap::new(),
            footprint,
        }
    }

    pub fn insert(&mut self, unit: UnitId, command: UnitCommand) -> Option<UnitCommand> {
        self.commands.insert(unit, command)
    }

    pub fn get(&self, unit: UnitId) -> Option<&UnitCommand> {
        self.commands.get(&unit)
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.commands.contains_key(&unit)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &UnitCommand)> {
        self.commands.iter().map(|(id, command)| (*id, command))
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn footprint_mut(&mut self) -> &mut Footprint {
        &mut self.footprint
    }

    /// Add every command of `other` whose unit has no command here yet.
    pub fn merge(&mut self, other: &JointAction) {
        for (unit, command) in other.iter() {
            self.commands.entry(unit).or_insert(*command);
        }
        self.footprint.merge(&other.footprint);
    }

    /// Copy of this action restricted to units that exist in `snapshot`.
    pub fn bound_to<S: Snapshot>(&self, snapshot: &S) -> JointAction {
        let commands = self
            .commands
            .iter()
            .filter(|(id, _)| snapshot.unit(**id).is_some())
            .map(|(id, command)| (*id, *command))
            .collect();
        JointAction {
            commands,
            footprint: self.footprint.clone(),
        }
    }
}

impl PartialEq for JointAction {
    fn eq(&self, other: &Self) -> bool {
        self.commands == other.commands
    }
}

impl Eq for JointAction {}

impl fmt::Display for JointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.commands.is_empty() {
            return write!(f, "{{}}");
        }
        let mut first = true;
        for (unit, command) in &self.commands {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{unit}:{command}")?;
            first = false;
        }
        Ok(())
    }
}
