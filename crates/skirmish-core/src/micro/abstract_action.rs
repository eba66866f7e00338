use std::{collections::BTreeMap, sync::Arc};

use crate::game::{
    command::{JointAction, UnitCommand},
    ids::{PlayerId, UnitId},
    path::PathFinder,
    snapshot::Snapshot,
    unit::Unit,
};

/// Path finder shared between scripts and the actions they create.
pub type SharedPathFinder<S> = Arc<dyn PathFinder<S>>;

/// Abstract actions currently assigned to units, keyed by the unit they drive.
pub type CarriedActions<S> = BTreeMap<UnitId, AbstractAction<S>>;

/// Walk a unit to a cell.
#[derive(Debug, Clone)]
pub struct MoveTo<S: Snapshot> {
    unit: UnitId,
    x: i32,
    y: i32,
    path_finder: SharedPathFinder<S>,
}

impl<S: Snapshot> MoveTo<S> {
    pub fn new(unit: UnitId, x: i32, y: i32, path_finder: SharedPathFinder<S>) -> Self {
        MoveTo {
            unit,
            x,
            y,
            path_finder,
        }
    }

    pub fn destination(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn completed(&self, snapshot: &S) -> bool {
        snapshot
            .unit(self.unit)
            .is_none_or(|u| u.position() == (self.x, self.y))
    }

    fn execute(&self, snapshot: &S) -> Option<UnitCommand> {
        let unit = snapshot.unit(self.unit)?;
        self.path_finder
            .move_toward(unit, self.x, self.y, snapshot)
            .filter(|command| snapshot.is_allowed(unit, command))
    }
}

impl<S: Snapshot> PartialEq for MoveTo<S> {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit
            && self.x == other.x
            && self.y == other.y
            && self.path_finder.name() == other.path_finder.name()
    }
}

/// Close in on a target and land a single hit.
#[derive(Debug, Clone)]
pub struct AttackOnce<S: Snapshot> {
    unit: UnitId,
    target: UnitId,
    path_finder: SharedPathFinder<S>,
    /// Target hit points when the last attack was issued.
    target_hp: i32,
    damage: i32,
    finished: bool,
    assigned_at: u64,
    last_command: Option<UnitCommand>,
}

impl<S: Snapshot> AttackOnce<S> {
    pub fn new(unit: &Unit, target: &Unit, path_finder: SharedPathFinder<S>) -> Self {
        AttackOnce {
            unit: unit.id,
            target: target.id,
            path_finder,
            target_hp: target.hp,
            damage: unit.min_damage,
            finished: false,
            assigned_at: 0,
            last_command: None,
        }
    }

    pub fn target(&self) -> UnitId {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn update(&mut self, snapshot: &S) {
        let (Some(unit), Some(target)) = (snapshot.unit(self.unit), snapshot.unit(self.target))
        else {
            return;
        };
        // While still approaching, damage dealt by others must not count as ours.
        if unit.manhattan_distance(target.x, target.y) > unit.attack_range {
            self.target_hp = target.hp;
        }
    }

    fn completed(&mut self, snapshot: &S) -> bool {
        if self.finished {
            return true;
        }
        let (Some(unit), Some(target)) = (snapshot.unit(self.unit), snapshot.unit(self.target))
        else {
            self.finished = true;
            return true;
        };
        if let Some(command) = self.last_command {
            if command.is_attack()
                && self.assigned_at + command.eta(unit) <= snapshot.clock()
                && target.hp < self.target_hp
            {
                self.finished = true;
            }
        }
        self.finished
    }

    fn execute(&mut self, snapshot: &S) -> Option<UnitCommand> {
        self.assigned_at = snapshot.clock();
        let unit = snapshot.unit(self.unit)?;
        let target = snapshot.unit(self.target)?;

        if unit.in_attack_range(target) {
            self.target_hp = target.hp;
            let command = UnitCommand::Attack {
                x: target.x,
                y: target.y,
            };
            self.last_command = Some(command);
            return Some(command);
        }

        let step = self
            .path_finder
            .move_within_range(unit, target.x, target.y, unit.attack_range, snapshot)
            .filter(|command| snapshot.is_allowed(unit, command));
        self.last_command = step;
        step
    }
}

impl<S: Snapshot> PartialEq for AttackOnce<S> {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit
            && self.target == other.target
            && self.path_finder.name() == other.path_finder.name()
    }
}

/// Attack once, then back off `retreat_distance` cells directly away from the target.
#[derive(Debug, Clone)]
pub struct HitAndRun<S: Snapshot> {
    attack: AttackOnce<S>,
    retreat: Option<MoveTo<S>>,
    retreat_distance: i32,
}

impl<S: Snapshot> HitAndRun<S> {
    pub fn new(attack: AttackOnce<S>, retreat_distance: i32) -> Self {
        HitAndRun {
            attack,
            retreat: None,
            retreat_distance,
        }
    }

    pub fn attack(&self) -> &AttackOnce<S> {
        &self.attack
    }

    pub fn retreat(&self) -> Option<&MoveTo<S>> {
        self.retreat.as_ref()
    }

    fn completed(&mut self, snapshot: &S) -> bool {
        if !self.attack.completed(snapshot) {
            return false;
        }
        let (Some(unit), Some(target)) = (
            snapshot.unit(self.attack.unit),
            snapshot.unit(self.attack.target),
        ) else {
            return true;
        };

        if let Some(retreat) = &self.retreat {
            return retreat.completed(snapshot);
        }

        let dx = unit.x - target.x;
        let dy = unit.y - target.y;
        let x = (unit.x + dx * self.retreat_distance).clamp(0, snapshot.width() - 1);
        let y = (unit.y + dy * self.retreat_distance).clamp(0, snapshot.height() - 1);
        self.retreat = Some(MoveTo::new(
            unit.id,
            x,
            y,
            Arc::clone(&self.attack.path_finder),
        ));
        false
    }

    fn execute(&mut self, snapshot: &S) -> Option<UnitCommand> {
        if !self.attack.completed(snapshot) {
            return self.attack.execute(snapshot);
        }
        if self.retreat.is_none() && self.completed(snapshot) {
            return None;
        }
        self.retreat
            .as_ref()
            .and_then(|retreat| retreat.execute(snapshot))
    }
}

impl<S: Snapshot> PartialEq for HitAndRun<S> {
    fn eq(&self, other: &Self) -> bool {
        self.attack == other.attack
            && self.retreat == other.retreat
            && self.retreat_distance == other.retreat_distance
    }
}

/// A multi-tick behaviour bound to one unit by id.
///
/// Call [`AbstractAction::update`] whenever the action moves to another
/// snapshot, before asking it anything about that snapshot.
#[derive(Debug, Clone)]
pub enum AbstractAction<S: Snapshot> {
    Move(MoveTo<S>),
    AttackOnce(AttackOnce<S>),
    HitAndRun(HitAndRun<S>),
}

impl<S: Snapshot> AbstractAction<S> {
    /// The unit this action drives.
    pub fn unit(&self) -> UnitId {
        match self {
            AbstractAction::Move(action) => action.unit,
            AbstractAction::AttackOnce(action) => action.unit,
            AbstractAction::HitAndRun(action) => action.attack.unit,
        }
    }

    pub fn target(&self) -> Option<UnitId> {
        match self {
            AbstractAction::Move(_) => None,
            AbstractAction::AttackOnce(action) => Some(action.target),
            AbstractAction::HitAndRun(action) => Some(action.attack.target),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AbstractAction::Move(_) => "move",
            AbstractAction::AttackOnce(_) => "attack_once",
            AbstractAction::HitAndRun(_) => "hit_and_run",
        }
    }

    /// Refresh snapshot-dependent bookkeeping against `snapshot`.
    pub fn update(&mut self, snapshot: &S) {
        match self {
            AbstractAction::Move(_) => {}
            AbstractAction::AttackOnce(action) => action.update(snapshot),
            AbstractAction::HitAndRun(action) => action.attack.update(snapshot),
        }
    }

    /// Whether the goal has been observed as reached. Sticky for attacks.
    pub fn completed(&mut self, snapshot: &S) -> bool {
        match self {
            AbstractAction::Move(action) => action.completed(snapshot),
            AbstractAction::AttackOnce(action) => action.completed(snapshot),
            AbstractAction::HitAndRun(action) => action.completed(snapshot),
        }
    }

    /// Next atomic command, or `None` when blocked right now.
    pub fn execute(&mut self, snapshot: &S) -> Option<UnitCommand> {
        match self {
            AbstractAction::Move(action) => action.execute(snapshot),
            AbstractAction::AttackOnce(action) => action.execute(snapshot),
            AbstractAction::HitAndRun(action) => action.execute(snapshot),
        }
    }

    /// Damage this action is guaranteed to deal, as `(target, amount)`.
    pub fn assigned_damage(&self) -> Option<(UnitId, i32)> {
        match self {
            AbstractAction::Move(_) => None,
            AbstractAction::AttackOnce(action) => Some((action.target, action.damage)),
            AbstractAction::HitAndRun(action) => Some((action.attack.target, action.attack.damage)),
        }
    }
}

impl<S: Snapshot> PartialEq for AbstractAction<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AbstractAction::Move(a), AbstractAction::Move(b)) => a == b,
            (AbstractAction::AttackOnce(a), AbstractAction::AttackOnce(b)) => a == b,
            (AbstractAction::HitAndRun(a), AbstractAction::HitAndRun(b)) => a == b,
            _ => false,
        }
    }
}

/// Turn carried abstract actions into atomic commands for idle units.
///
/// Actions whose unit is gone, whose goal is reached, or that are blocked are
/// dropped from `carried`. With `player` set, only that side's units are
/// considered.
pub fn resolve_carried<S: Snapshot>(
    carried: &mut CarriedActions<S>,
    snapshot: &S,
    player: Option<PlayerId>,
) -> JointAction {
    carried.retain(|id, _| snapshot.unit(*id).is_some());

    let mut joint = JointAction::new();
    for unit in snapshot.units() {
        if player.is_some_and(|p| p != unit.player) || snapshot.is_busy(unit.id) {
            continue;
        }
        let Some(action) = carried.get_mut(&unit.id) else {
            continue;
        };

        action.update(snapshot);
        if action.completed(snapshot) {
            carried.remove(&unit.id);
            continue;
        }
        match action.execute(snapshot) {
            Some(command) => {
                joint
                    .footprint_mut()
                    .merge(&snapshot.footprint(unit, &command));
                joint.insert(unit.id, command);
            }
            None => {
                carried.remove(&unit.id);
            }
        }
    }
    joint
}
