use std::fmt;

use crate::game::{
    command::{Direction, UnitCommand},
    snapshot::Snapshot,
    unit::Unit,
};

/// Strategy producing the next step of a unit toward a destination.
/// `None` means no step is possible right now, which is not the same as arrival.
pub trait PathFinder<S: Snapshot>: fmt::Debug {
    /// Short name used when comparing abstract actions.
    fn name(&self) -> &'static str;

    /// Next step toward the cell `(x, y)`.
    fn move_toward(&self, unit: &Unit, x: i32, y: i32, snapshot: &S) -> Option<UnitCommand>;

    /// Next step toward any cell within `range` (euclidean) of `(x, y)`.
    fn move_within_range(
        &self,
        unit: &Unit,
        x: i32,
        y: i32,
        range: i32,
        snapshot: &S,
    ) -> Option<UnitCommand>;
}

/// Steps to whichever free neighbour lies closest to the goal.
/// Cheap and good enough on open maps, blind to dead ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPathFinder;

impl GreedyPathFinder {
    fn best_step<S: Snapshot>(
        unit: &Unit,
        snapshot: &S,
        score: impl Fn(i32, i32) -> i32,
    ) -> Option<UnitCommand> {
        let current = score(unit.x, unit.y);
        let mut best: Option<(Direction, i32)> = None;

        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            let (nx, ny) = (unit.x + dx, unit.y + dy);
            if !snapshot.is_free(nx, ny) {
                continue;
            }
            let candidate = score(nx, ny);
            if candidate >= current {
                continue;
            }
            best = match best {
                Some((_, best_score)) if best_score <= candidate => best,
                _ => Some((direction, candidate)),
            };
        }

        best.map(|(direction, _)| UnitCommand::Move { direction })
    }
}

impl<S: Snapshot> PathFinder<S> for GreedyPathFinder {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn move_toward(&self, unit: &Unit, x: i32, y: i32, snapshot: &S) -> Option<UnitCommand> {
        if unit.position() == (x, y) {
            return None;
        }
        Self::best_step(unit, snapshot, |cx, cy| (cx - x).abs() + (cy - y).abs())
    }

    fn move_within_range(
        &self,
        unit: &Unit,
        x: i32,
        y: i32,
        range: i32,
        snapshot: &S,
    ) -> Option<UnitCommand> {
        let range_sq = range * range;
        Self::best_step(unit, snapshot, |cx, cy| {
            let d = (cx - x) * (cx - x) + (cy - y) * (cy - y);
            (d - range_sq).max(0)
        })
    }
}
