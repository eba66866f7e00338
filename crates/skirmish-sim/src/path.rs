use std::collections::{HashMap, VecDeque};

use skirmish_core::{Direction, PathFinder, Snapshot, Unit, UnitCommand};

/// Shortest-path steps over free cells, found with a breadth-first search.
///
/// Unlike the greedy strategy it walks around walls of units, at the cost of
/// visiting up to every cell of the map per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsPathFinder;

impl BfsPathFinder {
    /// First step of a shortest path from `unit` to any cell satisfying
    /// `is_goal`. Goal cells need not be free; intermediate cells must be.
    fn first_step<S: Snapshot>(
        unit: &Unit,
        snapshot: &S,
        is_goal: impl Fn(i32, i32) -> bool,
    ) -> Option<UnitCommand> {
        let start = unit.position();
        if is_goal(start.0, start.1) {
            return None;
        }

        // Each reached cell remembers the first step taken from `start`.
        let mut first: HashMap<(i32, i32), Direction> = HashMap::new();
        let mut queue = VecDeque::new();

        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            let next = (start.0 + dx, start.1 + dy);
            if !snapshot.is_free(next.0, next.1) {
                continue;
            }
            if is_goal(next.0, next.1) {
                return Some(UnitCommand::Move { direction });
            }
            first.insert(next, direction);
            queue.push_back(next);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(direction) = first.get(&cell).copied() else {
                continue;
            };
            for step in Direction::ALL {
                let (dx, dy) = step.offset();
                let next = (cell.0 + dx, cell.1 + dy);
                if next == start || first.contains_key(&next) {
                    continue;
                }
                if is_goal(next.0, next.1) && snapshot.in_bounds(next.0, next.1) {
                    return Some(UnitCommand::Move { direction });
                }
                if !snapshot.is_free(next.0, next.1) {
                    continue;
                }
                first.insert(next, direction);
                queue.push_back(next);
            }
        }
        None
    }
}

impl<S: Snapshot> PathFinder<S> for BfsPathFinder {
    fn name(&self) -> &'static str {
        "bfs"
    }

    fn move_toward(&self, unit: &Unit, x: i32, y: i32, snapshot: &S) -> Option<UnitCommand> {
        Self::first_step(unit, snapshot, |cx, cy| (cx, cy) == (x, y))
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
        let start = unit.position();
        Self::first_step(unit, snapshot, |cx, cy| {
            (cx - x) * (cx - x) + (cy - y) * (cy - y) <= range_sq
                && ((cx, cy) == start || snapshot.is_free(cx, cy))
        })
    }
}
