use serde::{Deserialize, Serialize};

use crate::game::ids::{PlayerId, UnitId};

/// A combat unit as seen in one snapshot.
/// Values are snapshot-local; only `id` is stable across clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub player: PlayerId,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub min_damage: i32,
    pub max_damage: i32,
    pub attack_range: i32,
    /// Ticks between issuing an attack and its damage landing.
    pub attack_time: u64,
    /// Ticks needed to step into a neighbouring cell.
    pub move_time: u64,
}

impl Unit {
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn manhattan_distance(&self, x: i32, y: i32) -> i32 {
        (self.x - x).abs() + (self.y - y).abs()
    }

    /// Squared euclidean distance, avoids floating point in range checks.
    pub fn squared_distance(&self, x: i32, y: i32) -> i32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }

    /// Whether `other` can be hit from the current position.
    pub fn in_attack_range(&self, other: &Unit) -> bool {
        self.squared_distance(other.x, other.y) <= self.attack_range * self.attack_range
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Damage throughput per hit point, used to rank targets.
    pub fn threat_ratio(&self) -> f64 {
        let attack_time = self.attack_time.max(1) as f64;
        let hp = self.hp.max(1) as f64;
        (self.max_damage as f64 / attack_time) / hp
    }
}
