use std::collections::BTreeMap;

use crate::{
    game::{ids::UnitId, snapshot::Snapshot, unit::Unit},
    micro::abstract_action::CarriedActions,
};

/// Damage already promised to enemy units.
///
/// No-overkill scripts skip any target whose promised damage has reached its
/// remaining hit points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageLedger {
    assigned: BTreeMap<UnitId, i32>,
}

impl DamageLedger {
    pub fn new() -> Self {
        DamageLedger::default()
    }

    /// Damage promised by every action in `carried`.
    pub fn from_carried<S: Snapshot>(carried: &CarriedActions<S>) -> Self {
        let mut ledger = DamageLedger::new();
        for action in carried.values() {
            if let Some((target, amount)) = action.assigned_damage() {
                ledger.add(target, amount);
            }
        }
        ledger
    }

    /// Damage assigned to `unit` so far, zero if none.
    pub fn assigned(&self, unit: UnitId) -> i32 {
        self.assigned.get(&unit).copied().unwrap_or(0)
    }

    pub fn add(&mut self, unit: UnitId, amount: i32) {
        *self.assigned.entry(unit).or_insert(0) += amount;
    }

    /// Add every entry of `other` on top of this ledger.
    pub fn absorb(&mut self, other: &DamageLedger) {
        for (unit, amount) in &other.assigned {
            self.add(*unit, *amount);
        }
    }

    /// Whether the assigned damage already covers the unit's remaining hit points.
    pub fn is_doomed(&self, unit: &Unit) -> bool {
        self.assigned(unit.id) >= unit.hp
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, i32)> + '_ {
        self.assigned.iter().map(|(unit, amount)| (*unit, *amount))
    }
}
