use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    game::{snapshot::Snapshot, unit::Unit},
    micro::{
        abstract_action::{AbstractAction, AttackOnce, HitAndRun, SharedPathFinder},
        ledger::DamageLedger,
    },
};

/// Scripted unit behaviours available to the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptKind {
    /// No-overkill attack-value: hit the most threatening enemy in range that
    /// is not already doomed, or walk to the closest one.
    Nokav,
    /// Same target choice as `Nokav`, then back off after the hit lands.
    Kiter { retreat_distance: i32 },
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Nokav => write!(f, "nokav"),
            ScriptKind::Kiter { retreat_distance } => write!(f, "kiter({retreat_distance})"),
        }
    }
}

/// A stateless factory for abstract actions.
#[derive(Debug, Clone)]
pub struct Script<S: Snapshot> {
    kind: ScriptKind,
    path_finder: SharedPathFinder<S>,
}

impl<S: Snapshot> Script<S> {
    pub fn new(kind: ScriptKind, path_finder: SharedPathFinder<S>) -> Self {
        Script { kind, path_finder }
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    /// Build the abstract action this script would give `unit`.
    /// `None` when no enemy is a valid target under `ledger`.
    pub fn instantiate(
        &self,
        unit: &Unit,
        snapshot: &S,
        ledger: &DamageLedger,
    ) -> Option<AbstractAction<S>> {
        let target = best_enemy_unit(unit, snapshot, ledger)?;
        let attack = AttackOnce::new(unit, target, Arc::clone(&self.path_finder));
        Some(match self.kind {
            ScriptKind::Nokav => AbstractAction::AttackOnce(attack),
            ScriptKind::Kiter { retreat_distance } => {
                AbstractAction::HitAndRun(HitAndRun::new(attack, retreat_distance))
            }
        })
    }
}

/// Pick the enemy `unit` should go after.
///
/// Among enemies in attack range that are not doomed by `ledger`, the one with
/// the highest damage rate per hit point wins; without any, the closest
/// non-doomed enemy. Ties keep the earlier unit.
pub fn best_enemy_unit<'a, S: Snapshot>(
    unit: &Unit,
    snapshot: &'a S,
    ledger: &DamageLedger,
) -> Option<&'a Unit> {
    let candidates = || {
        snapshot
            .units()
            .iter()
            .filter(move |other| other.player != unit.player && !ledger.is_doomed(other))
    };

    let mut best: Option<(&Unit, f64)> = None;
    for enemy in candidates().filter(|enemy| unit.in_attack_range(enemy)) {
        let ratio = enemy.threat_ratio();
        best = match best {
            Some((_, best_ratio)) if best_ratio >= ratio => best,
            _ => Some((enemy, ratio)),
        };
    }
    if let Some((enemy, _)) = best {
        return Some(enemy);
    }

    let mut closest: Option<(&Unit, i32)> = None;
    for enemy in candidates() {
        let distance = unit.manhattan_distance(enemy.x, enemy.y);
        closest = match closest {
            Some((_, best_distance)) if best_distance <= distance => closest,
            _ => Some((enemy, distance)),
        };
    }
    closest.map(|(enemy, _)| enemy)
}

/// The fixed set of scripts the search chooses from for every unit.
#[derive(Debug, Clone)]
pub struct Portfolio<S: Snapshot> {
    scripts: Arc<[Script<S>]>,
}

impl<S: Snapshot> Portfolio<S> {
    pub fn new(scripts: Vec<Script<S>>) -> Self {
        Portfolio {
            scripts: scripts.into(),
        }
    }

    /// One script per kind, all sharing `path_finder`.
    pub fn from_kinds(kinds: &[ScriptKind], path_finder: SharedPathFinder<S>) -> Self {
        Portfolio::new(
            kinds
                .iter()
                .map(|kind| Script::new(*kind, Arc::clone(&path_finder)))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Script<S>> {
        self.scripts.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script<S>> {
        self.scripts.iter()
    }
}
