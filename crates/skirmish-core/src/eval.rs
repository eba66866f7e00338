use serde::{Deserialize, Serialize};

use crate::game::{ids::PlayerId, snapshot::Snapshot};

/// Scores a snapshot from `max_player`'s point of view.
pub trait EvaluationFunction<S: Snapshot> {
    fn evaluate(&self, max_player: PlayerId, min_player: PlayerId, snapshot: &S) -> f64;

    /// Largest magnitude `evaluate` is expected to return, used to rescale
    /// exploitation terms.
    fn upper_bound(&self, snapshot: &S) -> f64;
}

/// Built-in evaluation functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluation {
    /// `1` if only max's units remain, `-1` if only min's remain, else `0`.
    #[default]
    WinLoss,
    /// Max's total hit points minus everyone else's.
    HpDifference,
    /// Hit point difference squashed into `(-1, 1)` with steepness `k`.
    Sigmoid { k: f64 },
}

pub(crate) fn hp_difference<S: Snapshot>(max_player: PlayerId, snapshot: &S) -> f64 {
    snapshot
        .units()
        .iter()
        .map(|u| {
            if u.player == max_player {
                u.hp as f64
            } else {
                -(u.hp as f64)
            }
        })
        .sum()
}

impl<S: Snapshot> EvaluationFunction<S> for Evaluation {
    fn evaluate(&self, max_player: PlayerId, _min_player: PlayerId, snapshot: &S) -> f64 {
        match self {
            Evaluation::WinLoss => {
                let max_present = snapshot.units().iter().any(|u| u.player == max_player);
                let min_present = snapshot.units().iter().any(|u| u.player != max_player);
                match (max_present, min_present) {
                    (true, true) => 0.0,
                    (true, false) => 1.0,
                    (false, _) => -1.0,
                }
            }
            Evaluation::HpDifference => hp_difference(max_player, snapshot),
            Evaluation::Sigmoid { k } => {
                let x = hp_difference(max_player, snapshot);
                2.0 / (1.0 + (-k * x).exp()) - 1.0
            }
        }
    }

    fn upper_bound(&self, _snapshot: &S) -> f64 {
        1.0
    }
}
