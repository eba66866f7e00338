use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tree::node::NodeKind;

/// Bandit rule used to pick which child to descend into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Rescaled mean plus `c·√(ln N / n)`.
    Ucb1 { c: f64 },
    /// Variance-aware UCB1.
    Ucb1Tuned,
    /// Raw mean ± `c·√(ln N / n)`; MIN nodes minimize.
    UcbWithoutScaling { c: f64 },
    /// `c·√(√N / n)` exploration at the root, UCB1 below.
    UcbSqrt { c: f64 },
    /// Root only: the empirical best with probability `epsilon`, otherwise
    /// any other existing or untried action uniformly. UCB1 below the root.
    EpsilonGreedy { epsilon: f64 },
    /// Root only: sample where one more playout is worth the most. UCB1 below.
    VoiAware,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Ucb1 { c: 1.0 }
    }
}

/// What the tree should do at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Descend into the child at this position.
    Child(usize),
    /// Create a new child from the generator.
    Expand,
    /// Stop here.
    Stay,
}

/// The parent's side of a selection decision.
#[derive(Debug, Clone, Copy)]
pub struct NodeView {
    pub kind: NodeKind,
    pub visits: u64,
    pub evaluation_bound: f64,
    pub is_root: bool,
    pub has_more_actions: bool,
    pub action_count: u64,
}

/// One candidate child.
#[derive(Debug, Clone, Copy)]
pub struct ChildView {
    pub visits: u64,
    pub reward_sum: f64,
    pub squared_reward_sum: f64,
}

impl ChildView {
    fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward_sum / self.visits as f64
        }
    }
}

/// Map a mean reward into `[0, 1]` from the deciding side's perspective.
/// MAX prefers high rewards, MIN low ones. A non-positive bound counts as 1.
pub fn scaled_exploitation(kind: NodeKind, bound: f64, mean: f64) -> f64 {
    let bound = if bound > 0.0 { bound } else { 1.0 };
    match kind {
        NodeKind::Min => (bound - mean) / (2.0 * bound),
        NodeKind::Max | NodeKind::Terminal => (bound + mean) / (2.0 * bound),
    }
}

impl SelectionPolicy {
    pub fn choose<R: Rng>(&self, node: &NodeView, children: &[ChildView], rng: &mut R) -> Selection {
        match *self {
            SelectionPolicy::Ucb1 { c } => ucb1(node, children, c),
            SelectionPolicy::Ucb1Tuned => ucb1_tuned(node, children),
            SelectionPolicy::UcbWithoutScaling { c } => ucb_without_scaling(node, children, c),
            SelectionPolicy::UcbSqrt { c } => {
                if node.is_root {
                    ucb_sqrt(node, children, c)
                } else {
                    ucb1(node, children, 1.0)
                }
            }
            SelectionPolicy::EpsilonGreedy { epsilon } => {
                if node.is_root {
                    epsilon_greedy(node, children, epsilon, rng)
                } else {
                    ucb1(node, children, 1.0)
                }
            }
            SelectionPolicy::VoiAware => voi_aware(node, children),
        }
    }
}

/// Child with the highest score, earlier children winning ties.
/// Unvisited children score infinity so they are tried first.
fn argmax(children: &[ChildView], score: impl Fn(&ChildView) -> f64) -> Selection {
    let mut best: Option<(usize, f64)> = None;
    for (index, child) in children.iter().enumerate() {
        let value = if child.visits == 0 {
            f64::INFINITY
        } else {
            score(child)
        };
        best = match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((index, value)),
        };
    }
    best.map(|(index, _)| Selection::Child(index))
        .unwrap_or(Selection::Stay)
}

fn ln_visits(node: &NodeView) -> f64 {
    (node.visits.max(1) as f64).ln()
}

fn ucb1(node: &NodeView, children: &[ChildView], c: f64) -> Selection {
    let ln_n = ln_visits(node);
    argmax(children, |child| {
        let exploitation = scaled_exploitation(node.kind, node.evaluation_bound, child.mean());
        let exploration = (ln_n / child.visits as f64).sqrt();
        exploitation + c * exploration
    })
}

fn ucb1_tuned(node: &NodeView, children: &[ChildView]) -> Selection {
    let ln_n = ln_visits(node);
    argmax(children, |child| {
        let n = child.visits as f64;
        let exploitation = scaled_exploitation(node.kind, node.evaluation_bound, child.mean());
        let variance = child.squared_reward_sum / n - exploitation * exploitation
            + (2.0 * ln_n / n).sqrt();
        let exploration = ((ln_n / n) * variance.min(0.25)).max(0.0).sqrt();
        exploitation + exploration
    })
}

fn ucb_without_scaling(node: &NodeView, children: &[ChildView], c: f64) -> Selection {
    let ln_n = ln_visits(node);
    argmax(children, |child| {
        let exploration = c * (ln_n / child.visits as f64).sqrt();
        match node.kind {
            NodeKind::Min => exploration - child.mean(),
            NodeKind::Max | NodeKind::Terminal => child.mean() + exploration,
        }
    })
}

fn ucb_sqrt(node: &NodeView, children: &[ChildView], c: f64) -> Selection {
    let sqrt_n = (node.visits as f64).sqrt();
    argmax(children, |child| {
        let exploitation = scaled_exploitation(node.kind, node.evaluation_bound, child.mean());
        exploitation + c * (sqrt_n / child.visits as f64).sqrt()
    })
}

/// Visited child with the best mean for the deciding side.
fn empirical_best(node: &NodeView, children: &[ChildView]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, child) in children.iter().enumerate() {
        if child.visits == 0 {
            continue;
        }
        let value = scaled_exploitation(node.kind, node.evaluation_bound, child.mean());
        best = match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((index, value)),
        };
    }
    best.map(|(index, _)| index)
}

fn epsilon_greedy<R: Rng>(
    node: &NodeView,
    children: &[ChildView],
    epsilon: f64,
    rng: &mut R,
) -> Selection {
    if children.is_empty() && !node.has_more_actions {
        return Selection::Stay;
    }

    let best = empirical_best(node, children);
    if let Some(best) = best {
        if rng.gen_range(0.0..1.0) < epsilon {
            return Selection::Child(best);
        }
    }

    let untried = if node.has_more_actions {
        node.action_count.saturating_sub(children.len() as u64)
    } else {
        0
    };
    let others = children.len() as u64 - u64::from(best.is_some()) + untried;
    if others == 0 {
        return match best {
            Some(best) => Selection::Child(best),
            None if node.has_more_actions => Selection::Expand,
            None => Selection::Stay,
        };
    }

    let mut index = rng.gen_range(0..others);
    if let Some(best) = best {
        if index >= best as u64 {
            index += 1;
        }
    }
    if index < children.len() as u64 {
        Selection::Child(index as usize)
    } else {
        Selection::Expand
    }
}

fn voi_aware(node: &NodeView, children: &[ChildView]) -> Selection {
    if !node.has_more_actions && children.len() == 1 {
        return Selection::Child(0);
    }
    if !node.is_root {
        return ucb1(node, children, 1.0);
    }
    if children.is_empty() {
        return if node.has_more_actions {
            Selection::Expand
        } else {
            Selection::Stay
        };
    }
    if let Some(index) = children.iter().position(|child| child.visits == 0) {
        return Selection::Child(index);
    }

    let value =
        |child: &ChildView| scaled_exploitation(node.kind, node.evaluation_bound, child.mean());

    let Some(best) = empirical_best(node, children) else {
        return Selection::Stay;
    };
    let best_value = value(&children[best]);
    let best_visits = children[best].visits as f64;

    let mut second: Option<(usize, f64)> = None;
    for (index, child) in children.iter().enumerate() {
        if index == best {
            continue;
        }
        let candidate = value(child);
        second = match second {
            Some((_, second_value)) if second_value >= candidate => second,
            _ => Some((index, candidate)),
        };
    }

    let mut chosen: Option<(usize, f64)> = None;
    for (index, child) in children.iter().enumerate() {
        let score = if index == best {
            match second {
                Some((_, second_value)) => {
                    second_value / (best_visits + 1.0)
                        * (-2.0 * (best_value - second_value).powi(2) * best_visits).exp()
                }
                None => 0.0,
            }
        } else {
            let n = child.visits as f64;
            (1.0 - best_value) / (n + 1.0)
                * (-2.0 * (best_value - value(child)).powi(2) * n).exp()
        };
        chosen = match chosen {
            Some((_, chosen_score)) if chosen_score >= score => chosen,
            _ => Some((index, score)),
        };
    }
    chosen
        .map(|(index, _)| Selection::Child(index))
        .unwrap_or(Selection::Stay)
}
