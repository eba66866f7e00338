use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::tree::{
    node::NodeKind,
    selection::{ChildView, NodeView, Selection, SelectionPolicy, scaled_exploitation},
};

fn root(kind: NodeKind, visits: u64) -> NodeView {
    NodeView {
        kind,
        visits,
        evaluation_bound: 1.0,
        is_root: true,
        has_more_actions: false,
        action_count: 0,
    }
}

fn child(visits: u64, mean: f64) -> ChildView {
    ChildView {
        visits,
        reward_sum: mean * visits as f64,
        squared_reward_sum: 0.0,
    }
}

#[test]
fn exploitation_is_rescaled_per_side() {
    assert_eq!(scaled_exploitation(NodeKind::Max, 1.0, 0.0), 0.5);
    assert_eq!(scaled_exploitation(NodeKind::Max, 1.0, 1.0), 1.0);
    assert_eq!(scaled_exploitation(NodeKind::Min, 1.0, 1.0), 0.0);
    assert_eq!(scaled_exploitation(NodeKind::Min, 2.0, -2.0), 1.0);
    assert_eq!(
        scaled_exploitation(NodeKind::Max, 0.0, 0.0),
        scaled_exploitation(NodeKind::Max, 1.0, 0.0),
        "a non-positive bound falls back to 1"
    );
}

#[test]
fn unvisited_children_are_tried_first() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let children = [child(10, 0.9), child(0, 0.0), child(3, 0.1)];

    for policy in [
        SelectionPolicy::Ucb1 { c: 1.0 },
        SelectionPolicy::Ucb1Tuned,
        SelectionPolicy::UcbWithoutScaling { c: 1.0 },
        SelectionPolicy::UcbSqrt { c: 1.0 },
    ] {
        assert_eq!(
            policy.choose(&root(NodeKind::Max, 13), &children, &mut rng),
            Selection::Child(1),
            "{policy:?}"
        );
    }
}

#[test]
fn ucb1_prefers_the_deciding_sides_best_child() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let children = [child(50, 0.8), child(50, -0.8)];
    let policy = SelectionPolicy::Ucb1 { c: 0.1 };

    assert_eq!(
        policy.choose(&root(NodeKind::Max, 100), &children, &mut rng),
        Selection::Child(0)
    );
    assert_eq!(
        policy.choose(&root(NodeKind::Min, 100), &children, &mut rng),
        Selection::Child(1)
    );
}

#[test]
fn ties_keep_the_earlier_child() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let children = [child(4, 0.5), child(4, 0.5)];
    let policy = SelectionPolicy::Ucb1 { c: 1.0 };

    assert_eq!(
        policy.choose(&root(NodeKind::Max, 8), &children, &mut rng),
        Selection::Child(0)
    );
}

#[test]
fn no_children_means_stay() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let policy = SelectionPolicy::Ucb1 { c: 1.0 };
    assert_eq!(
        policy.choose(&root(NodeKind::Max, 0), &[], &mut rng),
        Selection::Stay
    );
}

#[test]
fn ucb_without_scaling_minimizes_at_min_nodes() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let children = [child(20, 3.0), child(20, -3.0)];
    let policy = SelectionPolicy::UcbWithoutScaling { c: 1.0 };

    assert_eq!(
        policy.choose(&root(NodeKind::Max, 40), &children, &mut rng),
        Selection::Child(0)
    );
    assert_eq!(
        policy.choose(&root(NodeKind::Min, 40), &children, &mut rng),
        Selection::Child(1)
    );
}

#[test]
fn ucb1_tuned_explores_a_high_variance_child() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let steady = ChildView {
        visits: 100,
        reward_sum: 0.0,
        squared_reward_sum: 100.0 * 0.25,
    };
    let noisy = ChildView {
        visits: 2,
        reward_sum: 0.0,
        squared_reward_sum: 2.0,
    };

    assert_eq!(
        SelectionPolicy::Ucb1Tuned.choose(&root(NodeKind::Max, 102), &[steady, noisy], &mut rng),
        Selection::Child(1)
    );
}

#[test]
fn epsilon_one_always_returns_the_empirical_best() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let children = [child(5, -0.2), child(5, 0.6), child(5, 0.1)];
    let policy = SelectionPolicy::EpsilonGreedy { epsilon: 1.0 };

    for _ in 0..32 {
        assert_eq!(
            policy.choose(&root(NodeKind::Max, 15), &children, &mut rng),
            Selection::Child(1)
        );
    }
}

#[test]
fn epsilon_zero_never_returns_the_empirical_best() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let children = [child(5, -0.2), child(5, 0.6), child(5, 0.1)];
    let policy = SelectionPolicy::EpsilonGreedy { epsilon: 0.0 };

    let mut picked = [false; 3];
    for _ in 0..64 {
        match policy.choose(&root(NodeKind::Max, 15), &children, &mut rng) {
            Selection::Child(index) => picked[index] = true,
            other => panic!("unexpected selection {other:?}"),
        }
    }
    assert_eq!(picked, [true, false, true]);
}

#[test]
fn epsilon_greedy_can_pick_an_untried_action() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let node = NodeView {
        has_more_actions: true,
        action_count: 4,
        ..root(NodeKind::Max, 1)
    };
    let policy = SelectionPolicy::EpsilonGreedy { epsilon: 0.0 };

    assert_eq!(policy.choose(&node, &[], &mut rng), Selection::Expand);

    let children = [child(1, 0.0)];
    let mut expanded = false;
    for _ in 0..64 {
        match policy.choose(&node, &children, &mut rng) {
            Selection::Expand => expanded = true,
            other => panic!("only untried actions remain besides the best, got {other:?}"),
        }
    }
    assert!(expanded);
}

#[test]
fn epsilon_greedy_below_the_root_is_ucb1() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let node = NodeView {
        is_root: false,
        ..root(NodeKind::Max, 10)
    };
    let children = [child(5, 0.1), child(0, 0.0)];

    assert_eq!(
        SelectionPolicy::EpsilonGreedy { epsilon: 1.0 }.choose(&node, &children, &mut rng),
        Selection::Child(1)
    );
}

#[test]
fn voi_aware_samples_the_cheaply_informative_child() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let children = [child(100, 0.9), child(5, 0.8)];

    assert_eq!(
        SelectionPolicy::VoiAware.choose(&root(NodeKind::Max, 105), &children, &mut rng),
        Selection::Child(1)
    );
}

#[test]
fn voi_aware_handles_trivial_roots() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let policy = SelectionPolicy::VoiAware;

    assert_eq!(
        policy.choose(&root(NodeKind::Max, 3), &[child(3, 0.2)], &mut rng),
        Selection::Child(0)
    );
    let growing = NodeView {
        has_more_actions: true,
        action_count: 2,
        ..root(NodeKind::Max, 0)
    };
    assert_eq!(policy.choose(&growing, &[], &mut rng), Selection::Expand);
    assert_eq!(
        policy.choose(&root(NodeKind::Max, 3), &[child(3, 0.2), child(0, 0.0)], &mut rng),
        Selection::Child(1)
    );
}
