use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    game::{command::JointAction, snapshot::Snapshot},
    micro::{abstract_action::CarriedActions, ledger::DamageLedger},
    tree::{
        arena::Arena,
        error::TreeError,
        ids::{ActionId, NodeId},
        node::{NodeKind, SearchNode, TreeParams},
        selection::{ChildView, NodeView, Selection},
        summary::{ChildSummary, NodeSummary, TreeSummary},
    },
};

/// How a playout result is accumulated on the way up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpropagation {
    /// Add the reward unchanged at every ancestor.
    Plain,
    /// Divide the reward by the live hit points of the side it favours,
    /// measured in each ancestor's own snapshot.
    HpNormalized,
}

#[derive(Debug, Clone)]
/// Owns the arena (root is always at index 0) and the search operations.
pub struct Tree<S: Snapshot> {
    arena: Arena<SearchNode<S>>,
    params: TreeParams<S>,
    rng: ChaCha8Rng,
}

impl<S: Snapshot> Tree<S> {
    /// Create a tree whose root is built from `snapshot`.
    pub fn new(
        params: TreeParams<S>,
        snapshot: S,
        ledger: DamageLedger,
        carried: CarriedActions<S>,
        seed: u64,
    ) -> Result<Self, TreeError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let root = SearchNode::new(&params, snapshot, None, 0, ledger, carried, rng.r#gen())?;
        let mut arena = Arena::new();
        let _ = arena.allocate(root);
        Ok(Tree { arena, params, rng })
    }

    /// Return the root node id.
    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    /// Return how many nodes exist in the tree arena.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn params(&self) -> &TreeParams<S> {
        &self.params
    }

    /// Return an immutable node handle.
    pub fn node(&self, node_id: NodeId) -> Result<&SearchNode<S>, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Return a mutable node handle.
    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Result<&mut SearchNode<S>, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    /// Walk from the root to the node the next playout should start from.
    ///
    /// With `expand_first`, a node that still has untried joint actions grows
    /// a new child and returns it. Otherwise the selection policy picks a
    /// child; an unvisited pick is returned as is, a visited one is descended
    /// into with expansion enabled again.
    pub fn select_leaf(&mut self, expand_first: bool) -> Result<NodeId, TreeError> {
        let mut current = self.root_id();
        let mut expand_first = expand_first;

        loop {
            let (depth, has_more) = {
                let node = self.node(current)?;
                (node.depth(), node.has_more_actions())
            };
            if depth >= self.params.max_depth {
                return Ok(current);
            }

            if expand_first && has_more {
                if let Some(child) = self.expand(current)? {
                    return Ok(child);
                }
            }

            let selection = {
                let node = self.node(current)?;
                let view = NodeView {
                    kind: node.kind(),
                    visits: node.stats().visits(),
                    evaluation_bound: node.evaluation_bound(),
                    is_root: node.is_root(),
                    has_more_actions: node.has_more_actions(),
                    action_count: node.action_count(),
                };
                let children = node
                    .children()
                    .iter()
                    .map(|child| {
                        self.node(*child).map(|child| ChildView {
                            visits: child.stats().visits(),
                            reward_sum: child.stats().reward_sum(),
                            squared_reward_sum: child.stats().squared_reward_sum(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let policy = self.params.policy;
                policy.choose(&view, &children, &mut self.rng)
            };

            match selection {
                Selection::Stay => return Ok(current),
                Selection::Expand => return Ok(self.expand(current)?.unwrap_or(current)),
                Selection::Child(index) => {
                    let child = self
                        .node(current)?
                        .child(ActionId::from(index))
                        .ok_or(TreeError::MissingAction {
                            node_id: current,
                            action_id: ActionId::from(index),
                        })?;
                    if self.node(child)?.stats().is_unvisited() {
                        return Ok(child);
                    }
                    current = child;
                    expand_first = true;
                }
            }
        }
    }

    /// Pull the next untried joint action of `node_id` and grow a child for it.
    /// `None` when the generator is exhausted.
    pub fn expand(&mut self, node_id: NodeId) -> Result<Option<NodeId>, TreeError> {
        let Some((action, sources)) = self.node_mut(node_id)?.next_untried() else {
            return Ok(None);
        };
        self.make_new_child(node_id, action, sources).map(Some)
    }

    /// Build the child reached by `action` and attach it to `parent_id`.
    ///
    /// The child inherits the parent's ledger plus the damage promised by
    /// `sources`, and the parent's carried actions with `sources` taking over
    /// the units they drive.
    fn make_new_child(
        &mut self,
        parent_id: NodeId,
        action: JointAction,
        sources: CarriedActions<S>,
    ) -> Result<NodeId, TreeError> {
        let (snapshot, ledger, carried, depth, action_id) = {
            let parent = self.node(parent_id)?;
            let snapshot = parent.snapshot().clone_and_apply(&action);

            let mut ledger = parent.ledger().clone();
            for source in sources.values() {
                if let Some((target, amount)) = source.assigned_damage() {
                    ledger.add(target, amount);
                }
            }

            let mut carried = parent.carried().clone();
            carried.extend(sources.iter().map(|(unit, a)| (*unit, a.clone())));

            (
                snapshot,
                ledger,
                carried,
                parent.depth() + 1,
                parent.next_action_id(),
            )
        };

        let seed = self.rng.r#gen();
        let child = SearchNode::new(
            &self.params,
            snapshot,
            Some((parent_id, action_id)),
            depth,
            ledger,
            carried,
            seed,
        )?;
        let child_id = self.arena.allocate(child);
        self.node_mut(parent_id)?
            .push_child(action, sources, child_id);
        Ok(child_id)
    }

    /// Add `reward` worth `visits` visits to `leaf` and every ancestor.
    pub fn backpropagate(
        &mut self,
        leaf: NodeId,
        reward: f64,
        visits: u64,
        mode: Backpropagation,
    ) -> Result<(), TreeError> {
        let (max, min) = (self.params.max_player, self.params.min_player);
        let favoured = if reward > 0.0 { max } else { min };
        let mut current = Some(leaf);

        while let Some(node_id) = current {
            let parent = self.node(node_id)?.parent();
            let parent_kind = match parent {
                Some((parent_id, _)) => Some(self.node(parent_id)?.kind()),
                None => None,
            };

            let node = self.node_mut(node_id)?;
            let contribution = match mode {
                Backpropagation::Plain => reward,
                Backpropagation::HpNormalized => {
                    let hp = node.snapshot().hp_sum(favoured);
                    if hp > 0 { reward / hp as f64 } else { reward }
                }
            };
            let squared = match parent_kind {
                Some(kind) => {
                    let bound = node.evaluation_bound();
                    let shifted = match kind {
                        NodeKind::Min => bound - contribution,
                        NodeKind::Max | NodeKind::Terminal => bound + contribution,
                    };
                    shifted * shifted / 4.0
                }
                None => 0.0,
            };
            node.stats_mut().record(contribution, visits, squared);
            current = parent.map(|(parent_id, _)| parent_id);
        }
        Ok(())
    }

    /// Root action whose child has the highest mean reward.
    /// Unvisited children are skipped; ties keep the lower index.
    pub fn best_action_so_far(&self) -> Result<Option<ActionId>, TreeError> {
        let root = self.node(self.root_id())?;
        let mut best: Option<(ActionId, f64)> = None;

        for (index, child_id) in root.children().iter().enumerate() {
            let child = self.node(*child_id)?;
            if child.stats().is_unvisited() {
                continue;
            }
            let candidate = (ActionId::from(index), child.stats().mean());
            best = match best {
                Some((best_action, best_mean)) if best_mean >= candidate.1 => {
                    Some((best_action, best_mean))
                }
                _ => Some(candidate),
            };
        }

        Ok(best.map(|(action, _)| action))
    }

    /// Joint action in root slot `action_id`.
    pub fn root_action(&self, action_id: ActionId) -> Result<&JointAction, TreeError> {
        let root_id = self.root_id();
        self.node(root_id)?
            .action(action_id)
            .ok_or(TreeError::MissingAction {
                node_id: root_id,
                action_id,
            })
    }

    /// Abstract actions behind root slot `action_id`.
    pub fn root_action_sources(
        &self,
        action_id: ActionId,
    ) -> Result<&CarriedActions<S>, TreeError> {
        let root_id = self.root_id();
        self.node(root_id)?
            .action_sources(action_id)
            .ok_or(TreeError::MissingAction {
                node_id: root_id,
                action_id,
            })
    }

    /// Serializable view of every node and its children.
    pub fn summary(&self) -> TreeSummary {
        let nodes = self
            .arena
            .iter()
            .enumerate()
            .map(|(index, node)| NodeSummary {
                node_id: index,
                kind: node.kind(),
                depth: node.depth(),
                clock: node.snapshot().clock(),
                parent_node_id: node.parent().map(|(parent, _)| parent.index()),
                parent_action_id: node.parent().map(|(_, action)| action.index()),
                visits: node.stats().visits(),
                reward_sum: node.stats().reward_sum(),
                mean: node.stats().mean(),
                has_more_actions: node.has_more_actions(),
                action_count: node.action_count(),
                children: node
                    .children()
                    .iter()
                    .zip(node.actions())
                    .enumerate()
                    .map(|(action_id, (child, action))| ChildSummary {
                        action_id,
                        child_node_id: child.index(),
                        action: action.to_string(),
                    })
                    .collect(),
            })
            .collect();

        TreeSummary {
            schema_version: 1,
            root_node_id: self.root_id().index(),
            node_count: self.node_count(),
            nodes,
        }
    }

    /// [`Tree::summary`] rendered as pretty JSON.
    pub fn summary_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.summary())
    }
}
