use serde::Serialize;

use crate::{
    game::{command::JointAction, ids::PlayerId, snapshot::Snapshot},
    micro::{
        abstract_action::{CarriedActions, resolve_carried},
        generator::{GeneratorError, JointActionGenerator},
        ledger::DamageLedger,
        script::Portfolio,
    },
    tree::{
        ids::{ActionId, NodeId},
        selection::SelectionPolicy,
        stats::NodeStats,
    },
};

/// Who decides at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Max,
    Min,
    Terminal,
}

/// Settings shared by every node of one search tree.
#[derive(Debug, Clone)]
pub struct TreeParams<S: Snapshot> {
    pub max_player: PlayerId,
    pub min_player: PlayerId,
    pub evaluation_bound: f64,
    pub portfolio: Portfolio<S>,
    pub policy: SelectionPolicy,
    pub max_depth: u64,
    /// Carried-action passes allowed while fast-forwarding before the node
    /// gives up and ends the game.
    pub deadlock_bound: u32,
}

#[derive(Debug, Clone)]
/// A decision point of the search, owning a private snapshot.
///
/// `actions`, `sources` and `children` are index aligned: entry `i` is the
/// joint action that produced child `i` and the abstract actions behind it.
pub struct SearchNode<S: Snapshot> {
    kind: NodeKind,
    depth: u64,
    parent: Option<(NodeId, ActionId)>,
    snapshot: S,
    children: Vec<NodeId>,
    actions: Vec<JointAction>,
    sources: Vec<CarriedActions<S>>,
    stats: NodeStats,
    evaluation_bound: f64,
    has_more_actions: bool,
    generator: Option<JointActionGenerator<S>>,
    carried: CarriedActions<S>,
    ledger: DamageLedger,
}

impl<S: Snapshot> SearchNode<S> {
    /// Create a node, fast-forwarding `snapshot` to the next decision.
    ///
    /// Takes ownership of the snapshot, ledger and carried actions. Carried
    /// actions are resolved into commands and time advances until one of the
    /// players has an idle unit without a carried action, or the game ends.
    pub fn new(
        params: &TreeParams<S>,
        mut snapshot: S,
        parent: Option<(NodeId, ActionId)>,
        depth: u64,
        ledger: DamageLedger,
        mut carried: CarriedActions<S>,
        seed: u64,
    ) -> Result<Self, GeneratorError> {
        let (max, min) = (params.max_player, params.min_player);
        fast_forward(&mut snapshot, &mut carried, max, min, params.deadlock_bound);

        let acting = if snapshot.winner().is_some() || snapshot.is_over() {
            None
        } else if snapshot.can_act(max) {
            Some((NodeKind::Max, max))
        } else if snapshot.can_act(min) {
            Some((NodeKind::Min, min))
        } else {
            log::warn!(
                "node at depth {depth} has no acting player at tick {}, treating it as terminal",
                snapshot.clock()
            );
            None
        };

        let (kind, generator) = match acting {
            Some((kind, player)) => {
                let generator = JointActionGenerator::new(
                    &snapshot,
                    params.portfolio.clone(),
                    player,
                    &ledger,
                    seed,
                )?;
                (kind, Some(generator))
            }
            None => (NodeKind::Terminal, None),
        };

        Ok(SearchNode {
            kind,
            depth,
            parent,
            snapshot,
            children: Vec::new(),
            actions: Vec::new(),
            sources: Vec::new(),
            stats: NodeStats::new(),
            evaluation_bound: params.evaluation_bound,
            has_more_actions: generator.is_some(),
            generator,
            carried,
            ledger,
        })
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == NodeKind::Terminal
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    pub fn parent(&self) -> Option<(NodeId, ActionId)> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child(&self, action_id: ActionId) -> Option<NodeId> {
        self.children.get(action_id.index()).copied()
    }

    pub fn actions(&self) -> &[JointAction] {
        &self.actions
    }

    pub fn action(&self, action_id: ActionId) -> Option<&JointAction> {
        self.actions.get(action_id.index())
    }

    /// Abstract actions behind the joint action in slot `action_id`.
    pub fn action_sources(&self, action_id: ActionId) -> Option<&CarriedActions<S>> {
        self.sources.get(action_id.index())
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut NodeStats {
        &mut self.stats
    }

    pub fn evaluation_bound(&self) -> f64 {
        self.evaluation_bound
    }

    pub fn has_more_actions(&self) -> bool {
        self.has_more_actions
    }

    /// Size of the full script-combination space at this node.
    pub fn action_count(&self) -> u64 {
        self.generator
            .as_ref()
            .map(|generator| generator.action_count())
            .unwrap_or(0)
    }

    /// Abstract actions still running for units of either side.
    pub fn carried(&self) -> &CarriedActions<S> {
        &self.carried
    }

    pub fn ledger(&self) -> &DamageLedger {
        &self.ledger
    }

    /// Draw the next untried joint action from the generator.
    /// Marks the node exhausted once nothing is left.
    pub(crate) fn next_untried(&mut self) -> Option<(JointAction, CarriedActions<S>)> {
        let Some(generator) = self.generator.as_mut() else {
            self.has_more_actions = false;
            return None;
        };
        let Some(action) = generator.next_action() else {
            self.has_more_actions = false;
            return None;
        };
        let sources = generator
            .corresponding_abstract_actions(&action)
            .cloned()
            .unwrap_or_default();
        self.has_more_actions = generator.has_more();
        Some((action, sources))
    }

    pub(crate) fn push_child(
        &mut self,
        action: JointAction,
        sources: CarriedActions<S>,
        child: NodeId,
    ) {
        self.actions.push(action);
        self.sources.push(sources);
        self.children.push(child);
    }

    /// Next action slot to be filled.
    pub(crate) fn next_action_id(&self) -> ActionId {
        ActionId::from(self.actions.len())
    }
}

/// Advance `snapshot` through ticks where nobody has a fresh decision to make.
///
/// Each pass resolves carried actions for idle units and issues them. Time
/// only moves when neither player has an idle unit. After `deadlock_bound`
/// passes the game is ended by clearing all units.
fn fast_forward<S: Snapshot>(
    snapshot: &mut S,
    carried: &mut CarriedActions<S>,
    max: PlayerId,
    min: PlayerId,
    deadlock_bound: u32,
) {
    let mut passes = 0;
    let mut resolved_this_pass = false;

    while snapshot.winner().is_none() && !snapshot.is_over() {
        if !snapshot.can_act(max) && !snapshot.can_act(min) {
            snapshot.tick();
            resolved_this_pass = false;
        } else if passes >= deadlock_bound {
            log::debug!(
                "carried actions made no progress after {passes} passes, ending the game at tick {}",
                snapshot.clock()
            );
            snapshot.clear_units();
            break;
        } else if !resolved_this_pass {
            let joint = resolve_carried(carried, snapshot, None);
            snapshot.issue(&joint);
            resolved_this_pass = true;
            passes += 1;
        } else {
            break;
        }
    }
}
