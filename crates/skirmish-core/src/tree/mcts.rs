use std::{
    fmt, fs, io,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    agent::Agent,
    eval::{Evaluation, EvaluationFunction, hp_difference},
    game::{command::JointAction, ids::PlayerId, snapshot::Snapshot},
    micro::{
        abstract_action::{CarriedActions, SharedPathFinder, resolve_carried},
        generator::GeneratorError,
        ledger::DamageLedger,
        script::{Portfolio, ScriptKind},
    },
    tree::{
        diagnostics::IterationLog,
        error::TreeError,
        ids::NodeId,
        node::TreeParams,
        playout::{RandomScriptedPlayer, playout},
        reward::{PlayoutOutcome, RewardScheme, RewardShaper, Segmentation},
        search_tree::Tree,
        selection::SelectionPolicy,
    },
};

const DEFAULT_SEARCH_CONFIG_YAML: &str = include_str!("../../config/search.default.yaml");

/// Search configuration for one MCTS player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wall-clock budget per decision; non-positive disables it.
    pub time_budget_ms: i64,
    /// Playouts per decision; non-positive disables it.
    pub iteration_budget: i64,
    /// Ticks a playout may simulate past its leaf.
    pub lookahead: u64,
    pub max_tree_depth: u64,
    /// Carried-action passes a node may spend fast-forwarding.
    pub deadlock_bound: u32,
    /// Grow untried actions before descending into visited children.
    pub expand_first: bool,
    pub seed: u64,
    pub portfolio: Vec<ScriptKind>,
    pub selection: SelectionPolicy,
    pub evaluation: Evaluation,
    pub reward: RewardScheme,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            time_budget_ms: 100,
            iteration_budget: -1,
            lookahead: 100,
            max_tree_depth: 10,
            deadlock_bound: 50,
            expand_first: true,
            seed: 0,
            portfolio: vec![
                ScriptKind::Nokav,
                ScriptKind::Kiter {
                    retreat_distance: 3,
                },
            ],
            selection: SelectionPolicy::default(),
            evaluation: Evaluation::default(),
            reward: RewardScheme::default(),
        }
    }
}

/// Named configurations of the search, one per published variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MctsVariant {
    Basic,
    HpNormalized,
    Segmented,
    SegmentedHp,
    Sigmoid,
    RqBonus,
    SegmentedRqBonus,
    WeightedPlayout,
    Ucb1Tuned,
    VoiAware,
    SimpleRegret,
    EpsilonGreedy,
}

impl MctsVariant {
    pub const ALL: [MctsVariant; 12] = [
        MctsVariant::Basic,
        MctsVariant::HpNormalized,
        MctsVariant::Segmented,
        MctsVariant::SegmentedHp,
        MctsVariant::Sigmoid,
        MctsVariant::RqBonus,
        MctsVariant::SegmentedRqBonus,
        MctsVariant::WeightedPlayout,
        MctsVariant::Ucb1Tuned,
        MctsVariant::VoiAware,
        MctsVariant::SimpleRegret,
        MctsVariant::EpsilonGreedy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MctsVariant::Basic => "basic_mcts",
            MctsVariant::HpNormalized => "mcts_hp",
            MctsVariant::Segmented => "fap_mcts",
            MctsVariant::SegmentedHp => "fap_hp_mcts",
            MctsVariant::Sigmoid => "sigmoid_mcts",
            MctsVariant::RqBonus => "rq_bonus_mcts",
            MctsVariant::SegmentedRqBonus => "fap_rq_bonus_mcts",
            MctsVariant::WeightedPlayout => "wp_mcts",
            MctsVariant::Ucb1Tuned => "ucb1_tuned_mcts",
            MctsVariant::VoiAware => "voi_aware_mcts",
            MctsVariant::SimpleRegret => "simple_regret_mcts",
            MctsVariant::EpsilonGreedy => "epsilon_greedy_mcts",
        }
    }
}

impl fmt::Display for MctsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SearchConfig {
    /// Parse a search config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SearchConfigError> {
        let config: SearchConfig = serde_yaml::from_str(yaml).map_err(SearchConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a search config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SearchConfigError> {
        let yaml = fs::read_to_string(path).map_err(SearchConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SEARCH_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SearchConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    /// Default configuration adjusted to one named variant.
    pub fn for_variant(variant: MctsVariant) -> Self {
        let base = SearchConfig::default();
        let segmented = |segmentation: Segmentation| SearchConfig {
            time_budget_ms: -1,
            iteration_budget: 1000,
            reward: RewardScheme::Segmented(segmentation),
            ..SearchConfig::default()
        };

        match variant {
            MctsVariant::Basic => base,
            MctsVariant::HpNormalized => SearchConfig {
                evaluation: Evaluation::HpDifference,
                reward: RewardScheme::HpNormalized,
                ..base
            },
            MctsVariant::Segmented => segmented(Segmentation::default()),
            MctsVariant::SegmentedHp => SearchConfig {
                evaluation: Evaluation::HpDifference,
                ..segmented(Segmentation {
                    hp_normalized: true,
                    ..Segmentation::default()
                })
            },
            MctsVariant::Sigmoid => SearchConfig {
                evaluation: Evaluation::Sigmoid { k: 1.0 },
                ..base
            },
            MctsVariant::RqBonus => SearchConfig {
                reward: RewardScheme::Bonus {
                    k: 1.0,
                    relative: true,
                    qualitative: true,
                    segmentation: None,
                },
                ..base
            },
            MctsVariant::SegmentedRqBonus => SearchConfig {
                reward: RewardScheme::Bonus {
                    k: 1.0,
                    relative: true,
                    qualitative: true,
                    segmentation: Some(Segmentation::default()),
                },
                ..segmented(Segmentation::default())
            },
            MctsVariant::WeightedPlayout => SearchConfig {
                evaluation: Evaluation::HpDifference,
                selection: SelectionPolicy::UcbWithoutScaling { c: 1.0 },
                reward: RewardScheme::WeightedPlayout {
                    poe_base: std::f64::consts::E,
                    voi_base: std::f64::consts::E,
                    relative: false,
                },
                ..base
            },
            MctsVariant::Ucb1Tuned => SearchConfig {
                selection: SelectionPolicy::Ucb1Tuned,
                ..base
            },
            MctsVariant::VoiAware => SearchConfig {
                selection: SelectionPolicy::VoiAware,
                ..base
            },
            MctsVariant::SimpleRegret => SearchConfig {
                selection: SelectionPolicy::UcbSqrt { c: 1.0 },
                ..base
            },
            MctsVariant::EpsilonGreedy => SearchConfig {
                selection: SelectionPolicy::EpsilonGreedy { epsilon: 0.5 },
                expand_first: false,
                ..base
            },
        }
    }

    /// Check the config describes a search that terminates.
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if self.time_budget_ms <= 0 && self.iteration_budget <= 0 {
            return Err(SearchConfigError::Invalid(
                "at least one of time_budget_ms and iteration_budget must be positive".to_string(),
            ));
        }
        if self.lookahead == 0 {
            return Err(SearchConfigError::Invalid(
                "lookahead must be greater than 0".to_string(),
            ));
        }
        if self.max_tree_depth == 0 {
            return Err(SearchConfigError::Invalid(
                "max_tree_depth must be greater than 0".to_string(),
            ));
        }
        if self.deadlock_bound == 0 {
            return Err(SearchConfigError::Invalid(
                "deadlock_bound must be greater than 0".to_string(),
            ));
        }
        if self.portfolio.is_empty() {
            return Err(SearchConfigError::Invalid(
                "portfolio must name at least one script".to_string(),
            ));
        }
        if self.portfolio.iter().any(|kind| {
            matches!(kind, ScriptKind::Kiter { retreat_distance } if *retreat_distance <= 0)
        }) {
            return Err(SearchConfigError::Invalid(
                "kiter retreat_distance must be greater than 0".to_string(),
            ));
        }

        match self.selection {
            SelectionPolicy::Ucb1 { c }
            | SelectionPolicy::UcbWithoutScaling { c }
            | SelectionPolicy::UcbSqrt { c }
                if !c.is_finite() || c < 0.0 =>
            {
                return Err(SearchConfigError::Invalid(
                    "selection c must be finite and >= 0".to_string(),
                ));
            }
            SelectionPolicy::EpsilonGreedy { epsilon } if !(0.0..=1.0).contains(&epsilon) => {
                return Err(SearchConfigError::Invalid(
                    "epsilon must be within [0, 1]".to_string(),
                ));
            }
            _ => {}
        }

        if let Evaluation::Sigmoid { k } = self.evaluation {
            if !k.is_finite() || k <= 0.0 {
                return Err(SearchConfigError::Invalid(
                    "sigmoid k must be finite and > 0".to_string(),
                ));
            }
        }

        if let Some(segmentation) = self.reward.segmentation() {
            if segmentation.segments == 0 || segmentation.segments > 63 {
                return Err(SearchConfigError::Invalid(
                    "segments must be within 1..=63".to_string(),
                ));
            }
            if self.iteration_budget <= 0 {
                return Err(SearchConfigError::Invalid(
                    "segmented rewards need a positive iteration_budget".to_string(),
                ));
            }
            if segmentation
                .total_visits_bound(self.iteration_budget as u64)
                .is_none()
            {
                return Err(SearchConfigError::Invalid(format!(
                    "{} segments overflow the visit count for an iteration_budget of {}",
                    segmentation.segments, self.iteration_budget
                )));
            }
        }
        match self.reward {
            RewardScheme::Bonus { k, .. } if !k.is_finite() || k <= 0.0 => {
                return Err(SearchConfigError::Invalid(
                    "bonus k must be finite and > 0".to_string(),
                ));
            }
            RewardScheme::WeightedPlayout {
                poe_base, voi_base, ..
            } if poe_base <= 0.0 || voi_base <= 0.0 => {
                return Err(SearchConfigError::Invalid(
                    "weighted playout bases must be > 0".to_string(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Error type for loading and validating `SearchConfig`.
#[derive(Debug)]
pub enum SearchConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for SearchConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SearchConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SearchConfigError::Invalid(err) => write!(f, "invalid search config: {err}"),
        }
    }
}

impl std::error::Error for SearchConfigError {}

/// Error type for one decision of the search.
#[derive(Debug)]
pub enum RunError {
    Tree(TreeError),
    /// The iteration log could not be written.
    Diagnostics(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Tree(err) => write!(f, "search tree failure: {err}"),
            RunError::Diagnostics(err) => write!(f, "failed to write iteration log: {err}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<TreeError> for RunError {
    fn from(err: TreeError) -> Self {
        RunError::Tree(err)
    }
}

impl From<io::Error> for RunError {
    fn from(err: io::Error) -> Self {
        RunError::Diagnostics(err)
    }
}

/// Per-playout metrics emitted by MCTS.
#[derive(Debug, Clone, Copy)]
pub struct IterationMetrics {
    /// 1-based playout index within the decision.
    pub playout: u64,
    /// `None` when the leaf could not be found and the playout was skipped.
    pub leaf: Option<NodeId>,
    pub leaf_depth: u64,
    pub decisions: u64,
    pub reward: f64,
    pub visits: u64,
    pub elapsed: Duration,
}

/// Aggregate metrics for one decision.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    pub iteration_budget: Option<u64>,
    pub playouts_completed: u64,
    pub max_depth: u64,
    pub reward_sum: f64,
    pub average_reward: f64,
    /// The root had a single child and nothing left to try.
    pub stopped_early: bool,
    pub elapsed: Duration,
}

impl RunMetrics {
    fn new(iteration_budget: Option<u64>) -> Self {
        RunMetrics {
            iteration_budget,
            playouts_completed: 0,
            max_depth: 0,
            reward_sum: 0.0,
            average_reward: 0.0,
            stopped_early: false,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, metrics: &IterationMetrics) {
        self.playouts_completed += 1;
        self.max_depth = self.max_depth.max(metrics.leaf_depth);
        self.reward_sum += metrics.reward;
        self.average_reward = self.reward_sum / self.playouts_completed as f64;
    }
}

/// Portfolio-restricted MCTS player.
///
/// Each decision builds a fresh tree from the live snapshot; only the
/// abstract actions behind chosen joint actions survive between decisions.
pub struct Mcts<S: Snapshot> {
    name: String,
    config: SearchConfig,
    path_finder: SharedPathFinder<S>,
    portfolio: Portfolio<S>,
    evaluator: Arc<dyn EvaluationFunction<S>>,
    carried: CarriedActions<S>,
    rng: ChaCha8Rng,
    shaper: RewardShaper,
    iteration_log: Option<IterationLog>,
    tree: Option<Tree<S>>,
    last_metrics: Option<RunMetrics>,
}

impl<S: Snapshot + 'static> Mcts<S> {
    /// Validate `config` and build a player whose scripts share `path_finder`.
    pub fn new(config: SearchConfig, path_finder: SharedPathFinder<S>) -> Result<Self, SearchConfigError> {
        config.validate()?;
        let portfolio = Portfolio::from_kinds(&config.portfolio, Arc::clone(&path_finder));
        let evaluator: Arc<dyn EvaluationFunction<S>> = Arc::new(config.evaluation);
        let shaper = RewardShaper::new(config.reward, config.iteration_budget.max(0) as u64);
        Ok(Mcts {
            name: "mcts".to_string(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            path_finder,
            portfolio,
            evaluator,
            carried: CarriedActions::new(),
            shaper,
            iteration_log: None,
            tree: None,
            last_metrics: None,
        })
    }

    /// Player configured as one named variant.
    pub fn for_variant(
        variant: MctsVariant,
        path_finder: SharedPathFinder<S>,
    ) -> Result<Self, SearchConfigError> {
        let mut mcts = Mcts::new(SearchConfig::for_variant(variant), path_finder)?;
        mcts.name = variant.name().to_string();
        Ok(mcts)
    }
}

impl<S: Snapshot> Mcts<S> {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the configured evaluation with a custom one.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn EvaluationFunction<S>>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Write `count, depth, nanoseconds` for every playout to `log`.
    pub fn with_iteration_log(mut self, log: IterationLog) -> Self {
        self.iteration_log = Some(log);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn path_finder(&self) -> &SharedPathFinder<S> {
        &self.path_finder
    }

    /// Abstract actions kept from earlier decisions of this game.
    pub fn carried(&self) -> &CarriedActions<S> {
        &self.carried
    }

    /// Tree built by the most recent decision that ran a search.
    pub fn last_tree(&self) -> Option<&Tree<S>> {
        self.tree.as_ref()
    }

    pub fn last_metrics(&self) -> Option<&RunMetrics> {
        self.last_metrics.as_ref()
    }

    pub(crate) fn shaper(&self) -> &RewardShaper {
        &self.shaper
    }

    /// Forget carried actions and the last tree between games.
    pub fn reset(&mut self) {
        self.carried.clear();
        self.tree = None;
        self.last_metrics = None;
    }

    /// Pick commands for `player`'s idle units in the live snapshot.
    pub fn decide(&mut self, player: PlayerId, live: &S) -> Result<JointAction, RunError> {
        self.decide_with_hook(player, live, |_| {})
    }

    /// [`Mcts::decide`], invoking a callback after each completed playout.
    pub fn decide_with_hook<F>(
        &mut self,
        player: PlayerId,
        live: &S,
        mut on_iteration: F,
    ) -> Result<JointAction, RunError>
    where
        F: FnMut(&IterationMetrics),
    {
        if !live.can_act(player) {
            return Ok(JointAction::new());
        }

        let mut snapshot = live.clone();
        let initial = resolve_carried(&mut self.carried, &snapshot, Some(player));
        snapshot.issue(&initial);

        let mut chosen = JointAction::new();
        if snapshot.can_act(player) {
            let mut tree = match self.start_new_computation(player, snapshot) {
                Ok(tree) => tree,
                Err(TreeError::Generator(GeneratorError::NoAssignableUnits { player })) => {
                    log::warn!("no assignable units for {player} despite an idle unit");
                    return Ok(initial.bound_to(live));
                }
                Err(err) => return Err(err.into()),
            };
            let metrics = self.compute_during_one_game_frame(&mut tree, &mut on_iteration);
            let extracted = metrics.and_then(|metrics| {
                log::debug!(
                    "{} ran {} playouts to depth {} in {:?}",
                    self.name,
                    metrics.playouts_completed,
                    metrics.max_depth,
                    metrics.elapsed
                );
                self.last_metrics = Some(metrics);
                self.extract_best_action(&tree)
            });
            self.tree = Some(tree);
            chosen = extracted?;
        }

        chosen.merge(&initial);
        Ok(chosen.bound_to(live))
    }

    /// Build the root for `player` from a snapshot with carried actions issued.
    fn start_new_computation(&mut self, player: PlayerId, snapshot: S) -> Result<Tree<S>, TreeError> {
        let (max, min) = (player, player.opponent());
        let params = TreeParams {
            max_player: max,
            min_player: min,
            evaluation_bound: self.evaluator.upper_bound(&snapshot),
            portfolio: self.portfolio.clone(),
            policy: self.config.selection,
            max_depth: self.config.max_tree_depth,
            deadlock_bound: self.config.deadlock_bound,
        };
        let ledger = DamageLedger::from_carried(&self.carried);
        let seed = self.rng.r#gen();
        let tree = Tree::new(params, snapshot, ledger, self.carried.clone(), seed)?;

        // Weighted playouts normalize by the larger side after the root fast-forward.
        let root = tree.node(tree.root_id())?.snapshot();
        let upper_bound = root.hp_sum(max).max(root.hp_sum(min));
        self.shaper.reset(upper_bound as f64);
        Ok(tree)
    }

    /// Run playouts until a budget runs out or the root has nothing to decide.
    fn compute_during_one_game_frame<F>(
        &mut self,
        tree: &mut Tree<S>,
        on_iteration: &mut F,
    ) -> Result<RunMetrics, RunError>
    where
        F: FnMut(&IterationMetrics),
    {
        let start = Instant::now();
        let deadline = u64::try_from(self.config.time_budget_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(|ms| start + Duration::from_millis(ms));
        let budget = u64::try_from(self.config.iteration_budget)
            .ok()
            .filter(|n| *n > 0);
        let mut metrics = RunMetrics::new(budget);
        let mut playouts = 0;

        loop {
            let round_start = Instant::now();
            if deadline.is_some_and(|deadline| round_start > deadline) {
                break;
            }
            playouts += 1;
            if budget.is_some_and(|budget| playouts > budget) {
                break;
            }

            let iteration = self.monte_carlo_run(tree, playouts, round_start)?;
            metrics.record(&iteration);
            if let Some(log) = self.iteration_log.as_mut() {
                log.record(playouts, metrics.max_depth, iteration.elapsed.as_nanos())?;
            }
            on_iteration(&iteration);

            let root = tree.node(tree.root_id())?;
            if root.children().len() == 1 && !root.has_more_actions() {
                metrics.stopped_early = true;
                break;
            }
        }

        if let Some(log) = self.iteration_log.as_mut() {
            log.flush()?;
        }
        metrics.elapsed = start.elapsed();
        Ok(metrics)
    }

    /// One select, playout, evaluate and backpropagate round.
    fn monte_carlo_run(
        &mut self,
        tree: &mut Tree<S>,
        playout_index: u64,
        started: Instant,
    ) -> Result<IterationMetrics, RunError> {
        let leaf = match tree.select_leaf(self.config.expand_first) {
            Ok(leaf) => leaf,
            Err(TreeError::MissingNode { node_id }) => {
                log::warn!(
                    "selection reached missing node {}, skipping playout {playout_index}",
                    node_id.index()
                );
                return Ok(IterationMetrics {
                    playout: playout_index,
                    leaf: None,
                    leaf_depth: 0,
                    decisions: 0,
                    reward: 0.0,
                    visits: 0,
                    elapsed: started.elapsed(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let (max, min) = (tree.params().max_player, tree.params().min_player);
        let (mut snapshot, leaf_depth, mut max_policy, mut min_policy) = {
            let node = tree.node(leaf)?;
            let max_policy = RandomScriptedPlayer::new(self.portfolio.clone(), self.rng.r#gen())
                .with_carried(node.carried());
            let min_policy = RandomScriptedPlayer::new(self.portfolio.clone(), self.rng.r#gen())
                .with_carried(node.carried());
            (node.snapshot().clone(), node.depth(), max_policy, min_policy)
        };

        let evaluator = &self.evaluator;
        let initial_evaluation = evaluator.evaluate(max, min, &snapshot);
        let sample = self.shaper.scheme().samples_playouts();
        let mut samples = Vec::new();
        let decisions = playout(
            &mut snapshot,
            (max, &mut max_policy),
            (min, &mut min_policy),
            self.config.lookahead,
            |state| {
                if sample {
                    samples.push(evaluator.evaluate(max, min, state));
                }
            },
        );

        let outcome = PlayoutOutcome {
            evaluation: evaluator.evaluate(max, min, &snapshot),
            quality: if self.shaper.scheme().needs_quality() {
                hp_difference(max, &snapshot)
            } else {
                0.0
            },
            leaf_depth,
            decisions,
            initial_evaluation,
            samples,
        };
        let shaped = self.shaper.shape(playout_index, &outcome);
        tree.backpropagate(leaf, shaped.reward, shaped.visits, shaped.backpropagation)?;

        Ok(IterationMetrics {
            playout: playout_index,
            leaf: Some(leaf),
            leaf_depth,
            decisions,
            reward: shaped.reward,
            visits: shaped.visits,
            elapsed: started.elapsed(),
        })
    }

    /// Highest-mean root action, with its abstract actions kept for later
    /// decisions. Empty when the root has no visited child.
    fn extract_best_action(&mut self, tree: &Tree<S>) -> Result<JointAction, RunError> {
        let Some(action_id) = tree.best_action_so_far()? else {
            return Ok(JointAction::new());
        };
        let action = tree.root_action(action_id)?.clone();
        let sources = tree.root_action_sources(action_id)?;
        self.carried
            .extend(sources.iter().map(|(unit, a)| (*unit, a.clone())));
        Ok(action)
    }
}

impl<S: Snapshot> Clone for Mcts<S> {
    /// Copies configuration only: carried actions, the last tree and the
    /// iteration log stay with the original.
    fn clone(&self) -> Self {
        Mcts {
            name: self.name.clone(),
            config: self.config.clone(),
            path_finder: Arc::clone(&self.path_finder),
            portfolio: self.portfolio.clone(),
            evaluator: Arc::clone(&self.evaluator),
            carried: CarriedActions::new(),
            rng: ChaCha8Rng::seed_from_u64(self.config.seed),
            shaper: RewardShaper::new(self.config.reward, self.config.iteration_budget.max(0) as u64),
            iteration_log: None,
            tree: None,
            last_metrics: None,
        }
    }
}

impl<S: Snapshot> fmt::Debug for Mcts<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mcts")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("carried", &self.carried.len())
            .finish_non_exhaustive()
    }
}

impl<S: Snapshot> Agent<S> for Mcts<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, player: PlayerId, snapshot: &S) -> Result<JointAction, RunError> {
        Mcts::decide(self, player, snapshot)
    }

    fn reset(&mut self) {
        Mcts::reset(self);
    }
}
