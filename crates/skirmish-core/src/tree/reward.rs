use serde::{Deserialize, Serialize};

use crate::tree::search_tree::Backpropagation;

/// Splits an iteration budget into segments whose playouts weigh more the
/// later they run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segmentation {
    pub segments: u32,
    /// Segment boundaries at `budget · 2^i / (2^segments - 1)` instead of
    /// equal-sized segments.
    pub exponential_segmentation: bool,
    /// Factor `2^(segment - 1)` instead of `segment`.
    pub exponential_multiplication: bool,
    /// Normalize by hit points on the way up, like [`RewardScheme::HpNormalized`].
    pub hp_normalized: bool,
}

impl Default for Segmentation {
    fn default() -> Self {
        Segmentation {
            segments: 10,
            exponential_segmentation: true,
            exponential_multiplication: true,
            hp_normalized: false,
        }
    }
}

impl Segmentation {
    /// 1-based segment of the `playout`-th playout (also 1-based).
    pub fn segment(&self, playout: u64, budget: u64) -> u64 {
        let segments = u64::from(self.segments.max(1));
        if self.exponential_segmentation {
            let denominator = 2f64.powi(self.segments as i32) - 1.0;
            let mut segment = 1;
            for i in 1..=self.segments {
                let bound = budget as f64 * (2f64.powi(i as i32) / denominator);
                if (playout as f64) < bound {
                    break;
                }
                segment += 1;
            }
            segment
        } else {
            let width = (budget / segments).max(1);
            playout.saturating_sub(1) / width + 1
        }
    }

    /// Weight of the `playout`-th playout, used both for the reward and the
    /// visit increment.
    pub fn factor(&self, playout: u64, budget: u64) -> u64 {
        let segment = self.segment(playout, budget);
        if self.exponential_multiplication {
            1u64.checked_shl((segment - 1) as u32).unwrap_or(u64::MAX)
        } else {
            segment
        }
    }

    /// Upper bound on the visits a whole budget adds to the root, `None` when
    /// it does not fit in a `u64`. Segments never decrease with the playout
    /// index, so the last playout carries the largest factor.
    pub fn total_visits_bound(&self, budget: u64) -> Option<u64> {
        budget.checked_mul(self.factor(budget, budget))
    }

    fn backpropagation(&self) -> Backpropagation {
        if self.hp_normalized {
            Backpropagation::HpNormalized
        } else {
            Backpropagation::Plain
        }
    }
}

/// How a finished playout turns into a backpropagated reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardScheme {
    /// The evaluation of the final playout state.
    #[default]
    Basic,
    /// Same reward, normalized by hit points at every ancestor.
    HpNormalized,
    /// Reward and visit increment scaled by the playout's segment factor.
    Segmented(Segmentation),
    /// Reward adjusted by a surprise bonus on playout length (`relative`)
    /// and final hit point difference (`qualitative`).
    Bonus {
        k: f64,
        relative: bool,
        qualitative: bool,
        #[serde(default)]
        segmentation: Option<Segmentation>,
    },
    /// Weighted average of evaluations sampled after every playout decision.
    WeightedPlayout {
        poe_base: f64,
        voi_base: f64,
        /// Measure samples against the evaluation at the leaf.
        relative: bool,
    },
}

impl RewardScheme {
    pub fn segmentation(&self) -> Option<&Segmentation> {
        match self {
            RewardScheme::Segmented(segmentation) => Some(segmentation),
            RewardScheme::Bonus { segmentation, .. } => segmentation.as_ref(),
            _ => None,
        }
    }

    /// Whether playouts must record intermediate evaluations.
    pub fn samples_playouts(&self) -> bool {
        matches!(self, RewardScheme::WeightedPlayout { .. })
    }

    /// Whether the qualitative bonus needs the final hit point difference.
    pub fn needs_quality(&self) -> bool {
        matches!(
            self,
            RewardScheme::Bonus {
                qualitative: true,
                ..
            }
        )
    }
}

/// What one playout produced.
#[derive(Debug, Clone, Default)]
pub struct PlayoutOutcome {
    /// Evaluation of the final state.
    pub evaluation: f64,
    /// Hit point difference of the final state, from max's side.
    pub quality: f64,
    /// Depth of the leaf the playout started from.
    pub leaf_depth: u64,
    /// Decisions both sides made during the playout.
    pub decisions: u64,
    /// Evaluation at the leaf, before the playout.
    pub initial_evaluation: f64,
    /// Evaluations sampled after every playout decision.
    pub samples: Vec<f64>,
}

/// A reward ready for [`crate::tree::search_tree::Tree::backpropagate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedReward {
    pub reward: f64,
    pub visits: u64,
    pub backpropagation: Backpropagation,
}

/// Running statistics of one bonus metric within a single decision.
#[derive(Debug, Clone, Default)]
struct MetricStats {
    values: Vec<f64>,
    mean: f64,
    win_mean: f64,
    deviation: f64,
}

impl MetricStats {
    fn bonus(&self, k: f64, offset: f64) -> f64 {
        -1.0 + 2.0 / (1.0 + (-k * offset / self.deviation).exp())
    }

    /// `|cov(win-weighted metric, metric) / deviation|` over earlier playouts.
    fn alpha(&self, results: &[f64]) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let covariance: f64 = self
            .values
            .iter()
            .zip(results)
            .map(|(value, result)| {
                (result.max(0.0) * value - self.win_mean) * (value - self.mean)
            })
            .sum::<f64>()
            / self.values.len() as f64;
        (covariance / self.deviation).abs()
    }

    /// Apply the bonus for `offset` to `evaluation` if the deviation allows it.
    fn adjust(&self, k: f64, offset: f64, evaluation: f64, results: &[f64]) -> f64 {
        if self.deviation > 0.0 {
            evaluation + evaluation * self.alpha(results) * self.bonus(k, offset)
        } else {
            evaluation
        }
    }

    fn record(&mut self, value: f64, evaluation: f64) {
        self.values.push(value);
        let n = self.values.len() as f64;
        let won = evaluation.signum().max(0.0);
        self.mean = (self.mean * (n - 1.0) + value) / n;
        self.win_mean = (self.win_mean * (n - 1.0) + won * value) / n;
        if self.values.len() > 1 {
            let squares: f64 = self
                .values
                .iter()
                .map(|v| (v - self.mean) * (v - self.mean))
                .sum();
            self.deviation = (squares / (n - 1.0)).sqrt();
        }
    }
}

/// Turns playout outcomes into rewards, keeping whatever per-decision
/// statistics the scheme needs.
#[derive(Debug, Clone)]
pub struct RewardShaper {
    scheme: RewardScheme,
    iteration_budget: u64,
    upper_bound: f64,
    results: Vec<f64>,
    relative: MetricStats,
    qualitative: MetricStats,
}

impl RewardShaper {
    pub fn new(scheme: RewardScheme, iteration_budget: u64) -> Self {
        RewardShaper {
            scheme,
            iteration_budget,
            upper_bound: 1.0,
            results: Vec::new(),
            relative: MetricStats::default(),
            qualitative: MetricStats::default(),
        }
    }

    pub fn scheme(&self) -> &RewardScheme {
        &self.scheme
    }

    /// Normalizer for weighted playout rewards in the current decision.
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Clear running statistics before a new decision.
    /// `upper_bound` normalizes weighted playout rewards; zero counts as 1.
    pub fn reset(&mut self, upper_bound: f64) {
        self.upper_bound = if upper_bound > 0.0 { upper_bound } else { 1.0 };
        self.results.clear();
        self.relative = MetricStats::default();
        self.qualitative = MetricStats::default();
    }

    /// Shape the outcome of the `playout`-th playout (1-based) of this decision.
    pub fn shape(&mut self, playout: u64, outcome: &PlayoutOutcome) -> ShapedReward {
        match self.scheme {
            RewardScheme::Basic => plain(outcome.evaluation, Backpropagation::Plain),
            RewardScheme::HpNormalized => {
                plain(outcome.evaluation, Backpropagation::HpNormalized)
            }
            RewardScheme::Segmented(segmentation) => {
                let factor = segmentation.factor(playout, self.iteration_budget);
                ShapedReward {
                    reward: outcome.evaluation * factor as f64,
                    visits: factor,
                    backpropagation: segmentation.backpropagation(),
                }
            }
            RewardScheme::Bonus {
                k,
                relative,
                qualitative,
                segmentation,
            } => {
                let evaluation = self.apply_bonus(k, relative, qualitative, outcome);
                match segmentation {
                    Some(segmentation) => {
                        let factor = segmentation.factor(playout, self.iteration_budget);
                        ShapedReward {
                            reward: evaluation * factor as f64,
                            visits: factor,
                            backpropagation: segmentation.backpropagation(),
                        }
                    }
                    None => plain(evaluation, Backpropagation::Plain),
                }
            }
            RewardScheme::WeightedPlayout {
                poe_base,
                voi_base,
                relative,
            } => {
                let reward = if outcome.samples.is_empty() {
                    let base = if relative {
                        outcome.evaluation - outcome.initial_evaluation
                    } else {
                        outcome.evaluation
                    };
                    base / self.upper_bound
                } else {
                    let offset = if relative {
                        outcome.initial_evaluation
                    } else {
                        0.0
                    };
                    let samples: Vec<f64> = outcome.samples.iter().map(|s| s - offset).collect();
                    weighted_average(&samples, poe_base, voi_base) / self.upper_bound
                };
                plain(reward, Backpropagation::Plain)
            }
        }
    }

    fn apply_bonus(
        &mut self,
        k: f64,
        relative: bool,
        qualitative: bool,
        outcome: &PlayoutOutcome,
    ) -> f64 {
        let mut evaluation = outcome.evaluation;
        self.results.push(outcome.evaluation);

        if relative {
            let distance = (outcome.leaf_depth + 2 * outcome.decisions) as f64;
            evaluation = self.relative.adjust(
                k,
                self.relative.mean - distance,
                evaluation,
                &self.results,
            );
            self.relative.record(distance, evaluation);
        }
        if qualitative {
            let quality = outcome.quality;
            evaluation = self.qualitative.adjust(
                k,
                quality - self.qualitative.mean,
                evaluation,
                &self.results,
            );
            self.qualitative.record(quality, evaluation);
        }
        evaluation
    }
}

fn plain(reward: f64, backpropagation: Backpropagation) -> ShapedReward {
    ShapedReward {
        reward,
        visits: 1,
        backpropagation,
    }
}

/// Average of `samples` where sample `i` of `n` weighs
/// `(min(poe^-i, 1e4) + min(voi^(i-n), 1e4)) / 2`.
pub fn weighted_average(samples: &[f64], poe_base: f64, voi_base: f64) -> f64 {
    let n = samples.len() as i32;
    let mut total = 0.0;
    let mut weights = 0.0;
    for (i, sample) in samples.iter().enumerate() {
        let i = i as i32;
        let encounter = poe_base.powi(-i).min(1e4);
        let information = voi_base.powi(i - n).min(1e4);
        let weight = (encounter + information) / 2.0;
        total += sample * weight;
        weights += weight;
    }
    if weights > 0.0 { total / weights } else { 0.0 }
}
