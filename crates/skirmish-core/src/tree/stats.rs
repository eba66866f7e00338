/// Playout statistics accumulated on a node during backpropagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeStats {
    visits: u64,
    reward_sum: f64,
    /// Sum of squared rescaled rewards, only read by UCB1-tuned.
    squared_reward_sum: f64,
}

impl NodeStats {
    pub fn new() -> Self {
        NodeStats::default()
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn reward_sum(&self) -> f64 {
        self.reward_sum
    }

    pub fn squared_reward_sum(&self) -> f64 {
        self.squared_reward_sum
    }

    /// Add one backpropagated contribution worth `visits` visits.
    /// The count saturates instead of wrapping.
    pub fn record(&mut self, reward: f64, visits: u64, squared_reward: f64) {
        self.visits = self.visits.saturating_add(visits);
        self.reward_sum += reward;
        self.squared_reward_sum += squared_reward;
    }

    pub fn is_unvisited(&self) -> bool {
        self.visits == 0
    }

    /// Mean reward, zero while unvisited.
    pub fn mean(&self) -> f64 {
        if self.is_unvisited() {
            0.0
        } else {
            self.reward_sum / self.visits as f64
        }
    }
}
