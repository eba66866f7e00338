use serde::Serialize;

use crate::tree::node::NodeKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSummary {
    pub schema_version: u32,
    pub root_node_id: usize,
    pub node_count: usize,
    pub nodes: Vec<NodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node_id: usize,
    pub kind: NodeKind,
    pub depth: u64,
    pub clock: u64,
    pub parent_node_id: Option<usize>,
    pub parent_action_id: Option<usize>,
    pub visits: u64,
    pub reward_sum: f64,
    pub mean: f64,
    pub has_more_actions: bool,
    pub action_count: u64,
    pub children: Vec<ChildSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildSummary {
    pub action_id: usize,
    pub child_node_id: usize,
    /// The joint action in display form, e.g. `#1:attack(2,3) #2:idle(1)`.
    pub action: String,
}
