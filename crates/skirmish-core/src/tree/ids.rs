/// Index of a search node inside the tree arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Position of a joint action (and its child) in a node's action list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

impl ActionId {
    /// Raw position in the node's action list.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ActionId {
    fn from(value: usize) -> Self {
        ActionId(value)
    }
}
