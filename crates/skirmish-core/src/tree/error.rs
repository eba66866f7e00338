use std::fmt;

use crate::{
    micro::generator::GeneratorError,
    tree::ids::{ActionId, NodeId},
};

/// Error type for search tree construction and traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Attempted to access a node id that does not exist in the arena.
    MissingNode { node_id: NodeId },
    /// Attempted to access an action slot that a node does not have.
    MissingAction {
        node_id: NodeId,
        action_id: ActionId,
    },
    /// A node could not build its joint action generator.
    Generator(GeneratorError),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::MissingNode { node_id } => {
                write!(f, "missing node with id {}", node_id.index())
            }
            TreeError::MissingAction { node_id, action_id } => write!(
                f,
                "missing action {} on node {}",
                action_id.index(),
                node_id.index()
            ),
            TreeError::Generator(err) => write!(f, "failed to build action generator: {err}"),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<GeneratorError> for TreeError {
    fn from(err: GeneratorError) -> Self {
        TreeError::Generator(err)
    }
}
