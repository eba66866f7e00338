mod arena;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod mcts;
pub mod node;
pub mod playout;
pub mod reward;
pub mod search_tree;
pub mod selection;
pub mod stats;
pub mod summary;

#[cfg(test)]
mod tests;
