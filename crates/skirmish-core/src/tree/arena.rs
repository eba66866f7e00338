use std::slice::Iter;

use crate::tree::ids::NodeId;

/// Flat storage for search nodes. Children refer to parents by index only,
/// so the tree has no reference cycles and is dropped in one go.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    storage: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            storage: Vec::new(),
        }
    }

    /// Store `item` and return its id.
    pub fn allocate(&mut self, item: T) -> NodeId {
        let id = NodeId::from(self.storage.len());
        self.storage.push(item);
        id
    }

    pub fn get(&self, node_id: NodeId) -> Option<&T> {
        self.storage.get(node_id.index())
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.storage.get_mut(node_id.index())
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.storage.iter()
    }
}

impl<'a, T> IntoIterator for &'a Arena<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.storage.iter()
    }
}
