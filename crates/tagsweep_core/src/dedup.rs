use std::collections::HashSet;

use crate::{Item, ItemId};

/// Set of item ids already handed to the network layer during this page session.
///
/// Append-only: ids are never forgotten.
#[derive(Debug, Clone, Default)]
pub struct DedupTracker {
    seen: HashSet<ItemId>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, id: &ItemId) -> bool {
        self.seen.contains(id)
    }

    /// Returns `true` when `id` was not seen before.
    pub fn mark_seen(&mut self, id: &ItemId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Items not yet seen, in discovery order, with in-list duplicates collapsed.
    ///
    /// Does not mark anything; marking happens when an item enters a batch.
    pub fn unseen(&self, items: impl IntoIterator<Item = Item>) -> Vec<Item> {
        let mut in_list = HashSet::new();
        items
            .into_iter()
            .filter(|item| !self.seen(&item.id))
            .filter(|item| in_list.insert(item.id.clone()))
            .collect()
    }
}
