use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{active_tags, FilterTag, Item, ReceivedItem, RevisionPolicy};

/// In-memory mapping from item id to item - the single source of truth for list state.
///
/// Every per-item operation addresses the item by id and is a silent no-op when the
/// id is absent. The returned `bool` reports whether anything was touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemStore {
    items: BTreeMap<String, Item>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Insert under the item's own id, replacing any previous entry.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.items.insert(item.id.clone(), item)
    }

    pub fn remove(&mut self, id: &str) -> Option<Item> {
        self.items.remove(id)
    }

    /// Apply `f` to the item if present.
    pub fn update<F: FnOnce(&mut Item)>(&mut self, id: &str, f: F) -> bool {
        match self.items.get_mut(id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    // ===== Mutation primitives =====

    pub fn toggle_done(&mut self, id: &str) -> bool {
        self.update(id, Item::toggle_done)
    }

    pub fn toggle_edit(&mut self, id: &str) -> bool {
        self.update(id, Item::toggle_edit)
    }

    pub fn update_draft_title(&mut self, id: &str, title: String) -> bool {
        self.update(id, |item| item.set_draft_title(title))
    }

    pub fn update_draft_tags(&mut self, id: &str, tags: Vec<String>) -> bool {
        self.update(id, |item| item.set_draft_tags(tags))
    }

    pub fn update_draft_tags_input(&mut self, id: &str, text: String) -> bool {
        self.update(id, |item| item.set_draft_tags_input(text))
    }

    pub fn set_done(&mut self, id: &str, done: u8) -> bool {
        self.update(id, |item| item.set_done(done))
    }

    pub fn set_synced(&mut self, id: &str, synced: bool) -> bool {
        self.update(id, |item| item.set_synced(synced))
    }

    pub fn increment_client_revision(&mut self, id: &str, policy: RevisionPolicy) -> bool {
        self.update(id, |item| item.increment_client_revision(policy))
    }

    // ===== Creation =====

    pub fn max_order_index(&self) -> Option<i64> {
        self.items.values().map(|item| item.order_index_default).max()
    }

    pub fn next_order_index(&self) -> i64 {
        self.max_order_index().map_or(0, |max| max + 1)
    }

    /// Create a local item under `id`, opened for editing, at the end of the insertion order.
    pub fn add_new_item(&mut self, id: String) {
        let item = Item::new_local(id, self.next_order_index());
        self.insert(item);
    }

    /// Insert an item announced by another client. An entry being edited is left alone.
    pub fn add_received_item(&mut self, received: ReceivedItem) -> bool {
        if self.items.get(&received.id).is_some_and(|item| item.editing) {
            return false;
        }
        let item = received.into_item(self.next_order_index());
        self.insert(item);
        true
    }

    /// Move an entry to a new key, keeping the old key as its `old_id`.
    pub fn rekey(&mut self, old_id: &str, new_id: &str) -> bool {
        let Some(mut item) = self.items.remove(old_id) else {
            return false;
        };
        item.id = new_id.to_string();
        item.old_id = old_id.to_string();
        self.insert(item);
        true
    }

    // ===== Queries =====

    /// Sorted unique set of committed tags across all items.
    pub fn tag_names(&self) -> Vec<String> {
        self.items
            .values()
            .flat_map(|item| item.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Items in insertion order, as the server expects them on a full sync.
    pub fn by_default_order(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by_key(|item| item.order_index_default);
        items
    }

    pub fn done_ids(&self) -> Vec<String> {
        self.items
            .values()
            .filter(|item| item.is_done())
            .map(|item| item.id.clone())
            .collect()
    }

    /// True when any item carries local changes the server has not acknowledged.
    pub fn has_pending_edits(&self) -> bool {
        self.items.values().any(Item::has_pending_edits)
    }

    /// Items that pass the tag filters, newest first in the active ordering.
    pub fn visible_items(
        &self,
        filters: &[FilterTag],
        no_tags_filter_active: bool,
        override_ordering: bool,
    ) -> Vec<&Item> {
        let active = active_tags(filters);
        let filtering = !active.is_empty() || no_tags_filter_active;

        let mut visible: Vec<&Item> = self
            .items
            .values()
            .filter(|item| {
                !filtering
                    || item.editing
                    || (no_tags_filter_active && item.tags.is_empty())
                    || item.tags.iter().any(|tag| active.contains(&tag.as_str()))
            })
            .collect();

        if override_ordering {
            visible.sort_by_key(|item| item.order_index_override);
        } else {
            visible.sort_by_key(|item| item.order_index_default);
        }
        visible.reverse();
        visible
    }
}
