//! Reconciliation of server snapshots with the local item store.
//!
//! Resolution is whole-record: the local item wins outright while it is being
//! edited or carries a client revision ahead of the server's revision, otherwise
//! the server's content is adopted. Revision bookkeeping is always refreshed
//! when the server wins.
//!
//! Items the server reports under a new id are matched to local placeholders
//! through `old_id`, so a create round trip that raced with a full sync does
//! not leave a duplicate behind.

use std::collections::{BTreeMap, HashSet};

use crate::models::{ClientRevision, Item, ReceivedItem};
use crate::store::ItemStore;

fn local_dominates(local: &Item, server_revision: i64) -> bool {
    local.editing || local.client_revision.is_ahead_of(server_revision)
}

/// Local item with the server's content and revision markers.
fn adopt_server(local: &Item, server: &Item) -> Item {
    Item {
        done: server.done,
        title: server.title.clone(),
        tags: server.tags.clone(),
        order_index_default: server.order_index_default,
        last_synced_revision: server.last_synced_revision,
        client_revision: ClientRevision::Revision(server.last_synced_revision),
        synced: true,
        ..local.clone()
    }
}

/// Resolve an id present both locally and on the server.
pub fn merge_item(local: &Item, server: &Item) -> Item {
    if local_dominates(local, server.last_synced_revision) {
        local.clone()
    } else {
        adopt_server(local, server)
    }
}

/// Resolve a local placeholder against the server item that replaced it.
fn splice_placeholder(placeholder: &Item, server: &Item) -> Item {
    let base = if local_dominates(placeholder, server.last_synced_revision) {
        placeholder.clone()
    } else {
        adopt_server(placeholder, server)
    };
    Item {
        id: server.id.clone(),
        old_id: placeholder.id.clone(),
        is_new: false,
        ..base
    }
}

/// Merge a full server snapshot into `local`, returning the new store.
///
/// Local-only items survive unchanged, except placeholders that were matched
/// to a server item through `old_id`.
pub fn merge_into_store(server_items: Vec<ReceivedItem>, local: &ItemStore) -> ItemStore {
    // Later duplicates of an id replace earlier ones
    let server: BTreeMap<String, Item> = server_items
        .into_iter()
        .enumerate()
        .map(|(position, received)| {
            let item = received.into_item(position as i64);
            (item.id.clone(), item)
        })
        .collect();

    let mut result = ItemStore::new();
    let mut consumed: HashSet<String> = HashSet::new();
    let mut unmatched: Vec<&Item> = Vec::new();

    for (key, server_item) in &server {
        if let Some(local_item) = local.get(key) {
            consumed.insert(key.clone());
            result.insert(merge_item(local_item, server_item));
            continue;
        }

        let placeholder = Some(server_item.old_id.as_str())
            .filter(|old_id| !old_id.is_empty() && !server.contains_key(*old_id))
            .and_then(|old_id| local.get(old_id));

        match placeholder {
            Some(placeholder) => {
                tracing::debug!("Merging placeholder {} into {}", placeholder.id, key);
                consumed.insert(placeholder.id.clone());
                result.insert(splice_placeholder(placeholder, server_item));
            }
            None => unmatched.push(server_item),
        }
    }

    // Appended after every adopted server position is known
    let mut next_index = local
        .max_order_index()
        .max(result.max_order_index())
        .map_or(0, |max| max + 1);
    for server_item in unmatched {
        let mut item = server_item.clone();
        item.order_index_default = next_index;
        item.order_index_override = next_index;
        result.insert(item);
        next_index += 1;
    }

    for item in local.iter() {
        if !consumed.contains(&item.id) && !result.contains(&item.id) {
            result.insert(item.clone());
        }
    }

    result
}

/// Apply a live "updated item" message with the same precedence as a full merge.
/// Unknown ids are ignored.
pub fn apply_remote_update(store: &mut ItemStore, received: ReceivedItem) -> bool {
    let Some(local) = store.get(&received.id) else {
        return false;
    };
    if local_dominates(local, received.revision) {
        tracing::debug!("Keeping local state of {} over remote update", received.id);
        return false;
    }
    let server = received.into_item(local.order_index_default);
    let updated = adopt_server(local, &server);
    store.insert(updated);
    true
}
