use serde::Serialize;

use crate::constants::{ACTION_CROSSED, ACTION_UNCROSSED};
use crate::models::{Geolocation, Item};
use crate::store::PersistedState;

/// Side effect requested by a transition, executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    WriteLocalStorage(PersistedState),
    /// Ask for a fresh unique id, answered with `LocalAction::ItemIdGenerated`
    RequestItemId,
    Http(ApiCall),
}

/// Outgoing request to the backend or the data services.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// Full sync; items in insertion order
    SyncItems { items: Vec<Item> },
    CreateItem { item: Item },
    UpdateItem { item: Item },
    UpdateDone { item_id: String, done: u8 },
    DeleteItem { item_id: String },
    Collect(CollectEvent),
    Sort {
        item_ids: Vec<String>,
        titles: Vec<String>,
    },
}

/// Telemetry record sent when an item is crossed off or restored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectEvent {
    pub action_type: String,
    pub name: String,
    pub item_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_agent: String,
    pub user_key: String,
}

impl CollectEvent {
    /// Record for `item` after its done flag has been flipped.
    pub fn for_item(
        item: &Item,
        geolocation: Option<Geolocation>,
        user_agent: &str,
        api_key: &str,
    ) -> Self {
        let action_type = if item.is_done() {
            ACTION_CROSSED
        } else {
            ACTION_UNCROSSED
        };
        Self {
            action_type: action_type.to_string(),
            name: item.title.clone(),
            item_id: item.id.clone(),
            latitude: geolocation.map(|g| g.latitude),
            longitude: geolocation.map(|g| g.longitude),
            user_agent: user_agent.to_string(),
            user_key: api_key.to_string(),
        }
    }
}
