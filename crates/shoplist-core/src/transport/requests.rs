//! JSON bodies of outgoing requests.

use serde_json::{json, Value};

use crate::models::Item;
use crate::sync::CollectEvent;
use crate::transport::TransportError;

pub fn sync_body(items: &[Item]) -> Result<Value, TransportError> {
    let client_items =
        serde_json::to_value(items).map_err(|e| TransportError::BadBody(e.to_string()))?;
    Ok(json!({ "clientItems": client_items }))
}

/// `itemData` envelope shared by create and update.
pub fn item_data_body(item: &Item) -> Value {
    json!({
        "itemData": {
            "title": item.title,
            "tags": item.tags,
        }
    })
}

pub fn done_body(done: u8) -> Value {
    json!({ "done": done })
}

pub fn sort_body(titles: &[String]) -> Value {
    json!({ "input_list": titles })
}

pub fn collect_body(event: &CollectEvent) -> Result<Value, TransportError> {
    serde_json::to_value(event).map_err(|e| TransportError::BadBody(e.to_string()))
}
