use serde::{Deserialize, Deserializer};

use super::item::{ClientRevision, Item};

fn revision_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Item as the server reports it, in a sync response or a live message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedItem {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub done: u8,
    /// Server revision; a `null` revision counts as 0
    #[serde(deserialize_with = "revision_or_null")]
    pub revision: i64,
    #[serde(default)]
    pub client_revision_was: Option<i64>,
    #[serde(default)]
    pub old_id: Option<String>,
}

impl ReceivedItem {
    /// Parse a single received item; malformed payloads yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!("Ignoring malformed item payload: {}", e);
                None
            }
        }
    }

    pub fn into_item(self, order_index: i64) -> Item {
        Item {
            draft_title: self.title.clone(),
            draft_tags: self.tags.clone(),
            draft_tags_input: String::new(),
            draft_changed: false,
            id: self.id,
            title: self.title,
            tags: self.tags,
            done: self.done,
            order_index_default: order_index,
            order_index_override: order_index,
            editing: false,
            synced: true,
            is_new: false,
            last_synced_revision: self.revision,
            client_revision: ClientRevision::from_wire(self.client_revision_was),
            old_id: self.old_id.unwrap_or_default(),
        }
    }
}

/// Parse a full-sync response body. Anything unparseable is treated as an empty list.
pub fn parse_received_items(raw: &str) -> Vec<ReceivedItem> {
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Sync response was not a valid item list, treating as empty: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_received_item() {
        let item = ReceivedItem::parse(
            r#"{"id":"x","title":"Eggs","tags":["fridge"],"done":0,"revision":7,"clientRevisionWas":6,"oldId":"local-1"}"#,
        )
        .expect("parse");
        assert_eq!(item.id, "x");
        assert_eq!(item.revision, 7);
        assert_eq!(item.client_revision_was, Some(6));
        assert_eq!(item.old_id.as_deref(), Some("local-1"));
    }

    #[test]
    fn test_null_revision_defaults_to_zero() {
        let item = ReceivedItem::parse(r#"{"id":"x","title":"Eggs","tags":[],"done":1,"revision":null}"#)
            .expect("parse");
        assert_eq!(item.revision, 0);
        assert_eq!(item.client_revision_was, None);
        assert_eq!(item.old_id, None);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        assert!(ReceivedItem::parse(r#"{"id":"x","tags":[],"done":0,"revision":1}"#).is_none());
        assert!(ReceivedItem::parse("not json").is_none());
    }

    #[test]
    fn test_parse_list_falls_back_to_empty() {
        assert!(parse_received_items("{\"oops\":true}").is_empty());
        let items = parse_received_items(
            r#"[{"id":"a","title":"A","tags":[],"done":0,"revision":1},{"id":"b","title":"B","tags":["t"],"done":1,"revision":2}]"#,
        );
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_into_item_marks_synced() {
        let received = ReceivedItem::parse(r#"{"id":"x","title":"Eggs","tags":["a"],"done":0,"revision":7}"#)
            .expect("parse");
        let item = received.into_item(4);
        assert!(item.synced);
        assert!(!item.is_new);
        assert!(!item.editing);
        assert_eq!(item.last_synced_revision, 7);
        assert_eq!(item.client_revision, ClientRevision::NoPendingEdits);
        assert_eq!(item.order_index_default, 4);
        assert_eq!(item.draft_title, "Eggs");
        assert_eq!(item.old_id, "");
    }
}
