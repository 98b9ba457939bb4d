//! Decoders for messages pushed by other clients over the live channel.
//!
//! Every decoder is forgiving: a payload that does not match yields `None`
//! and the message is dropped.

use serde::Deserialize;

#[derive(Deserialize)]
struct Origin {
    #[serde(rename = "clientId")]
    client_id: String,
}

#[derive(Deserialize)]
struct Deleted {
    id: String,
}

/// Payload of a done-status message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DoneStatus {
    pub id: String,
    pub status: u8,
}

/// Client id embedded in a new/updated item message, if any.
pub fn origin_client_id(raw: &str) -> Option<String> {
    serde_json::from_str::<Origin>(raw)
        .ok()
        .map(|origin| origin.client_id)
}

/// True when the message was published by this very client.
pub fn is_own_echo(raw: &str, local_client_id: &str) -> bool {
    !local_client_id.is_empty() && origin_client_id(raw).as_deref() == Some(local_client_id)
}

pub fn parse_done_status(raw: &str) -> Option<DoneStatus> {
    match serde_json::from_str(raw) {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::debug!("Ignoring malformed done-status message: {}", e);
            None
        }
    }
}

pub fn parse_deleted_id(raw: &str) -> Option<String> {
    match serde_json::from_str::<Deleted>(raw) {
        Ok(deleted) => Some(deleted.id),
        Err(e) => {
            tracing::debug!("Ignoring malformed deleted-item message: {}", e);
            None
        }
    }
}
