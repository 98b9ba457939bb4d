use serde_json::Value;
use uuid::Uuid;

use crate::transport::{PostResponse, TransportError, UpdateResponse};

/// Everything that can drive a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Local(LocalAction),
    Network(NetworkResponse),
    Live(LiveMessage),
    Port(PortMessage),
}

/// User intents coming from a front end.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalAction {
    ToggleEdit(String),
    CancelEditing(String),
    FinishEditing(String),
    AddItemClicked,
    /// Answer to `Effect::RequestItemId`
    ItemIdGenerated(Uuid),
    DraftTitleChanged { id: String, text: String },
    DraftTagsChanged { id: String, tags: Vec<String> },
    DraftTagsInputChanged { id: String, text: String },
    ToggleDone(String),
    FilterClicked(String),
    NoTagsFilterClicked,
    SortClicked,
    DeleteItem(String),
    DeleteAllDone,
}

/// Completion of an `ApiCall`, in whatever order the requests finish.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkResponse {
    /// Raw body of a full-sync response
    ItemsReceived(Result<String, TransportError>),
    ItemPosted {
        local_id: String,
        result: Result<PostResponse, TransportError>,
    },
    ItemUpdated {
        item_id: String,
        result: Result<UpdateResponse, TransportError>,
    },
    DoneUpdated {
        item_id: String,
        /// Done value the request carried.
        done: u8,
        result: Result<bool, TransportError>,
    },
    ItemDeleted {
        item_id: String,
        result: Result<bool, TransportError>,
    },
    SortReceived {
        item_ids: Vec<String>,
        result: Result<Vec<i64>, TransportError>,
    },
    CollectSent(Result<(), TransportError>),
}

/// Raw payloads published by other clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveMessage {
    NewItem(String),
    UpdatedItem(String),
    DoneStatus(String),
    DeletedItem(String),
}

impl LiveMessage {
    pub const SUBJECTS: [&'static str; 4] = ["new-item", "updated-item", "done-status", "deleted-item"];

    /// Wrap a payload received on `subject`; unknown subjects yield `None`.
    pub fn from_subject(subject: &str, payload: impl Into<String>) -> Option<Self> {
        let payload = payload.into();
        match subject {
            "new-item" => Some(Self::NewItem(payload)),
            "updated-item" => Some(Self::UpdatedItem(payload)),
            "done-status" => Some(Self::DoneStatus(payload)),
            "deleted-item" => Some(Self::DeletedItem(payload)),
            _ => None,
        }
    }
}

/// Signals from the hosting device.
#[derive(Debug, Clone, PartialEq)]
pub enum PortMessage {
    Geolocation(Value),
    GotFocus,
}

impl From<LocalAction> for Event {
    fn from(action: LocalAction) -> Self {
        Event::Local(action)
    }
}

impl From<NetworkResponse> for Event {
    fn from(response: NetworkResponse) -> Self {
        Event::Network(response)
    }
}

impl From<LiveMessage> for Event {
    fn from(message: LiveMessage) -> Self {
        Event::Live(message)
    }
}

impl From<PortMessage> for Event {
    fn from(message: PortMessage) -> Self {
        Event::Port(message)
    }
}
