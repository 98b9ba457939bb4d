use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{DONE, NOT_DONE, UNSYNCED_REVISION};

/// How a local edit bumps a revision that was never tracked on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevisionPolicy {
    /// First local edit of a server item starts counting at `last_synced_revision + 1`.
    #[default]
    Corrected,
    /// Keep the historical behaviour: an untracked revision stays untracked.
    Legacy,
}

/// Optimistic-concurrency marker for edits made on this device.
///
/// On the wire this is a nullable integer: `null` is `NoPendingEdits`,
/// `-1` is `NeverSynced`, anything else is `Revision(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientRevision {
    /// Created on this device and never acknowledged by the server.
    NeverSynced,
    /// Received from the server with no local edit tracked yet.
    #[default]
    NoPendingEdits,
    /// Local revision counter. Edits are unconfirmed while it is ahead of
    /// the item's `last_synced_revision`.
    Revision(i64),
}

impl ClientRevision {
    pub fn from_wire(value: Option<i64>) -> Self {
        match value {
            None => Self::NoPendingEdits,
            Some(n) if n <= UNSYNCED_REVISION => Self::NeverSynced,
            Some(n) => Self::Revision(n),
        }
    }

    pub fn to_wire(self) -> Option<i64> {
        match self {
            Self::NeverSynced => Some(UNSYNCED_REVISION),
            Self::NoPendingEdits => None,
            Self::Revision(n) => Some(n),
        }
    }

    pub fn incremented(self, last_synced_revision: i64, policy: RevisionPolicy) -> Self {
        match (self, policy) {
            (Self::NeverSynced, _) => Self::Revision(0),
            (Self::Revision(n), _) => Self::Revision(n + 1),
            (Self::NoPendingEdits, RevisionPolicy::Corrected) => {
                Self::Revision(last_synced_revision + 1)
            }
            (Self::NoPendingEdits, RevisionPolicy::Legacy) => Self::NoPendingEdits,
        }
    }

    /// True when this marker carries local state newer than `revision`.
    pub fn is_ahead_of(self, revision: i64) -> bool {
        matches!(self, Self::Revision(n) if n > revision)
    }
}

impl Serialize for ClientRevision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClientRevision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<i64>::deserialize(deserializer).map(Self::from_wire)
    }
}

fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single list entry with its committed values, edit buffer and sync bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub draft_title: String,
    pub draft_tags: Vec<String>,
    pub draft_tags_input: String,
    pub draft_changed: bool,
    pub done: u8,
    pub order_index_default: i64,
    pub order_index_override: i64,
    pub editing: bool,
    pub synced: bool,
    #[serde(rename = "new")]
    pub is_new: bool,
    pub last_synced_revision: i64,
    #[serde(default)]
    pub client_revision: ClientRevision,
    /// Placeholder id this item carried before the server assigned `id`
    #[serde(default, deserialize_with = "string_or_null")]
    pub old_id: String,
}

impl Item {
    /// Fresh item created on this device, opened for editing.
    pub fn new_local(id: String, order_index: i64) -> Self {
        Self {
            id,
            title: String::new(),
            tags: Vec::new(),
            draft_title: String::new(),
            draft_tags: Vec::new(),
            draft_tags_input: String::new(),
            draft_changed: false,
            done: NOT_DONE,
            order_index_default: order_index,
            order_index_override: order_index,
            editing: true,
            synced: false,
            is_new: true,
            last_synced_revision: UNSYNCED_REVISION,
            client_revision: ClientRevision::NeverSynced,
            old_id: String::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.done != NOT_DONE
    }

    /// Local state that the server has not acknowledged yet.
    pub fn has_pending_edits(&self) -> bool {
        self.client_revision.is_ahead_of(self.last_synced_revision)
    }

    pub fn toggle_done(&mut self) {
        self.done = if self.done == NOT_DONE { DONE } else { NOT_DONE };
    }

    pub fn set_done(&mut self, done: u8) {
        self.done = done;
    }

    pub fn set_synced(&mut self, synced: bool) {
        self.synced = synced;
    }

    /// Flip edit mode, resetting the edit buffer to the committed values.
    pub fn toggle_edit(&mut self) {
        self.draft_title = self.title.clone();
        self.draft_tags = self.tags.clone();
        self.draft_tags_input.clear();
        self.draft_changed = false;
        self.editing = !self.editing;
    }

    pub fn set_draft_title(&mut self, title: String) {
        self.draft_title = title;
        self.draft_changed = self.draft_has_changed();
    }

    pub fn set_draft_tags(&mut self, tags: Vec<String>) {
        self.draft_tags = tags;
        self.draft_changed = self.draft_has_changed();
    }

    pub fn set_draft_tags_input(&mut self, text: String) {
        self.draft_tags_input = text;
        self.draft_changed = self.draft_has_changed();
    }

    pub fn increment_client_revision(&mut self, policy: RevisionPolicy) {
        self.client_revision = self
            .client_revision
            .incremented(self.last_synced_revision, policy);
    }

    pub fn draft_has_changed(&self) -> bool {
        self.draft_title != self.title
            || !tags_equal(&self.draft_tags, &self.tags)
            || !self.draft_tags_input.trim().is_empty()
    }

    /// Commit the edit buffer: trimmed title, pending tag input appended as a tag.
    /// The item leaves edit mode and becomes an unsynced local change.
    pub fn commit_draft(&mut self, policy: RevisionPolicy) {
        let remaining = self.draft_tags_input.trim().to_string();
        let mut tags = std::mem::take(&mut self.draft_tags);
        if !remaining.is_empty() {
            tags.push(remaining);
        }

        self.title = self.draft_title.trim().to_string();
        self.draft_title = self.title.clone();
        self.draft_tags = tags.clone();
        self.tags = tags;
        self.draft_tags_input.clear();
        self.draft_changed = false;
        self.editing = false;
        self.is_new = false;
        self.synced = false;
        self.increment_client_revision(policy);
    }
}

/// Multiset equality of two tag lists: same length and equal once sorted.
pub fn tags_equal(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut sorted_a: Vec<&String> = a.iter().collect();
    let mut sorted_b: Vec<&String> = b.iter().collect();
    sorted_a.sort();
    sorted_b.sort();
    sorted_a == sorted_b
}
