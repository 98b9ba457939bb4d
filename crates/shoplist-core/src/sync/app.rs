use uuid::Uuid;

use crate::config::CoreConfig;
use crate::constants::LOCAL_ID_PREFIX;
use crate::models::{
    merge_filter_state, parse_received_items, toggle_by_tag, FilterTag, Geolocation, Item,
    ReceivedItem, RevisionPolicy,
};
use crate::store::{apply_remote_update, merge_into_store, ItemStore, PersistedState};
use crate::sync::effects::{ApiCall, CollectEvent, Effect};
use crate::sync::events::{Event, LiveMessage, LocalAction, NetworkResponse, PortMessage};
use crate::sync::live::{is_own_echo, parse_deleted_id, parse_done_status};
use crate::sync::ranking::override_indices;
use crate::transport::{PostResponse, TransportError, UpdateResponse};

/// Complete application state plus the single transition function.
///
/// `update` is the only place state changes. It never performs I/O; the
/// returned effects are executed by the runtime, whose completions come
/// back in as further events.
#[derive(Debug, Clone)]
pub struct App {
    pub items: ItemStore,
    pub override_ordering: bool,
    pub filter_tags: Vec<FilterTag>,
    pub no_tags_filter_active: bool,
    pub geolocation: Option<Geolocation>,
    api_key: String,
    client_id: String,
    user_agent: String,
    policy: RevisionPolicy,
    /// A full-sync response with pending edits may push again only while set.
    /// Cleared by the re-push, set again by any other sync trigger.
    repush_armed: bool,
}

impl App {
    pub fn new(state: PersistedState, config: &CoreConfig) -> Self {
        let mut app = Self {
            items: state.items,
            override_ordering: state.override_ordering,
            filter_tags: state.filter_tags,
            no_tags_filter_active: state.no_tags_filter_active,
            geolocation: None,
            api_key: config.api_key.clone(),
            client_id: config.client_id.clone(),
            user_agent: config.user_agent.clone(),
            policy: config.revision_policy,
            repush_armed: true,
        };
        app.refresh_filter_tags();
        app
    }

    /// Restore state and schedule the start-up sync.
    pub fn init(state: PersistedState, config: &CoreConfig) -> (Self, Vec<Effect>) {
        let mut app = Self::new(state, config);
        let effects = vec![app.request_sync()];
        (app, effects)
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            items: self.items.clone(),
            override_ordering: self.override_ordering,
            filter_tags: self.filter_tags.clone(),
            no_tags_filter_active: self.no_tags_filter_active,
        }
    }

    pub fn visible_items(&self) -> Vec<&Item> {
        self.items.visible_items(
            &self.filter_tags,
            self.no_tags_filter_active,
            self.override_ordering,
        )
    }

    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Local(action) => self.on_local(action),
            Event::Network(response) => self.on_network(response),
            Event::Live(message) => self.on_live(message),
            Event::Port(message) => self.on_port(message),
        }
    }

    // ===== Effect builders =====

    fn persist(&self) -> Effect {
        Effect::WriteLocalStorage(self.persisted_state())
    }

    /// Full sync on behalf of a trigger other than a mismatch re-push.
    fn request_sync(&mut self) -> Effect {
        self.repush_armed = true;
        self.sync_effect()
    }

    fn sync_effect(&self) -> Effect {
        let items = self.items.by_default_order().into_iter().cloned().collect();
        Effect::Http(ApiCall::SyncItems { items })
    }

    fn sort_effect(&self) -> Effect {
        let (item_ids, titles) = self
            .items
            .iter()
            .map(|item| (item.id.clone(), item.title.clone()))
            .unzip();
        Effect::Http(ApiCall::Sort { item_ids, titles })
    }

    fn refresh_filter_tags(&mut self) {
        self.filter_tags = merge_filter_state(&self.filter_tags, &self.items.tag_names());
    }

    /// Persist when `changed`, nothing otherwise.
    fn persist_if(&self, changed: bool) -> Vec<Effect> {
        if changed {
            vec![self.persist()]
        } else {
            Vec::new()
        }
    }

    // ===== Local actions =====

    fn on_local(&mut self, action: LocalAction) -> Vec<Effect> {
        match action {
            LocalAction::ToggleEdit(id) => {
                let changed = self.items.toggle_edit(&id);
                self.persist_if(changed)
            }
            LocalAction::CancelEditing(id) => self.cancel_editing(&id),
            LocalAction::FinishEditing(id) => self.finish_editing(&id),
            LocalAction::AddItemClicked => vec![Effect::RequestItemId],
            LocalAction::ItemIdGenerated(uuid) => self.add_item(uuid),
            LocalAction::DraftTitleChanged { id, text } => {
                let changed = self.items.update_draft_title(&id, text);
                self.persist_if(changed)
            }
            LocalAction::DraftTagsChanged { id, tags } => {
                let changed = self.items.update_draft_tags(&id, tags);
                self.persist_if(changed)
            }
            LocalAction::DraftTagsInputChanged { id, text } => {
                let changed = self.items.update_draft_tags_input(&id, text);
                self.persist_if(changed)
            }
            LocalAction::ToggleDone(id) => self.toggle_done(&id),
            LocalAction::FilterClicked(tag) => {
                toggle_by_tag(&mut self.filter_tags, &tag);
                vec![self.persist()]
            }
            LocalAction::NoTagsFilterClicked => {
                self.no_tags_filter_active = !self.no_tags_filter_active;
                vec![self.persist()]
            }
            LocalAction::SortClicked => {
                if self.override_ordering {
                    self.override_ordering = false;
                    vec![self.persist()]
                } else {
                    vec![self.sort_effect()]
                }
            }
            LocalAction::DeleteItem(id) => {
                if self.items.contains(&id) {
                    vec![Effect::Http(ApiCall::DeleteItem { item_id: id })]
                } else {
                    Vec::new()
                }
            }
            LocalAction::DeleteAllDone => self
                .items
                .done_ids()
                .into_iter()
                .map(|item_id| Effect::Http(ApiCall::DeleteItem { item_id }))
                .collect(),
        }
    }

    fn add_item(&mut self, uuid: Uuid) -> Vec<Effect> {
        let id = format!("{}{}", LOCAL_ID_PREFIX, uuid);
        tracing::debug!("Creating local item {}", id);
        self.items.add_new_item(id);
        vec![self.persist()]
    }

    fn cancel_editing(&mut self, id: &str) -> Vec<Effect> {
        let Some(item) = self.items.get(id) else {
            return Vec::new();
        };
        if item.is_new {
            self.items.remove(id);
            self.refresh_filter_tags();
        } else if item.editing {
            self.items.toggle_edit(id);
        } else {
            return Vec::new();
        }
        vec![self.persist()]
    }

    fn finish_editing(&mut self, id: &str) -> Vec<Effect> {
        let Some(item) = self.items.get(id) else {
            return Vec::new();
        };
        let was_new = item.is_new;

        if !item.draft_has_changed() {
            if was_new {
                tracing::debug!("Discarding untouched new item {}", id);
                self.items.remove(id);
                self.refresh_filter_tags();
            } else {
                self.items.update(id, |item| item.editing = false);
            }
            return vec![self.persist()];
        }

        let policy = self.policy;
        self.items.update(id, |item| item.commit_draft(policy));
        self.refresh_filter_tags();

        let mut effects = vec![self.persist()];
        if let Some(item) = self.items.get(id).cloned() {
            let call = if was_new {
                ApiCall::CreateItem { item }
            } else {
                ApiCall::UpdateItem { item }
            };
            effects.push(Effect::Http(call));
        }
        if self.override_ordering {
            effects.push(self.sort_effect());
        }
        effects
    }

    fn toggle_done(&mut self, id: &str) -> Vec<Effect> {
        if !self.items.toggle_done(id) {
            return Vec::new();
        }
        self.items.set_synced(id, false);
        self.items.increment_client_revision(id, self.policy);
        let Some(item) = self.items.get(id) else {
            return Vec::new();
        };

        let collect = CollectEvent::for_item(item, self.geolocation, &self.user_agent, &self.api_key);
        vec![
            self.persist(),
            Effect::Http(ApiCall::UpdateDone {
                item_id: item.id.clone(),
                done: item.done,
            }),
            Effect::Http(ApiCall::Collect(collect)),
        ]
    }

    // ===== Network responses =====

    fn on_network(&mut self, response: NetworkResponse) -> Vec<Effect> {
        match response {
            NetworkResponse::ItemsReceived(result) => match result {
                Ok(raw) => self.items_received(&raw),
                Err(e) => {
                    tracing::warn!("Full sync failed: {}", e);
                    Vec::new()
                }
            },
            NetworkResponse::ItemPosted { local_id, result } => self.item_posted(&local_id, result),
            NetworkResponse::ItemUpdated { item_id, result } => self.item_updated(&item_id, result),
            NetworkResponse::DoneUpdated {
                item_id,
                done,
                result,
            } => match result {
                Ok(true) => {
                    // A later toggle is still in flight
                    let acknowledged = self.items.get(&item_id).is_some_and(|item| item.done == done);
                    let changed = acknowledged && self.items.set_synced(&item_id, true);
                    self.persist_if(changed)
                }
                Ok(false) => {
                    tracing::warn!("Server rejected done update for {}", item_id);
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!("Done update for {} failed: {}", item_id, e);
                    Vec::new()
                }
            },
            NetworkResponse::ItemDeleted { item_id, result } => match result {
                Ok(true) => {
                    if self.items.remove(&item_id).is_none() {
                        return Vec::new();
                    }
                    self.refresh_filter_tags();
                    vec![self.persist()]
                }
                Ok(false) => {
                    tracing::warn!("Server rejected delete of {}", item_id);
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!("Delete of {} failed: {}", item_id, e);
                    Vec::new()
                }
            },
            NetworkResponse::SortReceived { item_ids, result } => match result {
                Ok(sort_indices) => {
                    for (id, rank) in override_indices(&item_ids, &sort_indices) {
                        self.items.update(&id, |item| item.order_index_override = rank);
                    }
                    self.override_ordering = true;
                    vec![self.persist()]
                }
                Err(e) => {
                    tracing::warn!("Sort request failed: {}", e);
                    Vec::new()
                }
            },
            NetworkResponse::CollectSent(result) => {
                if let Err(e) = result {
                    tracing::debug!("Collect event not delivered: {}", e);
                }
                Vec::new()
            }
        }
    }

    fn items_received(&mut self, raw: &str) -> Vec<Effect> {
        let server_items = parse_received_items(raw);
        tracing::info!("Merging {} items from full sync", server_items.len());
        self.items = merge_into_store(server_items, &self.items);
        self.refresh_filter_tags();

        let mut effects = vec![self.persist()];
        if self.items.has_pending_edits() {
            if self.repush_armed {
                tracing::debug!("Local edits ahead of server, pushing full list again");
                self.repush_armed = false;
                effects.push(self.sync_effect());
            } else {
                tracing::warn!("Server still behind local edits after re-push, waiting for next sync");
            }
        }
        if self.override_ordering {
            effects.push(self.sort_effect());
        }
        effects
    }

    fn item_posted(
        &mut self,
        local_id: &str,
        result: Result<PostResponse, TransportError>,
    ) -> Vec<Effect> {
        let response = match result {
            Ok(response) if response.success => response,
            Ok(_) => {
                tracing::warn!("Server rejected creation of {}", local_id);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Creating {} failed: {}", local_id, e);
                return Vec::new();
            }
        };

        // A full sync may already have remapped the placeholder
        if self.items.rekey(local_id, &response.new_id) {
            tracing::debug!("Item {} is now {}", local_id, response.new_id);
        }
        let changed = self.items.update(&response.new_id, |item| {
            item.last_synced_revision = item.last_synced_revision.max(response.revision);
            item.is_new = false;
            item.synced = true;
        });
        self.persist_if(changed)
    }

    fn item_updated(
        &mut self,
        item_id: &str,
        result: Result<UpdateResponse, TransportError>,
    ) -> Vec<Effect> {
        match result {
            Ok(response) if response.success => {
                let changed = self.items.update(item_id, |item| {
                    item.last_synced_revision = item.last_synced_revision.max(response.revision);
                    item.synced = !item.has_pending_edits();
                });
                self.persist_if(changed)
            }
            Ok(_) => {
                tracing::warn!("Server rejected update of {}", item_id);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Updating {} failed: {}", item_id, e);
                Vec::new()
            }
        }
    }

    // ===== Live messages =====

    fn on_live(&mut self, message: LiveMessage) -> Vec<Effect> {
        match message {
            LiveMessage::NewItem(raw) => {
                if is_own_echo(&raw, &self.client_id) {
                    tracing::debug!("Skipping own new-item echo");
                    return Vec::new();
                }
                let Some(received) = ReceivedItem::parse(&raw) else {
                    return Vec::new();
                };
                if !self.items.add_received_item(received) {
                    return Vec::new();
                }
                self.refresh_filter_tags();
                let mut effects = vec![self.persist()];
                if self.override_ordering {
                    effects.push(self.sort_effect());
                }
                effects
            }
            LiveMessage::UpdatedItem(raw) => {
                if is_own_echo(&raw, &self.client_id) {
                    tracing::debug!("Skipping own updated-item echo");
                    return Vec::new();
                }
                let Some(received) = ReceivedItem::parse(&raw) else {
                    return Vec::new();
                };
                if !apply_remote_update(&mut self.items, received) {
                    return Vec::new();
                }
                self.refresh_filter_tags();
                vec![self.persist()]
            }
            LiveMessage::DoneStatus(raw) => {
                let Some(status) = parse_done_status(&raw) else {
                    return Vec::new();
                };
                if self.items.get(&status.id).is_some_and(|item| item.editing) {
                    tracing::debug!("Ignoring done status for {} while editing", status.id);
                    return Vec::new();
                }
                let changed = self.items.set_done(&status.id, status.status);
                self.persist_if(changed)
            }
            LiveMessage::DeletedItem(raw) => {
                let Some(id) = parse_deleted_id(&raw) else {
                    return Vec::new();
                };
                if self.items.remove(&id).is_none() {
                    return Vec::new();
                }
                self.refresh_filter_tags();
                vec![self.persist()]
            }
        }
    }

    // ===== Port messages =====

    fn on_port(&mut self, message: PortMessage) -> Vec<Effect> {
        match message {
            PortMessage::Geolocation(value) => {
                match Geolocation::parse(&value) {
                    Some(location) => self.geolocation = Some(location),
                    None => tracing::debug!("Ignoring malformed geolocation: {}", value),
                }
                Vec::new()
            }
            PortMessage::GotFocus => vec![self.request_sync()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DONE, NOT_DONE};
    use crate::models::ClientRevision;
    use serde_json::json;

    fn config() -> CoreConfig {
        CoreConfig {
            api_key: "key".to_string(),
            client_id: "dev-1".to_string(),
            user_agent: "test-agent".to_string(),
            ..CoreConfig::default()
        }
    }

    fn synced(id: &str, title: &str, tags: &[&str], done: u8, order: i64) -> Item {
        let received = ReceivedItem {
            id: id.to_string(),
            title: title.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            done,
            revision: 1,
            client_revision_was: None,
            old_id: None,
        };
        received.into_item(order)
    }

    fn app_with(items: Vec<Item>) -> App {
        let state = PersistedState {
            items: ItemStore::from_items(items),
            ..PersistedState::default()
        };
        App::new(state, &config())
    }

    fn http_calls(effects: &[Effect]) -> Vec<&ApiCall> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Http(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    fn writes(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| matches!(effect, Effect::WriteLocalStorage(_)))
            .count()
    }

    #[test]
    fn test_init_pushes_full_sync() {
        let (_, effects) = App::init(PersistedState::default(), &config());
        assert_eq!(effects, vec![Effect::Http(ApiCall::SyncItems { items: Vec::new() })]);
    }

    #[test]
    fn test_add_item_flow() {
        let mut app = app_with(Vec::new());
        let effects = app.update(LocalAction::AddItemClicked.into());
        assert_eq!(effects, vec![Effect::RequestItemId]);

        let uuid = Uuid::new_v4();
        let effects = app.update(LocalAction::ItemIdGenerated(uuid).into());
        assert_eq!(writes(&effects), 1);
        assert_eq!(app.items.len(), 1);

        let item = app.items.get(&format!("local-{}", uuid)).expect("created");
        assert!(item.is_new);
        assert!(item.editing);
        assert_eq!(item.order_index_default, 0);
    }

    #[test]
    fn test_finish_editing_new_item_creates() {
        let mut app = app_with(Vec::new());
        app.items.add_new_item("local-1".to_string());
        app.update(LocalAction::DraftTitleChanged { id: "local-1".to_string(), text: " Milk ".to_string() }.into());
        app.update(LocalAction::DraftTagsInputChanged { id: "local-1".to_string(), text: "dairy ".to_string() }.into());

        let effects = app.update(LocalAction::FinishEditing("local-1".to_string()).into());
        let item = app.items.get("local-1").expect("present");
        assert_eq!(item.title, "Milk");
        assert_eq!(item.tags, vec!["dairy".to_string()]);
        assert!(!item.editing);
        assert!(!item.synced);
        assert_eq!(item.client_revision, ClientRevision::Revision(0));
        assert_eq!(app.filter_tags, vec![FilterTag::inactive("dairy")]);

        match http_calls(&effects).as_slice() {
            [ApiCall::CreateItem { item }] => assert_eq!(item.title, "Milk"),
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[test]
    fn test_finish_editing_existing_item_updates() {
        let mut app = app_with(vec![synced("a", "Milk", &[], NOT_DONE, 0)]);
        app.override_ordering = true;
        app.update(LocalAction::ToggleEdit("a".to_string()).into());
        app.update(LocalAction::DraftTitleChanged { id: "a".to_string(), text: "Oat milk".to_string() }.into());

        let effects = app.update(LocalAction::FinishEditing("a".to_string()).into());
        let calls = http_calls(&effects);
        assert!(matches!(calls[0], ApiCall::UpdateItem { item } if item.title == "Oat milk"));
        assert!(matches!(calls[1], ApiCall::Sort { .. }));
        let item = app.items.get("a").expect("present");
        assert!(item.has_pending_edits());
    }

    #[test]
    fn test_finish_editing_without_changes() {
        let mut app = app_with(vec![synced("a", "Milk", &[], NOT_DONE, 0)]);
        app.items.add_new_item("local-1".to_string());
        app.update(LocalAction::ToggleEdit("a".to_string()).into());

        let effects = app.update(LocalAction::FinishEditing("a".to_string()).into());
        assert!(http_calls(&effects).is_empty());
        assert!(!app.items.get("a").is_some_and(|item| item.editing));

        let effects = app.update(LocalAction::FinishEditing("local-1".to_string()).into());
        assert!(http_calls(&effects).is_empty());
        assert!(!app.items.contains("local-1"));
    }

    #[test]
    fn test_cancel_editing() {
        let mut app = app_with(vec![synced("a", "Milk", &[], NOT_DONE, 0)]);
        app.items.add_new_item("local-1".to_string());
        app.update(LocalAction::ToggleEdit("a".to_string()).into());
        app.update(LocalAction::DraftTitleChanged { id: "a".to_string(), text: "Typo".to_string() }.into());

        let effects = app.update(LocalAction::CancelEditing("a".to_string()).into());
        assert!(http_calls(&effects).is_empty());
        let item = app.items.get("a").expect("present");
        assert!(!item.editing);
        assert_eq!(item.title, "Milk");
        assert_eq!(item.draft_title, "Milk");

        app.update(LocalAction::CancelEditing("local-1".to_string()).into());
        assert!(!app.items.contains("local-1"));
    }

    #[test]
    fn test_toggle_done_emits_update_and_collect() {
        let mut app = app_with(vec![synced("a", "Milk", &["dairy"], NOT_DONE, 0)]);
        app.update(PortMessage::Geolocation(json!({"latitude": 1.5, "longitude": 2.5})).into());

        let effects = app.update(LocalAction::ToggleDone("a".to_string()).into());
        let item = app.items.get("a").expect("present");
        assert_eq!(item.done, DONE);
        assert!(!item.synced);
        assert_eq!(item.client_revision, ClientRevision::Revision(2));
        assert_eq!(writes(&effects), 1);

        let calls = http_calls(&effects);
        assert_eq!(
            calls[0],
            &ApiCall::UpdateDone { item_id: "a".to_string(), done: DONE }
        );
        match calls[1] {
            ApiCall::Collect(event) => {
                assert_eq!(event.action_type, "CROSSED");
                assert_eq!(event.name, "Milk");
                assert_eq!(event.latitude, Some(1.5));
                assert_eq!(event.user_key, "key");
                assert_eq!(event.user_agent, "test-agent");
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_stale_done_ack_keeps_item_unsynced() {
        let mut app = app_with(vec![synced("a", "Milk", &[], NOT_DONE, 0)]);
        app.update(LocalAction::ToggleDone("a".to_string()).into());
        app.update(LocalAction::ToggleDone("a".to_string()).into());

        let effects = app.update(Event::Network(NetworkResponse::DoneUpdated {
            item_id: "a".to_string(),
            done: DONE,
            result: Ok(true),
        }));
        assert!(effects.is_empty());
        assert!(!app.items.get("a").expect("present").synced);

        let effects = app.update(Event::Network(NetworkResponse::DoneUpdated {
            item_id: "a".to_string(),
            done: NOT_DONE,
            result: Ok(true),
        }));
        assert_eq!(writes(&effects), 1);
        assert!(app.items.get("a").expect("present").synced);
    }

    #[test]
    fn test_toggle_done_legacy_policy_keeps_untracked() {
        let state = PersistedState {
            items: ItemStore::from_items([synced("a", "Milk", &[], NOT_DONE, 0)]),
            ..PersistedState::default()
        };
        let legacy = CoreConfig {
            revision_policy: RevisionPolicy::Legacy,
            ..config()
        };
        let mut app = App::new(state, &legacy);
        app.update(LocalAction::ToggleDone("a".to_string()).into());
        let item = app.items.get("a").expect("present");
        assert_eq!(item.done, DONE);
        assert_eq!(item.client_revision, ClientRevision::NoPendingEdits);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut app = app_with(vec![synced("a", "Milk", &[], NOT_DONE, 0)]);
        let before = app.persisted_state();
        for action in [
            LocalAction::ToggleDone("zzz".to_string()),
            LocalAction::ToggleEdit("zzz".to_string()),
            LocalAction::FinishEditing("zzz".to_string()),
            LocalAction::DeleteItem("zzz".to_string()),
        ] {
            assert!(app.update(action.into()).is_empty());
        }
        assert_eq!(app.persisted_state(), before);
    }

    #[test]
    fn test_delete_all_done_waits_for_confirmation() {
        let mut app = app_with(vec![
            synced("a", "A", &[], DONE, 0),
            synced("b", "B", &[], NOT_DONE, 1),
            synced("c", "C", &[], DONE, 2),
        ]);

        let effects = app.update(LocalAction::DeleteAllDone.into());
        let mut deleted: Vec<&str> = http_calls(&effects)
            .into_iter()
            .map(|call| match call {
                ApiCall::DeleteItem { item_id } => item_id.as_str(),
                other => panic!("unexpected call: {:?}", other),
            })
            .collect();
        deleted.sort();
        assert_eq!(deleted, vec!["a", "c"]);
        assert_eq!(app.items.len(), 3);

        app.update(NetworkResponse::ItemDeleted { item_id: "a".to_string(), result: Ok(true) }.into());
        app.update(NetworkResponse::ItemDeleted { item_id: "c".to_string(), result: Ok(false) }.into());
        app.update(
            NetworkResponse::ItemDeleted {
                item_id: "b".to_string(),
                result: Err(TransportError::Timeout),
            }
            .into(),
        );
        assert!(!app.items.contains("a"));
        assert!(app.items.contains("b"));
        assert!(app.items.contains("c"));
    }

    #[test]
    fn test_delete_refreshes_filter_tags() {
        let mut app = app_with(vec![
            synced("a", "A", &["dairy"], NOT_DONE, 0),
            synced("b", "B", &["bakery"], NOT_DONE, 1),
        ]);
        app.update(LocalAction::FilterClicked("dairy".to_string()).into());
        app.update(NetworkResponse::ItemDeleted { item_id: "a".to_string(), result: Ok(true) }.into());
        assert_eq!(app.filter_tags, vec![FilterTag::inactive("bakery")]);
    }

    #[test]
    fn test_item_posted_rekeys_placeholder() {
        let mut app = app_with(Vec::new());
        app.items.add_new_item("local-1".to_string());
        app.update(LocalAction::DraftTitleChanged { id: "local-1".to_string(), text: "Milk".to_string() }.into());
        app.update(LocalAction::FinishEditing("local-1".to_string()).into());

        let response = PostResponse { success: true, new_id: "srv-9".to_string(), revision: 0 };
        let effects = app.update(
            NetworkResponse::ItemPosted { local_id: "local-1".to_string(), result: Ok(response) }.into(),
        );
        assert_eq!(writes(&effects), 1);
        assert!(!app.items.contains("local-1"));
        let item = app.items.get("srv-9").expect("rekeyed");
        assert_eq!(item.old_id, "local-1");
        assert_eq!(item.last_synced_revision, 0);
        assert!(item.synced);
        assert!(!item.is_new);
        assert!(!item.has_pending_edits());
    }

    #[test]
    fn test_rejected_post_keeps_placeholder() {
        let mut app = app_with(Vec::new());
        app.items.add_new_item("local-1".to_string());
        let response = PostResponse { success: false, new_id: "srv-9".to_string(), revision: 0 };
        let effects = app.update(
            NetworkResponse::ItemPosted { local_id: "local-1".to_string(), result: Ok(response) }.into(),
        );
        assert!(effects.is_empty());
        assert!(app.items.contains("local-1"));
    }

    #[test]
    fn test_stale_update_ack_keeps_pending() {
        let mut item = synced("a", "Milk", &[], NOT_DONE, 0);
        item.client_revision = ClientRevision::Revision(4);
        item.synced = false;
        let mut app = app_with(vec![item]);

        let ack = UpdateResponse { success: true, revision: 3 };
        app.update(NetworkResponse::ItemUpdated { item_id: "a".to_string(), result: Ok(ack) }.into());
        let item = app.items.get("a").expect("present");
        assert_eq!(item.last_synced_revision, 3);
        assert!(!item.synced);

        let ack = UpdateResponse { success: true, revision: 4 };
        app.update(NetworkResponse::ItemUpdated { item_id: "a".to_string(), result: Ok(ack) }.into());
        let item = app.items.get("a").expect("present");
        assert_eq!(item.last_synced_revision, 4);
        assert!(item.synced);

        let ack = UpdateResponse { success: true, revision: 2 };
        app.update(NetworkResponse::ItemUpdated { item_id: "a".to_string(), result: Ok(ack) }.into());
        assert_eq!(app.items.get("a").map(|i| i.last_synced_revision), Some(4));
    }

    #[test]
    fn test_items_received_merges_and_repushes() {
        let mut pending = synced("a", "Local", &[], NOT_DONE, 0);
        pending.client_revision = ClientRevision::Revision(5);
        let mut app = app_with(vec![pending]);

        let raw = r#"[
            {"id":"a","title":"Remote","tags":[],"done":0,"revision":3},
            {"id":"x","title":"Eggs","tags":["fridge"],"done":0,"revision":7}
        ]"#;
        let effects = app.update(NetworkResponse::ItemsReceived(Ok(raw.to_string())).into());

        assert_eq!(app.items.get("a").map(|i| i.title.as_str()), Some("Local"));
        let eggs = app.items.get("x").expect("inserted");
        assert_eq!(eggs.order_index_default, 1);
        assert!(eggs.synced);
        assert_eq!(app.filter_tags, vec![FilterTag::inactive("fridge")]);
        assert_eq!(writes(&effects), 1);
        assert!(matches!(http_calls(&effects).as_slice(), [ApiCall::SyncItems { items }] if items.len() == 2));
    }

    #[test]
    fn test_repush_happens_once_per_sync() {
        let mut pending = synced("a", "Local", &[], NOT_DONE, 0);
        pending.client_revision = ClientRevision::Revision(5);
        let mut app = app_with(vec![pending]);
        let raw = r#"[{"id":"a","title":"Remote","tags":[],"done":0,"revision":3}]"#;

        let first = app.update(NetworkResponse::ItemsReceived(Ok(raw.to_string())).into());
        assert_eq!(http_calls(&first).len(), 1);
        let second = app.update(NetworkResponse::ItemsReceived(Ok(raw.to_string())).into());
        assert!(http_calls(&second).is_empty());

        app.update(PortMessage::GotFocus.into());
        let third = app.update(NetworkResponse::ItemsReceived(Ok(raw.to_string())).into());
        assert_eq!(http_calls(&third).len(), 1);
    }

    #[test]
    fn test_items_received_without_pending_does_not_repush() {
        let mut app = app_with(vec![synced("a", "Local", &[], NOT_DONE, 0)]);
        let raw = r#"[{"id":"a","title":"Remote","tags":[],"done":1,"revision":3}]"#;
        let effects = app.update(NetworkResponse::ItemsReceived(Ok(raw.to_string())).into());
        assert!(http_calls(&effects).is_empty());
        assert_eq!(app.items.get("a").map(|i| i.done), Some(DONE));
    }

    #[test]
    fn test_sync_failure_leaves_state() {
        let mut app = app_with(vec![synced("a", "Milk", &[], NOT_DONE, 0)]);
        let before = app.persisted_state();
        let effects = app.update(NetworkResponse::ItemsReceived(Err(TransportError::BadStatus(500))).into());
        assert!(effects.is_empty());
        assert_eq!(app.persisted_state(), before);
    }

    #[test]
    fn test_sort_round_trip() {
        let mut app = app_with(vec![
            synced("a", "Apples", &[], NOT_DONE, 0),
            synced("b", "Bread", &[], NOT_DONE, 1),
        ]);
        let effects = app.update(LocalAction::SortClicked.into());
        let (item_ids, titles) = match http_calls(&effects).as_slice() {
            [ApiCall::Sort { item_ids, titles }] => (item_ids.clone(), titles.clone()),
            other => panic!("unexpected calls: {:?}", other),
        };
        assert_eq!(titles, vec!["Apples".to_string(), "Bread".to_string()]);

        app.update(NetworkResponse::SortReceived { item_ids, result: Ok(vec![0, 1]) }.into());
        assert!(app.override_ordering);
        assert_eq!(app.items.get("a").map(|i| i.order_index_override), Some(1));
        assert_eq!(app.items.get("b").map(|i| i.order_index_override), Some(0));

        let effects = app.update(LocalAction::SortClicked.into());
        assert!(!app.override_ordering);
        assert!(http_calls(&effects).is_empty());
    }

    #[test]
    fn test_own_echo_is_suppressed() {
        let mut app = app_with(Vec::new());
        let before = app.persisted_state();
        let raw = r#"{"id":"x","title":"Eggs","tags":[],"done":0,"revision":1,"clientId":"dev-1"}"#;
        assert!(app.update(LiveMessage::NewItem(raw.to_string()).into()).is_empty());
        assert!(app.update(LiveMessage::UpdatedItem(raw.to_string()).into()).is_empty());
        assert_eq!(app.persisted_state(), before);
    }

    #[test]
    fn test_live_new_item_from_other_client() {
        let mut app = app_with(vec![synced("a", "A", &[], NOT_DONE, 3)]);
        let raw = r#"{"id":"x","title":"Eggs","tags":["fridge"],"done":0,"revision":1,"clientId":"dev-2"}"#;
        let effects = app.update(LiveMessage::NewItem(raw.to_string()).into());
        assert_eq!(writes(&effects), 1);
        let item = app.items.get("x").expect("inserted");
        assert_eq!(item.order_index_default, 4);
        assert_eq!(app.filter_tags, vec![FilterTag::inactive("fridge")]);
    }

    #[test]
    fn test_live_malformed_messages_are_dropped() {
        let mut app = app_with(vec![synced("a", "A", &[], NOT_DONE, 0)]);
        for message in [
            LiveMessage::NewItem("{".to_string()),
            LiveMessage::UpdatedItem("[]".to_string()),
            LiveMessage::DoneStatus(r#"{"id":"a"}"#.to_string()),
            LiveMessage::DeletedItem("null".to_string()),
        ] {
            assert!(app.update(message.into()).is_empty());
        }
        assert_eq!(app.items.len(), 1);
    }

    #[test]
    fn test_live_done_status_respects_editing() {
        let mut app = app_with(vec![
            synced("a", "A", &[], NOT_DONE, 0),
            synced("b", "B", &[], NOT_DONE, 1),
        ]);
        app.update(LocalAction::ToggleEdit("b".to_string()).into());

        app.update(LiveMessage::DoneStatus(r#"{"id":"a","status":1}"#.to_string()).into());
        app.update(LiveMessage::DoneStatus(r#"{"id":"b","status":1}"#.to_string()).into());
        assert_eq!(app.items.get("a").map(|i| i.done), Some(DONE));
        assert_eq!(app.items.get("b").map(|i| i.done), Some(NOT_DONE));
    }

    #[test]
    fn test_live_update_and_delete() {
        let mut app = app_with(vec![synced("a", "A", &["old"], NOT_DONE, 0)]);
        let raw = r#"{"id":"a","title":"A2","tags":["new"],"done":0,"revision":2,"clientId":"dev-2"}"#;
        app.update(LiveMessage::UpdatedItem(raw.to_string()).into());
        assert_eq!(app.items.get("a").map(|i| i.title.as_str()), Some("A2"));
        assert_eq!(app.filter_tags, vec![FilterTag::inactive("new")]);

        app.update(LiveMessage::DeletedItem(r#"{"id":"a"}"#.to_string()).into());
        assert!(app.items.is_empty());
        assert!(app.filter_tags.is_empty());
    }

    #[test]
    fn test_got_focus_pushes_sync() {
        let mut app = app_with(vec![
            synced("b", "B", &[], NOT_DONE, 1),
            synced("a", "A", &[], NOT_DONE, 0),
        ]);
        let effects = app.update(PortMessage::GotFocus.into());
        match http_calls(&effects).as_slice() {
            [ApiCall::SyncItems { items }] => {
                let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[test]
    fn test_filters_toggle_and_persist() {
        let mut app = app_with(vec![synced("a", "A", &["dairy"], NOT_DONE, 0)]);
        let effects = app.update(LocalAction::FilterClicked("dairy".to_string()).into());
        assert_eq!(writes(&effects), 1);
        assert!(app.filter_tags[0].is_active);

        app.update(LocalAction::NoTagsFilterClicked.into());
        assert!(app.no_tags_filter_active);
        let Effect::WriteLocalStorage(state) = app.update(LocalAction::NoTagsFilterClicked.into()).remove(0) else {
            panic!("expected a storage write");
        };
        assert!(!state.no_tags_filter_active);
    }
}
