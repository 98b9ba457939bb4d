use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::store::{load_state, JsonFileStorage, LocalStorage};
use crate::sync::{ApiCall, App, Effect, Event, LocalAction, NetworkResponse};
use crate::transport::requests::{collect_body, done_body, item_data_body, sort_body, sync_body};
use crate::transport::responses::{decode, decode_sort_indices, decode_success};
use crate::transport::{Endpoints, Transport};

enum RuntimeCommand {
    Dispatch(Event),
    Shutdown,
}

/// Cloneable entry point for feeding events into a running `CoreRuntime`.
#[derive(Clone)]
pub struct CoreHandle {
    command_tx: UnboundedSender<RuntimeCommand>,
}

impl CoreHandle {
    pub fn send(&self, event: impl Into<Event>) -> Result<()> {
        self.command_tx
            .send(RuntimeCommand::Dispatch(event.into()))
            .map_err(|_| anyhow::anyhow!("Core runtime has stopped"))
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.send(RuntimeCommand::Shutdown);
    }
}

/// Single dispatch loop around `App`.
///
/// Events are applied one at a time. Storage writes happen inline, HTTP calls
/// are spawned on tokio and their completions re-enter the queue as
/// `Event::Network` in completion order.
pub struct CoreRuntime<T: Transport> {
    app: App,
    transport: Arc<T>,
    storage: Box<dyn LocalStorage>,
    endpoints: Endpoints,
    handle: CoreHandle,
    command_rx: UnboundedReceiver<RuntimeCommand>,
    startup_effects: Vec<Effect>,
    in_flight: usize,
}

impl<T: Transport> CoreRuntime<T> {
    pub fn new(config: CoreConfig, transport: T, storage: Box<dyn LocalStorage>) -> Self {
        let config = config.ensure_client_id();
        let state = load_state(storage.as_ref());
        tracing::info!(
            "Loaded {} items from local storage (client {})",
            state.items.len(),
            config.client_id
        );
        let (app, startup_effects) = App::init(state, &config);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            app,
            transport: Arc::new(transport),
            storage,
            endpoints: Endpoints::from_config(&config),
            handle: CoreHandle { command_tx },
            command_rx,
            startup_effects,
            in_flight: 0,
        }
    }

    /// Runtime persisting to `<dataDir>/local_store.json`.
    pub fn with_file_storage(config: CoreConfig, transport: T) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data dir {}", config.data_dir.display())
        })?;
        let storage = JsonFileStorage::new(&config.data_dir);
        Ok(Self::new(config, transport, Box::new(storage)))
    }

    pub fn handle(&self) -> CoreHandle {
        self.handle.clone()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Requests issued but not answered yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply one event and execute the resulting effects.
    pub fn dispatch(&mut self, event: Event) {
        self.flush_startup();
        if matches!(event, Event::Network(_)) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        for effect in self.app.update(event) {
            self.execute(effect);
        }
    }

    /// Process queued events until nothing is queued and no request is outstanding.
    /// Returns `false` if a shutdown was requested meanwhile.
    pub async fn run_until_idle(&mut self) -> bool {
        self.flush_startup();
        loop {
            while let Ok(command) = self.command_rx.try_recv() {
                if !self.handle_command(command) {
                    return false;
                }
            }
            if self.in_flight == 0 {
                return true;
            }
            match self.command_rx.recv().await {
                Some(command) => {
                    if !self.handle_command(command) {
                        return false;
                    }
                }
                None => return true,
            }
        }
    }

    /// Process events until `CoreHandle::shutdown` is called.
    pub async fn run(&mut self) {
        self.flush_startup();
        while let Some(command) = self.command_rx.recv().await {
            if !self.handle_command(command) {
                break;
            }
        }
        tracing::info!("Core runtime stopped with {} requests in flight", self.in_flight);
    }

    fn handle_command(&mut self, command: RuntimeCommand) -> bool {
        match command {
            RuntimeCommand::Dispatch(event) => {
                self.dispatch(event);
                true
            }
            RuntimeCommand::Shutdown => false,
        }
    }

    fn flush_startup(&mut self) {
        for effect in std::mem::take(&mut self.startup_effects) {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::WriteLocalStorage(state) => {
                let result = state.to_value().and_then(|value| self.storage.write(&value));
                if let Err(e) = result {
                    tracing::warn!("Failed to write local storage: {}", e);
                }
            }
            Effect::RequestItemId => {
                let _ = self
                    .handle
                    .command_tx
                    .send(RuntimeCommand::Dispatch(LocalAction::ItemIdGenerated(Uuid::new_v4()).into()));
            }
            Effect::Http(call) => {
                self.in_flight += 1;
                let transport = Arc::clone(&self.transport);
                let endpoints = self.endpoints.clone();
                let command_tx = self.handle.command_tx.clone();
                tokio::spawn(async move {
                    let response = perform_call(transport.as_ref(), &endpoints, call).await;
                    let _ = command_tx.send(RuntimeCommand::Dispatch(Event::Network(response)));
                });
            }
        }
    }
}

/// Execute one request and decode its answer into the matching response event.
pub async fn perform_call<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
    call: ApiCall,
) -> NetworkResponse {
    match call {
        ApiCall::SyncItems { items } => {
            let result = match endpoints.items_sync().and_then(|url| Ok((url, sync_body(&items)?))) {
                Ok((url, body)) => transport.post(&url, body).await,
                Err(e) => Err(e),
            };
            NetworkResponse::ItemsReceived(result)
        }
        ApiCall::CreateItem { item } => {
            let result = match endpoints.items() {
                Ok(url) => transport
                    .post(&url, item_data_body(&item))
                    .await
                    .and_then(|raw| decode(&raw)),
                Err(e) => Err(e),
            };
            NetworkResponse::ItemPosted {
                local_id: item.id,
                result,
            }
        }
        ApiCall::UpdateItem { item } => {
            let result = match endpoints.item(&item.id) {
                Ok(url) => transport
                    .update(&url, item_data_body(&item))
                    .await
                    .and_then(|raw| decode(&raw)),
                Err(e) => Err(e),
            };
            NetworkResponse::ItemUpdated {
                item_id: item.id,
                result,
            }
        }
        ApiCall::UpdateDone { item_id, done } => {
            let result = match endpoints.item_done(&item_id) {
                Ok(url) => transport
                    .update(&url, done_body(done))
                    .await
                    .and_then(|raw| decode_success(&raw)),
                Err(e) => Err(e),
            };
            NetworkResponse::DoneUpdated {
                item_id,
                done,
                result,
            }
        }
        ApiCall::DeleteItem { item_id } => {
            let result = match endpoints.item(&item_id) {
                Ok(url) => transport.delete(&url).await.and_then(|raw| decode_success(&raw)),
                Err(e) => Err(e),
            };
            NetworkResponse::ItemDeleted { item_id, result }
        }
        ApiCall::Collect(event) => {
            let result = match endpoints.collect().and_then(|url| Ok((url, collect_body(&event)?))) {
                Ok((url, body)) => transport.post(&url, body).await.map(|_| ()),
                Err(e) => Err(e),
            };
            NetworkResponse::CollectSent(result)
        }
        ApiCall::Sort { item_ids, titles } => {
            let result = match endpoints.sort() {
                Ok(url) => transport
                    .post(&url, sort_body(&titles))
                    .await
                    .and_then(|raw| decode_sort_indices(&raw)),
                Err(e) => Err(e),
            };
            NetworkResponse::SortReceived { item_ids, result }
        }
    }
}
