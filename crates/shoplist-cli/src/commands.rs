use anyhow::{bail, Context, Result};
use serde_json::Value;
use shoplist_core::models::Item;
use shoplist_core::sync::{LiveMessage, LocalAction, PortMessage};
use shoplist_core::transport::HttpTransport;
use shoplist_core::{App, CoreConfig, CoreRuntime};
use tokio::io::{AsyncBufReadExt, BufReader};

pub enum CliCommand {
    List,
    Add { title: String, tags: Vec<String> },
    Edit {
        id: String,
        title: Option<String>,
        tags: Vec<String>,
    },
    Toggle { id: String },
    Delete { id: String },
    DeleteDone,
    Sync,
    Sort,
    Filter { tag: Option<String>, untagged: bool },
    Listen,
}

/// Start the core, apply one command, wait for the network to settle and
/// return the visible items.
pub async fn run_command(config: CoreConfig, command: CliCommand) -> Result<Value> {
    let transport = HttpTransport::new()?;
    let mut runtime = CoreRuntime::with_file_storage(config, transport)?;
    let handle = runtime.handle();
    runtime.run_until_idle().await;

    match command {
        CliCommand::List => {}
        CliCommand::Add { title, tags } => {
            handle.send(LocalAction::AddItemClicked)?;
            runtime.run_until_idle().await;
            let id = newest_draft(runtime.app()).context("Item was not created")?;

            handle.send(LocalAction::DraftTitleChanged {
                id: id.clone(),
                text: title,
            })?;
            handle.send(LocalAction::DraftTagsChanged {
                id: id.clone(),
                tags,
            })?;
            handle.send(LocalAction::FinishEditing(id))?;
        }
        CliCommand::Edit { id, title, tags } => {
            let editing = existing(runtime.app(), &id)?.editing;
            if !editing {
                handle.send(LocalAction::ToggleEdit(id.clone()))?;
            }
            if let Some(title) = title {
                handle.send(LocalAction::DraftTitleChanged {
                    id: id.clone(),
                    text: title,
                })?;
            }
            if !tags.is_empty() {
                handle.send(LocalAction::DraftTagsChanged {
                    id: id.clone(),
                    tags,
                })?;
            }
            handle.send(LocalAction::FinishEditing(id))?;
        }
        CliCommand::Toggle { id } => {
            existing(runtime.app(), &id)?;
            handle.send(LocalAction::ToggleDone(id))?;
        }
        CliCommand::Delete { id } => {
            existing(runtime.app(), &id)?;
            handle.send(LocalAction::DeleteItem(id))?;
        }
        CliCommand::DeleteDone => handle.send(LocalAction::DeleteAllDone)?,
        CliCommand::Sync => handle.send(PortMessage::GotFocus)?,
        CliCommand::Sort => handle.send(LocalAction::SortClicked)?,
        CliCommand::Filter { tag, untagged } => match (tag, untagged) {
            (_, true) => handle.send(LocalAction::NoTagsFilterClicked)?,
            (Some(tag), false) => handle.send(LocalAction::FilterClicked(tag))?,
            (None, false) => bail!("Either a tag or --untagged is required"),
        },
        CliCommand::Listen => listen(&mut runtime).await?,
    }

    runtime.run_until_idle().await;
    Ok(serde_json::to_value(runtime.app().visible_items())?)
}

fn existing<'a>(app: &'a App, id: &str) -> Result<&'a Item> {
    app.items
        .get(id)
        .with_context(|| format!("Unknown item {}", id))
}

/// Id of the most recently created item still waiting for its first commit.
fn newest_draft(app: &App) -> Option<String> {
    app.items
        .iter()
        .filter(|item| item.is_new && item.editing)
        .max_by_key(|item| item.order_index_default)
        .map(|item| item.id.clone())
}

/// Feed `<subject> <json>` lines from stdin until EOF.
async fn listen(runtime: &mut CoreRuntime<HttpTransport>) -> Result<()> {
    let handle = runtime.handle();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (subject, payload) = line
            .split_once(char::is_whitespace)
            .map(|(subject, payload)| (subject, payload.trim()))
            .unwrap_or((line, ""));

        match subject {
            "focus" => handle.send(PortMessage::GotFocus)?,
            "geolocation" => match serde_json::from_str::<Value>(payload) {
                Ok(value) => handle.send(PortMessage::Geolocation(value))?,
                Err(e) => tracing::warn!("Ignoring geolocation line: {}", e),
            },
            _ => match LiveMessage::from_subject(subject, payload) {
                Some(message) => handle.send(message)?,
                None => tracing::warn!(
                    "Unknown subject '{}', expected one of {:?}",
                    subject,
                    LiveMessage::SUBJECTS
                ),
            },
        }
        if !runtime.run_until_idle().await {
            break;
        }
    }
    Ok(())
}
