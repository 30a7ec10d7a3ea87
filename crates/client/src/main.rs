//! `larder` command-line entry point.

use anyhow::{bail, Context};
use serde::Serialize;

use larder_client::commands;
use larder_client::{AppState, ClientConfig};
use larder_core::{FridgeId, ItemId};
use larder_inventory::{ItemDraft, ItemPatch};

const USAGE: &str = "usage:
  larder list <fridge>
  larder add <fridge> <name> <quantity> <category> [storage]
  larder remove <fridge> <id>...
  larder set-quantity <fridge> <id> <quantity>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    larder_observability::init();

    let config = ClientConfig::from_env().context("failed to resolve client configuration")?;
    let state = AppState::from_config(&config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["list", fridge] => {
            let items = commands::list_fridge_items(&state, &FridgeId::new(*fridge)).await?;
            print_json(&items)
        }
        ["add", fridge, name, quantity, category, rest @ ..] if rest.len() <= 1 => {
            let draft = ItemDraft {
                name: name.to_string(),
                quantity: quantity.to_string(),
                item_category: category.to_string(),
                storage_type: rest.first().copied().unwrap_or("Fridge").to_string(),
                ..ItemDraft::default()
            };
            let added =
                commands::add_items(&state, &FridgeId::new(*fridge), vec![draft], commands::today()).await?;
            print_json(&added)
        }
        ["remove", fridge, ids @ ..] if !ids.is_empty() => {
            let fridge = FridgeId::new(*fridge);
            commands::toggle_edit_mode(&state, &fridge).await?;
            for id in ids {
                if !commands::mark_for_deletion(&state, &ItemId::new(*id)).await {
                    tracing::warn!(item = %id, fridge = %fridge, "item not found in fridge, skipped");
                }
            }
            let (summary, items) = commands::commit_edits(&state).await?;
            tracing::info!(deleted = summary.deleted.len(), "remove finished");
            print_json(&items)
        }
        ["set-quantity", fridge, id, quantity] => {
            let fridge = FridgeId::new(*fridge);
            commands::toggle_edit_mode(&state, &fridge).await?;
            let patch = ItemPatch::default().with_quantity(*quantity);
            if !commands::update_locally(&state, &ItemId::new(*id), patch).await {
                commands::toggle_edit_mode(&state, &fridge).await?;
                bail!("item {id} is not in fridge {fridge}");
            }
            let (_, items) = commands::commit_edits(&state).await?;
            print_json(&items)
        }
        _ => bail!("{USAGE}"),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
