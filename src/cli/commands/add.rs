//! `ciphercell add`: add an item to the vault.

use crate::cli::output;
use crate::cli::{prompt_item_password, unlock, Cli, Context};
use crate::errors::Result;
use crate::vault::{Category, NewItem};

/// Execute the `add` command.
pub async fn execute(
    cli: &Cli,
    title: &str,
    username: Option<&str>,
    category: &str,
    notes: Option<&str>,
) -> Result<()> {
    // Parse before any prompting so a typo fails fast.
    let category: Category = category.parse()?;

    let ctx = Context::load(cli)?;
    let session = ctx.open_session().await?;
    unlock(&session).await?;

    let password = prompt_item_password()?;
    let mut item = NewItem::new(title, password.as_str()).with_category(category);
    if let Some(username) = username {
        item = item.with_username(username);
    }
    if let Some(notes) = notes {
        item = item.with_notes(notes);
    }

    let created = session.add_item(item).await;
    session.logout().await;
    let created = created?;

    output::success(&format!("Added '{}' ({})", created.title, created.id));
    Ok(())
}
