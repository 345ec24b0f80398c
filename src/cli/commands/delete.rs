//! `ciphercell delete`: remove an item from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{unlock, Cli, Context};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub async fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete item '{id}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let ctx = Context::load(cli)?;
    let session = ctx.open_session().await?;
    unlock(&session).await?;

    let removed = session.delete_item(id).await;
    session.logout().await;
    let removed = removed?;

    output::success(&format!("Deleted '{}'", removed.title));
    Ok(())
}
