//! `ciphercell status`: show the vault's state without unlocking it.

use console::style;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::lockout::LockStatus;
use crate::session::VaultState;

/// Execute the `status` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let session = ctx.open_session().await?;

    println!("{} {}", style("Store:").bold(), ctx.store_location());

    match session.state().await {
        VaultState::Uninitialized => {
            output::info("No vault yet.");
            output::tip("Run `ciphercell init` to create one.");
            return Ok(());
        }
        state => println!("{} {state}", style("State:").bold()),
    }

    match session.lockout_status().await {
        LockStatus::Open => output::success("Unlocking is allowed."),
        LockStatus::Locked { remaining_secs } => {
            let attempts = session.lockout_state().await.failed_attempts;
            output::warning(&format!(
                "Locked out after {attempts} failed attempt(s) — try again in {remaining_secs}s."
            ));
        }
    }

    Ok(())
}
