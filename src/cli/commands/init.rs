//! `ciphercell init`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Context};
use crate::errors::{Result, VaultError};
use crate::session::{SignupForm, VaultState};

/// Execute the `init` command.
pub async fn execute(cli: &Cli, email: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let session = ctx.open_session().await?;

    if session.state().await != VaultState::Uninitialized {
        output::tip("Use `ciphercell add` to add items to the existing vault.");
        return Err(VaultError::VaultAlreadyExists);
    }

    let email = match email {
        Some(email) => email.to_string(),
        None => dialoguer::Input::<String>::new()
            .with_prompt("Email (for security alerts)")
            .interact_text()
            .map_err(|e| VaultError::CommandFailed(format!("email prompt: {e}")))?,
    };

    let (password, confirm) = prompt_new_password()?;
    let form = SignupForm {
        email,
        password,
        confirm,
    };
    session.signup_with_form(&form).await?;

    output::success(&format!("Vault created at {}", ctx.store_location()));
    output::tip("The master password cannot be recovered. Keep it somewhere safe.");

    Ok(())
}
