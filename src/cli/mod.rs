//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::lockout::FileLockoutStore;
use crate::session::{UnlockOutcome, VaultSession, MIN_PASSWORD_LEN};
use crate::store::{FileVaultStore, VaultStore};

/// Environment variable that supplies the master password non-interactively.
pub const PASSWORD_ENV: &str = "CIPHERCELL_PASSWORD";

/// CipherCell CLI: a password vault that never lets the store see your keys.
#[derive(Parser)]
#[command(
    name = "ciphercell",
    about = "Client-side encrypted password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: `vault_dir` from .ciphercell.toml, else .ciphercell)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init {
        /// Email used for security alerts (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Show whether a vault exists and whether unlocking is locked out
    Status,

    /// List items (titles and usernames only)
    List {
        /// Only show items matching this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Add an item (the password is prompted for)
    Add {
        /// Item title (e.g. "Bank")
        title: String,
        #[arg(short, long)]
        username: Option<String>,
        /// Bank, Social, Work or Other
        #[arg(short, long, default_value = "Other")]
        category: String,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an item
    Delete {
        /// Item id (see `ciphercell list`)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Copy an item's password to the clipboard, wiping it shortly after
    Copy {
        /// Item id (see `ciphercell list`)
        id: String,
    },

    /// Unlock once and work interactively until you lock or go idle
    Shell,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Settings for the current directory plus the resolved vault directory.
pub struct Context {
    pub settings: Settings,
    pub vault_dir: PathBuf,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;
        let vault_dir = match &cli.vault_dir {
            Some(dir) => cwd.join(dir),
            None => settings.vault_dir_path(&cwd),
        };
        Ok(Self {
            settings,
            vault_dir,
        })
    }

    /// Where the sealed record is kept, as shown to the user.
    pub fn store_location(&self) -> String {
        match &self.settings.store_url {
            Some(url) => url.clone(),
            None => FileVaultStore::in_dir(&self.vault_dir)
                .path()
                .display()
                .to_string(),
        }
    }

    fn build_store(&self) -> Result<Arc<dyn VaultStore>> {
        match &self.settings.store_url {
            #[cfg(feature = "http-store")]
            Some(url) => Ok(Arc::new(crate::store::HttpVaultStore::new(url))),
            #[cfg(not(feature = "http-store"))]
            Some(_) => Err(VaultError::ConfigError(
                "store_url is set but this build has no HTTP support (feature `http-store`)"
                    .into(),
            )),
            None => Ok(Arc::new(FileVaultStore::in_dir(&self.vault_dir))),
        }
    }

    /// Build the session and settle its state against the store.
    pub async fn open_session(&self) -> Result<VaultSession> {
        let session = VaultSession::new(
            self.build_store()?,
            Arc::new(FileLockoutStore::in_dir(&self.vault_dir)),
            self.settings.session_config(),
        )?;
        session.check_existence().await;
        Ok(session)
    }
}

/// Unlock `session`, turning lockout and wrong-password outcomes into errors.
pub async fn unlock(session: &VaultSession) -> Result<()> {
    let password = prompt_password()?;
    match session.unlock(&password).await? {
        UnlockOutcome::Unlocked => Ok(()),
        UnlockOutcome::LockedOut { remaining_secs } => Err(VaultError::LockedOut { remaining_secs }),
        UnlockOutcome::WrongPassword { locked_for_secs } => {
            output::warning(&format!(
                "Unlocking is blocked for the next {locked_for_secs}s."
            ));
            Err(VaultError::AuthenticationFailure)
        }
    }
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Get the master password, trying in order:
/// 1. `CIPHERCELL_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used during `init`).
///
/// Also respects `CIPHERCELL_PASSWORD` for scripted usage.  Returns the
/// password and its confirmation.
pub fn prompt_new_password() -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    if let Some(pw) = password_from_env() {
        let confirm = pw.clone();
        return Ok((pw, confirm));
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        let confirm = Zeroizing::new(password.clone());
        return Ok((Zeroizing::new(password), confirm));
    }
}

/// Prompt for an item's password, hidden and confirmed.
pub fn prompt_item_password() -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt("Item password")
        .with_confirmation("Confirm item password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}
