//! `ciphercell shell`: unlock once and work interactively.
//!
//! Prompts run on the blocking pool so the inactivity timer keeps ticking
//! while the user is idle.  When it fires the vault locks and the next
//! answer is met with a fresh password prompt.

use dialoguer::{Confirm, Input, Select};

use crate::cli::commands::copy::system_clipboard;
use crate::cli::output;
use crate::cli::{prompt_item_password, unlock, Cli, Context};
use crate::clipboard::ClipboardGuard;
use crate::errors::{Result, VaultError};
use crate::session::{VaultSession, VaultState};
use crate::vault::{Category, NewItem, VaultItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    List,
    Search,
    Add,
    Copy,
    Delete,
    Activity,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::List,
        Action::Search,
        Action::Add,
        Action::Copy,
        Action::Delete,
        Action::Activity,
        Action::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            Action::List => "List items",
            Action::Search => "Search",
            Action::Add => "Add item",
            Action::Copy => "Copy a password",
            Action::Delete => "Delete item",
            Action::Activity => "Recent activity",
            Action::Quit => "Lock and quit",
        }
    }
}

/// Run a blocking prompt without stalling the runtime.
async fn ask<T, F>(prompt: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| VaultError::CommandFailed(format!("prompt task: {e}")))?
}

fn prompt_error(e: dialoguer::Error) -> VaultError {
    VaultError::CommandFailed(format!("prompt: {e}"))
}

fn pick_action() -> Result<Action> {
    let labels: Vec<&str> = Action::ALL.iter().map(|a| a.label()).collect();
    let index = Select::new()
        .with_prompt("What next?")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    Ok(Action::ALL[index])
}

fn pick_item(items: Vec<VaultItem>) -> Result<Option<String>> {
    if items.is_empty() {
        output::info("No items in this vault yet.");
        return Ok(None);
    }
    let labels: Vec<String> = items
        .iter()
        .map(|item| match &item.username {
            Some(user) => format!("{} ({user})", item.title),
            None => item.title.clone(),
        })
        .collect();
    let index = Select::new()
        .with_prompt("Which item?")
        .items(&labels)
        .default(0)
        .interact_opt()
        .map_err(prompt_error)?;
    Ok(index.map(|i| items[i].id.clone()))
}

fn prompt_new_item() -> Result<NewItem> {
    let title: String = Input::new()
        .with_prompt("Title")
        .interact_text()
        .map_err(prompt_error)?;
    let username: String = Input::new()
        .with_prompt("Username (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    let category_labels: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    let category = Select::new()
        .with_prompt("Category")
        .items(&category_labels)
        .default(Category::ALL.len() - 1)
        .interact()
        .map_err(prompt_error)?;
    let password = prompt_item_password()?;
    let notes: String = Input::new()
        .with_prompt("Notes (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;

    Ok(NewItem::new(title, password.as_str())
        .with_username(username)
        .with_notes(notes)
        .with_category(Category::ALL[category]))
}

fn confirm(prompt: String) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_error)
}

/// Returns `false` when the user asked to quit.
async fn run_action(
    session: &VaultSession,
    guard: Option<&ClipboardGuard>,
    action: Action,
) -> Result<bool> {
    match action {
        Action::List => output::print_items_table(&session.items().await?),
        Action::Search => {
            let query: String =
                ask(|| Input::<String>::new().with_prompt("Search for").interact_text().map_err(prompt_error))
                    .await?;
            output::print_items_table(&session.search(&query).await?);
        }
        Action::Add => {
            let item = ask(prompt_new_item).await?;
            let created = session.add_item(item).await?;
            output::success(&format!("Added '{}'", created.title));
        }
        Action::Copy => {
            let Some(guard) = guard else {
                output::warning("No clipboard available.");
                return Ok(true);
            };
            let items = session.items().await?;
            if let Some(id) = ask(move || pick_item(items)).await? {
                session.copy_password(&id, guard).await?;
                output::success(&format!(
                    "Password copied — clipboard clears in {}s",
                    guard.clear_after().as_secs()
                ));
            }
        }
        Action::Delete => {
            let items = session.items().await?;
            if let Some(id) = ask(move || pick_item(items)).await? {
                let question = format!("Delete item '{id}'?");
                if ask(move || confirm(question)).await? {
                    let removed = session.delete_item(&id).await?;
                    output::success(&format!("Deleted '{}'", removed.title));
                }
            }
        }
        Action::Activity => output::print_activity_table(&session.activity(20, None).await),
        Action::Quit => return Ok(false),
    }
    Ok(true)
}

/// Offer to unlock again after an auto-lock.  Returns `false` to quit.
async fn relock_prompt(session: &VaultSession) -> Result<bool> {
    output::warning("Vault locked after inactivity.");
    if !ask(|| confirm("Unlock again?".to_string())).await? {
        return Ok(false);
    }
    unlock(session).await?;
    Ok(true)
}

/// Execute the `shell` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let session = ctx.open_session().await?;
    if session.state().await == VaultState::Uninitialized {
        output::tip("Run `ciphercell init` to create a vault first.");
        return Err(VaultError::VaultNotFound);
    }

    let guard = match system_clipboard() {
        Ok(backend) => Some(ClipboardGuard::with_clear_after(
            backend,
            ctx.settings.clipboard_clear_after(),
        )),
        Err(e) => {
            output::warning(&e.to_string());
            None
        }
    };

    let timeout_secs = ctx.settings.inactivity_timeout_secs;
    run_then_close(
        &session,
        guard.as_ref(),
        interact(&session, guard.as_ref(), timeout_secs),
    )
    .await
}

/// Drive `body` until it finishes or Ctrl-C arrives, then wipe the
/// clipboard and lock the vault whatever the outcome.
async fn run_then_close<F>(
    session: &VaultSession,
    guard: Option<&ClipboardGuard>,
    body: F,
) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let outcome = tokio::select! {
        result = body => result,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => Err(VaultError::CommandFailed("interrupted".into())),
            Err(e) => Err(VaultError::CommandFailed(format!("signal handler: {e}"))),
        },
    };

    if let Some(guard) = guard {
        guard.wipe_now();
    }
    session.logout().await;
    output::success("Vault locked.");
    outcome
}

async fn interact(
    session: &VaultSession,
    guard: Option<&ClipboardGuard>,
    timeout_secs: u64,
) -> Result<()> {
    unlock(session).await?;
    output::success("Vault unlocked.");
    output::tip(&format!("It locks itself after {timeout_secs}s without input."));

    loop {
        let action = ask(pick_action).await?;
        if !session.record_activity().await {
            if relock_prompt(session).await? {
                continue;
            }
            return Ok(());
        }

        match run_action(session, guard, action).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(VaultError::SessionExpired | VaultError::NotUnlocked) => {
                if !relock_prompt(session).await? {
                    return Ok(());
                }
            }
            Err(e) => output::error(&e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::clipboard::MemoryClipboard;
    use crate::crypto::kdf::MIN_MEMORY_KIB;
    use crate::crypto::Argon2Params;
    use crate::lockout::MemoryLockoutStore;
    use crate::session::SessionConfig;
    use crate::store::MemoryVaultStore;

    const PASSWORD: &str = "correct-horse-battery";

    async fn unlocked_session() -> VaultSession {
        let config = SessionConfig {
            kdf: Argon2Params {
                memory_kib: MIN_MEMORY_KIB,
                iterations: 1,
                parallelism: 1,
            },
            ..SessionConfig::default()
        };
        let session = VaultSession::new(
            Arc::new(MemoryVaultStore::new()),
            Arc::new(MemoryLockoutStore::new()),
            config,
        )
        .unwrap();
        session.check_existence().await;
        session.signup(PASSWORD).await.unwrap();
        assert!(session.unlock(PASSWORD).await.unwrap().is_unlocked());
        session
    }

    #[tokio::test]
    async fn failed_shell_still_wipes_and_locks() {
        let session = unlocked_session().await;
        let clipboard = Arc::new(MemoryClipboard::new());
        let guard = ClipboardGuard::new(clipboard.clone());
        let item = session.add_item(NewItem::new("Bank", "p1")).await.unwrap();

        let result = run_then_close(&session, Some(&guard), async {
            session.copy_password(&item.id, &guard).await?;
            Err::<(), VaultError>(VaultError::CommandFailed("prompt: interrupted".into()))
        })
        .await;

        assert!(matches!(result, Err(VaultError::CommandFailed(_))));
        assert_eq!(clipboard.contents(), "");
        assert_eq!(session.state().await, VaultState::Locked);
    }

    #[tokio::test]
    async fn finished_shell_wipes_and_locks() {
        let session = unlocked_session().await;
        let clipboard = Arc::new(MemoryClipboard::new());
        let guard = ClipboardGuard::new(clipboard.clone());
        let item = session.add_item(NewItem::new("Bank", "p1")).await.unwrap();

        run_then_close(&session, Some(&guard), async {
            session.copy_password(&item.id, &guard).await?;
            Ok::<(), VaultError>(())
        })
        .await
        .unwrap();

        assert_eq!(clipboard.contents(), "");
        assert_eq!(session.state().await, VaultState::Locked);
    }
}
