//! `ciphercell copy`: put an item's password on the clipboard.
//!
//! The process stays alive until the wipe has run, so the password never
//! outlives the command on the clipboard.  Ctrl-C wipes immediately.

use std::sync::Arc;
use std::time::Duration;

use crate::cli::output;
use crate::cli::{unlock, Cli, Context};
use crate::clipboard::{ClipboardBackend, ClipboardGuard};
use crate::errors::{Result, VaultError};

/// The clipboard this build can talk to.
pub fn system_clipboard() -> Result<Arc<dyn ClipboardBackend>> {
    #[cfg(feature = "system-clipboard")]
    {
        Ok(Arc::new(crate::clipboard::SystemClipboard::new()))
    }
    #[cfg(not(feature = "system-clipboard"))]
    {
        Err(VaultError::ClipboardError(
            "this build has no clipboard support (feature `system-clipboard`)".into(),
        ))
    }
}

/// Execute the `copy` command.
pub async fn execute(cli: &Cli, id: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let guard = ClipboardGuard::with_clear_after(
        system_clipboard()?,
        ctx.settings.clipboard_clear_after(),
    );

    let session = ctx.open_session().await?;
    unlock(&session).await?;

    let copied = session.copy_password(id, &guard).await;
    let title = session.item(id).await.map(|item| item.title.clone());
    session.logout().await;
    let handle = copied?;

    let clear_after = guard.clear_after();
    output::success(&format!(
        "Copied password for '{}' — clipboard clears in {}s",
        title.unwrap_or_else(|_| id.to_string()),
        clear_after.as_secs()
    ));

    tokio::select! {
        _ = wait_for_wipe(&guard, &handle) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| VaultError::CommandFailed(format!("signal handler: {e}")))?;
            guard.wipe_now();
        }
    }

    output::info("Clipboard cleared.");
    Ok(())
}

async fn wait_for_wipe(guard: &ClipboardGuard, handle: &crate::clipboard::ExposureHandle) {
    tokio::time::sleep(guard.clear_after()).await;
    while guard.is_pending(handle) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
