//! Clipboard exposure guard.
//!
//! Copying a password puts it somewhere every other process can read, so
//! each copy is paired with a wipe 15 seconds later.  Only one wipe is ever
//! pending: copying again cancels the previous wipe and starts a fresh one.
//! A wipe that fails is logged and otherwise ignored.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{Result, VaultError};
use crate::timer::{TimerId, TimerSlot};

/// How long a copied secret stays on the clipboard.
pub const DEFAULT_CLEAR_AFTER: Duration = Duration::from_secs(15);

/// Somewhere text can be written for the user to paste.
pub trait ClipboardBackend: Send + Sync + 'static {
    fn write_text(&self, text: &str) -> Result<()>;

    /// Overwrite the clipboard with an empty value.
    fn clear(&self) -> Result<()> {
        self.write_text("")
    }
}

/// The operating system clipboard.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    clipboard: Mutex<Option<arboard::Clipboard>>,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                warn!("failed to initialize clipboard: {e}");
                None
            }
        };
        Self {
            clipboard: Mutex::new(clipboard),
        }
    }

    fn with_clipboard<T>(
        &self,
        op: impl FnOnce(&mut arboard::Clipboard) -> std::result::Result<T, arboard::Error>,
    ) -> Result<T> {
        let mut guard = self.clipboard.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(
                arboard::Clipboard::new()
                    .map_err(|e| VaultError::ClipboardError(format!("clipboard not available: {e}")))?,
            );
        }
        match guard.as_mut() {
            Some(cb) => op(cb).map_err(|e| VaultError::ClipboardError(e.to_string())),
            None => Err(VaultError::ClipboardError("clipboard not available".into())),
        }
    }
}

#[cfg(feature = "system-clipboard")]
impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "system-clipboard")]
impl ClipboardBackend for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        self.with_clipboard(|cb| cb.set_text(text))
    }

    fn clear(&self) -> Result<()> {
        self.with_clipboard(|cb| cb.clear())
    }
}

/// A clipboard that lives in process memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<String>,
    writes: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every write fail, as if the OS denied access.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(VaultError::ClipboardError("access denied".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut contents = self.contents.lock().unwrap_or_else(PoisonError::into_inner);
        contents.clear();
        contents.push_str(text);
        Ok(())
    }
}

/// Identifies one exposure; used to ask whether its wipe is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureHandle {
    id: TimerId,
}

struct GuardShared {
    backend: Arc<dyn ClipboardBackend>,
    clear_after: Duration,
    wipe: Mutex<TimerSlot>,
}

impl GuardShared {
    fn slot(&self) -> MutexGuard<'_, TimerSlot> {
        self.wipe.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wipe(&self, id: TimerId) {
        if !self.slot().release(id) {
            return;
        }
        match self.backend.clear() {
            Ok(()) => debug!("clipboard wiped"),
            Err(e) => warn!("could not wipe clipboard: {e}"),
        }
    }
}

impl Drop for GuardShared {
    fn drop(&mut self) {
        let slot = self.wipe.get_mut().unwrap_or_else(PoisonError::into_inner);
        if slot.cancel() {
            match self.backend.clear() {
                Ok(()) => debug!("clipboard wiped on guard drop"),
                Err(e) => warn!("could not wipe clipboard: {e}"),
            }
        }
    }
}

/// Puts secrets on the clipboard and takes them off again.
///
/// Dropping the last handle while a wipe is pending clears the clipboard
/// immediately.
///
/// Cloning yields another handle to the same guard.  Must be used from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct ClipboardGuard {
    shared: Arc<GuardShared>,
}

impl ClipboardGuard {
    pub fn new(backend: Arc<dyn ClipboardBackend>) -> Self {
        Self::with_clear_after(backend, DEFAULT_CLEAR_AFTER)
    }

    pub fn with_clear_after(backend: Arc<dyn ClipboardBackend>, clear_after: Duration) -> Self {
        Self {
            shared: Arc::new(GuardShared {
                backend,
                clear_after,
                wipe: Mutex::new(TimerSlot::new()),
            }),
        }
    }

    pub fn clear_after(&self) -> Duration {
        self.shared.clear_after
    }

    /// Copy `value` to the clipboard and schedule its wipe.
    ///
    /// Any wipe still pending from an earlier exposure is cancelled first.
    /// If the write itself fails nothing is scheduled.
    pub fn expose_secret(&self, value: &str) -> Result<ExposureHandle> {
        let mut slot = self.shared.slot();
        slot.cancel();

        self.shared.backend.write_text(value)?;

        let weak: Weak<GuardShared> = Arc::downgrade(&self.shared);
        let id = slot.arm(self.shared.clear_after, move |id| async move {
            if let Some(shared) = weak.upgrade() {
                shared.wipe(id);
            }
        });

        debug!(clear_after_secs = self.shared.clear_after.as_secs(), "secret copied to clipboard");
        Ok(ExposureHandle { id })
    }

    /// Whether the wipe scheduled by `handle` has yet to run.
    pub fn is_pending(&self, handle: &ExposureHandle) -> bool {
        let slot = self.shared.slot();
        slot.is_current(handle.id) && slot.is_pending()
    }

    /// Cancel the pending wipe and clear the clipboard right away.
    ///
    /// Returns whether a wipe was pending.
    pub fn wipe_now(&self) -> bool {
        let pending = self.shared.slot().cancel();
        if pending {
            if let Err(e) = self.shared.backend.clear() {
                warn!("could not wipe clipboard: {e}");
            }
        }
        pending
    }
}
