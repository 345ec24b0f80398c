//! Persistence for `LockoutState`.
//!
//! The lockout counter has to outlive the process, otherwise an attacker
//! could reset the backoff simply by restarting.  The file format is a tiny
//! JSON object with two named entries:
//!
//! ```text
//! { "failedAttempts": 3, "lockedUntil": 1700000060000 }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::LockoutState;
use crate::errors::{VaultError, Result};
use crate::persist;

/// Where the lockout state is kept between runs.
pub trait LockoutStore: Send + Sync + 'static {
    /// Read the stored state.  A missing entry reads as the zero state.
    fn load(&self) -> Result<LockoutState>;

    /// Overwrite the stored state.
    fn save(&self, state: &LockoutState) -> Result<()>;
}

/// Lockout state kept in a JSON file next to the vault.
#[derive(Debug, Clone)]
pub struct FileLockoutStore {
    path: PathBuf,
}

impl FileLockoutStore {
    /// Name of the lockout file inside the vault directory.
    pub const FILE_NAME: &'static str = "lockout.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The lockout file for a vault directory.
    pub fn in_dir(vault_dir: &Path) -> Self {
        Self::new(vault_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockoutStore for FileLockoutStore {
    fn load(&self) -> Result<LockoutState> {
        if !self.path.exists() {
            return Ok(LockoutState::default());
        }

        let contents = std::fs::read(&self.path)?;
        serde_json::from_slice(&contents).map_err(|e| {
            VaultError::SerializationError(format!(
                "lockout state at {}: {e}",
                self.path.display()
            ))
        })
    }

    fn save(&self, state: &LockoutState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| VaultError::SerializationError(format!("lockout state: {e}")))?;
        persist::write_atomic(&self.path, &bytes)
    }
}

/// In-memory lockout state, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryLockoutStore {
    state: Mutex<LockoutState>,
    saves: AtomicUsize,
}

impl MemoryLockoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, as if it had been persisted earlier.
    pub fn with_state(state: LockoutState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: AtomicUsize::new(0),
        }
    }

    /// The last state written.
    pub fn current(&self) -> LockoutState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How many times `save` was called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LockoutStore for MemoryLockoutStore {
    fn load(&self) -> Result<LockoutState> {
        Ok(self.current())
    }

    fn save(&self, state: &LockoutState) -> Result<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = *state;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
