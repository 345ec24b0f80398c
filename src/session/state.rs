//! Session configuration, lifecycle states and unlock outcomes.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::crypto::{Argon2Params, VaultKey, SALT_LEN};

/// Idle time after which an unlocked vault locks itself.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(180);

/// Shortest master password accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 12;

/// Tunables for a `VaultSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub kdf: Argon2Params,
    pub inactivity_timeout: Duration,
    pub min_password_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            kdf: Argon2Params::default(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            min_password_len: MIN_PASSWORD_LEN,
        }
    }
}

/// Where the vault is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultState {
    /// The store has not been queried yet.
    Loading,
    /// No vault exists; signup is the only way forward.
    Uninitialized,
    Locked,
    Unlocked,
}

impl VaultState {
    pub fn as_str(self) -> &'static str {
        match self {
            VaultState::Loading => "loading",
            VaultState::Uninitialized => "uninitialized",
            VaultState::Locked => "locked",
            VaultState::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for VaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an unlock attempt led to.
///
/// Being locked out and typing the wrong password are ordinary outcomes,
/// not errors: the caller shows a countdown in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    /// Rejected before the store or the KDF were touched.
    LockedOut { remaining_secs: u64 },
    /// The password did not open the vault; unlocking is now blocked for
    /// `locked_for_secs`.
    WrongPassword { locked_for_secs: u64 },
}

impl UnlockOutcome {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockOutcome::Unlocked)
    }
}

/// Key material for one unlocked session.  Lives only in memory.
pub(crate) struct SessionState {
    pub(crate) key: VaultKey,
    pub(crate) salt: [u8; SALT_LEN],
    pub(crate) expires_at: DateTime<Utc>,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("key", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_locks_after_three_minutes() {
        let config = SessionConfig::default();
        assert_eq!(config.inactivity_timeout, Duration::from_secs(180));
        assert_eq!(config.min_password_len, 12);
    }

    #[test]
    fn session_debug_hides_key() {
        let session = SessionState {
            key: VaultKey::new([0xAB; 32]),
            salt: [1; SALT_LEN],
            expires_at: Utc::now(),
        };
        let shown = format!("{session:?}");
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains("171, 171"));
    }
}
