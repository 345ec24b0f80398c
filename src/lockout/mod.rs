//! Brute-force mitigation for unlock attempts.
//!
//! Every wrong master password bumps `failed_attempts` and locks unlocking
//! for a delay taken from a fixed table.  The delay grows with each
//! consecutive failure and then plateaus at five minutes:
//!
//! | attempt | delay |
//! |---------|-------|
//! | 1       | 15s   |
//! | 2       | 30s   |
//! | 3       | 60s   |
//! | 4       | 120s  |
//! | 5+      | 300s  |
//!
//! The policy is pure: it takes the current state and `now` (epoch ms) and
//! returns the next state.  Persistence lives in `store`.

pub mod store;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use store::{FileLockoutStore, LockoutStore, MemoryLockoutStore};

/// Backoff delay in seconds, indexed by `attempt - 1`.
pub const BACKOFF_SECS: [u64; 5] = [15, 30, 60, 120, 300];

/// Delay imposed after the `attempt`-th consecutive failure.
///
/// Attempt `0` means "no failures yet" and carries no delay.
pub fn delay_for(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let index = usize::try_from(attempt - 1)
        .unwrap_or(usize::MAX)
        .min(BACKOFF_SECS.len() - 1);
    Duration::from_secs(BACKOFF_SECS[index])
}

/// Persisted failure counter and lock deadline.
///
/// Serialized as two named entries; absent entries read as `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutState {
    #[serde(default)]
    pub failed_attempts: u32,
    /// Epoch milliseconds; `0` means not locked.
    #[serde(default)]
    pub locked_until: i64,
}

/// Result of checking the lockout gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Open,
    Locked { remaining_secs: u64 },
}

impl LockoutState {
    /// Register one more failed unlock at `now_ms`.
    #[must_use]
    pub fn record_failure(self, now_ms: i64) -> Self {
        let failed_attempts = self.failed_attempts.saturating_add(1);
        let delay_ms = i64::try_from(delay_for(failed_attempts).as_millis()).unwrap_or(i64::MAX);
        Self {
            failed_attempts,
            locked_until: now_ms.saturating_add(delay_ms),
        }
    }

    /// State after a successful unlock.
    #[must_use]
    pub fn reset() -> Self {
        Self::default()
    }

    /// Normalize a state just read from persistent storage.
    ///
    /// A lock that has already expired is cleared together with its
    /// counter; a lock that is still running survives untouched.
    #[must_use]
    pub fn on_load(self, now_ms: i64) -> Self {
        if self.locked_until <= now_ms {
            Self::default()
        } else {
            self
        }
    }

    pub fn is_locked(&self, now_ms: i64) -> bool {
        now_ms < self.locked_until
    }

    /// Whole seconds left on the lock, rounded up.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        let remaining_ms = self.locked_until.saturating_sub(now_ms);
        if remaining_ms <= 0 {
            return 0;
        }
        u64::try_from(remaining_ms).unwrap_or(u64::MAX).div_ceil(1_000)
    }

    pub fn check(&self, now_ms: i64) -> LockStatus {
        if self.is_locked(now_ms) {
            LockStatus::Locked {
                remaining_secs: self.remaining_secs(now_ms),
            }
        } else {
            LockStatus::Open
        }
    }
}
