//! The vault session: a state machine over one encrypted vault.
//!
//! ```text
//!   Loading ──► Uninitialized ──signup──► Locked ◄──────────────┐
//!      │                                    │  ▲                 │
//!      └────────── record exists ──────────►┘  └─ wrong password │
//!                                           │                    │
//!                                        unlock ──► Unlocked ────┘
//!                                                  logout / inactivity
//! ```
//!
//! All operations go through one async mutex, so unlock, signup, mutations
//! and logout never interleave; a second request waits for the first.
//! The session key and the decrypted vault only exist while `Unlocked` and
//! are wiped from memory when the session ends.
//!
//! An inactivity timer runs while unlocked.  Every mutation, clipboard copy
//! or explicit `record_activity` call re-arms it.  When it fires the session
//! locks itself; a mutation that was saving at that moment is reported as
//! `SessionExpired` and the caller has to unlock again.

mod signup;
mod state;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::audit::{ActivityEntry, ActivityKind, ActivityLog};
use crate::clipboard::{ClipboardGuard, ExposureHandle};
use crate::clock::{Clock, SystemClock};
use crate::crypto::{self, derive_key_with_params, generate_salt, VaultKey, SALT_LEN};
use crate::errors::{Result, VaultError};
use crate::lockout::{LockStatus, LockoutState, LockoutStore};
use crate::store::VaultStore;
use crate::timer::{TimerId, TimerSlot};
use crate::vault::{DecryptedVault, NewItem, StoredVault, VaultItem, VaultRecord};

pub use signup::{validate_master_password, SignupForm};
pub use state::{
    SessionConfig, UnlockOutcome, VaultState, DEFAULT_INACTIVITY_TIMEOUT, MIN_PASSWORD_LEN,
};

use state::SessionState;

struct Machine {
    state: VaultState,
    session: Option<SessionState>,
    vault: Option<DecryptedVault>,
    lockout: LockoutState,
    inactivity: TimerSlot,
    activity: ActivityLog,
}

impl Machine {
    /// Drop the key and the decrypted vault and go back to `Locked`.
    fn end_session(&mut self, kind: ActivityKind, now: DateTime<Utc>) {
        self.inactivity.cancel();
        self.session = None;
        self.vault = None;
        self.state = VaultState::Locked;
        self.activity.log(kind, None, now);
    }

    /// Confirm the session is unlocked and still usable.
    ///
    /// A fired inactivity timer whose lock has not run yet ends the session
    /// here.  So does an unlocked state without key material.
    fn ensure_live(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != VaultState::Unlocked {
            return Err(VaultError::NotUnlocked);
        }
        if self.inactivity.has_fired() {
            self.end_session(ActivityKind::AutoLocked, now);
            info!("vault auto-locked after inactivity");
            return Err(VaultError::SessionExpired);
        }
        if self.session.is_none() || self.vault.is_none() {
            self.end_session(ActivityKind::ForceLocked, now);
            warn!("session key missing while unlocked, vault locked");
            return Err(VaultError::NotUnlocked);
        }
        Ok(())
    }

    fn unlocked_vault(&self) -> Result<&DecryptedVault> {
        self.vault.as_ref().ok_or(VaultError::NotUnlocked)
    }
}

struct Shared {
    store: Arc<dyn VaultStore>,
    lockout_store: Arc<dyn LockoutStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    machine: Mutex<Machine>,
}

impl Shared {
    /// Run Argon2id on the blocking pool.
    async fn derive(&self, password: &str, salt: [u8; SALT_LEN]) -> Result<VaultKey> {
        let password = Zeroizing::new(password.to_owned());
        let params = self.config.kdf;
        tokio::task::spawn_blocking(move || {
            derive_key_with_params(password.as_bytes(), &salt, &params)
        })
        .await
        .map_err(|e| VaultError::KeyDerivationFailed(format!("key derivation task failed: {e}")))?
    }

    async fn push(&self, record: &VaultRecord) -> Result<()> {
        let response = self.store.save(record).await?;
        if !response.success {
            return Err(VaultError::StoreUnavailable(
                "vault store rejected the write".into(),
            ));
        }
        Ok(())
    }

    fn persist_lockout(&self, state: &LockoutState) {
        if let Err(e) = self.lockout_store.save(state) {
            warn!(error = %e, "could not persist lockout state");
        }
    }

    /// (Re)start the inactivity timer for the current session.
    fn arm_inactivity(self: &Arc<Self>, machine: &mut Machine) {
        let timeout = self.config.inactivity_timeout;
        let weak = Arc::downgrade(self);
        machine.inactivity.arm(timeout, move |id| async move {
            if let Some(shared) = weak.upgrade() {
                shared.auto_lock(id).await;
            }
        });

        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now);
        if let Some(session) = machine.session.as_mut() {
            session.expires_at = expires_at;
        }
    }

    async fn auto_lock(&self, id: TimerId) {
        let mut machine = self.machine.lock().await;
        if !machine.inactivity.release(id) {
            debug!("stale inactivity timer ignored");
            return;
        }
        if machine.state != VaultState::Unlocked {
            return;
        }
        machine.end_session(ActivityKind::AutoLocked, self.clock.now());
        info!(
            timeout_secs = self.config.inactivity_timeout.as_secs(),
            "vault auto-locked after inactivity"
        );
    }
}

/// Handle to a vault session.  Clones share the same session.
#[derive(Clone)]
pub struct VaultSession {
    shared: Arc<Shared>,
}

impl VaultSession {
    /// Create a session in the `Loading` state.
    ///
    /// Reads the persisted lockout state; a lock that has already expired
    /// is cleared and written back.  Call `check_existence` next.
    pub fn new(
        store: Arc<dyn VaultStore>,
        lockout_store: Arc<dyn LockoutStore>,
        config: SessionConfig,
    ) -> Result<Self> {
        Self::with_clock(store, lockout_store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn VaultStore>,
        lockout_store: Arc<dyn LockoutStore>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let stored = lockout_store.load()?;
        let lockout = stored.on_load(clock.now_ms());
        if lockout != stored {
            debug!(
                failed_attempts = stored.failed_attempts,
                "expired lockout cleared"
            );
            if let Err(e) = lockout_store.save(&lockout) {
                warn!(error = %e, "could not persist lockout state");
            }
        }

        let machine = Machine {
            state: VaultState::Loading,
            session: None,
            vault: None,
            lockout,
            inactivity: TimerSlot::new(),
            activity: ActivityLog::default(),
        };

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                lockout_store,
                clock,
                config,
                machine: Mutex::new(machine),
            }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Ask the store whether a vault exists and settle the state.
    ///
    /// From `Loading`, a store failure counts as "no vault" so the user is
    /// offered signup.  Later failures leave the state as it was.  An
    /// unlocked session is left alone.
    pub async fn check_existence(&self) -> VaultState {
        let mut machine = self.shared.machine.lock().await;
        if machine.state == VaultState::Unlocked {
            return machine.state;
        }

        match self.shared.store.fetch().await {
            Ok(response) => {
                machine.state = if response.into_record().is_some() {
                    VaultState::Locked
                } else {
                    VaultState::Uninitialized
                };
            }
            Err(e) if machine.state == VaultState::Loading => {
                warn!(error = %e, "vault store query failed, assuming no vault");
                machine.state = VaultState::Uninitialized;
            }
            Err(e) => {
                warn!(error = %e, state = %machine.state, "vault store query failed");
            }
        }

        debug!(state = %machine.state, "vault existence checked");
        machine.state
    }

    /// Create the vault: fresh salt, empty vault sealed under the derived
    /// key, record pushed to the store.  No session is started.
    pub async fn signup(&self, password: &str) -> Result<()> {
        let shared = &self.shared;
        let mut machine = shared.machine.lock().await;
        match machine.state {
            VaultState::Uninitialized => {}
            VaultState::Loading => {
                return Err(VaultError::InvalidState {
                    operation: "sign up",
                    state: VaultState::Loading.as_str(),
                })
            }
            VaultState::Locked | VaultState::Unlocked => {
                return Err(VaultError::VaultAlreadyExists)
            }
        }
        validate_master_password(password, shared.config.min_password_len)?;

        let salt = generate_salt();
        let key = shared.derive(password, salt).await?;
        let now = shared.clock.now();
        let envelope = crypto::seal(&key, &DecryptedVault::empty(now))?;
        drop(key);

        let record = VaultRecord {
            envelope,
            salt,
            created_at: now,
        };
        shared.push(&record).await?;

        machine.state = VaultState::Locked;
        machine.activity.log(ActivityKind::VaultCreated, None, now);
        info!("vault created");
        Ok(())
    }

    /// Validate a signup form, then sign up with its password.
    pub async fn signup_with_form(&self, form: &SignupForm) -> Result<()> {
        form.validate(self.shared.config.min_password_len)?;
        self.signup(&form.password).await
    }

    /// Try to open the vault with `password`.
    ///
    /// While locked out this returns immediately, without fetching the
    /// record or deriving a key.  A wrong password extends the lockout.
    pub async fn unlock(&self, password: &str) -> Result<UnlockOutcome> {
        if password.is_empty() {
            return Err(VaultError::InvalidInput(
                "master password cannot be empty".into(),
            ));
        }

        let shared = &self.shared;
        let mut machine = shared.machine.lock().await;
        match machine.state {
            VaultState::Locked => {}
            VaultState::Uninitialized => return Err(VaultError::VaultNotFound),
            state @ (VaultState::Loading | VaultState::Unlocked) => {
                return Err(VaultError::InvalidState {
                    operation: "unlock",
                    state: state.as_str(),
                })
            }
        }

        let now = shared.clock.now();
        if let LockStatus::Locked { remaining_secs } = machine.lockout.check(now.timestamp_millis())
        {
            machine.activity.log(ActivityKind::UnlockRejected, None, now);
            warn!(remaining_secs, "unlock rejected, locked out");
            return Ok(UnlockOutcome::LockedOut { remaining_secs });
        }

        let record = shared
            .store
            .fetch()
            .await?
            .into_record()
            .ok_or(VaultError::VaultNotFound)?;
        let key = shared.derive(password, record.salt).await?;

        let stored: StoredVault = match crypto::open(&key, &record.envelope) {
            Ok(stored) => stored,
            Err(VaultError::AuthenticationFailure) => {
                let now = shared.clock.now();
                let now_ms = now.timestamp_millis();
                machine.lockout = machine.lockout.record_failure(now_ms);
                shared.persist_lockout(&machine.lockout);
                machine.activity.log(ActivityKind::UnlockFailed, None, now);

                let locked_for_secs = machine.lockout.remaining_secs(now_ms);
                warn!(
                    failed_attempts = machine.lockout.failed_attempts,
                    locked_for_secs, "wrong master password"
                );
                return Ok(UnlockOutcome::WrongPassword { locked_for_secs });
            }
            Err(e) => return Err(e),
        };

        let now = shared.clock.now();
        let vault = DecryptedVault::from_stored(stored, now);
        let item_count = vault.items.len();

        if machine.lockout != LockoutState::default() {
            machine.lockout = LockoutState::reset();
            shared.persist_lockout(&machine.lockout);
        }
        machine.session = Some(SessionState {
            key,
            salt: record.salt,
            expires_at: now,
        });
        machine.vault = Some(vault);
        machine.state = VaultState::Unlocked;
        shared.arm_inactivity(&mut machine);
        machine.activity.log(ActivityKind::Unlocked, None, now);

        info!(item_count, "vault unlocked");
        Ok(UnlockOutcome::Unlocked)
    }

    /// Apply `change` to a copy of the vault, seal it, save it and only then
    /// make it the current vault.
    ///
    /// A failed save leaves the session unlocked with the previous contents.
    async fn mutate<T>(
        &self,
        kind: ActivityKind,
        change: impl FnOnce(&mut DecryptedVault) -> Result<(T, String)>,
    ) -> Result<T> {
        let shared = &self.shared;
        let mut machine = shared.machine.lock().await;
        machine.ensure_live(shared.clock.now())?;

        let mut next = machine.unlocked_vault()?.clone();
        let (value, item_id) = change(&mut next)?;

        let record = {
            let session = machine.session.as_ref().ok_or(VaultError::NotUnlocked)?;
            VaultRecord {
                envelope: crypto::seal(&session.key, &next)?,
                salt: session.salt,
                created_at: next.created_at,
            }
        };
        shared.push(&record).await?;

        let now = shared.clock.now();
        if machine.inactivity.has_fired() {
            machine.end_session(ActivityKind::AutoLocked, now);
            warn!(action = %kind, "vault auto-locked while saving, session discarded");
            return Err(VaultError::SessionExpired);
        }

        let item_count = next.items.len();
        machine.vault = Some(next);
        shared.arm_inactivity(&mut machine);
        machine.activity.log(kind, Some(item_id.as_str()), now);

        info!(action = %kind, item_count, "vault saved");
        Ok(value)
    }

    /// Add a new item and return it with its generated id.
    pub async fn add_item(&self, item: NewItem) -> Result<VaultItem> {
        self.mutate(ActivityKind::ItemAdded, move |vault| {
            let created = item.to_item()?;
            let id = created.id.clone();
            vault.add(created.clone())?;
            Ok((created, id))
        })
        .await
    }

    /// Replace the stored item that has the same id.
    pub async fn update_item(&self, item: VaultItem) -> Result<()> {
        self.mutate(ActivityKind::ItemUpdated, move |vault| {
            let id = item.id.clone();
            vault.update(item)?;
            Ok(((), id))
        })
        .await
    }

    /// Remove an item and return what was removed.
    pub async fn delete_item(&self, id: &str) -> Result<VaultItem> {
        self.mutate(ActivityKind::ItemDeleted, move |vault| {
            let removed = vault.remove(id)?;
            Ok((removed, id.to_string()))
        })
        .await
    }

    /// Lock the vault now.  Does nothing unless unlocked.
    pub async fn logout(&self) {
        let mut machine = self.shared.machine.lock().await;
        if machine.state != VaultState::Unlocked {
            return;
        }
        machine.end_session(ActivityKind::LoggedOut, self.shared.clock.now());
        info!("vault locked");
    }

    /// Note user activity and push the auto-lock back.
    ///
    /// Returns `false` if the session is no longer unlocked.
    pub async fn record_activity(&self) -> bool {
        let mut machine = self.shared.machine.lock().await;
        if machine.ensure_live(self.shared.clock.now()).is_err() {
            return false;
        }
        self.shared.arm_inactivity(&mut machine);
        true
    }

    pub async fn items(&self) -> Result<Vec<VaultItem>> {
        let mut machine = self.shared.machine.lock().await;
        machine.ensure_live(self.shared.clock.now())?;
        Ok(machine.unlocked_vault()?.items.clone())
    }

    pub async fn item(&self, id: &str) -> Result<VaultItem> {
        let mut machine = self.shared.machine.lock().await;
        machine.ensure_live(self.shared.clock.now())?;
        machine
            .unlocked_vault()?
            .get(id)
            .cloned()
            .ok_or_else(|| VaultError::ItemNotFound(id.to_string()))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<VaultItem>> {
        let mut machine = self.shared.machine.lock().await;
        machine.ensure_live(self.shared.clock.now())?;
        Ok(machine
            .unlocked_vault()?
            .search(query)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Put an item's password on the clipboard through `guard`.
    ///
    /// Counts as activity.
    pub async fn copy_password(&self, id: &str, guard: &ClipboardGuard) -> Result<ExposureHandle> {
        let shared = &self.shared;
        let mut machine = shared.machine.lock().await;
        machine.ensure_live(shared.clock.now())?;

        let handle = {
            let item = machine
                .unlocked_vault()?
                .get(id)
                .ok_or_else(|| VaultError::ItemNotFound(id.to_string()))?;
            guard.expose_secret(&item.password)?
        };

        shared.arm_inactivity(&mut machine);
        machine
            .activity
            .log(ActivityKind::SecretCopied, Some(id), shared.clock.now());
        Ok(handle)
    }

    pub async fn state(&self) -> VaultState {
        self.shared.machine.lock().await.state
    }

    /// The lockout gate as it stands now, for a countdown display.
    pub async fn lockout_status(&self) -> LockStatus {
        let now_ms = self.shared.clock.now_ms();
        self.shared.machine.lock().await.lockout.check(now_ms)
    }

    pub async fn lockout_state(&self) -> LockoutState {
        self.shared.machine.lock().await.lockout
    }

    /// When the session will auto-lock if nothing else happens.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        let machine = self.shared.machine.lock().await;
        machine.session.as_ref().map(|session| session.expires_at)
    }

    /// Recent security activity, newest first.
    pub async fn activity(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Vec<ActivityEntry> {
        self.shared.machine.lock().await.activity.query(limit, since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::crypto::kdf::MIN_MEMORY_KIB;
    use crate::crypto::Argon2Params;
    use crate::lockout::MemoryLockoutStore;
    use crate::store::MemoryVaultStore;

    const PASSWORD: &str = "correct-horse-battery";

    fn config() -> SessionConfig {
        SessionConfig {
            kdf: Argon2Params {
                memory_kib: MIN_MEMORY_KIB,
                iterations: 1,
                parallelism: 1,
            },
            ..SessionConfig::default()
        }
    }

    async fn unlocked() -> (Arc<MemoryVaultStore>, VaultSession) {
        let store = Arc::new(MemoryVaultStore::new());
        let session = VaultSession::with_clock(
            store.clone(),
            Arc::new(MemoryLockoutStore::new()),
            config(),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        )
        .unwrap();
        session.check_existence().await;
        session.signup(PASSWORD).await.unwrap();
        assert!(session.unlock(PASSWORD).await.unwrap().is_unlocked());
        (store, session)
    }

    #[tokio::test(start_paused = true)]
    async fn missing_key_material_forces_lock() {
        let (store, session) = unlocked().await;
        session.shared.machine.lock().await.session = None;

        let saves = store.save_count();
        let err = session.add_item(NewItem::new("Bank", "p1")).await.unwrap_err();
        assert!(matches!(err, VaultError::NotUnlocked));
        assert_eq!(store.save_count(), saves);
        assert_eq!(session.state().await, VaultState::Locked);

        let log = session.activity(1, None).await;
        assert_eq!(log[0].kind, ActivityKind::ForceLocked);
    }

    #[tokio::test(start_paused = true)]
    async fn fired_timer_is_honoured_before_its_lock_runs() {
        let (_store, session) = unlocked().await;

        // Hold the machine so the auto-lock callback has to queue.
        let mut machine = session.shared.machine.lock().await;
        tokio::time::sleep(DEFAULT_INACTIVITY_TIMEOUT + std::time::Duration::from_secs(1)).await;
        assert!(machine.inactivity.has_fired());

        let err = machine.ensure_live(Utc::now()).unwrap_err();
        assert!(matches!(err, VaultError::SessionExpired));
        assert_eq!(machine.state, VaultState::Locked);
        assert!(machine.session.is_none());
        drop(machine);

        tokio::task::yield_now().await;
        assert_eq!(session.state().await, VaultState::Locked);
        let auto_locks = session
            .activity(10, None)
            .await
            .iter()
            .filter(|entry| entry.kind == ActivityKind::AutoLocked)
            .count();
        assert_eq!(auto_locks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unlocked_session_sets_expiry() {
        let (_store, session) = unlocked().await;
        let expires = session.expires_at().await.unwrap();
        assert_eq!(
            expires.timestamp_millis(),
            1_700_000_000_000 + 180_000
        );
        session.logout().await;
        assert!(session.expires_at().await.is_none());
    }
}
