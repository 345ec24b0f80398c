use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{FetchResponse, SaveResponse, VaultStore};
use crate::errors::{VaultError, Result};
use crate::vault::VaultRecord;

/// In-process vault store.
///
/// Counts calls and can be told to fail, which lets tests observe exactly
/// what the session sent to the store (and what it did not).
#[derive(Debug, Default)]
pub struct MemoryVaultStore {
    record: Mutex<Option<VaultRecord>>,
    fetches: AtomicUsize,
    saves: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_save: AtomicBool,
    reject_save: AtomicBool,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record.
    pub fn with_record(record: VaultRecord) -> Self {
        let store = Self::default();
        *store.lock() = Some(record);
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<VaultRecord>> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The record currently held.
    pub fn record(&self) -> Option<VaultRecord> {
        self.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make `fetch` fail with `StoreUnavailable`.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make `save` fail with `StoreUnavailable`.
    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Make `save` answer `{ success: false }` without storing anything.
    pub fn set_reject_save(&self, reject: bool) {
        self.reject_save.store(reject, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl VaultStore for MemoryVaultStore {
    async fn fetch(&self) -> Result<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(VaultError::StoreUnavailable("memory store: fetch disabled".into()));
        }
        Ok(match self.record() {
            Some(record) => FetchResponse::found(record),
            None => FetchResponse::missing(),
        })
    }

    async fn save(&self, record: &VaultRecord) -> Result<SaveResponse> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(VaultError::StoreUnavailable("memory store: save disabled".into()));
        }
        if self.reject_save.load(Ordering::SeqCst) {
            return Ok(SaveResponse { success: false });
        }
        *self.lock() = Some(record.clone());
        Ok(SaveResponse { success: true })
    }
}
