//! Vault store client: the boundary to wherever the sealed record lives.
//!
//! The store knows nothing about passwords or keys.  It exposes exactly two
//! operations, mirroring the reference HTTP API:
//!
//! - `GET  vault -> { exists, vault? }`
//! - `POST vault(record) -> { success }`
//!
//! Three implementations are provided:
//!
//! - [`FileVaultStore`]: one JSON document on local disk
//! - [`HttpVaultStore`]: the remote store over HTTP (feature `http-store`)
//! - [`MemoryVaultStore`]: in-process, for tests and embedding

mod file;
#[cfg(feature = "http-store")]
mod http;
mod memory;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::vault::VaultRecord;

pub use file::FileVaultStore;
#[cfg(feature = "http-store")]
pub use http::HttpVaultStore;
pub use memory::MemoryVaultStore;

/// Answer to a vault query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub exists: bool,
    #[serde(default, alias = "record", skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultRecord>,
}

impl FetchResponse {
    pub fn missing() -> Self {
        Self {
            exists: false,
            vault: None,
        }
    }

    pub fn found(record: VaultRecord) -> Self {
        Self {
            exists: true,
            vault: Some(record),
        }
    }

    /// The record, if the store reported one.
    pub fn into_record(self) -> Option<VaultRecord> {
        if self.exists {
            self.vault
        } else {
            None
        }
    }
}

/// Answer to a vault write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
}

/// Where the sealed vault record is kept.
///
/// Transport or storage failures surface as
/// [`VaultError::StoreUnavailable`](crate::errors::VaultError::StoreUnavailable).
/// Implementations never retry on their own.
#[async_trait::async_trait]
pub trait VaultStore: Send + Sync + 'static {
    /// Query the current record.
    async fn fetch(&self) -> Result<FetchResponse>;

    /// Replace the stored record.
    async fn save(&self, record: &VaultRecord) -> Result<SaveResponse>;
}
