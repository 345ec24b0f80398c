use std::path::{Path, PathBuf};

use tracing::debug;

use super::{FetchResponse, SaveResponse, VaultStore};
use crate::errors::{VaultError, Result};
use crate::persist;
use crate::vault::VaultRecord;

/// Vault store backed by a single JSON file.
///
/// The file holds the `VaultRecord` exactly as it would travel over HTTP,
/// and is replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileVaultStore {
    path: PathBuf,
}

impl FileVaultStore {
    /// Name of the record file inside the vault directory.
    pub const FILE_NAME: &'static str = "vault.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The record file for a vault directory.
    pub fn in_dir(vault_dir: &Path) -> Self {
        Self::new(vault_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl VaultStore for FileVaultStore {
    async fn fetch(&self) -> Result<FetchResponse> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FetchResponse::missing());
            }
            Err(e) => {
                return Err(VaultError::StoreUnavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let record: VaultRecord = serde_json::from_slice(&data).map_err(|e| {
            VaultError::InvalidVaultFormat(format!("{}: {e}", self.path.display()))
        })?;

        Ok(FetchResponse::found(record))
    }

    async fn save(&self, record: &VaultRecord) -> Result<SaveResponse> {
        let bytes = serde_json::to_vec(record)
            .map_err(|e| VaultError::SerializationError(format!("vault record: {e}")))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist::write_atomic(&path, &bytes))
            .await
            .map_err(|e| VaultError::StoreUnavailable(format!("write task failed: {e}")))?
            .map_err(|e| {
                VaultError::StoreUnavailable(format!("cannot write {}: {e}", self.path.display()))
            })?;

        debug!(path = %self.path.display(), "vault record written");
        Ok(SaveResponse { success: true })
    }
}
