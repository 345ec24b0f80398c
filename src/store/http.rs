//! Remote vault store over HTTP.
//!
//! Talks to the reference store API:
//!
//! - `GET  {base}/vault` → `{ "exists": bool, "vault"?: VaultRecord }`
//! - `POST {base}/vault` with the record as JSON → `{ "success": bool }`
//!
//! `ureq` is blocking, so every request runs on Tokio's blocking pool.

use tracing::debug;

use super::{FetchResponse, SaveResponse, VaultStore};
use crate::errors::{VaultError, Result};
use crate::vault::VaultRecord;

/// HTTP client for the vault store.
#[derive(Debug, Clone)]
pub struct HttpVaultStore {
    vault_url: String,
}

impl HttpVaultStore {
    /// Build a client for an API base such as `http://localhost:4000/api`.
    pub fn new(base_url: &str) -> Self {
        Self {
            vault_url: format!("{}/vault", base_url.trim_end_matches('/')),
        }
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }
}

fn user_agent() -> String {
    format!("ciphercell/{}", env!("CARGO_PKG_VERSION"))
}

fn unavailable(context: &str, e: impl std::fmt::Display) -> VaultError {
    VaultError::StoreUnavailable(format!("{context}: {e}"))
}

#[async_trait::async_trait]
impl VaultStore for HttpVaultStore {
    async fn fetch(&self) -> Result<FetchResponse> {
        let url = self.vault_url.clone();
        let response = tokio::task::spawn_blocking(move || -> Result<FetchResponse> {
            let mut response = ureq::get(&url)
                .header("User-Agent", &user_agent())
                .call()
                .map_err(|e| unavailable("GET vault", e))?;
            response
                .body_mut()
                .read_json::<FetchResponse>()
                .map_err(|e| unavailable("GET vault response", e))
        })
        .await
        .map_err(|e| unavailable("GET vault task", e))??;

        debug!(exists = response.exists, "vault store queried");
        Ok(response)
    }

    async fn save(&self, record: &VaultRecord) -> Result<SaveResponse> {
        let url = self.vault_url.clone();
        let record = record.clone();
        let response = tokio::task::spawn_blocking(move || -> Result<SaveResponse> {
            let mut response = ureq::post(&url)
                .header("User-Agent", &user_agent())
                .send_json(&record)
                .map_err(|e| unavailable("POST vault", e))?;
            response
                .body_mut()
                .read_json::<SaveResponse>()
                .map_err(|e| unavailable("POST vault response", e))
        })
        .await
        .map_err(|e| unavailable("POST vault task", e))??;

        debug!(success = response.success, "vault record pushed");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_vault_url_from_base() {
        assert_eq!(
            HttpVaultStore::new("http://localhost:4000/api/").vault_url(),
            "http://localhost:4000/api/vault"
        );
        assert_eq!(
            HttpVaultStore::new("https://vault.example").vault_url(),
            "https://vault.example/vault"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_store_unavailable() {
        let store = HttpVaultStore::new("http://127.0.0.1:9");
        let err = store.fetch().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
