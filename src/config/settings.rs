use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::Argon2Params;
use crate::errors::{Result, VaultError};
use crate::session::{SessionConfig, MIN_PASSWORD_LEN};

/// Upper bound for both timeouts (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Project-level configuration, loaded from `.ciphercell.toml`.
///
/// Every field has a sensible default so CipherCell works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding the vault record and
    /// the lockout state.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Base URL of a remote vault store, e.g. `http://localhost:4000/api`.
    /// When unset the record is kept in `vault_dir`.
    #[serde(default)]
    pub store_url: Option<String>,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Idle seconds before an unlocked vault locks itself.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Seconds a copied password stays on the clipboard.
    #[serde(default = "default_clipboard_clear_secs")]
    pub clipboard_clear_secs: u64,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".ciphercell".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_inactivity_timeout_secs() -> u64 {
    180
}

fn default_clipboard_clear_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            store_url: None,
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            clipboard_clear_secs: default_clipboard_clear_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".ciphercell.toml";

    /// Load settings from `<project_dir>/.ciphercell.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("inactivity_timeout_secs", self.inactivity_timeout_secs),
            ("clipboard_clear_secs", self.clipboard_clear_secs),
        ] {
            if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
                return Err(VaultError::ConfigError(format!(
                    "{name} must be between 1 and {MAX_TIMEOUT_SECS} (got {value})"
                )));
            }
        }
        Ok(())
    }

    /// The directory holding `vault.json` and `lockout.json`.
    ///
    /// Example: `project_dir/.ciphercell`
    pub fn vault_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            kdf: self.argon2_params(),
            inactivity_timeout: Duration::from_secs(self.inactivity_timeout_secs),
            min_password_len: MIN_PASSWORD_LEN,
        }
    }

    pub fn clipboard_clear_after(&self) -> Duration {
        Duration::from_secs(self.clipboard_clear_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
