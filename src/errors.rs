use thiserror::Error;

/// All errors that can occur in CipherCell.
///
/// Messages never carry key material or passwords.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    /// The AEAD tag did not verify. Wrong master password and tampered
    /// ciphertext are deliberately reported the same way.
    #[error("Authentication failed — wrong master password")]
    AuthenticationFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Lockout ---
    #[error("Too many failed attempts — try again in {remaining_secs}s")]
    LockedOut { remaining_secs: u64 },

    // --- Store errors ---
    #[error("Vault store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("No vault exists yet — run `ciphercell init` first")]
    VaultNotFound,

    #[error("A vault already exists")]
    VaultAlreadyExists,

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    // --- Session errors ---
    #[error("Cannot {operation} while the vault is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Vault is locked — unlock it first")]
    NotUnlocked,

    #[error("Session expired — the vault was locked, unlock again")]
    SessionExpired,

    #[error("Item '{0}' not found")]
    ItemNotFound(String),

    // --- Input validation ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Clipboard ---
    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl VaultError {
    /// Whether the caller may simply retry the same operation.
    ///
    /// Only store outages qualify; retrying a wrong password just burns
    /// more of the lockout budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::StoreUnavailable(_))
    }
}

/// Convenience type alias for CipherCell results.
pub type Result<T> = std::result::Result<T, VaultError>;
