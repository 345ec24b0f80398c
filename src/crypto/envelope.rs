//! AES-256-GCM envelope encryption of JSON payloads.
//!
//! Each call to `seal` generates a fresh random 12-byte nonce.  The
//! ciphertext carries the 16-byte auth tag at its end, which is the layout
//! the `aes-gcm` API (and WebCrypto) produce:
//!
//! ```text
//! Envelope { iv: 12-byte nonce, ciphertext: encrypted JSON || 16-byte tag }
//! ```
//!
//! `open` has exactly one way to fail on a bad envelope:
//! [`VaultError::AuthenticationFailure`].  A wrong key, a flipped bit in the
//! nonce, ciphertext or tag, and a truncated envelope are indistinguishable.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::keys::VaultKey;
use crate::errors::{VaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// One sealed snapshot of a payload.
///
/// Byte fields serialize as JSON arrays of numbers so they survive plain
/// JSON transport unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Random nonce, unique per `seal` call.
    pub iv: [u8; NONCE_LEN],

    /// Ciphertext with the auth tag appended.
    #[serde(rename = "data")]
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// The trailing authentication tag, if the ciphertext is long enough
    /// to contain one.
    pub fn tag(&self) -> Option<&[u8]> {
        self.ciphertext
            .len()
            .checked_sub(TAG_LEN)
            .map(|start| &self.ciphertext[start..])
    }
}

/// Serialize `value` to JSON and seal it under `key`.
pub fn seal<T: Serialize + ?Sized>(key: &VaultKey, value: &T) -> Result<Envelope> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(value)
            .map_err(|e| VaultError::SerializationError(format!("vault payload: {e}")))?,
    );

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut iv = [0u8; NONCE_LEN];
    iv.copy_from_slice(nonce.as_slice());

    Ok(Envelope { iv, ciphertext })
}

/// Open an envelope produced by `seal` and parse the JSON payload.
///
/// Fails with `AuthenticationFailure` whenever the tag does not verify.
/// Nothing is parsed unless authentication succeeded.
pub fn open<T: DeserializeOwned>(key: &VaultKey, envelope: &Envelope) -> Result<T> {
    if envelope.tag().is_none() {
        return Err(VaultError::AuthenticationFailure);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::AuthenticationFailure)?;
    let nonce = Nonce::from_slice(&envelope.iv);

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(nonce, envelope.ciphertext.as_slice())
            .map_err(|_| VaultError::AuthenticationFailure)?,
    );

    // Authenticated but not a document we understand: the key was right,
    // so this must not be reported as a wrong password.
    serde_json::from_slice(&plaintext)
        .map_err(|e| VaultError::InvalidVaultFormat(format!("vault payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_is_last_sixteen_bytes() {
        let key = VaultKey::new([7u8; 32]);
        let envelope = seal(&key, &json!({"a": 1})).unwrap();
        let tag = envelope.tag().unwrap();
        assert_eq!(tag.len(), TAG_LEN);
        assert_eq!(tag, &envelope.ciphertext[envelope.ciphertext.len() - TAG_LEN..]);
    }

    #[test]
    fn truncated_envelope_is_an_authentication_failure() {
        let key = VaultKey::new([7u8; 32]);
        let envelope = Envelope {
            iv: [0u8; NONCE_LEN],
            ciphertext: vec![1, 2, 3],
        };
        assert!(envelope.tag().is_none());
        let result: Result<serde_json::Value> = open(&key, &envelope);
        assert!(matches!(result, Err(VaultError::AuthenticationFailure)));
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let key = VaultKey::new([9u8; 32]);
        let mut envelope = seal(&key, &json!(["x"])).unwrap();
        envelope.iv[0] ^= 0x01;
        let result: Result<serde_json::Value> = open(&key, &envelope);
        assert!(matches!(result, Err(VaultError::AuthenticationFailure)));
    }

    #[test]
    fn serializes_bytes_as_number_arrays() {
        let envelope = Envelope {
            iv: [1u8; NONCE_LEN],
            ciphertext: vec![250, 0, 17],
        };
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["iv"], json!([1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]));
        assert_eq!(wire["data"], json!([250, 0, 17]));
    }
}
