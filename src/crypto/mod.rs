//! Cryptographic primitives for CipherCell.
//!
//! This module provides:
//! - Argon2id master-password key derivation (`kdf`)
//! - The zeroizing in-memory vault key (`keys`)
//! - AES-256-GCM envelope sealing of JSON payloads (`envelope`)

pub mod envelope;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key_with_params, ...};
pub use envelope::{open, seal, Envelope, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key_with_params, generate_salt, Argon2Params, SALT_LEN};
pub use keys::{VaultKey, KEY_LEN};
