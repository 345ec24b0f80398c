//! The at-rest vault record exchanged with the vault store.
//!
//! Wire shape (JSON):
//!
//! ```text
//! { "encryptedVault": { "iv": [..12], "data": [..] }, "salt": [..16], "createdAt": <epoch ms> }
//! ```
//!
//! Byte fields are arrays of numbers rather than strings so the record
//! survives plain JSON transport.  The store treats the record as opaque.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{Envelope, SALT_LEN};

/// One sealed vault plus the salt needed to re-derive its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    /// The sealed `DecryptedVault`.
    #[serde(rename = "encryptedVault")]
    pub envelope: Envelope,

    /// Argon2id salt, generated once at signup.
    pub salt: [u8; SALT_LEN],

    /// When the vault was first created.
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
