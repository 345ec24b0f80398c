//! Vault module: the vault document and its sealed record.
//!
//! This module provides:
//! - `DecryptedVault`, `VaultItem`, `NewItem` and `Category` (`model`)
//! - The at-rest `VaultRecord` exchanged with the store (`record`)

pub mod model;
pub mod record;

// Re-export the most commonly used items.
pub use model::{Category, DecryptedVault, NewItem, StoredVault, VaultItem, CURRENT_VERSION};
pub use record::VaultRecord;
