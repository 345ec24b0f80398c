//! The decrypted vault document and the items it holds.
//!
//! A `DecryptedVault` only ever exists in memory while the session is
//! unlocked.  On disk (and on the wire) it is always inside an `Envelope`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{VaultError, Result};

/// Current vault document version.
pub const CURRENT_VERSION: u32 = 1;

/// Item category shown as a chip next to the title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Bank,
    Social,
    Work,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Bank,
        Category::Social,
        Category::Work,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Bank => "Bank",
            Category::Social => "Social",
            Category::Work => "Work",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                VaultError::InvalidInput(format!(
                    "unknown category '{s}' — expected Bank, Social, Work or Other"
                ))
            })
    }
}

/// A single stored credential.
///
/// The `id` is assigned once at creation and never changes.  All string
/// fields are wiped from memory when the item is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct VaultItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub category: Category,
}

impl VaultItem {
    /// Lower-cased haystack used by `DecryptedVault::search`.
    fn search_text(&self) -> String {
        [
            self.title.as_str(),
            self.username.as_deref().unwrap_or_default(),
            self.notes.as_deref().unwrap_or_default(),
            self.category.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(VaultError::InvalidInput("title cannot be empty".into()));
        }
        if self.password.is_empty() {
            return Err(VaultError::InvalidInput("password cannot be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for VaultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("notes", &self.notes.as_ref().map(|_| "<redacted>"))
            .field("category", &self.category)
            .finish()
    }
}

/// Fields supplied by the user when adding an item.  The id is generated.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct NewItem {
    pub title: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    #[zeroize(skip)]
    pub category: Category,
}

impl NewItem {
    pub fn new(title: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            username: None,
            password: password.into(),
            notes: None,
            category: Category::Other,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Build the stored item under a freshly generated id.
    ///
    /// Blank optional fields are stored as absent.
    pub fn to_item(&self) -> Result<VaultItem> {
        let item = VaultItem {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            username: non_blank(self.username.as_deref()),
            password: self.password.clone(),
            notes: non_blank(self.notes.as_deref()),
            category: self.category,
        };
        item.validate()?;
        Ok(item)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The vault document exactly as it may appear inside an older envelope.
///
/// Every field is optional; `DecryptedVault::from_stored` fills the gaps.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVault {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    items: Option<Vec<VaultItem>>,
}

/// The vault contents while unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedVault {
    pub version: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<VaultItem>,
}

impl DecryptedVault {
    /// A brand-new, empty vault.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_VERSION,
            created_at: now,
            items: Vec::new(),
        }
    }

    /// Normalize a document read from an envelope.
    ///
    /// Missing `version`, `createdAt` and `items` become `1`, `now` and `[]`.
    pub fn from_stored(stored: StoredVault, now: DateTime<Utc>) -> Self {
        Self {
            version: stored.version.filter(|v| *v >= 1).unwrap_or(CURRENT_VERSION),
            created_at: stored.created_at.unwrap_or(now),
            items: stored.items.unwrap_or_default(),
        }
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&VaultItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Append a new item.
    pub fn add(&mut self, item: VaultItem) -> Result<()> {
        item.validate()?;
        if self.get(&item.id).is_some() {
            return Err(VaultError::InvalidInput(format!(
                "an item with id '{}' already exists",
                item.id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replace the item with the same id, keeping its position.
    pub fn update(&mut self, item: VaultItem) -> Result<()> {
        item.validate()?;
        let slot = self
            .items
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or_else(|| VaultError::ItemNotFound(item.id.clone()))?;
        *slot = item;
        Ok(())
    }

    /// Remove an item by id and return it.
    pub fn remove(&mut self, id: &str) -> Result<VaultItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| VaultError::ItemNotFound(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Case-insensitive substring search over title, username, notes and
    /// category.  An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&VaultItem> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| needle.is_empty() || item.search_text().contains(&needle))
            .collect()
    }
}
