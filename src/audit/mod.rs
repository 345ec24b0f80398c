//! Security activity feed: what happened to the vault in this process.
//!
//! Keeps a bounded, in-memory history of session events (unlocks, failed
//! attempts, auto-locks, item changes) so the front end can show recent
//! activity.  Nothing here is ever written to disk, and entries carry item
//! ids only, never titles or secrets.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};

/// Default number of entries kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 256;

/// What kind of event an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    VaultCreated,
    Unlocked,
    UnlockFailed,
    UnlockRejected,
    LoggedOut,
    AutoLocked,
    /// Locked because the session had lost its key material.
    ForceLocked,
    ItemAdded,
    ItemUpdated,
    ItemDeleted,
    SecretCopied,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::VaultCreated => "vault created",
            ActivityKind::Unlocked => "unlocked",
            ActivityKind::UnlockFailed => "unlock failed",
            ActivityKind::UnlockRejected => "unlock rejected (locked out)",
            ActivityKind::LoggedOut => "logged out",
            ActivityKind::AutoLocked => "auto-locked",
            ActivityKind::ForceLocked => "force-locked",
            ActivityKind::ItemAdded => "item added",
            ActivityKind::ItemUpdated => "item updated",
            ActivityKind::ItemDeleted => "item deleted",
            ActivityKind::SecretCopied => "secret copied",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub item_id: Option<String>,
}

/// Bounded in-memory activity history.
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Record an event, dropping the oldest entry when full.
    pub fn log(&mut self, kind: ActivityKind, item_id: Option<&str>, timestamp: DateTime<Utc>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            id: self.next_id,
            timestamp,
            kind,
            item_id: item_id.map(str::to_string),
        });
        self.next_id += 1;
    }

    /// Query recent entries.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries at or after this time.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Vec<ActivityEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| since.map_or(true, |ts| entry.timestamp >= ts))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries of `kind` are currently held.
    pub fn count(&self, kind: ActivityKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
}
