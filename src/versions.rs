//! Append-only ledger of content snapshots kept on each note.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable copy of a note's content, taken by an explicit checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    content: String,
    timestamp: DateTime<Utc>,
    version: u32,
}

impl VersionSnapshot {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Ordered snapshot history for a single note.
///
/// Entries are only ever appended. Nothing removes or reorders them, so a
/// revert leaves newer snapshots in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionLedger {
    entries: Vec<VersionSnapshot>,
}

impl VersionLedger {
    /// Appends a snapshot of `content` under `version`.
    ///
    /// The caller owns the counter; the ledger only checks that numbers keep
    /// increasing.
    pub(crate) fn record(&mut self, content: &str, version: u32, timestamp: DateTime<Utc>) {
        debug_assert!(
            self.latest().map_or(true, |last| last.version < version),
            "snapshot versions must increase"
        );
        self.entries.push(VersionSnapshot {
            content: content.to_string(),
            timestamp,
            version,
        });
    }

    /// Looks up the snapshot with the given version number.
    pub fn find(&self, version: u32) -> Option<&VersionSnapshot> {
        self.entries.iter().find(|s| s.version == version)
    }

    pub fn latest(&self) -> Option<&VersionSnapshot> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VersionSnapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a VersionLedger {
    type Item = &'a VersionSnapshot;
    type IntoIter = std::slice::Iter<'a, VersionSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
