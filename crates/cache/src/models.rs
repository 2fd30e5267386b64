//! Store entities and the derived export rows.

use serde::Serialize;

/// One observed `(platform, revision)` pair from the remote archive.
///
/// Immutable once inserted; a platform may have many revisions, and a
/// revision number is only meaningful within its platform's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    pub platform: String,
    pub revision: i64,
}

impl Snapshot {
    pub fn new(platform: impl Into<String>, revision: i64) -> Self {
        Self { platform: platform.into(), revision }
    }
}

/// A release milestone mapped to the revision at which its branch diverged.
///
/// Mutable: the feed is authoritative and may retroactively change a
/// milestone's branch point, so the revision is overwritten on every sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct Milestone {
    pub milestone: i64,
    pub revision: i64,
}

/// Per-platform "last completed sync" row, exported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SyncEntry {
    pub prefix: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Derived nearest-at-or-below match between a milestone and one platform's
/// snapshot history. Recomputed fully on every export; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ResolvedRecord {
    pub milestone: i64,
    pub prefix: String,
    pub revision: i64,
}
