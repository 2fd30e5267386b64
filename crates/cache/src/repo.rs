//! Combined repository for snapshots, milestones, and sync logs.
//!
//! The three tables are tightly coupled: the resolver joins milestones
//! against per-platform snapshot history in one query, and the sync log
//! only makes sense next to the snapshot rows it describes. One repository
//! keeps the whole store behind a single handle that can be threaded
//! through the sync engine and swapped for an in-memory database in tests.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Milestone, ResolvedRecord, Snapshot, SyncEntry};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Repository for the snapshot/milestone store.
///
/// # Write semantics
///
/// - Snapshot rows are append-only: `INSERT OR IGNORE` on the unique
///   `(prefix, revision)` pair, so re-inserting known rows is a no-op.
/// - Milestone rows are last-write-wins: the freshly fetched revision
///   always replaces the stored one.
/// - Batch writes ([`insert_snapshots`](Self::insert_snapshots),
///   [`upsert_milestones`](Self::upsert_milestones)) are applied inside a
///   single transaction, so one remote page or one feed fetch commits
///   all-or-nothing.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Check whether the exact `(platform, revision)` pair is already stored.
    ///
    /// This backs the last-change short-circuit: if the newest remote marker
    /// is locally known, the platform is considered fully synchronized.
    pub async fn has_snapshot(&self, platform: impl AsRef<str>, revision: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(include_str!("../queries/has_snapshot.sql"))
            .bind(platform.as_ref())
            .bind(revision)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.is_some())
    }

    /// Insert a batch of snapshots with insert-or-ignore semantics.
    ///
    /// The whole batch is committed in one transaction (all-or-nothing per
    /// remote page). Returns the number of rows actually inserted, i.e.
    /// excluding pairs that were already present.
    pub async fn insert_snapshots(&self, snapshots: &[Snapshot]) -> Result<u64> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut inserted = 0;
        for snapshot in snapshots {
            let result = sqlx::query(include_str!("../queries/insert_snapshot.sql"))
                .bind(&snapshot.platform)
                .bind(snapshot.revision)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            inserted += result.rows_affected();
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(inserted)
    }

    /// Record that a platform's listing sync completed at the given time.
    ///
    /// One row per platform, overwritten on every completed run. Stored as
    /// RFC 3339 text since it is only ever exported, never compared.
    pub async fn touch_sync_log(&self, platform: impl AsRef<str>, at: OffsetDateTime) -> Result<()> {
        let at = at.format(&Rfc3339).or_raise(|| ErrorKind::InvalidData("timestamp"))?;
        sqlx::query(include_str!("../queries/touch_sync_log.sql"))
            .bind(platform.as_ref())
            .bind(at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// List the distinct platform prefixes actually present in the store.
    pub async fn list_platforms(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_platforms.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Greatest stored revision for a platform not exceeding the ceiling.
    ///
    /// Returns `None` when every stored revision for the platform exceeds
    /// the ceiling (or the platform has no rows at all).
    pub async fn max_revision_at_or_below(
        &self,
        platform: impl AsRef<str>,
        ceiling: i64,
    ) -> Result<Option<i64>> {
        sqlx::query_scalar(include_str!("../queries/max_revision_at_or_below.sql"))
            .bind(platform.as_ref())
            .bind(ceiling)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Count all stored snapshot rows (logging/observability only).
    pub async fn count_snapshots(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_snapshots.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("row count"))
    }

    // =========================================================================
    // Milestones
    // =========================================================================

    /// Upsert a batch of milestones, last write wins.
    ///
    /// Applied in one transaction: a feed fetch either replaces the stored
    /// revisions for all its milestones or none of them.
    pub async fn upsert_milestones(&self, milestones: &[Milestone]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for milestone in milestones {
            sqlx::query(include_str!("../queries/upsert_milestone.sql"))
                .bind(milestone.milestone)
                .bind(milestone.revision)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// List all milestones, ordered by milestone number.
    pub async fn list_milestones(&self) -> Result<Vec<Milestone>> {
        sqlx::query_as(include_str!("../queries/list_milestones.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Export reads
    // =========================================================================

    /// Full sync-log contents, ordered by platform prefix.
    pub async fn list_sync_logs(&self) -> Result<Vec<SyncEntry>> {
        sqlx::query_as(include_str!("../queries/list_sync_logs.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Resolve every `(milestone, platform)` pair to the greatest snapshot
    /// revision not exceeding the milestone's branch revision.
    ///
    /// Pairs where no snapshot qualifies are omitted entirely. Rows are
    /// ordered by resolved revision ascending, ties broken by prefix, so
    /// the result is reproducible for unchanged stores.
    pub async fn resolve_records(&self) -> Result<Vec<ResolvedRecord>> {
        sqlx::query_as(include_str!("../queries/resolve_records.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
