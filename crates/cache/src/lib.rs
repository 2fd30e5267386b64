//! SQLite store for the snapshot/milestone sync pipeline.
//!
//! Three tables back the pipeline:
//! - **snapshots**: every `(prefix, revision)` pair ever observed in the
//!   remote archive listing. Append-only, deduplicated by a unique index,
//!   so re-ingesting a listing is idempotent.
//! - **milestones**: one row per release milestone mapping it to its branch
//!   revision. Overwritten on every feed sync (the feed is authoritative).
//! - **sync_logs**: one row per platform recording when its listing sync
//!   last ran to completion. Observability only; correctness never depends
//!   on it beyond the short-circuit in the sync engine.

mod db;
pub mod error;
pub mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
