//! The synchronization/correlation engine.
//!
//! Three stages, run in order by the binary:
//! 1. [`sync_platform`] once per configured platform — incremental,
//!    idempotent ingestion of the paginated remote listing into the
//!    deduplicated snapshot store, with a last-change short-circuit;
//! 2. [`sync_milestones`] once — single-fetch, last-write-wins upsert of
//!    the milestone feed;
//! 3. [`write_export`] last — pure read of both stores, joining every
//!    milestone against each platform's snapshot history at the nearest
//!    revision at or below the milestone's branch point.
//!
//! Every commit unit (one listing page, one feed batch) is atomic and
//! idempotent, so any stage may be aborted and re-run with no cleanup.

pub mod error;
mod export;
mod milestone;
mod snapshot;

pub use self::export::{ExportDocument, build_document, write_export};
pub use self::milestone::sync_milestones;
pub use self::snapshot::{SyncReport, parse_prefix, sync_platform};
