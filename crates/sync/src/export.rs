//! Resolver/exporter: the read-only final stage of a run.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use revmap_cache::Repository;
use revmap_cache::models::{ResolvedRecord, SyncEntry};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// The portable export document.
///
/// `records` holds, for every `(milestone, platform)` pair with at least one
/// eligible snapshot, the greatest snapshot revision not exceeding the
/// milestone's branch revision — ordered by revision ascending, ties broken
/// by prefix, so re-exporting an unchanged store is byte-identical.
/// `updatedAt` is the sync log, emitted unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub records: Vec<ResolvedRecord>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Vec<SyncEntry>,
}

/// Assemble the export document from the store. Pure read, no mutation.
pub async fn build_document(repo: &Repository) -> Result<ExportDocument> {
    let records = repo.resolve_records().await.or_raise(|| ErrorKind::Store)?;
    let updated_at = repo.list_sync_logs().await.or_raise(|| ErrorKind::Store)?;
    Ok(ExportDocument { records, updated_at })
}

/// Resolve the full record set and write it to `path`, pretty-printed.
///
/// The document is written to a sibling temporary file and renamed into
/// place, so a failed write never leaves a truncated file looking complete;
/// the previous export stays observable instead. Returns the number of
/// resolved records written.
pub async fn write_export(repo: &Repository, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let document = build_document(repo).await?;
    let json = serde_json::to_vec_pretty(&document).or_raise(|| ErrorKind::Serialize)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::ExportIo(path.to_path_buf()))?;
    }
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, &json).await.or_raise(|| ErrorKind::ExportIo(staging.clone()))?;
    tokio::fs::rename(&staging, path).await.or_raise(|| ErrorKind::ExportIo(path.to_path_buf()))?;

    info!(records = document.records.len(), path = %path.display(), "export written");
    Ok(document.records.len())
}
