//! `revmap`: run the full sync-then-export pipeline once.
//!
//! Syncs every configured platform's snapshot listing into the local store,
//! refreshes the milestone feed, and writes the milestone-to-nearest-build
//! export. There are no partial modes; re-running the whole pipeline is the
//! retry mechanism (every commit unit is idempotent).

mod error;

use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use revmap_cache::{Database, Repository};
use revmap_config::Config;
use revmap_remote::{DashFeed, GcsListing};
use revmap_sync::{sync_milestones, sync_platform, write_export};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "revmap", version, about = "Sync Chromium snapshot revisions and milestones, then export the milestone-to-build mapping")]
struct Args {
    /// Path to a TOML configuration file (defaults to ./revmap.toml if present).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        // Partial failure: already logged per platform, the rest of the
        // pipeline still ran.
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = ?err, "run aborted");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<bool> {
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    info!(
        platforms = config.platforms.len(),
        database = %config.database_path.display(),
        "starting sync run",
    );

    let db = Database::connect(&config.database_path).await.or_raise(|| ErrorKind::Database)?;
    let repo = Repository::from(&db);
    let listing = GcsListing::new()
        .with_base_url(config.storage_base_url.clone())
        .with_bucket(config.bucket.clone());
    let feed = DashFeed::new().with_base_url(config.dash_base_url.clone());

    // Platform syncs are independent: one failing platform must not block
    // the others, so failures are tallied instead of propagated.
    let mut failed = 0usize;
    for platform in &config.platforms {
        let platform = platform.as_str();
        match sync_platform(&listing, &repo, platform).await {
            Ok(report) if report.up_to_date => info!(platform, "already up to date"),
            Ok(report) => info!(
                platform,
                pages = report.pages,
                discovered = report.discovered,
                inserted = report.inserted,
                "platform synced",
            ),
            Err(err) => {
                error!(platform, error = ?err, "platform sync failed");
                failed += 1;
            },
        }
    }

    let milestones = sync_milestones(&feed, &repo).await.or_raise(|| ErrorKind::Milestones)?;
    let records = write_export(&repo, &config.export_path).await.or_raise(|| ErrorKind::Export)?;
    info!(
        milestones,
        records,
        export = %config.export_path.display(),
        failed_platforms = failed,
        "run complete",
    );
    db.close().await;
    Ok(failed == 0)
}
