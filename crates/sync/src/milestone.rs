//! Milestone feed sync.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use revmap_cache::Repository;
use revmap_cache::models::Milestone;
use revmap_remote::MilestoneFeed;
use tracing::info;

/// Fetch the milestone feed once and upsert every entry.
///
/// Last write wins unconditionally: the feed is the single source of truth
/// at fetch time and may retroactively move a milestone's branch point. The
/// whole batch is applied atomically; a fetch failure leaves the store
/// untouched. Returns the number of milestones upserted.
pub async fn sync_milestones(feed: &dyn MilestoneFeed, repo: &Repository) -> Result<usize> {
    let items = feed.fetch().await.or_raise(|| ErrorKind::Feed)?;
    let milestones: Vec<Milestone> = items
        .iter()
        .map(|item| Milestone {
            milestone: item.milestone,
            revision: item.chromium_main_branch_position,
        })
        .collect();
    repo.upsert_milestones(&milestones).await.or_raise(|| ErrorKind::Store)?;
    info!(milestones = milestones.len(), "milestone sync complete");
    Ok(milestones.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use revmap_cache::Database;
    use revmap_remote::mock::MockFeed;

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    #[tokio::test]
    async fn test_feed_entries_are_upserted() {
        let repo = repo().await;
        let feed = MockFeed::default().with_items([(100, 950365), (101, 961656)]);
        assert_eq!(sync_milestones(&feed, &repo).await.unwrap(), 2);
        let all = repo.list_milestones().await.unwrap();
        assert_eq!(
            all,
            vec![
                Milestone { milestone: 100, revision: 950365 },
                Milestone { milestone: 101, revision: 961656 },
            ]
        );
    }

    #[tokio::test]
    async fn test_refetch_overwrites_revisions() {
        let repo = repo().await;
        sync_milestones(&MockFeed::default().with_items([(100, 500)]), &repo).await.unwrap();
        // The feed moved milestone 100's branch point.
        sync_milestones(&MockFeed::default().with_items([(100, 600)]), &repo).await.unwrap();
        assert_eq!(
            repo.list_milestones().await.unwrap(),
            vec![Milestone { milestone: 100, revision: 600 }]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let repo = repo().await;
        sync_milestones(&MockFeed::default().with_items([(99, 400)]), &repo).await.unwrap();
        let error = sync_milestones(&MockFeed::default().failing(), &repo).await.unwrap_err();
        assert!(matches!(&*error, ErrorKind::Feed));
        assert_eq!(
            repo.list_milestones().await.unwrap(),
            vec![Milestone { milestone: 99, revision: 400 }]
        );
    }
}
