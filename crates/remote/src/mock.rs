//! In-memory remote sources for testing.

use crate::error::{ErrorKind, Result};
use crate::feed::MilestoneFeed;
use crate::listing::{PageStream, SnapshotListing};
use crate::models::MilestoneItem;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`SnapshotListing`] for testing.
///
/// Seed it with a `LAST_CHANGE` marker and a page chain per platform, and
/// optionally make it fail partway through the chain to exercise
/// interrupted-sync recovery. Fetch counters let tests assert that the
/// short-circuit really skipped the network.
///
/// # Examples
///
/// ```
/// use revmap_remote::mock::MockListing;
///
/// let listing = MockListing::default()
///     .with_last_change("Win", 300)
///     .with_pages("Win", [vec!["Win/100/".into()], vec!["Win/300/".into()]]);
/// ```
#[derive(Debug, Default)]
pub struct MockListing {
    last_change: HashMap<String, i64>,
    pages: HashMap<String, Vec<Vec<String>>>,
    fail_after_pages: Option<usize>,
    marker_fetches: AtomicUsize,
    page_fetches: AtomicUsize,
}

impl MockListing {
    /// Seed the `LAST_CHANGE` marker for a platform.
    pub fn with_last_change(mut self, platform: impl Into<String>, revision: i64) -> Self {
        self.last_change.insert(platform.into(), revision);
        self
    }

    /// Seed the listing page chain for a platform, one `Vec` of prefix
    /// strings per page.
    pub fn with_pages(
        mut self,
        platform: impl Into<String>,
        pages: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        self.pages.insert(platform.into(), pages.into_iter().collect());
        self
    }

    /// Fail the page stream after yielding `pages` successful pages.
    pub fn failing_after_pages(mut self, pages: usize) -> Self {
        self.fail_after_pages = Some(pages);
        self
    }

    /// Number of `LAST_CHANGE` fetches performed so far.
    pub fn marker_fetches(&self) -> usize {
        self.marker_fetches.load(Ordering::SeqCst)
    }

    /// Number of listing pages served so far (successful ones only).
    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotListing for MockListing {
    async fn last_change(&self, platform: &str) -> Result<i64> {
        self.marker_fetches.fetch_add(1, Ordering::SeqCst);
        match self.last_change.get(platform) {
            Some(revision) => Ok(*revision),
            // An unseeded platform behaves like an unreachable remote.
            None => Err(exn::Exn::from(ErrorKind::Http)),
        }
    }

    fn pages<'a>(&'a self, platform: &'a str) -> PageStream<'a> {
        // An unseeded platform serves a single empty page, like a real
        // listing of an empty namespace.
        let pages = self.pages.get(platform).cloned().unwrap_or_else(|| vec![Vec::new()]);
        Box::pin(stream! {
            for (index, page) in pages.into_iter().enumerate() {
                if self.fail_after_pages.is_some_and(|limit| index >= limit) {
                    yield Err(exn::Exn::from(ErrorKind::Http));
                    break;
                }
                self.page_fetches.fetch_add(1, Ordering::SeqCst);
                yield Ok(page);
            }
        })
    }
}

/// In-memory [`MilestoneFeed`] for testing.
#[derive(Debug, Default)]
pub struct MockFeed {
    items: Vec<MilestoneItem>,
    fail: bool,
}

impl MockFeed {
    /// Seed the feed with `(milestone, branch position)` pairs.
    pub fn with_items(mut self, items: impl IntoIterator<Item = (i64, i64)>) -> Self {
        self.items = items
            .into_iter()
            .map(|(milestone, position)| MilestoneItem {
                milestone,
                chromium_main_branch_position: position,
            })
            .collect();
        self
    }

    /// Make every fetch fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl MilestoneFeed for MockFeed {
    async fn fetch(&self) -> Result<Vec<MilestoneItem>> {
        if self.fail {
            return Err(exn::Exn::from(ErrorKind::Http));
        }
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_mock_listing_serves_seeded_pages() {
        let listing = MockListing::default()
            .with_last_change("Win", 300)
            .with_pages("Win", [vec!["Win/100/".to_string()], vec!["Win/300/".to_string()]]);
        assert_eq!(listing.last_change("Win").await.unwrap(), 300);
        let pages: Vec<Vec<String>> = listing.pages("Win").try_collect().await.unwrap();
        assert_eq!(pages, vec![vec!["Win/100/".to_string()], vec!["Win/300/".to_string()]]);
        assert_eq!(listing.marker_fetches(), 1);
        assert_eq!(listing.page_fetches(), 2);
    }

    #[tokio::test]
    async fn test_mock_listing_failure_injection() {
        let listing = MockListing::default()
            .with_pages("Mac", [vec!["Mac/1/".to_string()], vec!["Mac/2/".to_string()]])
            .failing_after_pages(1);
        let mut stream = listing.pages("Mac");
        assert_eq!(stream.try_next().await.unwrap(), Some(vec!["Mac/1/".to_string()]));
        let error = stream.try_next().await.unwrap_err();
        assert!(matches!(&*error, ErrorKind::Http));
    }

    #[tokio::test]
    async fn test_mock_feed() {
        let feed = MockFeed::default().with_items([(100, 950365)]);
        let items = feed.fetch().await.unwrap();
        assert_eq!(items[0].milestone, 100);
        assert!(MockFeed::default().failing().fetch().await.is_err());
    }
}
