//! Milestone feed capability and its ChromiumDash client.

use crate::error::{ErrorKind, Result};
use crate::models::MilestoneItem;
use async_trait::async_trait;
use exn::ResultExt;
use tracing::debug;

/// Read capability over the milestone feed.
///
/// One fetch returns the entire feed; there is no pagination.
#[async_trait]
pub trait MilestoneFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<MilestoneItem>>;
}

const DEFAULT_BASE_URL: &str = "https://chromiumdash.appspot.com";

/// [`MilestoneFeed`] backed by the ChromiumDash `fetch_milestones` endpoint.
#[derive(Debug, Clone)]
pub struct DashFeed {
    http: reqwest::Client,
    base_url: String,
}

impl DashFeed {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint base URL (local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn feed_url(&self) -> String {
        format!("{}/fetch_milestones", self.base_url)
    }
}

impl Default for DashFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MilestoneFeed for DashFeed {
    async fn fetch(&self) -> Result<Vec<MilestoneItem>> {
        let items = self
            .http
            .get(self.feed_url())
            .send()
            .await
            .or_raise(|| ErrorKind::Http)?
            .error_for_status()
            .or_raise(|| ErrorKind::Http)?
            .json::<Vec<MilestoneItem>>()
            .await
            .or_raise(|| ErrorKind::MalformedResponse("milestone feed"))?;
        debug!(milestones = items.len(), "fetched milestone feed");
        Ok(items)
    }
}
