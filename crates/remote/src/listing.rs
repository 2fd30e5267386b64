//! Object-storage listing capability and its Google Cloud Storage client.

use crate::error::{ErrorKind, Result};
use crate::models::ListingPage;
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use futures::Stream;
use std::pin::Pin;
use tracing::debug;

/// Lazy, finite sequence of listing pages, one `Vec` of prefix strings per
/// remote page, in continuation-token order.
///
/// The stream is restartable from scratch (call [`SnapshotListing::pages`]
/// again) but never resumable mid-chain.
pub type PageStream<'a> = Pin<Box<dyn Stream<Item = Result<Vec<String>>> + Send + 'a>>;

/// Read capability over the remote snapshot archive.
///
/// Two observations are exposed: the newest revision marker for a platform
/// (a single scalar) and the paginated listing of per-revision directories
/// under the platform's namespace. Implementations only fetch; they never
/// interpret prefixes, so malformed-entry filtering stays in the sync engine.
#[async_trait]
pub trait SnapshotListing: Send + Sync {
    /// Fetch the newest known revision marker for a platform.
    async fn last_change(&self, platform: &str) -> Result<i64>;

    /// Stream the directory-prefix listing for a platform, one page at a
    /// time, following the continuation-token chain until the remote stops
    /// returning a token.
    fn pages<'a>(&'a self, platform: &'a str) -> PageStream<'a>;
}

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_BUCKET: &str = "chromium-browser-snapshots";

/// [`SnapshotListing`] backed by the Google Cloud Storage JSON API.
///
/// Uses the `delimiter=/` listing mode, which collapses objects into their
/// common directory prefixes (`<platform>/<revision>/`), and the per-platform
/// `LAST_CHANGE` object as the newest-revision marker.
#[derive(Debug, Clone)]
pub struct GcsListing {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl GcsListing {
    /// Client against the default public endpoint and snapshot bucket.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }

    /// Override the endpoint base URL (local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the bucket name.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    fn last_change_url(&self, platform: &str) -> String {
        // `alt=media` downloads the object body (the raw marker text)
        // instead of its metadata document.
        format!(
            "{}/download/storage/v1/b/{}/o/{}%2FLAST_CHANGE?alt=media",
            self.base_url, self.bucket, platform,
        )
    }

    fn page_url(&self, platform: &str, token: Option<&str>) -> String {
        let mut url = format!(
            "{}/storage/v1/b/{}/o?delimiter=/&prefix={}/&fields=prefixes,nextPageToken",
            self.base_url, self.bucket, platform,
        );
        if let Some(token) = token {
            url.push_str("&pageToken=");
            url.push_str(token);
        }
        url
    }

    async fn fetch_page(&self, url: &str) -> Result<ListingPage> {
        self.http
            .get(url)
            .send()
            .await
            .or_raise(|| ErrorKind::Http)?
            .error_for_status()
            .or_raise(|| ErrorKind::Http)?
            .json::<ListingPage>()
            .await
            .or_raise(|| ErrorKind::MalformedResponse("listing page"))
    }
}

impl Default for GcsListing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotListing for GcsListing {
    async fn last_change(&self, platform: &str) -> Result<i64> {
        let body = self
            .http
            .get(self.last_change_url(platform))
            .send()
            .await
            .or_raise(|| ErrorKind::Http)?
            .error_for_status()
            .or_raise(|| ErrorKind::Http)?
            .text()
            .await
            .or_raise(|| ErrorKind::Http)?;
        body.trim().parse::<i64>().or_raise(|| ErrorKind::MalformedResponse("LAST_CHANGE marker"))
    }

    fn pages<'a>(&'a self, platform: &'a str) -> PageStream<'a> {
        Box::pin(stream! {
            let mut token: Option<String> = None;
            loop {
                let url = self.page_url(platform, token.as_deref());
                match self.fetch_page(&url).await {
                    Ok(page) => {
                        debug!(platform, prefixes = page.prefixes.len(), "fetched listing page");
                        token = page.next_page_token;
                        yield Ok(page.prefixes);
                        if token.is_none() {
                            break;
                        }
                    },
                    Err(error) => {
                        yield Err(error);
                        break;
                    },
                }
            }
        })
    }
}
