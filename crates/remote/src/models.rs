//! Wire shapes of the two remote documents we consume.

use serde::Deserialize;

/// One page of the object-storage "directory" listing.
///
/// The listing endpoint omits `prefixes` entirely when a page carries no
/// directory entries, and omits `nextPageToken` on the final page, so both
/// fields default.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// One entry of the milestone feed.
///
/// The feed maps each release milestone to the revision at which its
/// development branch diverged from main.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MilestoneItem {
    pub milestone: i64,
    pub chromium_main_branch_position: i64,
}
