//! Remote fetch capabilities for the snapshot sync pipeline.
//!
//! Two independent remote services are consumed:
//! - the object-storage listing of the snapshot archive (directory prefixes
//!   per platform plus a per-platform `LAST_CHANGE` marker), paginated via
//!   continuation tokens;
//! - the milestone feed, a single unpaginated JSON array.
//!
//! Both are exposed as traits so the sync engine never touches transport
//! details and tests can substitute in-memory sources (`mock` feature).

pub mod error;
mod feed;
mod listing;
#[cfg(feature = "mock")]
pub mod mock;
pub mod models;

pub use self::feed::{DashFeed, MilestoneFeed};
pub use self::listing::{GcsListing, PageStream, SnapshotListing};
