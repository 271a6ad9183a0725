//! Live materialized views over paginated remote collections.
//!
//! This module provides the central store type that:
//! - Materializes a deduplicated, server-ordered window over a collection
//! - Paginates forward single-flight, with an infinite-scroll trigger
//! - Reconciles the window against the server on a background timer
//! - Applies server-reported bulk mutation results and manages selection

mod cache;
mod sync;
mod traits;

pub use cache::{FetchOutcome, RefreshOutcome, ResourceStore};
pub use sync::Synchronizer;
pub use traits::Resource;
