//! livelist — a live paginated resource cache for remote collections.
//!
//! Every screen that lists a remote collection (files, invitations,
//! permission grants, background jobs) shares the same data-layer pattern:
//! a client-side store that materializes pages from a typed RPC client,
//! reconciles its window on a background timer and waits for server-side
//! jobs to finish. This crate implements that pattern once, generically.
//!
//! - [`store::ResourceStore`] — materialized, deduplicated window over a
//!   paginated collection, with single-flight forward pagination, bulk
//!   mutation bookkeeping and selection management
//! - [`store::Synchronizer`] — per-store background reconciliation timer
//! - [`jobs::wait_for_job`] / [`jobs::wait_until`] — completion pollers
//! - [`permission`] — total-order permission levels and authorization gates
//! - [`remote`] — the RPC collaborator traits the application implements
//!
//! The crate owns no transport: page fetches, bulk mutations and job
//! lookups go through the [`remote`] traits, and server errors arrive
//! pre-classified as [`error::ErrorCode`]s.

pub mod bulk;
pub mod config;
pub mod error;
pub mod jobs;
pub mod page;
pub mod permission;
pub mod query;
pub mod remote;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use bulk::{BulkKind, BulkResult, Severity};
pub use config::Config;
pub use error::{Error, ErrorCode, Result};
pub use jobs::{wait_for_job, wait_until, Job, JobStatus, PollOptions};
pub use page::{Page, PageRequest, SortOrder};
pub use permission::{Governed, Permission};
pub use query::CollectionQuery;
pub use remote::{BulkSource, InMemoryRemote, JobApi, PageSource};
pub use store::{FetchOutcome, RefreshOutcome, Resource, ResourceStore, Synchronizer};
