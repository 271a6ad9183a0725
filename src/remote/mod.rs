//! RPC collaborator traits.
//!
//! The data layer does not speak any transport itself; it consumes a typed
//! client that exposes these logical operations. Error responses arrive
//! pre-classified into [`crate::error::ErrorCode`]s by the implementor.

mod memory;

pub use memory::InMemoryRemote;

use async_trait::async_trait;

use crate::bulk::{BulkKind, BulkResult};
use crate::error::Result;
use crate::jobs::Job;
use crate::page::{Page, PageRequest};
use crate::store::Resource;

/// Read access to one kind of paginated remote collection.
#[async_trait]
pub trait PageSource<T: Resource>: Send + Sync {
  /// Fetch one page of a collection.
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>>;

  /// Fetch a single entity by id.
  async fn fetch_entity(&self, collection: &str, id: &T::Id) -> Result<T>;

  /// Fetch the element count of a collection (e.g. outstanding jobs).
  async fn fetch_count(&self, collection: &str) -> Result<i64>;
}

/// Batch mutations over entities of a collection.
#[async_trait]
pub trait BulkSource<T: Resource>: Send + Sync {
  /// Apply a bulk operation to `ids`. `target` names the destination
  /// collection for move/copy. The returned partition is authoritative.
  async fn mutate_bulk(
    &self,
    kind: BulkKind,
    ids: &[T::Id],
    target: Option<&str>,
  ) -> Result<BulkResult<T::Id>>;
}

/// Job handle operations.
#[async_trait]
pub trait JobApi: Send + Sync {
  async fn fetch_job(&self, id: &str) -> Result<Job>;

  async fn dismiss_job(&self, id: &str) -> Result<()>;

  /// Dismiss every dismissible job; non-dismissible ones come back in the
  /// failed partition.
  async fn dismiss_all_jobs(&self) -> Result<BulkResult<String>>;
}
