//! Server page shape and pagination request parameters.

use serde::{Deserialize, Serialize};

use crate::query::CollectionQuery;

/// One server response page of a paginated collection.
///
/// `items` preserves server order and is not required to be unique across
/// pages; deduplication is the store's concern. `size` is the requested page
/// size, not necessarily `items.len()` for the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// 1-based page index. Invariant: `page <= max(total_pages, 1)`.
  pub page: u32,
  pub size: u32,
  pub total_pages: u32,
  pub total_elements: u64,
}

impl<T> Page<T> {
  /// An empty first page, as a server reports it for an empty collection.
  pub fn empty(size: u32) -> Self {
    Self {
      items: Vec::new(),
      page: 1,
      size,
      total_pages: 0,
      total_elements: 0,
    }
  }

  pub fn is_first(&self) -> bool {
    self.page == 1
  }

  pub fn has_next(&self) -> bool {
    self.page < self.total_pages
  }
}

/// Sort direction for a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Ascending,
  Descending,
}

/// Parameters of one page fetch issued to the RPC collaborator.
#[derive(Debug, Clone)]
pub struct PageRequest {
  /// Identifier of the remote collection (folder id, "jobs", ...).
  pub collection: String,
  /// 1-based page index.
  pub page: u32,
  pub size: u32,
  pub query: CollectionQuery,
}
