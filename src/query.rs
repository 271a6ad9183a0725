//! Collection query descriptors.
//!
//! A [`CollectionQuery`] describes how a listing is sorted and filtered. The
//! filter itself is an opaque blob serialized out-of-band by the RPC
//! collaborator; the store only needs a stable identity for the whole
//! descriptor so it can tell "same listing, keep the window" apart from
//! "different listing, reset the window".

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::page::SortOrder;

/// Sort and filter descriptor for one remote listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionQuery {
  /// Server-side sort key (e.g. "name", "modified").
  pub sort_by: Option<String>,
  #[serde(default)]
  pub sort_order: SortOrder,
  /// Opaque filter payload, passed through to the collaborator untouched.
  pub filter: Option<serde_json::Value>,
}

impl CollectionQuery {
  pub fn sorted_by(key: impl Into<String>, order: SortOrder) -> Self {
    Self {
      sort_by: Some(key.into()),
      sort_order: order,
      filter: None,
    }
  }

  pub fn with_filter(mut self, filter: serde_json::Value) -> Self {
    self.filter = Some(filter);
    self
  }

  /// Stable, fixed-length identity of this query.
  ///
  /// Two queries with the same hash address the same remote listing; a hash
  /// change means the materialized window no longer matches the query and
  /// must be reset.
  pub fn cache_hash(&self) -> String {
    let sort_by = self
      .sort_by
      .as_deref()
      .map(normalize_sort_key)
      .unwrap_or_default();
    let order = match self.sort_order {
      SortOrder::Ascending => "asc",
      SortOrder::Descending => "desc",
    };
    let filter = self
      .filter
      .as_ref()
      .map(|f| f.to_string())
      .unwrap_or_default();
    let input = format!("{}:{}:{}", sort_by, order, filter);

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Short human-readable form for log lines.
  pub fn description(&self) -> String {
    match (&self.sort_by, &self.filter) {
      (Some(key), Some(_)) => format!("sorted by {}, filtered", key),
      (Some(key), None) => format!("sorted by {}", key),
      (None, Some(_)) => "filtered".to_string(),
      (None, None) => "default order".to_string(),
    }
  }
}

/// Normalize a sort key for consistent hashing.
/// Trims whitespace and lowercases for case-insensitive matching.
fn normalize_sort_key(key: &str) -> String {
  key.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_hash_is_stable_across_key_normalization() {
    let a = CollectionQuery::sorted_by("Name", SortOrder::Ascending);
    let b = CollectionQuery::sorted_by("  name ", SortOrder::Ascending);
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_hash_changes_with_order_and_filter() {
    let base = CollectionQuery::sorted_by("name", SortOrder::Ascending);
    let descending = CollectionQuery::sorted_by("name", SortOrder::Descending);
    let filtered = base.clone().with_filter(json!({ "type": "file" }));

    assert_ne!(base.cache_hash(), descending.cache_hash());
    assert_ne!(base.cache_hash(), filtered.cache_hash());
  }

  #[test]
  fn test_description() {
    assert_eq!(CollectionQuery::default().description(), "default order");
    assert_eq!(
      CollectionQuery::sorted_by("modified", SortOrder::Descending).description(),
      "sorted by modified"
    );
  }
}
