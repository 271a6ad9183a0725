//! Bulk mutation results.
//!
//! The server is authoritative for which ids of a batch operation succeeded
//! and which failed; [`Severity`] is derived from that partition alone and
//! never re-counted client-side.

use std::collections::HashSet;
use std::hash::Hash;

/// Kind of a bulk mutation against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
  Delete,
  Move,
  Copy,
}

/// Outcome classification of a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  /// Every requested id succeeded.
  FullSuccess,
  /// Some requested ids succeeded, some failed.
  PartialFailure,
  /// Every requested id failed.
  TotalFailure,
}

/// Server-reported partition of a batch operation's input ids.
///
/// Invariants (server-guaranteed, checkable via [`BulkResult::accounts_for`]):
/// `succeeded` and `failed` are disjoint, and together cover exactly the
/// requested id set. `created` is only populated for copy operations.
#[derive(Debug, Clone)]
pub struct BulkResult<Id> {
  pub succeeded: HashSet<Id>,
  pub failed: HashSet<Id>,
  /// Ids of entities newly created by a copy.
  pub created: HashSet<Id>,
}

impl<Id: Clone + Eq + Hash> BulkResult<Id> {
  pub fn new(succeeded: HashSet<Id>, failed: HashSet<Id>) -> Self {
    Self {
      succeeded,
      failed,
      created: HashSet::new(),
    }
  }

  /// A result in which every requested id succeeded.
  pub fn all_succeeded(ids: impl IntoIterator<Item = Id>) -> Self {
    Self::new(ids.into_iter().collect(), HashSet::new())
  }

  pub fn with_created(mut self, created: HashSet<Id>) -> Self {
    self.created = created;
    self
  }

  /// Number of ids the server accounted for.
  pub fn requested(&self) -> usize {
    self.succeeded.len() + self.failed.len()
  }

  /// Classify this result from the server-reported partition.
  pub fn severity(&self) -> Severity {
    if self.failed.is_empty() {
      Severity::FullSuccess
    } else if self.succeeded.is_empty() {
      Severity::TotalFailure
    } else {
      Severity::PartialFailure
    }
  }

  /// Check the partition invariant against the originally requested ids:
  /// disjoint sets whose union is exactly the request.
  pub fn accounts_for<'a>(&self, requested: impl IntoIterator<Item = &'a Id>) -> bool
  where
    Id: 'a,
  {
    if !self.succeeded.is_disjoint(&self.failed) {
      return false;
    }
    let requested: HashSet<&Id> = requested.into_iter().collect();
    if requested.len() != self.requested() {
      return false;
    }
    requested
      .iter()
      .all(|id| self.succeeded.contains(id) || self.failed.contains(id))
  }
}
