//! Core trait for entities held in a resource store.

use std::fmt::Debug;
use std::hash::Hash;

/// An entity of a remote collection that can be materialized client-side.
///
/// Implementors provide a unique id used for dedup, selection and mutation
/// bookkeeping, and optionally a weak back-reference to a server-side job
/// still working on the entity.
pub trait Resource: Clone + Send + Sync + 'static {
  /// Unique identifier within the collection.
  type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

  fn id(&self) -> Self::Id;

  /// Entity type name for log lines (e.g. "file", "invitation", "job").
  fn resource_type() -> &'static str;

  /// Id of a server-side job still working on this entity, if any.
  /// A back-reference only; the entity never owns the job.
  fn linked_job(&self) -> Option<&str> {
    None
  }
}
