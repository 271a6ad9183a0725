//! Permission levels and authorization gates.
//!
//! Permission is a four-level total order. Gates are pure predicates over an
//! entity's level plus, where relevant, its type; selection-wide checks live
//! on the store ([`crate::store::ResourceStore::selection_permits`]) because
//! they need the materialized window to resolve ids.

use serde::{Deserialize, Serialize};

/// Access level on an entity, totally ordered by integer weight:
/// `None < Viewer < Editor < Owner`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
  #[default]
  None = 0,
  Viewer = 1,
  Editor = 2,
  Owner = 3,
}

impl Permission {
  pub fn weight(self) -> u8 {
    self as u8
  }

  pub fn at_least(self, threshold: Permission) -> bool {
    self >= threshold
  }
}

/// Entities subject to permission checks.
pub trait Governed {
  fn permission(&self) -> Permission;

  /// Whether the entity is of a type that can be opened at all.
  /// Containers (folders) are listable but not openable as documents.
  fn is_openable(&self) -> bool {
    true
  }
}

pub fn can_open<E: Governed>(entity: &E) -> bool {
  entity.is_openable() && entity.permission() >= Permission::Viewer
}

pub fn can_download<E: Governed>(entity: &E) -> bool {
  entity.permission() >= Permission::Viewer
}

pub fn can_copy<E: Governed>(entity: &E) -> bool {
  entity.permission() >= Permission::Viewer
}

pub fn can_rename<E: Governed>(entity: &E) -> bool {
  entity.permission() >= Permission::Editor
}

pub fn can_move<E: Governed>(entity: &E) -> bool {
  entity.permission() >= Permission::Editor
}

pub fn can_delete<E: Governed>(entity: &E) -> bool {
  entity.permission() >= Permission::Owner
}

pub fn can_share<E: Governed>(entity: &E) -> bool {
  entity.permission() >= Permission::Owner
}
