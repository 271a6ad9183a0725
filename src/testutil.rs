//! Shared fixtures for unit tests.

use crate::permission::{Governed, Permission};
use crate::store::Resource;

/// Install a fmt subscriber honoring `RUST_LOG`, writing through the test
/// capture. First caller wins; every test may call it.
pub(crate) fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// A document-like test entity.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestDoc {
  pub id: String,
  pub name: String,
  pub permission: Permission,
  pub folder: bool,
  pub job: Option<String>,
}

impl Resource for TestDoc {
  type Id = String;

  fn id(&self) -> String {
    self.id.clone()
  }

  fn resource_type() -> &'static str {
    "doc"
  }

  fn linked_job(&self) -> Option<&str> {
    self.job.as_deref()
  }
}

impl Governed for TestDoc {
  fn permission(&self) -> Permission {
    self.permission
  }

  fn is_openable(&self) -> bool {
    !self.folder
  }
}

pub(crate) fn doc(id: &str) -> TestDoc {
  TestDoc {
    id: id.to_string(),
    name: format!("{}.pdf", id),
    permission: Permission::Owner,
    folder: false,
    job: None,
  }
}

/// `n` documents with ids `doc-1` through `doc-n`.
pub(crate) fn docs(n: usize) -> Vec<TestDoc> {
  (1..=n).map(|i| doc(&format!("doc-{}", i))).collect()
}
